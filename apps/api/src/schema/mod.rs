// Résumé schema boundary: format rules and the single validation entry point.

pub mod formats;
pub mod validation;

pub use validation::{validate_resume, ValidationErrors};
