//! Persistence collaborator for résumé documents.
//!
//! The editor treats the store as atomic: `update` replaces the whole record,
//! `delete` removes it. Authorization and consistency checks belong to the store.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::Resume;
use crate::schema::ValidationErrors;

pub use postgres::PgResumeStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resume {0} not found")]
    NotFound(Uuid),

    #[error("Stored resume {id} failed validation: {errors}")]
    Corrupt { id: Uuid, errors: ValidationErrors },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Loads a résumé, re-validating the stored document.
    async fn fetch(&self, id: Uuid) -> Result<Option<Resume>, StoreError>;

    /// Whole-record replace keyed by `id`.
    async fn update(&self, id: Uuid, resume: &Resume) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
