// Preview and export collaborators.
// Renderers are pure functions of their input: no memory of earlier frames.

pub mod text;
pub mod wrap;

use bytes::Bytes;
use serde::Serialize;

use crate::models::resume::Resume;

pub use text::TextPreviewRenderer;

/// One rendered preview, tagged with the draft revision it was produced from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewFrame {
    pub revision: u64,
    pub title: String,
    pub body: String,
}

pub trait PreviewRenderer: Send + Sync {
    fn render(&self, resume: &Resume, revision: u64, layout_width: usize) -> PreviewFrame;
}

/// On-demand PDF export. Not part of the editing loop; callers run it on the
/// blocking pool.
pub trait PdfExporter: Send + Sync {
    fn export(&self, resume: &Resume) -> anyhow::Result<Bytes>;
}
