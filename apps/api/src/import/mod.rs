//! AI-assisted text import. The model only proposes content; a proposal reaches
//! the draft exclusively through the editor's own update operations, so it is
//! validated at save like any hand-typed edit.

pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::editor::{EditorController, EditorError, ResumeField};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::resume::{
    Certification, Education, Project, Resume, Section, Skill, WorkExperience,
};

use self::prompts::{build_import_prompt, IMPORT_SYSTEM};

/// Content extracted from free text, to be appended to the current résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportProposal {
    #[serde(default)]
    pub professional_summary: Option<String>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

impl ImportProposal {
    pub fn is_empty(&self) -> bool {
        self.professional_summary.is_none()
            && self.work_experience.is_empty()
            && self.education.is_empty()
            && self.skills.is_empty()
            && self.projects.is_empty()
            && self.certifications.is_empty()
    }

    /// The résumé that results from accepting this proposal: new entries are
    /// appended to each section, a proposed summary replaces the current one.
    pub fn merged_into(&self, resume: &Resume) -> Resume {
        let mut merged = resume.clone();
        if let Some(summary) = &self.professional_summary {
            merged.professional_summary = Some(summary.clone());
        }
        merged.work_experience.extend(self.work_experience.iter().cloned());
        merged.education.extend(self.education.iter().cloned());
        merged.skills.extend(self.skills.iter().cloned());
        merged.projects.extend(self.projects.iter().cloned());
        merged.certifications.extend(self.certifications.iter().cloned());
        merged
    }
}

/// Counts of what an applied proposal added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub summary_updated: bool,
    pub work_experience: usize,
    pub education: usize,
    pub skills: usize,
    pub projects: usize,
    pub certifications: usize,
}

/// Turns free text into a proposal. Implementations must not touch any session.
#[async_trait]
pub trait TextImporter: Send + Sync {
    async fn propose(&self, text: &str, current: &Resume) -> Result<ImportProposal, AppError>;
}

/// Importer backed by the Anthropic Messages API.
pub struct LlmTextImporter {
    llm: LlmClient,
}

impl LlmTextImporter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl TextImporter for LlmTextImporter {
    async fn propose(&self, text: &str, current: &Resume) -> Result<ImportProposal, AppError> {
        let current_json = serde_json::to_string_pretty(current)
            .map_err(|e| AppError::Internal(e.into()))?;
        let prompt = build_import_prompt(&current_json, text);
        let proposal: ImportProposal = self
            .llm
            .call_json(&prompt, IMPORT_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Failed to extract resume content: {e}")))?;
        if proposal.is_empty() {
            info!("Import found nothing new for resume {}", current.id);
            return Ok(proposal);
        }
        info!(
            "Import proposal for resume {}: {} jobs, {} schools, {} skill groups, {} projects, {} certifications",
            current.id,
            proposal.work_experience.len(),
            proposal.education.len(),
            proposal.skills.len(),
            proposal.projects.len(),
            proposal.certifications.len()
        );
        Ok(proposal)
    }
}

/// Applies a proposal through the controller's update operations. Each entry
/// is added blank and then filled one attribute at a time.
pub fn apply_import(
    editor: &mut EditorController,
    proposal: &ImportProposal,
) -> Result<ImportReport, EditorError> {
    let mut report = ImportReport::default();

    if let Some(summary) = &proposal.professional_summary {
        editor.update_field(ResumeField::ProfessionalSummary, Value::String(summary.clone()))?;
        report.summary_updated = true;
    }
    report.work_experience = append_items(editor, Section::WorkExperience, &proposal.work_experience)?;
    report.education = append_items(editor, Section::Education, &proposal.education)?;
    report.skills = append_items(editor, Section::Skills, &proposal.skills)?;
    report.projects = append_items(editor, Section::Projects, &proposal.projects)?;
    report.certifications = append_items(editor, Section::Certifications, &proposal.certifications)?;

    Ok(report)
}

fn append_items<T: Serialize>(
    editor: &mut EditorController,
    section: Section,
    items: &[T],
) -> Result<usize, EditorError> {
    for item in items {
        let index = editor.add_collection_item(section)?;
        if let Value::Object(attributes) = serde_json::to_value(item)? {
            for (field, value) in attributes {
                editor.update_collection_item(section, index, &field, value)?;
            }
        }
    }
    Ok(items.len())
}
