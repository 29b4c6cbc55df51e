//! Editor state controller. Owns one résumé draft for the length of a session.
//!
//! Forms emit intents (field, value); the controller applies them to the draft,
//! bumps the revision, and feeds the preview debouncer. Nothing is persisted
//! until an explicit save. Save and delete are split into `begin_*` / `execute`
//! / `finish_*` so a caller holding the controller behind a lock can release it
//! while the store call is in flight.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::fields::{self, ResumeField};
use crate::editor::preview::{PreviewConfig, PreviewDebouncer};
use crate::editor::{EditorError, SessionState};
use crate::models::resume::{Resume, Section};
use crate::render::{PreviewFrame, PreviewRenderer};
use crate::schema::validate_resume;
use crate::store::{ResumeStore, StoreError};

pub struct EditorController {
    resume: Resume,
    state: SessionState,
    revision: u64,
    saved_revision: u64,
    deleting: bool,
    store: Arc<dyn ResumeStore>,
    preview: PreviewDebouncer,
}

/// A validated snapshot on its way to the store.
pub struct PendingSave {
    revision: u64,
    snapshot: Resume,
    store: Arc<dyn ResumeStore>,
}

pub struct SaveOutcome {
    revision: u64,
    result: Result<(), StoreError>,
}

impl PendingSave {
    pub async fn execute(self) -> SaveOutcome {
        let result = self.store.update(self.snapshot.id, &self.snapshot).await;
        SaveOutcome {
            revision: self.revision,
            result,
        }
    }
}

pub struct PendingDelete {
    id: Uuid,
    store: Arc<dyn ResumeStore>,
}

impl PendingDelete {
    pub async fn execute(self) -> Result<(), StoreError> {
        self.store.delete(self.id).await
    }
}

pub enum DeleteStep {
    ConfirmationRequired { prompt: String },
    Pending(PendingDelete),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Nothing happened; the caller must ask the user and retry with confirmation.
    ConfirmationRequired { prompt: String },
    Deleted,
}

impl EditorController {
    /// Starts a session over a résumé loaded from the store. Must run inside a
    /// Tokio runtime: the preview debouncer is spawned here.
    pub fn open(
        resume: Resume,
        store: Arc<dyn ResumeStore>,
        renderer: Arc<dyn PreviewRenderer>,
        preview: PreviewConfig,
    ) -> Self {
        let preview = PreviewDebouncer::spawn(renderer, preview, &resume);
        Self {
            resume,
            state: SessionState::Clean,
            revision: 0,
            saved_revision: 0,
            deleting: false,
            store,
            preview,
        }
    }

    pub fn resume(&self) -> &Resume {
        &self.resume
    }

    pub fn id(&self) -> Uuid {
        self.resume.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn is_saving(&self) -> bool {
        self.state == SessionState::Saving
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn title(&self) -> String {
        self.resume.display_title()
    }

    pub fn kind_label(&self) -> &'static str {
        self.resume.kind_label()
    }

    /// Debounced snapshots of the draft, for a downstream renderer.
    pub fn preview_value(&self) -> watch::Receiver<Arc<Resume>> {
        self.preview.subscribe()
    }

    pub fn latest_preview(&self) -> Arc<PreviewFrame> {
        self.preview.latest_frame()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Mutations
    // ────────────────────────────────────────────────────────────────────────

    pub fn update_field(&mut self, field: ResumeField, value: Value) -> Result<(), EditorError> {
        self.ensure_live()?;
        fields::apply_field(&mut self.resume, field, value)?;
        debug!("Session {}: updated field {field}", self.resume.id);
        self.touch();
        Ok(())
    }

    pub fn update_collection_item(
        &mut self,
        section: Section,
        index: usize,
        field: &str,
        value: Value,
    ) -> Result<(), EditorError> {
        self.ensure_live()?;
        fields::update_collection_item(&mut self.resume, section, index, field, value)?;
        debug!("Session {}: updated {section}[{index}].{field}", self.resume.id);
        self.touch();
        Ok(())
    }

    /// Appends a blank entity and returns its index.
    pub fn add_collection_item(&mut self, section: Section) -> Result<usize, EditorError> {
        self.ensure_live()?;
        let index = fields::add_collection_item(&mut self.resume, section);
        self.touch();
        Ok(index)
    }

    /// Removes the entity at `index`; an absent index is a no-op returning `false`.
    pub fn remove_collection_item(&mut self, section: Section, index: usize) -> Result<bool, EditorError> {
        self.ensure_live()?;
        let removed = fields::remove_collection_item(&mut self.resume, section, index);
        if removed {
            debug!(
                "Session {}: removed {section}[{index}], {} left",
                self.resume.id,
                fields::section_len(&self.resume, section)
            );
            self.touch();
        }
        Ok(removed)
    }

    fn ensure_live(&self) -> Result<(), EditorError> {
        if self.state == SessionState::Deleted {
            return Err(EditorError::SessionEnded);
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
        if self.state == SessionState::Clean {
            self.state = SessionState::Dirty;
        }
        self.preview.push(self.revision, &self.resume);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Save
    // ────────────────────────────────────────────────────────────────────────

    /// Validates the draft and enters `Saving`. A validation failure leaves the
    /// state and draft untouched.
    pub fn begin_save(&mut self) -> Result<PendingSave, EditorError> {
        match self.state {
            SessionState::Deleted => return Err(EditorError::SessionEnded),
            SessionState::Saving => return Err(EditorError::Busy("save")),
            SessionState::Clean | SessionState::Dirty => {}
        }
        if self.deleting {
            return Err(EditorError::Busy("delete"));
        }

        let snapshot = validate_resume(&serde_json::to_value(&self.resume)?)?;
        self.state = SessionState::Saving;
        Ok(PendingSave {
            revision: self.revision,
            snapshot,
            store: self.store.clone(),
        })
    }

    pub fn finish_save(&mut self, outcome: SaveOutcome) -> Result<(), EditorError> {
        match outcome.result {
            Ok(()) => {
                self.saved_revision = outcome.revision;
                self.state = if self.revision == outcome.revision {
                    SessionState::Clean
                } else {
                    SessionState::Dirty
                };
                info!(
                    "Session {}: saved revision {}",
                    self.resume.id, outcome.revision
                );
                Ok(())
            }
            Err(e) => {
                self.state = if self.is_dirty() {
                    SessionState::Dirty
                } else {
                    SessionState::Clean
                };
                warn!("Session {}: save failed: {e}", self.resume.id);
                Err(EditorError::Store(e))
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Delete
    // ────────────────────────────────────────────────────────────────────────

    pub fn begin_delete(&mut self, confirmed: bool) -> Result<DeleteStep, EditorError> {
        match self.state {
            SessionState::Deleted => return Err(EditorError::SessionEnded),
            SessionState::Saving => return Err(EditorError::InvalidState(SessionState::Saving)),
            SessionState::Clean | SessionState::Dirty => {}
        }
        if self.deleting {
            return Err(EditorError::Busy("delete"));
        }
        if !confirmed {
            return Ok(DeleteStep::ConfirmationRequired {
                prompt: self.delete_prompt(),
            });
        }

        self.deleting = true;
        Ok(DeleteStep::Pending(PendingDelete {
            id: self.resume.id,
            store: self.store.clone(),
        }))
    }

    pub fn finish_delete(&mut self, result: Result<(), StoreError>) -> Result<DeleteOutcome, EditorError> {
        self.deleting = false;
        match result {
            Ok(()) => {
                self.state = SessionState::Deleted;
                info!("Session {}: resume deleted", self.resume.id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!("Session {}: delete failed: {e}", self.resume.id);
                Err(EditorError::Store(e))
            }
        }
    }

    fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone.",
            self.resume.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::preview::tests::CountingRenderer;
    use crate::models::resume::fixtures::blank_resume;
    use crate::render::TextPreviewRenderer;
    use crate::store::testing::{FailingStore, MemoryStore};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    async fn save(editor: &mut EditorController) -> Result<(), EditorError> {
        let pending = editor.begin_save()?;
        let outcome = pending.execute().await;
        editor.finish_save(outcome)
    }

    async fn delete(editor: &mut EditorController, confirmed: bool) -> Result<DeleteOutcome, EditorError> {
        match editor.begin_delete(confirmed)? {
            DeleteStep::ConfirmationRequired { prompt } => {
                Ok(DeleteOutcome::ConfirmationRequired { prompt })
            }
            DeleteStep::Pending(pending) => {
                let result = pending.execute().await;
                editor.finish_delete(result)
            }
        }
    }

    fn open_with(store: Arc<dyn ResumeStore>, resume: Resume) -> EditorController {
        EditorController::open(
            resume,
            store,
            Arc::new(TextPreviewRenderer),
            PreviewConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_opens_clean() {
        let resume = blank_resume();
        let editor = open_with(Arc::new(MemoryStore::with(&resume)), resume);
        assert_eq!(editor.state(), SessionState::Clean);
        assert!(!editor.is_dirty());
        assert!(!editor.is_saving());
    }

    #[tokio::test]
    async fn test_update_field_reads_back_and_spares_siblings() {
        let resume = blank_resume();
        let mut editor = open_with(Arc::new(MemoryStore::with(&resume)), resume.clone());

        editor
            .update_field(ResumeField::FirstName, json!("Grace"))
            .unwrap();

        assert_eq!(editor.resume().first_name, "Grace");
        let mut expected = resume;
        expected.first_name = "Grace".to_string();
        assert_eq!(editor.resume(), &expected);
        assert_eq!(editor.state(), SessionState::Dirty);
    }

    #[tokio::test]
    async fn test_update_field_is_idempotent() {
        let resume = blank_resume();
        let mut once = open_with(Arc::new(MemoryStore::with(&resume)), resume.clone());
        let mut twice = open_with(Arc::new(MemoryStore::with(&resume)), resume);

        once.update_field(ResumeField::Location, json!("Berlin")).unwrap();
        twice.update_field(ResumeField::Location, json!("Berlin")).unwrap();
        twice.update_field(ResumeField::Location, json!("Berlin")).unwrap();

        assert_eq!(once.resume(), twice.resume());
        assert_eq!(once.state(), twice.state());
    }

    #[tokio::test]
    async fn test_collection_scenario() {
        let resume = blank_resume();
        let mut editor = open_with(Arc::new(MemoryStore::with(&resume)), resume);

        let index = editor.add_collection_item(Section::WorkExperience).unwrap();
        assert_eq!(editor.resume().work_experience.len(), 1);
        assert_eq!(editor.resume().work_experience[0].company, "");

        editor
            .update_collection_item(Section::WorkExperience, index, "company", json!("Acme"))
            .unwrap();
        assert_eq!(editor.resume().work_experience[0].company, "Acme");
        assert_eq!(editor.resume().work_experience.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_update_is_error_without_side_effects() {
        let resume = blank_resume();
        let mut editor = open_with(Arc::new(MemoryStore::with(&resume)), resume);
        let err = editor
            .update_collection_item(Section::Skills, 0, "category", json!("Tools"))
            .unwrap_err();
        assert!(matches!(err, EditorError::IndexOutOfRange { .. }));
        assert_eq!(editor.state(), SessionState::Clean);
        assert_eq!(editor.revision(), 0);
    }

    #[tokio::test]
    async fn test_remove_missing_index_is_noop() {
        let resume = blank_resume();
        let mut editor = open_with(Arc::new(MemoryStore::with(&resume)), resume);
        assert!(!editor.remove_collection_item(Section::Projects, 4).unwrap());
        assert_eq!(editor.state(), SessionState::Clean);
    }

    #[tokio::test]
    async fn test_save_persists_and_returns_to_clean() {
        let resume = blank_resume();
        let store = Arc::new(MemoryStore::with(&resume));
        let mut editor = open_with(store.clone(), resume.clone());

        editor
            .update_field(ResumeField::Website, json!("https://ada.dev"))
            .unwrap();
        save(&mut editor).await.unwrap();

        assert_eq!(editor.state(), SessionState::Clean);
        assert!(!editor.is_dirty());
        assert_eq!(
            store.get(resume.id).unwrap().website.as_deref(),
            Some("https://ada.dev")
        );
    }

    #[tokio::test]
    async fn test_save_normalizes_blank_optional_urls() {
        let resume = blank_resume();
        let store = Arc::new(MemoryStore::with(&resume));
        let mut editor = open_with(store.clone(), resume.clone());

        editor.update_field(ResumeField::GithubUrl, json!("")).unwrap();
        save(&mut editor).await.unwrap();

        assert_eq!(editor.resume().github_url.as_deref(), Some(""));
        assert!(store.get(resume.id).unwrap().github_url.is_none());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_value_and_returns_to_dirty() {
        let store = Arc::new(FailingStore::default());
        let mut editor = open_with(store.clone(), blank_resume());
        editor.update_field(ResumeField::Location, json!("Lisbon")).unwrap();
        let before = editor.resume().clone();

        let err = save(&mut editor).await.unwrap_err();

        assert!(matches!(err, EditorError::Store(_)));
        assert_eq!(editor.resume(), &before);
        assert_eq!(editor.state(), SessionState::Dirty);
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_save_of_clean_draft_stays_clean() {
        let store = Arc::new(FailingStore::default());
        let mut editor = open_with(store.clone(), blank_resume());

        assert!(save(&mut editor).await.is_err());

        assert_eq!(editor.state(), SessionState::Clean);
        assert!(!editor.is_dirty());
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_sent_to_store() {
        let resume = blank_resume();
        let store = Arc::new(MemoryStore::with(&resume));
        let mut editor = open_with(store.clone(), resume);
        editor.update_field(ResumeField::Website, json!("not-a-url")).unwrap();

        let err = save(&mut editor).await.unwrap_err();

        match err {
            EditorError::Validation(errors) => assert!(errors.has_path("website")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(editor.state(), SessionState::Dirty);
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_edits_during_save_leave_session_dirty() {
        let resume = blank_resume();
        let store = Arc::new(MemoryStore::with(&resume));
        let mut editor = open_with(store.clone(), resume.clone());
        editor.update_field(ResumeField::Location, json!("Paris")).unwrap();

        let pending = editor.begin_save().unwrap();
        assert!(editor.is_saving());
        assert!(matches!(editor.begin_save(), Err(EditorError::Busy("save"))));
        editor.update_field(ResumeField::Location, json!("Oslo")).unwrap();
        assert_eq!(editor.state(), SessionState::Saving);

        let outcome = pending.execute().await;
        editor.finish_save(outcome).unwrap();

        assert_eq!(editor.state(), SessionState::Dirty);
        assert!(editor.is_dirty());
        assert_eq!(store.get(resume.id).unwrap().location.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let resume = blank_resume();
        let store = Arc::new(MemoryStore::with(&resume));
        let mut editor = open_with(store.clone(), resume.clone());

        let outcome = delete(&mut editor, false).await.unwrap();

        match outcome {
            DeleteOutcome::ConfirmationRequired { prompt } => {
                assert!(prompt.contains("Acme Backend Application"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert!(store.get(resume.id).is_some());
        assert_eq!(editor.state(), SessionState::Clean);
    }

    #[tokio::test]
    async fn test_confirmed_delete_ends_session() {
        let resume = blank_resume();
        let store = Arc::new(MemoryStore::with(&resume));
        let mut editor = open_with(store.clone(), resume.clone());

        assert_eq!(delete(&mut editor, true).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(editor.state(), SessionState::Deleted);
        assert!(store.get(resume.id).is_none());

        assert!(matches!(
            editor.update_field(ResumeField::Name, json!("x")),
            Err(EditorError::SessionEnded)
        ));
        assert!(matches!(save(&mut editor).await, Err(EditorError::SessionEnded)));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_prior_state() {
        let mut editor = open_with(Arc::new(FailingStore::default()), blank_resume());
        editor.update_field(ResumeField::Name, json!("Draft")).unwrap();
        let before = editor.resume().clone();

        assert!(delete(&mut editor, true).await.is_err());

        assert_eq!(editor.state(), SessionState::Dirty);
        assert_eq!(editor.resume(), &before);
        assert!(!editor.is_deleting());
    }

    #[tokio::test]
    async fn test_delete_rejected_while_saving() {
        let resume = blank_resume();
        let mut editor = open_with(Arc::new(MemoryStore::with(&resume)), resume);
        let _pending = editor.begin_save().unwrap();
        assert!(matches!(
            editor.begin_delete(true),
            Err(EditorError::InvalidState(SessionState::Saving))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_produce_one_preview() {
        let resume = blank_resume();
        let renderer = Arc::new(CountingRenderer::default());
        let mut editor = EditorController::open(
            resume.clone(),
            Arc::new(MemoryStore::with(&resume)),
            renderer.clone(),
            PreviewConfig::default(),
        );
        let preview = editor.preview_value();

        for city in ["L", "Li", "Lis", "Lisbon"] {
            editor.update_field(ResumeField::Location, json!(city)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(350)).await;

        // One render at open, one for the whole burst.
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(preview.borrow().location.as_deref(), Some("Lisbon"));
        assert_eq!(editor.latest_preview().revision, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_preview() {
        let resume = blank_resume();
        let renderer = Arc::new(CountingRenderer::default());
        let mut editor = EditorController::open(
            resume.clone(),
            Arc::new(MemoryStore::with(&resume)),
            renderer.clone(),
            PreviewConfig::default(),
        );
        editor.update_field(ResumeField::Location, json!("Rome")).unwrap();
        drop(editor);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }
}
