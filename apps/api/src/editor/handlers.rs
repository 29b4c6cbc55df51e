use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::editor::sessions::{self, SessionHandle};
use crate::editor::{DeleteOutcome, EditorController, ResumeField, SessionState};
use crate::errors::AppError;
use crate::import::{apply_import, ImportProposal, ImportReport};
use crate::models::resume::{Resume, Section};
use crate::render::PreviewFrame;
use crate::schema::validate_resume;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OpenSessionRequest {
    pub resume_id: Uuid,
}

/// What a client needs to redraw the editor after any operation.
#[derive(Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub resume: Resume,
    pub state: SessionState,
    pub revision: u64,
    pub is_dirty: bool,
    pub is_saving: bool,
    pub is_deleting: bool,
    pub title: String,
    pub kind: &'static str,
}

impl SessionView {
    fn of(session_id: Uuid, editor: &EditorController) -> Self {
        Self {
            session_id,
            resume: editor.resume().clone(),
            state: editor.state(),
            revision: editor.revision(),
            is_dirty: editor.is_dirty(),
            is_saving: editor.is_saving(),
            is_deleting: editor.is_deleting(),
            title: editor.title(),
            kind: editor.kind_label(),
        }
    }
}

#[derive(Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Value,
}

#[derive(Serialize)]
pub struct ItemAdded {
    pub index: usize,
    pub session: SessionView,
}

#[derive(Serialize)]
pub struct ItemRemoved {
    pub removed: bool,
    pub session: SessionView,
}

#[derive(Serialize)]
pub struct PreviewView {
    pub frame: PreviewFrame,
    /// Debounced draft; lags the live draft by at most one quiet period.
    pub resume: Resume,
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Deserialize)]
pub struct ImportRequest {
    pub text: String,
    /// Apply the proposal to the draft instead of only returning it.
    #[serde(default)]
    pub apply: bool,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub proposal: ImportProposal,
    /// The draft as it would look (or now looks, when applied) with the proposal merged in.
    pub merged: Resume,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ImportReport>,
}

async fn session(state: &AppState, session_id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}

fn parse_section(raw: &str) -> Result<Section, AppError> {
    raw.parse::<Section>().map_err(AppError::Validation)
}

// ────────────────────────────────────────────────────────────────────────────
// Schema
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/validate
/// Returns the canonical résumé (blank optionals removed) or every violation.
pub async fn handle_validate(Json(body): Json<Value>) -> Result<Json<Resume>, AppError> {
    Ok(Json(validate_resume(&body)?))
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let resume = state
        .store
        .fetch(req.resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", req.resume_id)))?;

    let controller = EditorController::open(
        resume,
        state.store.clone(),
        state.renderer.clone(),
        state.config.preview_config(),
    );
    let (session_id, handle) = state.sessions.insert(controller).await;
    let editor = handle.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::of(session_id, &editor))))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session(&state, id).await?;
    let editor = handle.lock().await;
    Ok(Json(SessionView::of(id, &editor)))
}

/// DELETE /api/v1/sessions/:id
/// Ends the session without saving. Unsaved edits are discarded.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.close(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Edits
// ────────────────────────────────────────────────────────────────────────────

/// PATCH /api/v1/sessions/:id/fields
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let field: ResumeField = req.field.parse()?;
    let handle = session(&state, id).await?;
    let mut editor = handle.lock().await;
    editor.update_field(field, req.value)?;
    Ok(Json(SessionView::of(id, &editor)))
}

/// POST /api/v1/sessions/:id/sections/:section
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, String)>,
) -> Result<(StatusCode, Json<ItemAdded>), AppError> {
    let section = parse_section(&section)?;
    let handle = session(&state, id).await?;
    let mut editor = handle.lock().await;
    let index = editor.add_collection_item(section)?;
    Ok((
        StatusCode::CREATED,
        Json(ItemAdded {
            index,
            session: SessionView::of(id, &editor),
        }),
    ))
}

/// PATCH /api/v1/sessions/:id/sections/:section/:index
pub async fn handle_update_item(
    State(state): State<AppState>,
    Path((id, section, index)): Path<(Uuid, String, usize)>,
    Json(req): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let section = parse_section(&section)?;
    let handle = session(&state, id).await?;
    let mut editor = handle.lock().await;
    editor.update_collection_item(section, index, &req.field, req.value)?;
    Ok(Json(SessionView::of(id, &editor)))
}

/// DELETE /api/v1/sessions/:id/sections/:section/:index
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((id, section, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<ItemRemoved>, AppError> {
    let section = parse_section(&section)?;
    let handle = session(&state, id).await?;
    let mut editor = handle.lock().await;
    let removed = editor.remove_collection_item(section, index)?;
    Ok(Json(ItemRemoved {
        removed,
        session: SessionView::of(id, &editor),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Save / delete
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/save
/// The session lock is released while the store call runs; a second save in
/// that window gets 409.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session(&state, id).await?;
    sessions::save(&handle).await?;

    let editor = handle.lock().await;
    Ok(Json(SessionView::of(id, &editor)))
}

/// POST /api/v1/sessions/:id/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let handle = session(&state, id).await?;
    let outcome = sessions::delete(&handle, req.confirm).await?;

    if outcome == DeleteOutcome::Deleted {
        state.sessions.close(id).await;
    }
    Ok(Json(outcome))
}

// ────────────────────────────────────────────────────────────────────────────
// Preview, import, export
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions/:id/preview
/// The latest rendered frame together with the debounced value it was drawn from.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewView>, AppError> {
    let handle = session(&state, id).await?;
    let editor = handle.lock().await;
    let frame = editor.latest_preview().as_ref().clone();
    let resume = editor.preview_value().borrow().as_ref().clone();
    Ok(Json(PreviewView { frame, resume }))
}

/// POST /api/v1/sessions/:id/import
pub async fn handle_import(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let importer = state
        .importer
        .clone()
        .ok_or_else(|| AppError::NotImplemented("AI text import".to_string()))?;
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("Import text is empty".to_string()));
    }

    let handle = session(&state, id).await?;
    let current = handle.lock().await.resume().clone();
    let proposal = importer.propose(&req.text, &current).await?;

    if !req.apply {
        let merged = proposal.merged_into(&current);
        return Ok(Json(ImportResponse {
            proposal,
            merged,
            report: None,
        }));
    }

    let mut editor = handle.lock().await;
    let report = apply_import(&mut editor, &proposal)?;
    Ok(Json(ImportResponse {
        merged: editor.resume().clone(),
        proposal,
        report: Some(report),
    }))
}

/// GET /api/v1/sessions/:id/export
/// Exports the current draft, saved or not.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exporter = state
        .exporter
        .clone()
        .ok_or_else(|| AppError::NotImplemented("PDF export".to_string()))?;

    let handle = session(&state, id).await?;
    let resume = handle.lock().await.resume().clone();
    let file_name = resume.pdf_file_name().replace('"', "");

    let pdf = tokio::task::spawn_blocking(move || exporter.export(&resume))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        pdf,
    ))
}
