use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::editor::controller::DeleteStep;
use crate::editor::{DeleteOutcome, EditorController, EditorError};

pub type SessionHandle = Arc<Mutex<EditorController>>;

struct Session {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Live editing sessions keyed by session id. Each controller sits behind its
/// own lock; sessions share nothing with each other.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, controller: EditorController) -> (Uuid, SessionHandle) {
        let session_id = Uuid::new_v4();
        let resume_id = controller.id();
        let handle = Arc::new(Mutex::new(controller));
        let open = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                session_id,
                Session {
                    handle: handle.clone(),
                    last_seen: Instant::now(),
                },
            );
            sessions.len()
        };
        info!("Opened editing session {session_id} for resume {resume_id} ({open} open)");
        (session_id, handle)
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, session_id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&session_id)?;
        session.last_seen = Instant::now();
        Some(session.handle.clone())
    }

    /// Ends a session. The controller (and its preview timer) is dropped once
    /// the last in-flight request holding it finishes.
    pub async fn close(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            info!("Closed editing session {session_id}");
        }
        removed
    }

    /// Closes every session untouched for longer than `idle_ttl`. Unsaved
    /// edits in those sessions are discarded.
    pub async fn sweep_idle(&self, idle_ttl: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, s)| now.duration_since(s.last_seen) > idle_ttl)
            .map(|(id, _)| *id)
            .collect();

        let mut closed = 0;
        for session_id in expired {
            if self.close(session_id).await {
                closed += 1;
            }
        }
        if closed > 0 {
            warn!("Closed {closed} editing sessions idle for more than {}s", idle_ttl.as_secs());
        }
        closed
    }

    /// Runs `sweep_idle` every `every` until the returned task is aborted.
    pub fn spawn_sweeper(&self, idle_ttl: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.sweep_idle(idle_ttl).await;
            }
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Save / delete over a shared session
// ────────────────────────────────────────────────────────────────────────────
//
// The store call and the `finish_*` step run on their own task. A caller that
// is dropped mid-flight (client disconnect) cannot leave the session stuck in
// `Saving` or with the delete flag raised.

/// Validates and persists the draft with the session lock released during I/O.
/// A second save while this one is in flight gets `Busy("save")`.
pub async fn save(handle: &SessionHandle) -> Result<(), EditorError> {
    let pending = handle.lock().await.begin_save()?;
    let handle = handle.clone();
    let completion = tokio::spawn(async move {
        let outcome = pending.execute().await;
        handle.lock().await.finish_save(outcome)
    });
    completion
        .await
        .unwrap_or_else(|e| Err(EditorError::Interrupted(e.to_string())))
}

/// Deletes the record once `confirmed`; otherwise returns the prompt to show.
pub async fn delete(handle: &SessionHandle, confirmed: bool) -> Result<DeleteOutcome, EditorError> {
    let pending = match handle.lock().await.begin_delete(confirmed)? {
        DeleteStep::ConfirmationRequired { prompt } => {
            return Ok(DeleteOutcome::ConfirmationRequired { prompt })
        }
        DeleteStep::Pending(pending) => pending,
    };
    let handle = handle.clone();
    let completion = tokio::spawn(async move {
        let result = pending.execute().await;
        handle.lock().await.finish_delete(result)
    });
    completion
        .await
        .unwrap_or_else(|e| Err(EditorError::Interrupted(e.to_string())))
}
