//! Debounced preview pipeline.
//!
//! Every mutation pushes a snapshot; a background task waits for a quiet
//! period, then publishes the last snapshot and renders it once. Bursts of
//! edits inside the window collapse into a single render. Dropping the
//! debouncer aborts the task, so nothing fires after the session is torn down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::resume::Resume;
use crate::render::{PreviewFrame, PreviewRenderer};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_LAYOUT_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy)]
pub struct PreviewConfig {
    pub debounce: Duration,
    /// Column width the renderer wraps to.
    pub layout_width: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            layout_width: DEFAULT_LAYOUT_WIDTH,
        }
    }
}

struct Snapshot {
    revision: u64,
    resume: Arc<Resume>,
}

pub struct PreviewDebouncer {
    tx: mpsc::UnboundedSender<Snapshot>,
    snapshot_rx: watch::Receiver<Arc<Resume>>,
    frame_rx: watch::Receiver<Arc<PreviewFrame>>,
    task: JoinHandle<()>,
}

impl PreviewDebouncer {
    /// Starts the debounce task. The initial value is published and rendered
    /// immediately so a freshly opened session has a preview.
    pub fn spawn(renderer: Arc<dyn PreviewRenderer>, config: PreviewConfig, initial: &Resume) -> Self {
        let initial = Arc::new(initial.clone());
        let first_frame = Arc::new(renderer.render(&initial, 0, config.layout_width));

        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (frame_tx, frame_rx) = watch::channel(first_frame);

        let task = tokio::spawn(run(rx, renderer, config, snapshot_tx, frame_tx));

        Self {
            tx,
            snapshot_rx,
            frame_rx,
            task,
        }
    }

    /// Queues a snapshot and restarts the quiet-period timer.
    pub fn push(&self, revision: u64, resume: &Resume) {
        let snapshot = Snapshot {
            revision,
            resume: Arc::new(resume.clone()),
        };
        if self.tx.send(snapshot).is_err() {
            debug!("Preview task already stopped; dropping revision {revision}");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Resume>> {
        self.snapshot_rx.clone()
    }

    pub fn latest_frame(&self) -> Arc<PreviewFrame> {
        self.frame_rx.borrow().clone()
    }
}

impl Drop for PreviewDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Snapshot>,
    renderer: Arc<dyn PreviewRenderer>,
    config: PreviewConfig,
    snapshot_tx: watch::Sender<Arc<Resume>>,
    frame_tx: watch::Sender<Arc<PreviewFrame>>,
) {
    while let Some(mut latest) = rx.recv().await {
        let mut coalesced = 0usize;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(snapshot) => {
                        latest = snapshot;
                        coalesced += 1;
                    }
                    // Sender dropped with the session: discard the pending snapshot.
                    None => return,
                },
                _ = tokio::time::sleep(config.debounce) => break,
            }
        }

        let frame = renderer.render(&latest.resume, latest.revision, config.layout_width);
        snapshot_tx.send_replace(latest.resume);
        frame_tx.send_replace(Arc::new(frame));
        debug!(
            "Rendered preview revision {} ({} edits coalesced)",
            latest.revision, coalesced
        );
    }
}
