use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::data_source::{FetchError, FetchOutcome, Refresh};

/// Reads allowed to overlap before ticks start being skipped.
const MAX_FETCHES_IN_FLIGHT: usize = 4;

/// Polls a JSON snapshot file and reports every attempt as a numbered [`Refresh`].
///
/// Each attempt runs in its own task, so a slow read can finish after a newer
/// one; consumers order them through [`crate::data_source::RefreshTracker`].
/// At most [`MAX_FETCHES_IN_FLIGHT`] reads are pending at any time.
#[derive(Debug, Clone)]
pub struct SnapshotPoller {
    path: Arc<PathBuf>,
    interval: Duration,
    next_sequence: Arc<AtomicU64>,
    in_flight: Arc<Semaphore>,
}

impl SnapshotPoller {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: Arc::new(path.into()),
            interval,
            next_sequence: Arc::new(AtomicU64::new(1)),
            in_flight: Arc::new(Semaphore::new(MAX_FETCHES_IN_FLIGHT)),
        }
    }

    pub async fn fetch(path: &Path) -> FetchOutcome {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchError::Read(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Starts polling. Sending on the returned trigger requests an immediate
    /// extra fetch. The loop ends once the result receiver is dropped.
    pub fn spawn(self, results: mpsc::Sender<Refresh>) -> (JoinHandle<()>, mpsc::Sender<()>) {
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(8);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            let mut triggers_open = true;
            info!(
                path = %self.path.display(),
                interval_ms = self.interval.as_millis() as u64,
                "Snapshot poller started."
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    trigger = trigger_rx.recv(), if triggers_open => {
                        if trigger.is_none() {
                            triggers_open = false;
                            continue;
                        }
                        debug!("Manual refresh requested.");
                    }
                }

                if results.is_closed() {
                    debug!("Refresh receiver dropped, stopping poller.");
                    break;
                }
                self.spawn_fetch(results.clone());
            }
        });
        (handle, trigger_tx)
    }

    fn spawn_fetch(&self, results: mpsc::Sender<Refresh>) {
        let Ok(permit) = Arc::clone(&self.in_flight).try_acquire_owned() else {
            warn!(
                max_in_flight = MAX_FETCHES_IN_FLIGHT,
                "Previous snapshot reads still pending, skipping this one."
            );
            return;
        };
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let path = Arc::clone(&self.path);
        tokio::spawn(async move {
            let outcome = Self::fetch(&path).await;
            if let Err(e) = &outcome {
                warn!(sequence, error = %e, "Snapshot fetch failed.");
            }
            if results.send(Refresh { sequence, outcome }).await.is_err() {
                debug!(sequence, "Refresh receiver dropped before delivery.");
            }
            drop(permit);
        });
    }
}
