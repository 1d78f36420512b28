//! Turns fetch outcomes into the loading / error / ready tri-state the list renders from.

pub mod snapshot_poller;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::server_record::{ServerListSnapshot, ServerRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Failed to read server snapshot: {0}")]
    Read(String),
    #[error("Failed to parse server snapshot: {0}")]
    Parse(String),
}

pub type FetchOutcome = Result<ServerListSnapshot, FetchError>;

/// One fetch attempt, numbered in the order attempts were started.
#[derive(Debug)]
pub struct Refresh {
    pub sequence: u64,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceState {
    /// No data and no error yet.
    Loading,
    /// The latest attempt failed; any earlier data is unusable.
    Failed(FetchError),
    Ready {
        servers: Vec<ServerRecord>,
        updated_at: DateTime<Utc>,
    },
}

/// Applies refreshes in start order and drops any that were overtaken.
#[derive(Debug)]
pub struct RefreshTracker {
    state: DataSourceState,
    last_applied: Option<u64>,
}

impl Default for RefreshTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self {
            state: DataSourceState::Loading,
            last_applied: None,
        }
    }

    pub fn state(&self) -> &DataSourceState {
        &self.state
    }

    /// Returns `false` when the refresh is older than one already applied.
    pub fn apply(&mut self, refresh: Refresh) -> bool {
        if self
            .last_applied
            .is_some_and(|last| refresh.sequence <= last)
        {
            debug!(
                sequence = refresh.sequence,
                last_applied = ?self.last_applied,
                "Discarding superseded refresh."
            );
            return false;
        }
        self.last_applied = Some(refresh.sequence);

        self.state = match refresh.outcome {
            Ok(snapshot) => match snapshot.into_records() {
                Some(servers) => {
                    debug!(sequence = refresh.sequence, servers = servers.len(), "Applied refresh.");
                    DataSourceState::Ready {
                        servers,
                        updated_at: Utc::now(),
                    }
                }
                None => {
                    info!(sequence = refresh.sequence, "Snapshot carried no result yet.");
                    DataSourceState::Loading
                }
            },
            Err(e) => {
                warn!(sequence = refresh.sequence, error = %e, "Refresh failed.");
                DataSourceState::Failed(e)
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(json: &str) -> FetchOutcome {
        Ok(serde_json::from_str(json).unwrap())
    }

    fn ready_ids(tracker: &RefreshTracker) -> Vec<u64> {
        match tracker.state() {
            DataSourceState::Ready { servers, .. } => servers.iter().map(|s| s.id).collect(),
            other => panic!("expected ready state, got {other:?}"),
        }
    }

    #[test]
    fn test_starts_loading() {
        let tracker = RefreshTracker::new();
        assert_eq!(tracker.state(), &DataSourceState::Loading);
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let mut tracker = RefreshTracker::new();
        assert!(tracker.apply(Refresh {
            sequence: 2,
            outcome: snapshot(r#"{"result":[{"id":2}]}"#),
        }));
        assert!(!tracker.apply(Refresh {
            sequence: 1,
            outcome: snapshot(r#"{"result":[{"id":1}]}"#),
        }));
        assert_eq!(ready_ids(&tracker), vec![2]);
        // an equal sequence is not newer either
        assert!(!tracker.apply(Refresh {
            sequence: 2,
            outcome: Err(FetchError::Read("late duplicate".into())),
        }));
        assert_eq!(ready_ids(&tracker), vec![2]);
    }

    #[test]
    fn test_error_replaces_data() {
        let mut tracker = RefreshTracker::new();
        tracker.apply(Refresh {
            sequence: 1,
            outcome: snapshot(r#"{"result":[{"id":1}]}"#),
        });
        tracker.apply(Refresh {
            sequence: 2,
            outcome: Err(FetchError::Read("connection refused".into())),
        });
        assert_eq!(
            tracker.state(),
            &DataSourceState::Failed(FetchError::Read("connection refused".into()))
        );

        tracker.apply(Refresh {
            sequence: 3,
            outcome: snapshot(r#"{"result":[{"id":5}]}"#),
        });
        assert_eq!(ready_ids(&tracker), vec![5]);
    }

    #[test]
    fn test_missing_result_is_loading() {
        let mut tracker = RefreshTracker::new();
        tracker.apply(Refresh {
            sequence: 1,
            outcome: snapshot("{}"),
        });
        assert_eq!(tracker.state(), &DataSourceState::Loading);
    }
}
