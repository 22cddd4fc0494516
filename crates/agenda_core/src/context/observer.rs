//! Commit observability hook.

use super::ContextError;
use log::{info, warn};

/// What the next commit is about to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub inserts: usize,
    pub updates: usize,
}

impl PendingChanges {
    pub fn total(&self) -> usize {
        self.inserts + self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Receives one `on_commit_start` before every `save_changes` attempt and
/// one `on_commit_finish` with its outcome.
pub trait CommitObserver {
    fn on_commit_start(&self, pending: &PendingChanges);
    fn on_commit_finish(&self, pending: &PendingChanges, outcome: Result<usize, &ContextError>);
}

/// Default observer writing `event=save_changes` lines to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCommitObserver;

impl CommitObserver for LogCommitObserver {
    fn on_commit_start(&self, pending: &PendingChanges) {
        info!(
            "event=save_changes module=context status=start inserts={} updates={}",
            pending.inserts, pending.updates
        );
    }

    fn on_commit_finish(&self, pending: &PendingChanges, outcome: Result<usize, &ContextError>) {
        match outcome {
            Ok(rows) => info!(
                "event=save_changes module=context status=ok inserts={} updates={} rows={rows}",
                pending.inserts, pending.updates
            ),
            Err(err) => warn!(
                "event=save_changes module=context status=error inserts={} updates={} error_code={} error={err}",
                pending.inserts,
                pending.updates,
                err.code()
            ),
        }
    }
}
