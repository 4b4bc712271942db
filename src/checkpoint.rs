//! Checkpointer seam and the interval-based checkpoint scheduler

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::retry::CheckpointRetryPolicy;

/// Trait for the coordinator-owned checkpoint handle
///
/// The coordinator supplies one handle per shard; committing durably
/// records "processed up to here" so a restart or hand-off resumes past
/// committed records. The core never inspects the handle, it only asks it
/// to commit.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Commit at the default position (latest processed, or end-of-shard
    /// when the shard has been fully consumed)
    async fn checkpoint(&self) -> anyhow::Result<()>;

    /// Commit with the coordinator applying the given retry policy on
    /// failure
    async fn checkpoint_with_retry(
        &self,
        policy: &CheckpointRetryPolicy,
    ) -> anyhow::Result<()>;
}

/// Decides when a periodic checkpoint is due, decoupling checkpoint
/// frequency from record-arrival rate.
///
/// The schedule advances after every commit attempt, success or failure;
/// commit reliability is owned by the coordinator's retry policy.
/// `next_due` is monotonically non-decreasing.
#[derive(Debug)]
pub struct CheckpointScheduler {
    interval: Duration,
    next_due: Instant,
}

impl CheckpointScheduler {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    /// Create a scheduler that is immediately due
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: Instant::now(),
        }
    }

    /// Re-arm the schedule so the next delivered batch checkpoints at once
    pub fn reset(&mut self, now: Instant) {
        self.next_due = now;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Commit through the checkpointer if the interval has elapsed
    ///
    /// Returns `None` when nothing was due, otherwise the commit outcome.
    /// The outcome is reported for observability only; the schedule has
    /// already advanced by the time it is returned.
    pub async fn maybe_checkpoint(
        &mut self,
        now: Instant,
        shard_id: &str,
        checkpointer: &dyn Checkpointer,
        policy: &CheckpointRetryPolicy,
    ) -> Option<anyhow::Result<()>> {
        if !self.is_due(now) {
            return None;
        }

        info!(shard_id = %shard_id, "Checkpointing shard");

        let outcome = checkpointer.checkpoint_with_retry(policy).await;
        match &outcome {
            Ok(_) => {
                debug!(shard_id = %shard_id, "Checkpoint committed");
            }
            Err(e) => {
                warn!(
                    shard_id = %shard_id,
                    error = %e,
                    "Checkpoint commit failed; continuing to process"
                );
            }
        }

        self.next_due = now + self.interval;
        Some(outcome)
    }
}

impl Default for CheckpointScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
