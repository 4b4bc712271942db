//! Retry and backoff policies for the shard processor
//!
//! The `Backoff` strategies govern the wait between per-record retry
//! attempts. `CheckpointRetryPolicy` is different in kind: it is a
//! capability the core configures but does not own - the coordinator's
//! checkpointer applies it when committing, so retry logic is never
//! implemented twice.

mod backoff;

pub use backoff::{Backoff, ExponentialBackoff, ExponentialBackoffBuilder, FixedBackoff};

use std::time::Duration;

/// Retry policy passed through to the coordinator's checkpointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointRetryPolicy {
    /// Maximum number of commit attempts
    pub max_attempts: u32,
    /// Fixed delay between commit attempts
    pub delay: Duration,
}

impl Default for CheckpointRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(3),
        }
    }
}
