//! Error types for the shard processor

use thiserror::Error;

use crate::processor::ShardState;

/// Main error type for processor operations
///
/// The only fatal condition in the core is a lifecycle event delivered out
/// of the allowed order. Per-record failures never surface here; they are
/// contained by the retry loop.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("{event} delivered while shard is in the {state} state")]
    LifecycleViolation {
        state: ShardState,
        event: &'static str,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Per-record failure taxonomy
///
/// Both variants are retryable under the same bound; the distinction only
/// affects what gets logged.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("decode failure (retriable): {0}")]
    Decode(#[source] anyhow::Error),

    #[error("handler failure (retriable): {0}")]
    Application(#[source] anyhow::Error),
}

impl ProcessingError {
    pub fn decode(err: impl Into<anyhow::Error>) -> Self {
        ProcessingError::Decode(err.into())
    }

    pub fn application(err: impl Into<anyhow::Error>) -> Self {
        ProcessingError::Application(err.into())
    }
}
