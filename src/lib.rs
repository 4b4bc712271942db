//! Shardline - a per-shard stream record processor
//!
//! This crate provides the record-processing core that sits behind a
//! shard-distribution runtime: bounded per-record retry, periodic
//! checkpoint scheduling, and the shard lifecycle state machine. Lease
//! management, record delivery and durable checkpoint storage belong to
//! the external coordinator and are consumed through traits.

pub mod checkpoint;
pub mod codec;
pub mod error;
pub mod monitoring;
pub mod processor;
pub mod record;
pub mod retry;

// Make test utilities available for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test;

pub use error::{ProcessingError, ProcessorError, Result};
pub use processor::{ProcessorConfig, ShardProcessor, ShardState};
pub use retry::{Backoff, CheckpointRetryPolicy, ExponentialBackoff, FixedBackoff};

// Re-export main traits
pub use crate::checkpoint::Checkpointer;
pub use crate::codec::RecordCodec;
pub use crate::processor::RecordHandler;
pub use crate::record::Record;

// Re-export stock codec implementations
pub use crate::codec::{BytesCodec, JsonCodec};
