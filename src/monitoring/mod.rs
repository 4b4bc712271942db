//! Optional monitoring events emitted by the shard processor
//!
//! When enabled, the processor sends a `ProcessingEvent` over a bounded
//! channel for every record attempt, terminal skip, batch completion,
//! checkpoint attempt and lifecycle transition. Structured log lines are
//! always emitted regardless of this setting.

mod types;

pub use types::{
    CheckpointKind, LifecycleEventType, MonitoringConfig, ProcessingEvent, ProcessingEventType,
};
