use std::time::{Duration, SystemTime};

/// Configuration for the monitoring channel
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Whether monitoring events are emitted
    pub enabled: bool,
    /// Size of the monitoring channel buffer
    pub channel_size: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel_size: 1000,
        }
    }
}

/// A monitoring event from the shard processor
#[derive(Debug, Clone)]
pub struct ProcessingEvent {
    /// When the event occurred
    pub timestamp: SystemTime,
    /// ID of the shard this event relates to
    pub shard_id: String,
    /// The type of event and its details
    pub event_type: ProcessingEventType,
}

/// The different types of events that can occur during processing
#[derive(Debug, Clone)]
pub enum ProcessingEventType {
    /// One decode-and-handle attempt for a record
    RecordAttempt {
        sequence_number: String,
        success: bool,
        attempt: u32,
        error: Option<String>,
        is_final_attempt: bool,
    },
    /// A record exhausted its retry bound and was skipped
    RecordSkipped {
        partition_key: String,
        sequence_number: String,
        attempts: u32,
    },
    /// A delivered batch finished processing
    BatchComplete {
        processed: usize,
        skipped: usize,
        duration: Duration,
    },
    /// A checkpoint commit was attempted
    Checkpoint {
        kind: CheckpointKind,
        success: bool,
        error: Option<String>,
    },
    /// The shard lifecycle state machine transitioned
    Lifecycle { event: LifecycleEventType },
}

/// Why a checkpoint commit was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    /// The periodic interval elapsed
    Scheduled,
    /// Final checkpoint after the shard's last record
    ShardEnd,
    /// Checkpoint on requested shutdown
    Shutdown,
}

/// Lifecycle transitions observable from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEventType {
    Initialized,
    LeaseLost,
    ShardEnded,
    ShutdownRequested,
}

impl ProcessingEvent {
    pub fn record_attempt(
        shard_id: String,
        sequence_number: String,
        success: bool,
        attempt: u32,
        error: Option<String>,
        is_final_attempt: bool,
    ) -> Self {
        Self {
            timestamp: SystemTime::now(),
            shard_id,
            event_type: ProcessingEventType::RecordAttempt {
                sequence_number,
                success,
                attempt,
                error,
                is_final_attempt,
            },
        }
    }

    pub fn record_skipped(
        shard_id: String,
        partition_key: String,
        sequence_number: String,
        attempts: u32,
    ) -> Self {
        Self {
            timestamp: SystemTime::now(),
            shard_id,
            event_type: ProcessingEventType::RecordSkipped {
                partition_key,
                sequence_number,
                attempts,
            },
        }
    }

    pub fn batch_complete(
        shard_id: String,
        processed: usize,
        skipped: usize,
        duration: Duration,
    ) -> Self {
        Self {
            timestamp: SystemTime::now(),
            shard_id,
            event_type: ProcessingEventType::BatchComplete {
                processed,
                skipped,
                duration,
            },
        }
    }

    pub fn checkpoint(
        shard_id: String,
        kind: CheckpointKind,
        success: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            timestamp: SystemTime::now(),
            shard_id,
            event_type: ProcessingEventType::Checkpoint {
                kind,
                success,
                error,
            },
        }
    }

    pub fn lifecycle(shard_id: String, event: LifecycleEventType) -> Self {
        Self {
            timestamp: SystemTime::now(),
            shard_id,
            event_type: ProcessingEventType::Lifecycle { event },
        }
    }
}
