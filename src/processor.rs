//! Core shard processor: retrying record processing and the lifecycle
//! state machine
//!
//! One `ShardProcessor` exists per shard per worker lifetime. The
//! coordinator drives it through the lifecycle event methods, in order:
//! `initialize`, zero or more `process_records`, then exactly one of
//! `lease_lost`, `shard_ended` or `shutdown_requested`. Events are
//! delivered serially; the `&mut self` receivers enforce the single
//! thread of control per shard.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::checkpoint::{CheckpointScheduler, Checkpointer};
use crate::codec::RecordCodec;
use crate::error::{ProcessingError, ProcessorError, Result};
use crate::monitoring::{
    CheckpointKind, LifecycleEventType, MonitoringConfig, ProcessingEvent,
};
use crate::record::Record;
use crate::retry::{Backoff, CheckpointRetryPolicy};

/// Trait for implementing application logic on decoded messages
///
/// Any error returned is retryable: the processor retries the record up to
/// the configured bound, sleeping per the backoff policy between attempts.
///
/// # Examples
///
/// ```rust
/// use bytes::Bytes;
/// use shardline::{Record, RecordHandler};
///
/// struct CountBytes;
///
/// #[async_trait::async_trait]
/// impl RecordHandler for CountBytes {
///     type Message = Bytes;
///
///     async fn handle(&self, message: Bytes, record: &Record) -> anyhow::Result<()> {
///         println!("{}: {} bytes", record.sequence_number(), message.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait RecordHandler: Send + Sync {
    /// The decoded message type this handler consumes
    type Message: Send;

    /// Handle one decoded message
    ///
    /// The record is also passed so the handler can reach the partition
    /// key and sequence number without re-threading them through the
    /// message type.
    async fn handle(&self, message: Self::Message, record: &Record) -> anyhow::Result<()>;
}

/// Configuration for the shard processor
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum number of decode-and-handle attempts per record
    pub max_retries: u32,
    /// How often a periodic checkpoint is committed
    pub checkpoint_interval: Duration,
    /// Retry policy forwarded to the coordinator's checkpointer for
    /// periodic commits
    pub checkpoint_retry: CheckpointRetryPolicy,
    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            checkpoint_interval: CheckpointScheduler::DEFAULT_INTERVAL,
            checkpoint_retry: CheckpointRetryPolicy::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

/// Lifecycle state of a shard processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardState {
    /// Created, waiting for `initialize`
    Uninitialized,
    /// Accepting record batches
    Processing,
    /// Lifecycle finished; no further events are accepted
    Terminated,
}

impl fmt::Display for ShardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShardState::Uninitialized => "Uninitialized",
            ShardState::Processing => "Processing",
            ShardState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

/// Per-shard record processor
///
/// Applies codec + handler to each delivered record with bounded retry,
/// schedules periodic checkpoints, and settles into `Terminated` on the
/// coordinator's terminal event.
///
/// # Examples
///
/// ```rust
/// use bytes::Bytes;
/// use std::time::Duration;
/// use shardline::{
///     BytesCodec, Checkpointer, CheckpointRetryPolicy, FixedBackoff,
///     ProcessorConfig, Record, RecordHandler, ShardProcessor,
/// };
///
/// struct CountBytes;
///
/// #[async_trait::async_trait]
/// impl RecordHandler for CountBytes {
///     type Message = Bytes;
///     async fn handle(&self, message: Bytes, _record: &Record) -> anyhow::Result<()> {
///         let _ = message.len();
///         Ok(())
///     }
/// }
///
/// struct NoopCheckpointer;
///
/// #[async_trait::async_trait]
/// impl Checkpointer for NoopCheckpointer {
///     async fn checkpoint(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
///     async fn checkpoint_with_retry(
///         &self,
///         _policy: &CheckpointRetryPolicy,
///     ) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> shardline::Result<()> {
/// let (mut processor, _monitoring_rx) = ShardProcessor::new(
///     ProcessorConfig::default(),
///     BytesCodec::new(),
///     CountBytes,
///     FixedBackoff::new(Duration::from_millis(10)),
/// );
///
/// processor.initialize("shard-0").await?;
/// processor
///     .process_records(&[Record::new(&b"hello"[..], "pk", "seq-1")], &NoopCheckpointer)
///     .await?;
/// processor.shutdown_requested(&NoopCheckpointer).await?;
/// # Ok(())
/// # }
/// ```
pub struct ShardProcessor<C, H, B>
where
    C: RecordCodec,
    H: RecordHandler<Message = C::Message>,
    B: Backoff,
{
    codec: C,
    handler: H,
    backoff: B,
    config: ProcessorConfig,
    state: ShardState,
    shard_id: Option<String>,
    scheduler: CheckpointScheduler,
    monitoring_tx: Option<mpsc::Sender<ProcessingEvent>>,
}

impl<C, H, B> ShardProcessor<C, H, B>
where
    C: RecordCodec,
    H: RecordHandler<Message = C::Message>,
    B: Backoff,
{
    /// Creates a new processor instance
    ///
    /// Returns the processor and, when monitoring is enabled in the
    /// config, the receiving end of the monitoring channel.
    pub fn new(
        config: ProcessorConfig,
        codec: C,
        handler: H,
        backoff: B,
    ) -> (Self, Option<mpsc::Receiver<ProcessingEvent>>) {
        let (monitoring_tx, monitoring_rx) = if config.monitoring.enabled {
            let (tx, rx) = mpsc::channel(config.monitoring.channel_size);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let scheduler = CheckpointScheduler::new(config.checkpoint_interval);

        (
            Self {
                codec,
                handler,
                backoff,
                config,
                state: ShardState::Uninitialized,
                shard_id: None,
                scheduler,
                monitoring_tx,
            },
            monitoring_rx,
        )
    }

    pub fn state(&self) -> ShardState {
        self.state
    }

    /// Shard ID, set once by `initialize`
    pub fn shard_id(&self) -> Option<&str> {
        self.shard_id.as_deref()
    }

    fn expect_state(&self, expected: ShardState, event: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ProcessorError::LifecycleViolation {
                state: self.state,
                event,
            })
        }
    }

    async fn send_monitoring_event(&self, event: ProcessingEvent) {
        if let Some(tx) = &self.monitoring_tx {
            if let Err(e) = tx.send(event).await {
                warn!(error = %e, "Failed to send monitoring event");
            }
        }
    }

    /// Begin processing a shard
    ///
    /// Records the shard ID and re-arms the checkpoint schedule so the
    /// first delivered batch commits a checkpoint immediately.
    pub async fn initialize(&mut self, shard_id: impl Into<String>) -> Result<()> {
        self.expect_state(ShardState::Uninitialized, "initialize")?;

        let shard_id = shard_id.into();
        info!(shard_id = %shard_id, "Initializing record processor for shard");

        self.scheduler.reset(Instant::now());
        self.shard_id = Some(shard_id.clone());
        self.state = ShardState::Processing;

        self.send_monitoring_event(ProcessingEvent::lifecycle(
            shard_id,
            LifecycleEventType::Initialized,
        ))
        .await;

        Ok(())
    }

    /// Process one delivered batch, then run the checkpoint schedule
    ///
    /// Per-record errors are contained: each record is retried up to the
    /// configured bound and skipped on exhaustion, so this only fails on
    /// a lifecycle violation. Checkpoints therefore always reflect fully
    /// processed or exhausted-and-skipped records, never partial ones.
    pub async fn process_records(
        &mut self,
        records: &[Record],
        checkpointer: &dyn Checkpointer,
    ) -> Result<()> {
        self.expect_state(ShardState::Processing, "process_records")?;

        let batch_start = Instant::now();
        let mut processed = 0usize;
        let mut skipped = 0usize;

        for record in records {
            if self.process_record_with_retries(record).await {
                processed += 1;
            } else {
                skipped += 1;
            }
        }

        let shard_id = self.shard_id.clone().unwrap_or_default();

        self.send_monitoring_event(ProcessingEvent::batch_complete(
            shard_id.clone(),
            processed,
            skipped,
            batch_start.elapsed(),
        ))
        .await;

        if let Some(outcome) = self
            .scheduler
            .maybe_checkpoint(
                Instant::now(),
                &shard_id,
                checkpointer,
                &self.config.checkpoint_retry,
            )
            .await
        {
            self.send_monitoring_event(ProcessingEvent::checkpoint(
                shard_id,
                CheckpointKind::Scheduled,
                outcome.is_ok(),
                outcome.err().map(|e| e.to_string()),
            ))
            .await;
        }

        Ok(())
    }

    /// The lease moved to another worker; checkpointing is no longer
    /// possible at this point
    pub async fn lease_lost(&mut self) -> Result<()> {
        self.expect_state(ShardState::Processing, "lease_lost")?;

        let shard_id = self.shard_id.clone().unwrap_or_default();
        warn!(shard_id = %shard_id, "Lost lease for shard");

        self.state = ShardState::Terminated;
        self.send_monitoring_event(ProcessingEvent::lifecycle(
            shard_id,
            LifecycleEventType::LeaseLost,
        ))
        .await;

        Ok(())
    }

    /// All records in the shard have been consumed; commit the final
    /// checkpoint unconditionally
    pub async fn shard_ended(&mut self, checkpointer: &dyn Checkpointer) -> Result<()> {
        self.expect_state(ShardState::Processing, "shard_ended")?;

        let shard_id = self.shard_id.clone().unwrap_or_default();
        info!(
            shard_id = %shard_id,
            "All records for shard processed, committing final checkpoint"
        );

        self.commit_terminal_checkpoint(&shard_id, checkpointer, CheckpointKind::ShardEnd)
            .await;

        self.state = ShardState::Terminated;
        self.send_monitoring_event(ProcessingEvent::lifecycle(
            shard_id,
            LifecycleEventType::ShardEnded,
        ))
        .await;

        Ok(())
    }

    /// The coordinator is shutting this worker down; commit the current
    /// position before terminating
    pub async fn shutdown_requested(&mut self, checkpointer: &dyn Checkpointer) -> Result<()> {
        self.expect_state(ShardState::Processing, "shutdown_requested")?;

        let shard_id = self.shard_id.clone().unwrap_or_default();
        info!(shard_id = %shard_id, "Shutdown requested for shard, checkpointing");

        self.commit_terminal_checkpoint(&shard_id, checkpointer, CheckpointKind::Shutdown)
            .await;

        self.state = ShardState::Terminated;
        self.send_monitoring_event(ProcessingEvent::lifecycle(
            shard_id,
            LifecycleEventType::ShutdownRequested,
        ))
        .await;

        Ok(())
    }

    // Terminal events use the plain commit; only the periodic checkpoint
    // carries the retry policy.
    async fn commit_terminal_checkpoint(
        &self,
        shard_id: &str,
        checkpointer: &dyn Checkpointer,
        kind: CheckpointKind,
    ) {
        let outcome = checkpointer.checkpoint().await;
        match &outcome {
            Ok(_) => {
                debug!(shard_id = %shard_id, kind = ?kind, "Terminal checkpoint committed");
            }
            Err(e) => {
                warn!(
                    shard_id = %shard_id,
                    kind = ?kind,
                    error = %e,
                    "Terminal checkpoint commit failed"
                );
            }
        }

        self.send_monitoring_event(ProcessingEvent::checkpoint(
            shard_id.to_string(),
            kind,
            outcome.is_ok(),
            outcome.err().map(|e| e.to_string()),
        ))
        .await;
    }

    /// Decode and handle one record with bounded retry
    ///
    /// Returns true if the record was processed, false if it exhausted the
    /// retry bound and was skipped. A backoff wait follows every failed
    /// attempt, the final one included.
    async fn process_record_with_retries(&self, record: &Record) -> bool {
        let shard_id = self.shard_id.as_deref().unwrap_or_default();
        let sequence = record.sequence_number();

        for attempt in 1..=self.config.max_retries {
            let outcome = match self.codec.decode(record) {
                Ok(message) => self
                    .handler
                    .handle(message, record)
                    .await
                    .map_err(ProcessingError::Application),
                Err(e) => Err(ProcessingError::Decode(e)),
            };

            match outcome {
                Ok(()) => {
                    debug!(
                        shard_id = %shard_id,
                        sequence_number = %sequence,
                        attempt = attempt,
                        "Record processed"
                    );

                    self.send_monitoring_event(ProcessingEvent::record_attempt(
                        shard_id.to_string(),
                        sequence.to_string(),
                        true,
                        attempt,
                        None,
                        false,
                    ))
                    .await;

                    return true;
                }
                Err(e) => {
                    let is_final_attempt = attempt == self.config.max_retries;
                    warn!(
                        shard_id = %shard_id,
                        partition_key = %record.partition_key(),
                        sequence_number = %sequence,
                        attempt = attempt,
                        error = %e,
                        "Record processing attempt failed"
                    );

                    self.send_monitoring_event(ProcessingEvent::record_attempt(
                        shard_id.to_string(),
                        sequence.to_string(),
                        false,
                        attempt,
                        Some(e.to_string()),
                        is_final_attempt,
                    ))
                    .await;

                    tokio::time::sleep(self.backoff.next_delay(attempt)).await;
                }
            }
        }

        error!(
            shard_id = %shard_id,
            partition_key = %record.partition_key(),
            sequence_number = %sequence,
            attempts = self.config.max_retries,
            "Record failed all retry attempts, skipping"
        );

        self.send_monitoring_event(ProcessingEvent::record_skipped(
            shard_id.to_string(),
            record.partition_key().to_string(),
            sequence.to_string(),
            self.config.max_retries,
        ))
        .await;

        false
    }
}
