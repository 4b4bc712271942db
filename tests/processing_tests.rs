use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;

use shardline::test::{
    mocks::{CountingBackoff, MockCheckpointer, MockRecordHandler},
    TelemetryMessage, TestUtils,
};
use shardline::{
    BytesCodec, CheckpointRetryPolicy, JsonCodec, ProcessorConfig, ShardProcessor,
};

fn bytes_processor(
    config: ProcessorConfig,
) -> (
    ShardProcessor<BytesCodec, MockRecordHandler, CountingBackoff>,
    MockRecordHandler,
    CountingBackoff,
) {
    let handler = MockRecordHandler::new();
    let backoff = CountingBackoff::new();
    let (processor, _monitoring_rx) = ShardProcessor::new(
        config,
        BytesCodec::new(),
        handler.clone(),
        backoff.clone(),
    );
    (processor, handler, backoff)
}

#[tokio::test]
async fn test_batch_never_errors_on_record_failures() -> Result<()> {
    let config = ProcessorConfig {
        max_retries: 3,
        ..Default::default()
    };
    let (mut processor, handler, _) = bytes_processor(config);
    let checkpointer = MockCheckpointer::new();

    handler.fail_sequence_forever("sequence-1");
    handler.fail_sequence_forever("sequence-3");

    processor.initialize("shard-0").await?;
    let result = processor
        .process_records(&TestUtils::create_test_records(5), &checkpointer)
        .await;

    assert!(result.is_ok());
    assert_eq!(
        processor.state(),
        shardline::ShardState::Processing,
        "poison records must not end the shard"
    );
    assert_eq!(handler.processed_sequences().len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_transient_failure_recovers_with_k_waits() -> Result<()> {
    let (mut processor, handler, backoff) = bytes_processor(ProcessorConfig::default());
    let checkpointer = MockCheckpointer::new();

    handler.fail_sequence("sequence-0", 2);

    processor.initialize("shard-0").await?;
    processor
        .process_records(&TestUtils::create_test_records(1), &checkpointer)
        .await?;

    assert_eq!(backoff.wait_count(), 2);
    assert_eq!(handler.attempts("sequence-0"), 3);
    assert_eq!(handler.processed_sequences(), vec!["sequence-0".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_exhaustion_waits_equal_retry_bound() -> Result<()> {
    let config = ProcessorConfig {
        max_retries: 7,
        ..Default::default()
    };
    let (mut processor, handler, backoff) = bytes_processor(config);
    let checkpointer = MockCheckpointer::new();

    handler.fail_sequence_forever("sequence-0");

    processor.initialize("shard-0").await?;
    processor
        .process_records(&TestUtils::create_test_records(1), &checkpointer)
        .await?;

    assert_eq!(handler.attempts("sequence-0"), 7);
    assert_eq!(backoff.wait_count(), 7);
    assert!(handler.processed_sequences().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_records_processed_in_delivery_order() -> Result<()> {
    let (mut processor, handler, _) = bytes_processor(ProcessorConfig::default());
    let checkpointer = MockCheckpointer::new();

    processor.initialize("shard-0").await?;
    processor
        .process_records(&TestUtils::create_test_records(4), &checkpointer)
        .await?;

    assert_eq!(
        handler.processed_sequences(),
        vec![
            "sequence-0".to_string(),
            "sequence-1".to_string(),
            "sequence-2".to_string(),
            "sequence-3".to_string(),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_scheduled_checkpoint_forwards_configured_policy() -> Result<()> {
    let policy = CheckpointRetryPolicy {
        max_attempts: 5,
        delay: Duration::from_millis(750),
    };
    let config = ProcessorConfig {
        checkpoint_retry: policy,
        ..Default::default()
    };
    let (mut processor, _, _) = bytes_processor(config);
    let checkpointer = MockCheckpointer::new();

    processor.initialize("shard-0").await?;
    processor
        .process_records(&TestUtils::create_test_records(1), &checkpointer)
        .await?;

    assert_eq!(checkpointer.recorded_policies(), vec![policy]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_failures_never_stop_processing() -> Result<()> {
    let config = ProcessorConfig {
        checkpoint_interval: Duration::from_secs(10),
        ..Default::default()
    };
    let (mut processor, handler, _) = bytes_processor(config);
    let checkpointer = MockCheckpointer::new();
    checkpointer.set_failing(true);

    processor.initialize("shard-0").await?;
    processor
        .process_records(&TestUtils::create_test_records(2), &checkpointer)
        .await?;

    tokio::time::advance(Duration::from_secs(10)).await;
    processor
        .process_records(&TestUtils::create_test_records(2), &checkpointer)
        .await?;

    // Both batches processed and a commit was attempted for each interval,
    // with the schedule advancing despite the failures
    assert_eq!(handler.processed_sequences().len(), 4);
    assert_eq!(checkpointer.scheduled_commit_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_json_pipeline_end_to_end() -> Result<()> {
    let handler = MockRecordHandler::<TelemetryMessage>::new();
    let (mut processor, _monitoring_rx) = ShardProcessor::new(
        ProcessorConfig {
            max_retries: 2,
            ..Default::default()
        },
        JsonCodec::<TelemetryMessage>::new(),
        handler.clone(),
        CountingBackoff::new(),
    );
    let checkpointer = MockCheckpointer::new();

    let records = vec![
        TestUtils::create_json_record("seq-1", "msg-1"),
        TestUtils::create_json_record("seq-2", "msg-2"),
    ];

    processor.initialize("shard-0").await?;
    processor.process_records(&records, &checkpointer).await?;
    processor.shard_ended(&checkpointer).await?;

    assert_eq!(
        handler.processed_sequences(),
        vec!["seq-1".to_string(), "seq-2".to_string()]
    );
    assert_eq!(checkpointer.plain_commit_count(), 1);

    Ok(())
}
