//! Test utilities and mock implementations for testing the shard processor


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Sample application message used by codec and processor tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub id: String,
    pub created_on: DateTime<Utc>,
}

/// Helper functions for creating test data
pub struct TestUtils;

impl TestUtils {
    /// Create a test record with given sequence number and raw payload
    pub fn create_test_record(sequence_number: &str, data: &[u8]) -> Record {
        Record::new(data.to_vec(), "test-partition-key", sequence_number)
    }

    /// Create a test record carrying a JSON-encoded `TelemetryMessage`
    pub fn create_json_record(sequence_number: &str, message_id: &str) -> Record {
        let message = TelemetryMessage {
            id: message_id.to_string(),
            created_on: Utc::now(),
        };
        let payload = serde_json::to_vec(&message).expect("Failed to encode test message");
        Record::new(payload, "test-partition-key", sequence_number)
    }

    /// Create a vector of test records with raw payloads
    pub fn create_test_records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Self::create_test_record(
                    &format!("sequence-{}", i),
                    format!("data-{}", i).as_bytes(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_test_record() {
        let record = TestUtils::create_test_record("seq-1", b"test-data");
        assert_eq!(record.sequence_number(), "seq-1");
        assert_eq!(record.data(), b"test-data");
        assert_eq!(record.partition_key(), "test-partition-key");
    }

    #[test]
    fn test_create_test_records() {
        let records = TestUtils::create_test_records(3);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].sequence_number(), "sequence-0");
        assert_eq!(records[2].sequence_number(), "sequence-2");
    }

    #[test]
    fn test_json_record_decodes() {
        let record = TestUtils::create_json_record("seq-1", "msg-1");
        let message: TelemetryMessage = serde_json::from_slice(record.data()).unwrap();
        assert_eq!(message.id, "msg-1");
    }
}
