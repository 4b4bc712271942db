//! Record type delivered by the coordinator

use bytes::Bytes;

/// A single sequenced record from a shard.
///
/// Owned by the coordinator and borrowed by the core for the duration of
/// one processing call. Sequence numbers are opaque strings, ordered per
/// shard; the core never parses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    data: Bytes,
    partition_key: String,
    sequence_number: String,
}

impl Record {
    pub fn new(
        data: impl Into<Bytes>,
        partition_key: impl Into<String>,
        sequence_number: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            partition_key: partition_key.into(),
            sequence_number: sequence_number.into(),
        }
    }

    /// Raw payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Zero-copy handle to the payload
    pub fn data_bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn sequence_number(&self) -> &str {
        &self.sequence_number
    }
}
