//! Record payload decoding
//!
//! A codec turns a record's raw payload into the typed message the
//! application handler consumes. Decode failure is a normal, retryable
//! error handled by the processor's retry loop, never a crash.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::record::Record;

/// Trait for decoding record payloads into application messages
///
/// # Examples
///
/// ```rust
/// use shardline::{JsonCodec, Record, RecordCodec};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct OrderPlaced {
///     order_id: String,
/// }
///
/// let codec = JsonCodec::<OrderPlaced>::new();
/// let record = Record::new(&br#"{"order_id":"o-17"}"#[..], "pk", "seq-1");
/// let message = codec.decode(&record).unwrap();
/// assert_eq!(message.order_id, "o-17");
/// ```
pub trait RecordCodec: Send + Sync {
    /// The decoded application message; ownership transfers to the handler.
    type Message: Send;

    /// Decode a record payload
    ///
    /// Any error is treated as retryable by the processor.
    fn decode(&self, record: &Record) -> anyhow::Result<Self::Message>;
}

/// JSON codec for any deserializable message type
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> RecordCodec for JsonCodec<T>
where
    T: DeserializeOwned + Send,
{
    type Message = T;

    fn decode(&self, record: &Record) -> anyhow::Result<T> {
        serde_json::from_slice(record.data()).map_err(Into::into)
    }
}

/// Pass-through codec handing the raw payload to the handler
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl BytesCodec {
    pub fn new() -> Self {
        Self
    }
}

impl RecordCodec for BytesCodec {
    type Message = Bytes;

    fn decode(&self, record: &Record) -> anyhow::Result<Bytes> {
        Ok(record.data_bytes())
    }
}
