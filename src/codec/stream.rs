//! Streaming adapters: incremental byte-chunk transducers around the codec.
//!
//! The decoder owns a single growable buffer. Because a top-level message is
//! not self-delimiting (any frame can still be extended by another field
//! entry), a buffered value is only known to be complete when the input
//! ends; `feed` therefore accumulates and `finish` decodes and emits. A
//! decoder instance is single-owner and restarts its frame from scratch if
//! dropped and recreated.

use bytes::{Bytes, BytesMut};

use crate::codec::decoder::decode_frame_body;
use crate::codec::encoder;
use crate::error::Error;
use crate::schema::Schema;
use crate::value::Value;

/// Streaming encoder: every fed value yields its complete, self-contained
/// encoding, identical to [`encode`](crate::encode) of that value.
#[derive(Debug, Clone)]
pub struct StreamEncoder {
    schema: Schema,
}

impl StreamEncoder {
    pub(crate) fn new(schema: Schema) -> StreamEncoder {
        StreamEncoder { schema }
    }

    /// The schema this encoder writes.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Encode one value. The outputs of successive calls are contiguous
    /// frames; concatenating them reproduces the per-value encodings.
    pub fn feed(&self, value: &Value) -> Result<Bytes, Error> {
        encoder::encode(&self.schema, value)
    }
}

/// Streaming decoder: accepts byte chunks of arbitrary size and boundaries.
#[derive(Debug)]
pub struct StreamDecoder {
    schema: Schema,
    buffer: BytesMut,
    poisoned: Option<Error>,
}

impl StreamDecoder {
    pub(crate) fn new(schema: Schema) -> StreamDecoder {
        StreamDecoder {
            schema,
            buffer: BytesMut::new(),
            poisoned: None,
        }
    }

    /// The schema this decoder reads.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of bytes buffered for the in-flight frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one chunk. Chunk boundaries carry no meaning: any partitioning
    /// of the same byte stream decodes to the same values.
    ///
    /// A `Fail` schema refuses before reading any bytes, so it terminates
    /// the stream on the first call rather than at end-of-input.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Value>, Error> {
        if let Some(error) = &self.poisoned {
            return Err(error.clone());
        }
        if let Schema::Fail(message) = &self.schema {
            let error = Error::SchemaFail(message.clone());
            self.poisoned = Some(error.clone());
            return Err(error);
        }
        self.buffer.extend_from_slice(chunk);
        Ok(Vec::new())
    }

    /// Signal end-of-input: decode and emit what was buffered.
    ///
    /// An empty buffer yields no values and no error (unlike the
    /// non-streaming `decode`, which refuses empty input). A pending
    /// partial frame fails, most commonly with `Unexpected end of chunk`;
    /// the error also poisons the decoder.
    pub fn finish(&mut self) -> Result<Vec<Value>, Error> {
        if let Some(error) = &self.poisoned {
            return Err(error.clone());
        }
        if let Schema::Fail(message) = &self.schema {
            let error = Error::SchemaFail(message.clone());
            self.poisoned = Some(error.clone());
            return Err(error);
        }
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }

        let result = {
            let mut slice = &self.buffer[..];
            decode_frame_body(&self.schema, &mut slice)
        };
        self.buffer.clear();

        match result {
            Ok(value) => Ok(vec![value]),
            Err(error) => {
                self.poisoned = Some(error.clone());
                Err(error)
            }
        }
    }
}
