//! Schema-driven codec for the [protobuf wire format](https://protobuf.dev/programming-guides/encoding).
//!
//! No code generation and no compile-time type information: a [`Schema`] is
//! an ordinary runtime value describing a type, and the codec walks it next
//! to a dynamic [`Value`] (encode) or an incoming byte stream (decode).
//! Record fields and enumeration cases take their wire field numbers from
//! declaration order, so two sides sharing a schema agree on the bytes.
//!
//! ```
//! use schemabuf::{decode, encode, Field, Schema, Value};
//!
//! let schema = Schema::record(vec![
//!     Field::new("name", Schema::string()),
//!     Field::new("count", Schema::int()),
//! ]);
//!
//! let value = Value::record(vec![Value::from("Foo"), Value::from(123)]);
//! let bytes = encode(&schema, &value)?;
//! assert_eq!(&bytes[..], b"\x0A\x03Foo\x10\x7B");
//!
//! assert_eq!(decode(&schema, &bytes)?, value);
//! # Ok::<(), schemabuf::Error>(())
//! ```
//!
//! For chunked transports, [`encoder`] and [`decoder`] build streaming
//! adapters: the decoder buffers partial input and is indifferent to chunk
//! boundaries.

mod bignum;
mod codec;
mod error;
mod schema;
mod value;

pub mod temporal;
pub mod varint;
pub mod wire;

pub use bignum::{BigDecimal, BigInteger};
pub use codec::{decode, encode, StreamDecoder, StreamEncoder};
pub use error::{Error, ErrorKind};
pub use schema::{Case, Field, Schema, StandardType, TimeUnit, Transform};
pub use temporal::{Date, DateTime, DateTimeFormat, Time};
pub use value::{default_of, Value};

/// Build a streaming encoder for `schema`.
///
/// Each [`feed`](StreamEncoder::feed) call returns the complete encoding of
/// one value, identical to [`encode`] of that value.
pub fn encoder(schema: Schema) -> StreamEncoder {
    StreamEncoder::new(schema)
}

/// Build a streaming decoder for `schema`.
///
/// The decoder accepts byte chunks of arbitrary size via
/// [`feed`](StreamDecoder::feed) and emits buffered values at
/// [`finish`](StreamDecoder::finish). It is a single-owner object; schemas
/// themselves are immutable and freely shareable.
pub fn decoder(schema: Schema) -> StreamDecoder {
    StreamDecoder::new(schema)
}
