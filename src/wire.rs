//! Protobuf wire-format plumbing: field keys, length prefixes, skipping.
//!
//! Every field on the wire is preceded by a key, the varint
//! `(field_number << 3) | wire_type`. See
//! <https://protobuf.dev/programming-guides/encoding> under "Message
//! Structure".

use crate::error::Error;
use crate::varint::{decode_varint, encode_varint, encoded_varint_len};

/// Smallest field number a key may carry.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;
/// Largest field number a key may carry.
pub const MAXIMUM_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The 3-bit payload classifier attached to every field key.
///
/// The deprecated group wire types (3 and 4) are not part of this enum;
/// decoding a key that carries them fails with
/// [`Error::UnknownWireType`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer payload.
    Varint = 0,
    /// Eight-byte little-endian payload (`Double`).
    I64 = 1,
    /// Varint byte count followed by that many payload bytes.
    Len = 2,
    /// Four-byte little-endian payload (`Float`).
    I32 = 5,
}

impl WireType {
    /// Decode the raw 3-bit value into a supported wire type.
    #[inline]
    pub fn try_from_raw(value: u8) -> Result<WireType, Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            5 => Ok(WireType::I32),
            _ => Err(Error::UnknownWireType { value }),
        }
    }

    /// The raw 3-bit value of this wire type.
    #[inline]
    pub const fn into_raw(self) -> u8 {
        self as u8
    }
}

/// Encode a field key for `field_number` with the given wire type.
#[inline]
pub fn encode_key<B: bytes::BufMut>(field_number: u32, wire_type: WireType, buf: &mut B) {
    let key = (u64::from(field_number) << 3) | u64::from(wire_type.into_raw());
    encode_varint(key, buf);
}

/// The encoded width of a field key. The wire type lives in the low three
/// bits and never changes the width.
#[inline]
pub fn encoded_key_len(field_number: u32) -> usize {
    encoded_varint_len(u64::from(field_number) << 3)
}

/// Decode the key at the front of `buf`.
///
/// The wire type is validated before the field number, so a key that is
/// broken in both ways reports the wire type.
#[inline]
pub fn decode_key(buf: &mut &[u8]) -> Result<(WireType, u32), Error> {
    let key = decode_varint(buf)?;
    let wire_type = WireType::try_from_raw((key & 0b111) as u8)?;

    let field_number = key >> 3;
    if field_number < u64::from(MINIMUM_FIELD_NUMBER)
        || field_number > u64::from(MAXIMUM_FIELD_NUMBER)
    {
        return Err(Error::InvalidFieldNumber {
            value: field_number,
        });
    }

    Ok((wire_type, field_number as u32))
}

/// Read a length prefix and split off that many payload bytes.
///
/// Advances `buf` past the prefix and the payload; the returned slice is
/// exactly the payload.
#[inline]
pub fn read_len_prefixed<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], Error> {
    let len = decode_varint(buf)?;
    let len = usize::try_from(len).map_err(|_| Error::UnexpectedEndOfChunk)?;
    if buf.len() < len {
        return Err(Error::UnexpectedEndOfChunk);
    }
    let (payload, rest) = buf.split_at(len);
    *buf = rest;
    Ok(payload)
}

/// Advance `buf` past one field payload of the given wire type.
///
/// This is how unknown field numbers are tolerated: the payload is consumed
/// and discarded without interpreting it.
#[inline]
pub fn skip_field(wire_type: WireType, buf: &mut &[u8]) -> Result<(), Error> {
    let skip_len = match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
            return Ok(());
        }
        WireType::I64 => 8,
        WireType::I32 => 4,
        WireType::Len => {
            read_len_prefixed(buf)?;
            return Ok(());
        }
    };

    if buf.len() < skip_len {
        return Err(Error::UnexpectedEndOfChunk);
    }
    *buf = &buf[skip_len..];
    Ok(())
}
