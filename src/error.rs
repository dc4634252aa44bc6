//! Error taxonomy for encoding and decoding.

use core::fmt;

use crate::wire::WireType;

/// Broad category of a codec [`Error`].
///
/// Every error belongs to exactly one category; categories are stable even
/// when the set of concrete errors grows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The field key at the front of a frame could not be decoded.
    Key,
    /// The input ended before the current item was complete.
    Truncation,
    /// A varint ran past its maximum encoded width.
    Varint,
    /// A payload was read but its contents were invalid for the schema.
    Payload,
    /// The decoded fields do not form a value of the schema.
    Structural,
    /// A schema `Transform` map rejected the value.
    Transformation,
    /// A `Fail` schema node was reached.
    SchemaFail,
}

/// An encoding or decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The 3-bit wire type in a field key was not one of 0, 1, 2, 5.
    UnknownWireType { value: u8 },
    /// The field number in a key was zero or out of range.
    InvalidFieldNumber { value: u64 },
    /// The input ended mid-varint, mid-payload, or mid-frame.
    UnexpectedEndOfChunk,
    /// The non-streaming decoder was handed an empty input.
    NoBytesToDecode,
    /// A varint still had its continuation bit set on the tenth byte.
    VarintTooLong,
    /// A 64-bit varint did not fit the narrower schema type.
    IntegerOverflow { target: &'static str },
    /// A string payload was not valid UTF-8.
    MalformedUtf8,
    /// A textual or range-checked payload failed to parse.
    MalformedPayload { what: &'static str, text: String },
    /// The wire type on a key contradicts the schema for that field.
    UnexpectedWireType { expected: WireType, actual: WireType },
    /// An enumeration frame ended without any recognised case.
    MissingEnumerationCase,
    /// The value handed to the encoder does not match the schema shape.
    TypeMismatch { expected: &'static str },
    /// A `Transform` forward or reverse map reported failure.
    Transformation(String),
    /// A `Fail` schema node refused to encode or decode.
    SchemaFail(String),
}

impl Error {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownWireType { .. } | Error::InvalidFieldNumber { .. } => ErrorKind::Key,
            Error::UnexpectedEndOfChunk | Error::NoBytesToDecode => ErrorKind::Truncation,
            Error::VarintTooLong => ErrorKind::Varint,
            Error::IntegerOverflow { .. }
            | Error::MalformedUtf8
            | Error::MalformedPayload { .. }
            | Error::UnexpectedWireType { .. } => ErrorKind::Payload,
            Error::MissingEnumerationCase | Error::TypeMismatch { .. } => ErrorKind::Structural,
            Error::Transformation(_) => ErrorKind::Transformation,
            Error::SchemaFail(_) => ErrorKind::SchemaFail,
        }
    }

    /// True when more input could turn this failure into a success.
    ///
    /// Lets callers driving a transport distinguish "wait for the next
    /// chunk" from a terminal stream error.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::UnexpectedEndOfChunk)
    }

    pub(crate) fn overflow(target: &'static str) -> Error {
        Error::IntegerOverflow { target }
    }

    pub(crate) fn malformed(what: &'static str, text: impl Into<String>) -> Error {
        Error::MalformedPayload {
            what,
            text: text.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownWireType { .. } => {
                write!(f, "Failed decoding key: unknown wire type")
            }
            Error::InvalidFieldNumber { .. } => {
                write!(f, "Failed decoding key: invalid field number")
            }
            Error::UnexpectedEndOfChunk => write!(f, "Unexpected end of chunk"),
            Error::NoBytesToDecode => write!(f, "no bytes to decode"),
            Error::VarintTooLong => write!(f, "varint too long"),
            Error::IntegerOverflow { target } => {
                write!(f, "integer overflow: value does not fit in {target}")
            }
            Error::MalformedUtf8 => write!(f, "malformed utf8"),
            Error::MalformedPayload { what, text } => {
                write!(f, "failed parsing {what}: '{text}'")
            }
            Error::UnexpectedWireType { expected, actual } => {
                write!(
                    f,
                    "unexpected wire type: expected {expected:?}, got {actual:?}"
                )
            }
            Error::MissingEnumerationCase => write!(f, "missing enumeration case"),
            Error::TypeMismatch { expected } => {
                write!(f, "value does not match schema: expected {expected}")
            }
            Error::Transformation(message) => write!(f, "{message}"),
            Error::SchemaFail(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {}
