//! Runtime schema tree driving the codec.
//!
//! Schemas are immutable values built by the caller and borrowed by the
//! codec for the duration of one encode or decode call. They may be shared
//! freely across threads.

use core::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::temporal::DateTimeFormat;
use crate::value::Value;
use crate::wire::WireType;

/// Declared unit of a `Duration` schema.
///
/// The unit is carried as metadata for the schema's author; the wire shape
/// of a duration is always the `(seconds, nanos)` pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    #[default]
    Seconds,
    Millis,
    Micros,
    Nanos,
}

/// An atomic schema type.
///
/// Temporal types carry the [`DateTimeFormat`] used for their textual wire
/// form; both directions of the codec go through the carried format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardType {
    Unit,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    BinaryBytes,
    BigInteger,
    BigDecimal,
    DayOfWeek,
    Month,
    MonthDay,
    Period,
    Year,
    YearMonth,
    ZoneId,
    ZoneOffset,
    Duration(TimeUnit),
    Instant(DateTimeFormat),
    LocalDate(DateTimeFormat),
    LocalTime(DateTimeFormat),
    LocalDateTime(DateTimeFormat),
    OffsetTime(DateTimeFormat),
    OffsetDateTime(DateTimeFormat),
    ZonedDateTime(DateTimeFormat),
}

impl StandardType {
    /// The wire type values of this atom are tagged with.
    pub fn wire_type(&self) -> WireType {
        match self {
            StandardType::Bool
            | StandardType::Byte
            | StandardType::Short
            | StandardType::Int
            | StandardType::Long
            | StandardType::Char
            | StandardType::DayOfWeek
            | StandardType::Month
            | StandardType::Year
            | StandardType::ZoneOffset => WireType::Varint,
            StandardType::Float => WireType::I32,
            StandardType::Double => WireType::I64,
            _ => WireType::Len,
        }
    }

    /// Human-readable name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            StandardType::Unit => "unit",
            StandardType::Bool => "bool",
            StandardType::Byte => "byte",
            StandardType::Short => "short",
            StandardType::Int => "int",
            StandardType::Long => "long",
            StandardType::Float => "float",
            StandardType::Double => "double",
            StandardType::Char => "char",
            StandardType::String => "string",
            StandardType::BinaryBytes => "binary",
            StandardType::BigInteger => "big integer",
            StandardType::BigDecimal => "big decimal",
            StandardType::DayOfWeek => "day of week",
            StandardType::Month => "month",
            StandardType::MonthDay => "month-day",
            StandardType::Period => "period",
            StandardType::Year => "year",
            StandardType::YearMonth => "year-month",
            StandardType::ZoneId => "zone id",
            StandardType::ZoneOffset => "zone offset",
            StandardType::Duration(_) => "duration",
            StandardType::Instant(_) => "instant",
            StandardType::LocalDate(_) => "local date",
            StandardType::LocalTime(_) => "local time",
            StandardType::LocalDateTime(_) => "local datetime",
            StandardType::OffsetTime(_) => "offset time",
            StandardType::OffsetDateTime(_) => "offset datetime",
            StandardType::ZonedDateTime(_) => "zoned datetime",
        }
    }
}

/// A named record field. Its position in the record fixes its wire field
/// number: the first declared field is number 1.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Field {
        Field {
            name: name.into(),
            schema,
        }
    }
}

/// A named enumeration case. Declaration order fixes the wire field number,
/// which is why cases live in a list and never in an unordered map.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub schema: Schema,
}

impl Case {
    pub fn new(name: impl Into<String>, schema: Schema) -> Case {
        Case {
            name: name.into(),
            schema,
        }
    }
}

type MapFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// An invertible, possibly-failing view over an inner schema.
///
/// `forward` runs after decoding the inner representation, `reverse` before
/// encoding it. Either side may reject a value with a message.
#[derive(Clone)]
pub struct Transform {
    inner: Schema,
    forward: MapFn,
    reverse: MapFn,
}

impl Transform {
    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    pub(crate) fn apply_forward(&self, value: Value) -> Result<Value, Error> {
        (self.forward)(value).map_err(Error::Transformation)
    }

    pub(crate) fn apply_reverse(&self, value: Value) -> Result<Value, Error> {
        (self.reverse)(value).map_err(Error::Transformation)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// The tagged schema tree.
#[derive(Debug, Clone)]
pub enum Schema {
    /// An atomic type.
    Primitive(StandardType),
    /// An ordered sequence of like-typed elements.
    Sequence(Box<Schema>),
    /// A product of heterogeneous named fields.
    Record(Vec<Field>),
    /// A discriminated union; exactly one case is present at a time.
    Enumeration(Vec<Case>),
    /// A 2-arity product, wire-identical to a record with fields at 1 and 2.
    Tuple(Box<Schema>, Box<Schema>),
    /// A value that may be absent, wire-identical to a record with a single
    /// optional field at number 1.
    Optional(Box<Schema>),
    /// An invertible view over an inner schema.
    Transform(Box<Transform>),
    /// A schema that refuses to encode or decode, carrying its message.
    Fail(String),
}

impl Schema {
    pub fn record(fields: Vec<Field>) -> Schema {
        Schema::Record(fields)
    }

    pub fn enumeration(cases: Vec<Case>) -> Schema {
        Schema::Enumeration(cases)
    }

    pub fn sequence(element: Schema) -> Schema {
        Schema::Sequence(Box::new(element))
    }

    pub fn tuple(left: Schema, right: Schema) -> Schema {
        Schema::Tuple(Box::new(left), Box::new(right))
    }

    pub fn optional(inner: Schema) -> Schema {
        Schema::Optional(Box::new(inner))
    }

    pub fn transform<F, R>(inner: Schema, forward: F, reverse: R) -> Schema
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
        R: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Schema::Transform(Box::new(Transform {
            inner,
            forward: Arc::new(forward),
            reverse: Arc::new(reverse),
        }))
    }

    pub fn fail(message: impl Into<String>) -> Schema {
        Schema::Fail(message.into())
    }

    pub fn unit() -> Schema {
        Schema::Primitive(StandardType::Unit)
    }

    pub fn boolean() -> Schema {
        Schema::Primitive(StandardType::Bool)
    }

    pub fn byte() -> Schema {
        Schema::Primitive(StandardType::Byte)
    }

    pub fn short() -> Schema {
        Schema::Primitive(StandardType::Short)
    }

    pub fn int() -> Schema {
        Schema::Primitive(StandardType::Int)
    }

    pub fn long() -> Schema {
        Schema::Primitive(StandardType::Long)
    }

    pub fn float() -> Schema {
        Schema::Primitive(StandardType::Float)
    }

    pub fn double() -> Schema {
        Schema::Primitive(StandardType::Double)
    }

    pub fn character() -> Schema {
        Schema::Primitive(StandardType::Char)
    }

    pub fn string() -> Schema {
        Schema::Primitive(StandardType::String)
    }

    pub fn binary() -> Schema {
        Schema::Primitive(StandardType::BinaryBytes)
    }

    /// The wire type a field of this schema is tagged with.
    pub fn wire_type(&self) -> WireType {
        match self {
            Schema::Primitive(standard) => standard.wire_type(),
            Schema::Transform(transform) => transform.inner().wire_type(),
            _ => WireType::Len,
        }
    }

    /// True for schemas that put their own field keys on the wire at the top
    /// level of an encode/decode call. Everything else is wrapped as the
    /// single field (number 1) of an implicit record.
    pub fn is_self_keyed(&self) -> bool {
        match self {
            Schema::Record(_)
            | Schema::Tuple(_, _)
            | Schema::Optional(_)
            | Schema::Enumeration(_)
            | Schema::Sequence(_) => true,
            Schema::Transform(transform) => transform.inner().is_self_keyed(),
            Schema::Primitive(_) | Schema::Fail(_) => false,
        }
    }

    /// Human-readable shape name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Primitive(standard) => standard.name(),
            Schema::Sequence(_) => "sequence",
            Schema::Record(_) => "record",
            Schema::Enumeration(_) => "enumeration",
            Schema::Tuple(_, _) => "tuple",
            Schema::Optional(_) => "optional",
            Schema::Transform(transform) => transform.inner().type_name(),
            Schema::Fail(_) => "fail",
        }
    }
}

impl From<StandardType> for Schema {
    fn from(standard: StandardType) -> Schema {
        Schema::Primitive(standard)
    }
}
