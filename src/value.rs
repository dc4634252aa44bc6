//! Dynamic values, the runtime counterpart of [`Schema`](crate::Schema).

use bytes::Bytes;

use crate::bignum::{BigDecimal, BigInteger};
use crate::error::Error;
use crate::schema::{Schema, StandardType};
use crate::temporal::{Date, DateTime, Time};

/// A value described by some schema.
///
/// Composite values are positional: a `Record` holds one value per schema
/// field in declaration order, and an `Enumeration` holds the 0-based index
/// of its selected case (the wire field number is `case_index + 1`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Bytes(Bytes),
    BigInteger(BigInteger),
    BigDecimal(BigDecimal),
    /// ISO day number, Monday = 1 through Sunday = 7.
    DayOfWeek(u8),
    /// Calendar month, January = 1 through December = 12.
    Month(u8),
    MonthDay {
        month: u8,
        day: u8,
    },
    Period {
        years: i32,
        months: i32,
        days: i32,
    },
    Year(i32),
    YearMonth {
        year: i32,
        month: u8,
    },
    ZoneId(String),
    /// Total offset from UTC in seconds.
    ZoneOffset(i32),
    Duration {
        seconds: i64,
        nanos: u32,
    },
    Instant(DateTime),
    LocalDate(Date),
    LocalTime(Time),
    LocalDateTime(DateTime),
    OffsetTime {
        time: Time,
        offset: i32,
    },
    OffsetDateTime {
        datetime: DateTime,
        offset: i32,
    },
    ZonedDateTime {
        datetime: DateTime,
        offset: i32,
        zone: String,
    },
    Sequence(Vec<Value>),
    Record(Vec<Value>),
    Enumeration {
        case_index: usize,
        value: Box<Value>,
    },
    Tuple(Box<Value>, Box<Value>),
    Optional(Option<Box<Value>>),
}

impl Value {
    pub fn record(fields: Vec<Value>) -> Value {
        Value::Record(fields)
    }

    pub fn sequence(elements: Vec<Value>) -> Value {
        Value::Sequence(elements)
    }

    pub fn tuple(left: Value, right: Value) -> Value {
        Value::Tuple(Box::new(left), Box::new(right))
    }

    /// The selected case of an enumeration, by 0-based declaration index.
    pub fn case(case_index: usize, value: Value) -> Value {
        Value::Enumeration {
            case_index,
            value: Box::new(value),
        }
    }

    pub fn some(value: Value) -> Value {
        Value::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Value {
        Value::Optional(None)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Value {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

/// The type default of a schema, derived from the schema alone.
///
/// This is what absent record fields decode to: numeric zero, false, empty
/// text and bytes, empty sequence, absent optional, recursively-defaulted
/// records, the first case of an enumeration, and epoch-flavoured temporal
/// values. A `Fail` schema has no default and surfaces its message.
pub fn default_of(schema: &Schema) -> Result<Value, Error> {
    match schema {
        Schema::Primitive(standard) => Ok(default_of_standard(standard)),
        Schema::Sequence(_) => Ok(Value::Sequence(Vec::new())),
        Schema::Record(fields) => fields
            .iter()
            .map(|field| default_of(&field.schema))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Record),
        Schema::Enumeration(cases) => {
            let first = cases.first().ok_or(Error::MissingEnumerationCase)?;
            Ok(Value::case(0, default_of(&first.schema)?))
        }
        Schema::Tuple(left, right) => Ok(Value::tuple(default_of(left)?, default_of(right)?)),
        Schema::Optional(_) => Ok(Value::none()),
        Schema::Transform(transform) => transform.apply_forward(default_of(transform.inner())?),
        Schema::Fail(message) => Err(Error::SchemaFail(message.clone())),
    }
}

fn default_of_standard(standard: &StandardType) -> Value {
    match standard {
        StandardType::Unit => Value::Unit,
        StandardType::Bool => Value::Bool(false),
        StandardType::Byte => Value::Byte(0),
        StandardType::Short => Value::Short(0),
        StandardType::Int => Value::Int(0),
        StandardType::Long => Value::Long(0),
        StandardType::Float => Value::Float(0.0),
        StandardType::Double => Value::Double(0.0),
        StandardType::Char => Value::Char('\0'),
        StandardType::String => Value::String(String::new()),
        StandardType::BinaryBytes => Value::Bytes(Bytes::new()),
        StandardType::BigInteger => Value::BigInteger(BigInteger::zero()),
        StandardType::BigDecimal => Value::BigDecimal(BigDecimal::zero()),
        StandardType::DayOfWeek => Value::DayOfWeek(1),
        StandardType::Month => Value::Month(1),
        StandardType::MonthDay => Value::MonthDay { month: 1, day: 1 },
        StandardType::Period => Value::Period {
            years: 0,
            months: 0,
            days: 0,
        },
        StandardType::Year => Value::Year(1970),
        StandardType::YearMonth => Value::YearMonth {
            year: 1970,
            month: 1,
        },
        StandardType::ZoneId => Value::ZoneId("Z".to_owned()),
        StandardType::ZoneOffset => Value::ZoneOffset(0),
        StandardType::Duration(_) => Value::Duration {
            seconds: 0,
            nanos: 0,
        },
        StandardType::Instant(_) => Value::Instant(DateTime::EPOCH),
        StandardType::LocalDate(_) => Value::LocalDate(Date::EPOCH),
        StandardType::LocalTime(_) => Value::LocalTime(Time::MIDNIGHT),
        StandardType::LocalDateTime(_) => Value::LocalDateTime(DateTime::EPOCH),
        StandardType::OffsetTime(_) => Value::OffsetTime {
            time: Time::MIDNIGHT,
            offset: 0,
        },
        StandardType::OffsetDateTime(_) => Value::OffsetDateTime {
            datetime: DateTime::EPOCH,
            offset: 0,
        },
        StandardType::ZonedDateTime(_) => Value::ZonedDateTime {
            datetime: DateTime::EPOCH,
            offset: 0,
            zone: "Z".to_owned(),
        },
    }
}
