//! Schema-walking encoder.
//!
//! Encoding is two-pass, the same shape as any protobuf writer that needs
//! length prefixes: a length pass computes every nested frame size, then a
//! write pass emits bytes into a buffer of exactly that capacity. Both
//! passes walk schema and value together and must agree byte-for-byte.

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::schema::{Schema, StandardType};
use crate::temporal::{
    format_instant, format_local_date, format_local_date_time, format_local_time,
    format_offset_date_time, format_offset_time, format_zoned_date_time,
};
use crate::value::Value;
use crate::varint::{encode_varint, encoded_varint_len, zigzag_encode};
use crate::wire::{encode_key, encoded_key_len, WireType};

/// Encode `value` under `schema` into a self-contained byte frame.
///
/// Self-keyed schemas (records, tuples, optionals, enumerations, sequences)
/// emit their own field keys; any other schema is framed as the single
/// field, number 1, of an implicit record. `Unit` and `Fail` encode to zero
/// bytes.
pub fn encode(schema: &Schema, value: &Value) -> Result<Bytes, Error> {
    let len = top_len(schema, value)?;
    let mut buf = BytesMut::with_capacity(len);
    encode_top(schema, value, &mut buf)?;
    debug_assert_eq!(buf.len(), len, "length pass and write pass disagree");
    Ok(buf.freeze())
}

/// Strip `Transform` layers, lowering the value through each reverse map.
fn resolve<'s, 'v>(
    schema: &'s Schema,
    value: &'v Value,
) -> Result<(&'s Schema, Cow<'v, Value>), Error> {
    let mut schema = schema;
    let mut value = Cow::Borrowed(value);
    while let Schema::Transform(transform) = schema {
        value = Cow::Owned(transform.apply_reverse(value.into_owned())?);
        schema = transform.inner();
    }
    Ok((schema, value))
}

fn is_packed(element: &Schema) -> bool {
    !matches!(element.wire_type(), WireType::Len)
}

pub(crate) fn top_len(schema: &Schema, value: &Value) -> Result<usize, Error> {
    let (schema, value) = resolve(schema, value)?;
    match schema {
        Schema::Fail(_) | Schema::Primitive(StandardType::Unit) => Ok(0),
        Schema::Record(_)
        | Schema::Tuple(_, _)
        | Schema::Enumeration(_)
        | Schema::Optional(_)
        | Schema::Sequence(_) => body_len(schema, &value),
        Schema::Primitive(_) => keyed_len(1, schema, &value),
        Schema::Transform(_) => unreachable!("resolved above"),
    }
}

fn encode_top<B: BufMut>(schema: &Schema, value: &Value, buf: &mut B) -> Result<(), Error> {
    let (schema, value) = resolve(schema, value)?;
    match schema {
        Schema::Fail(_) | Schema::Primitive(StandardType::Unit) => Ok(()),
        Schema::Record(_)
        | Schema::Tuple(_, _)
        | Schema::Enumeration(_)
        | Schema::Optional(_)
        | Schema::Sequence(_) => encode_body(schema, &value, buf),
        Schema::Primitive(_) => encode_keyed(1, schema, &value, buf),
        Schema::Transform(_) => unreachable!("resolved above"),
    }
}

/// Length of one `key + payload` entry for a field of `schema`.
///
/// Sequences expand to zero or more entries here: one packed frame, or one
/// entry per element. `Fail` and empty sequences contribute nothing.
fn keyed_len(field_number: u32, schema: &Schema, value: &Value) -> Result<usize, Error> {
    let (schema, value) = resolve(schema, value)?;
    match schema {
        Schema::Fail(_) => Ok(0),
        Schema::Sequence(element) => {
            let items = as_sequence(&value)?;
            if items.is_empty() {
                return Ok(0);
            }
            if is_packed(element) {
                let mut total = 0;
                for item in items {
                    total += body_len(element, item)?;
                }
                Ok(encoded_key_len(field_number) + encoded_varint_len(total as u64) + total)
            } else {
                let mut total = 0;
                for item in items {
                    let body = body_len(element, item)?;
                    total +=
                        encoded_key_len(field_number) + encoded_varint_len(body as u64) + body;
                }
                Ok(total)
            }
        }
        _ => match schema.wire_type() {
            WireType::Varint | WireType::I32 | WireType::I64 => {
                Ok(encoded_key_len(field_number) + body_len(schema, &value)?)
            }
            WireType::Len => {
                let body = body_len(schema, &value)?;
                Ok(encoded_key_len(field_number) + encoded_varint_len(body as u64) + body)
            }
        },
    }
}

/// Write one `key + payload` entry for a field of `schema`.
fn encode_keyed<B: BufMut>(
    field_number: u32,
    schema: &Schema,
    value: &Value,
    buf: &mut B,
) -> Result<(), Error> {
    let (schema, value) = resolve(schema, value)?;
    match schema {
        Schema::Fail(_) => Ok(()),
        Schema::Sequence(element) => {
            let items = as_sequence(&value)?;
            if items.is_empty() {
                return Ok(());
            }
            if is_packed(element) {
                let mut total = 0;
                for item in items {
                    total += body_len(element, item)?;
                }
                encode_key(field_number, WireType::Len, buf);
                encode_varint(total as u64, buf);
                for item in items {
                    encode_body(element, item, buf)?;
                }
                Ok(())
            } else {
                for item in items {
                    let body = body_len(element, item)?;
                    encode_key(field_number, WireType::Len, buf);
                    encode_varint(body as u64, buf);
                    encode_body(element, item, buf)?;
                }
                Ok(())
            }
        }
        _ => {
            let wire_type = schema.wire_type();
            encode_key(field_number, wire_type, buf);
            if wire_type == WireType::Len {
                encode_varint(body_len(schema, &value)? as u64, buf);
            }
            encode_body(schema, &value, buf)
        }
    }
}

/// Length of the bare payload of `schema` (what sits after the key, minus
/// any length prefix).
fn body_len(schema: &Schema, value: &Value) -> Result<usize, Error> {
    let (schema, value) = resolve(schema, value)?;
    let value = &*value;
    match schema {
        Schema::Primitive(standard) => standard_body_len(standard, value),
        Schema::Record(fields) => {
            let values = as_record(value, fields.len())?;
            let mut total = 0;
            for (index, (field, value)) in fields.iter().zip(values).enumerate() {
                total += keyed_len(index as u32 + 1, &field.schema, value)?;
            }
            Ok(total)
        }
        Schema::Tuple(left, right) => {
            let (first, second) = as_tuple(value)?;
            Ok(keyed_len(1, left, first)? + keyed_len(2, right, second)?)
        }
        Schema::Enumeration(cases) => {
            let (case_index, inner) = as_enumeration(value)?;
            let case = cases.get(case_index).ok_or(Error::TypeMismatch {
                expected: "declared enumeration case",
            })?;
            keyed_len(case_index as u32 + 1, &case.schema, inner)
        }
        Schema::Optional(inner) => match as_optional(value)? {
            Some(inner_value) => keyed_len(1, inner, inner_value),
            None => Ok(0),
        },
        // A sequence framed as a payload is its own message: the elements
        // are keyed at the implicit field number 1.
        Schema::Sequence(_) => keyed_len(1, schema, value),
        Schema::Fail(_) => Ok(0),
        Schema::Transform(_) => unreachable!("resolved above"),
    }
}

/// Write the bare payload of `schema`.
fn encode_body<B: BufMut>(schema: &Schema, value: &Value, buf: &mut B) -> Result<(), Error> {
    let (schema, value) = resolve(schema, value)?;
    let value = &*value;
    match schema {
        Schema::Primitive(standard) => encode_standard_body(standard, value, buf),
        Schema::Record(fields) => {
            let values = as_record(value, fields.len())?;
            for (index, (field, value)) in fields.iter().zip(values).enumerate() {
                encode_keyed(index as u32 + 1, &field.schema, value, buf)?;
            }
            Ok(())
        }
        Schema::Tuple(left, right) => {
            let (first, second) = as_tuple(value)?;
            encode_keyed(1, left, first, buf)?;
            encode_keyed(2, right, second, buf)
        }
        Schema::Enumeration(cases) => {
            let (case_index, inner) = as_enumeration(value)?;
            let case = cases.get(case_index).ok_or(Error::TypeMismatch {
                expected: "declared enumeration case",
            })?;
            encode_keyed(case_index as u32 + 1, &case.schema, inner, buf)
        }
        Schema::Optional(inner) => match as_optional(value)? {
            Some(inner_value) => encode_keyed(1, inner, inner_value, buf),
            None => Ok(()),
        },
        Schema::Sequence(_) => encode_keyed(1, schema, value, buf),
        Schema::Fail(_) => Ok(()),
        Schema::Transform(_) => unreachable!("resolved above"),
    }
}

fn standard_body_len(standard: &StandardType, value: &Value) -> Result<usize, Error> {
    match standard.wire_type() {
        WireType::Varint => Ok(encoded_varint_len(varint_raw(standard, value)?)),
        WireType::I32 => {
            float_raw(standard, value)?;
            Ok(4)
        }
        WireType::I64 => {
            double_raw(standard, value)?;
            Ok(8)
        }
        WireType::Len => match (standard, value) {
            (StandardType::Unit, Value::Unit) => Ok(0),
            (StandardType::String, Value::String(text)) => Ok(text.len()),
            (StandardType::BinaryBytes, Value::Bytes(bytes)) => Ok(bytes.len()),
            (StandardType::Duration(_), Value::Duration { seconds, nanos }) => {
                Ok(encoded_varint_len(zigzag_encode(*seconds))
                    + encoded_varint_len(zigzag_encode(i64::from(*nanos))))
            }
            (StandardType::MonthDay, Value::MonthDay { month, day }) => {
                Ok(int_field_len(u64::from(*month)) + int_field_len(u64::from(*day)))
            }
            (StandardType::YearMonth, Value::YearMonth { year, month }) => {
                Ok(int_field_len(*year as i64 as u64) + int_field_len(u64::from(*month)))
            }
            (StandardType::Period, Value::Period { years, months, days }) => {
                Ok(int_field_len(*years as i64 as u64)
                    + int_field_len(*months as i64 as u64)
                    + int_field_len(*days as i64 as u64))
            }
            _ => Ok(text_payload(standard, value)?.len()),
        },
    }
}

fn encode_standard_body<B: BufMut>(
    standard: &StandardType,
    value: &Value,
    buf: &mut B,
) -> Result<(), Error> {
    match standard.wire_type() {
        WireType::Varint => {
            encode_varint(varint_raw(standard, value)?, buf);
            Ok(())
        }
        WireType::I32 => {
            buf.put_f32_le(float_raw(standard, value)?);
            Ok(())
        }
        WireType::I64 => {
            buf.put_f64_le(double_raw(standard, value)?);
            Ok(())
        }
        WireType::Len => match (standard, value) {
            (StandardType::Unit, Value::Unit) => Ok(()),
            (StandardType::String, Value::String(text)) => {
                buf.put_slice(text.as_bytes());
                Ok(())
            }
            (StandardType::BinaryBytes, Value::Bytes(bytes)) => {
                buf.put_slice(bytes);
                Ok(())
            }
            (StandardType::Duration(_), Value::Duration { seconds, nanos }) => {
                encode_varint(zigzag_encode(*seconds), buf);
                encode_varint(zigzag_encode(i64::from(*nanos)), buf);
                Ok(())
            }
            (StandardType::MonthDay, Value::MonthDay { month, day }) => {
                put_int_field(1, u64::from(*month), buf);
                put_int_field(2, u64::from(*day), buf);
                Ok(())
            }
            (StandardType::YearMonth, Value::YearMonth { year, month }) => {
                put_int_field(1, *year as i64 as u64, buf);
                put_int_field(2, u64::from(*month), buf);
                Ok(())
            }
            (StandardType::Period, Value::Period { years, months, days }) => {
                put_int_field(1, *years as i64 as u64, buf);
                put_int_field(2, *months as i64 as u64, buf);
                put_int_field(3, *days as i64 as u64, buf);
                Ok(())
            }
            _ => {
                buf.put_slice(text_payload(standard, value)?.as_bytes());
                Ok(())
            }
        },
    }
}

/// One varint field of a numeric-pair payload; keys 1..=3 are single bytes.
fn int_field_len(raw: u64) -> usize {
    1 + encoded_varint_len(raw)
}

fn put_int_field<B: BufMut>(field_number: u32, raw: u64, buf: &mut B) {
    encode_key(field_number, WireType::Varint, buf);
    encode_varint(raw, buf);
}

/// The raw varint payload of an integer-shaped atom. Signed values are
/// sign-extended to 64 bits, matching protobuf `int64` semantics.
fn varint_raw(standard: &StandardType, value: &Value) -> Result<u64, Error> {
    match (standard, value) {
        (StandardType::Bool, Value::Bool(flag)) => Ok(u64::from(*flag)),
        (StandardType::Byte, Value::Byte(n)) => Ok(*n as i64 as u64),
        (StandardType::Short, Value::Short(n)) => Ok(*n as i64 as u64),
        (StandardType::Int, Value::Int(n)) => Ok(*n as i64 as u64),
        (StandardType::Long, Value::Long(n)) => Ok(*n as u64),
        (StandardType::Char, Value::Char(c)) => Ok(u64::from(u32::from(*c))),
        (StandardType::DayOfWeek, Value::DayOfWeek(day)) => Ok(u64::from(*day)),
        (StandardType::Month, Value::Month(month)) => Ok(u64::from(*month)),
        (StandardType::Year, Value::Year(year)) => Ok(*year as i64 as u64),
        (StandardType::ZoneOffset, Value::ZoneOffset(seconds)) => Ok(*seconds as i64 as u64),
        _ => Err(Error::TypeMismatch {
            expected: standard.name(),
        }),
    }
}

fn float_raw(standard: &StandardType, value: &Value) -> Result<f32, Error> {
    match (standard, value) {
        (StandardType::Float, Value::Float(x)) => Ok(*x),
        _ => Err(Error::TypeMismatch {
            expected: standard.name(),
        }),
    }
}

fn double_raw(standard: &StandardType, value: &Value) -> Result<f64, Error> {
    match (standard, value) {
        (StandardType::Double, Value::Double(x)) => Ok(*x),
        _ => Err(Error::TypeMismatch {
            expected: standard.name(),
        }),
    }
}

/// Text rendering for the atoms whose wire payload is their textual form.
fn text_payload(standard: &StandardType, value: &Value) -> Result<String, Error> {
    match (standard, value) {
        (StandardType::BigInteger, Value::BigInteger(n)) => Ok(n.as_str().to_owned()),
        (StandardType::BigDecimal, Value::BigDecimal(n)) => Ok(n.as_str().to_owned()),
        (StandardType::ZoneId, Value::ZoneId(zone)) => Ok(zone.clone()),
        (StandardType::Instant(format), Value::Instant(datetime)) => {
            Ok(format_instant(datetime, *format))
        }
        (StandardType::LocalDate(format), Value::LocalDate(date)) => {
            Ok(format_local_date(date, *format))
        }
        (StandardType::LocalTime(format), Value::LocalTime(time)) => {
            Ok(format_local_time(time, *format))
        }
        (StandardType::LocalDateTime(format), Value::LocalDateTime(datetime)) => {
            Ok(format_local_date_time(datetime, *format))
        }
        (StandardType::OffsetTime(format), Value::OffsetTime { time, offset }) => {
            Ok(format_offset_time(time, *offset, *format))
        }
        (StandardType::OffsetDateTime(format), Value::OffsetDateTime { datetime, offset }) => {
            Ok(format_offset_date_time(datetime, *offset, *format))
        }
        (
            StandardType::ZonedDateTime(format),
            Value::ZonedDateTime {
                datetime,
                offset,
                zone,
            },
        ) => Ok(format_zoned_date_time(datetime, *offset, zone, *format)),
        _ => Err(Error::TypeMismatch {
            expected: standard.name(),
        }),
    }
}

fn as_sequence(value: &Value) -> Result<&[Value], Error> {
    match value {
        Value::Sequence(items) => Ok(items),
        _ => Err(Error::TypeMismatch {
            expected: "sequence",
        }),
    }
}

fn as_record(value: &Value, arity: usize) -> Result<&[Value], Error> {
    match value {
        Value::Record(values) if values.len() == arity => Ok(values),
        _ => Err(Error::TypeMismatch { expected: "record" }),
    }
}

fn as_tuple(value: &Value) -> Result<(&Value, &Value), Error> {
    match value {
        Value::Tuple(left, right) => Ok((left, right)),
        _ => Err(Error::TypeMismatch { expected: "tuple" }),
    }
}

fn as_enumeration(value: &Value) -> Result<(usize, &Value), Error> {
    match value {
        Value::Enumeration { case_index, value } => Ok((*case_index, value)),
        _ => Err(Error::TypeMismatch {
            expected: "enumeration",
        }),
    }
}

fn as_optional(value: &Value) -> Result<Option<&Value>, Error> {
    match value {
        Value::Optional(inner) => Ok(inner.as_deref()),
        _ => Err(Error::TypeMismatch {
            expected: "optional",
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{Case, Field};

    use super::*;

    fn single_field(schema: Schema) -> Schema {
        Schema::record(vec![Field::new("value", schema)])
    }

    #[test]
    fn record_with_single_int_field() {
        let schema = single_field(Schema::int());
        let bytes = encode(&schema, &Value::record(vec![Value::Int(150)])).unwrap();
        assert_eq!(&bytes[..], &[0x08, 0x96, 0x01]);
    }

    #[test]
    fn top_level_primitive_gets_implicit_field_one() {
        let bytes = encode(&Schema::int(), &Value::Int(150)).unwrap();
        assert_eq!(&bytes[..], &[0x08, 0x96, 0x01]);
    }

    #[test]
    fn negative_int_is_sign_extended() {
        let bytes = encode(&Schema::int(), &Value::Int(-1)).unwrap();
        // 10-byte varint of u64::MAX after the field-1 key.
        assert_eq!(
            &bytes[..],
            &[0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
    }

    #[test]
    fn unit_and_fail_emit_nothing() {
        assert!(encode(&Schema::unit(), &Value::Unit).unwrap().is_empty());
        assert!(encode(&Schema::fail("failing schema"), &Value::Int(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn optional_some_and_none() {
        let schema = Schema::optional(Schema::int());
        assert_eq!(
            &encode(&schema, &Value::some(Value::Int(5))).unwrap()[..],
            &[0x08, 0x05]
        );
        assert!(encode(&schema, &Value::none()).unwrap().is_empty());
        // `Some(default)` still emits its field so it survives a round trip.
        assert_eq!(
            &encode(&schema, &Value::some(Value::Int(0))).unwrap()[..],
            &[0x08, 0x00]
        );
    }

    #[test]
    fn packed_and_unpacked_sequences() {
        let packed = single_field(Schema::sequence(Schema::int()));
        let bytes = encode(
            &packed,
            &Value::record(vec![Value::sequence(vec![
                Value::Int(3),
                Value::Int(270),
                Value::Int(86942),
            ])]),
        )
        .unwrap();
        assert_eq!(
            &bytes[..],
            &[0x0A, 0x06, 0x03, 0x8E, 0x02, 0x9E, 0xA7, 0x05]
        );

        let unpacked = single_field(Schema::sequence(Schema::string()));
        let bytes = encode(
            &unpacked,
            &Value::record(vec![Value::sequence(vec![
                Value::from("foo"),
                Value::from("bar"),
            ])]),
        )
        .unwrap();
        assert_eq!(
            &bytes[..],
            &[0x0A, 0x03, b'f', b'o', b'o', 0x0A, 0x03, b'b', b'a', b'r']
        );
    }

    #[test]
    fn sequence_of_sequences_frames_each_inner_list() {
        let schema = Schema::sequence(Schema::sequence(Schema::int()));
        let value = Value::sequence(vec![
            Value::sequence(vec![Value::Int(1), Value::Int(2)]),
            Value::sequence(vec![Value::Int(3)]),
        ]);
        let bytes = encode(&schema, &value).unwrap();
        // Outer entries are unpacked frames; inside each, the inner list is
        // packed under the implicit field 1.
        assert_eq!(
            &bytes[..],
            &[
                0x0A, 0x04, 0x0A, 0x02, 0x01, 0x02, // [1, 2]
                0x0A, 0x03, 0x0A, 0x01, 0x03, // [3]
            ]
        );
    }

    #[test]
    fn enumeration_case_picks_field_number() {
        let schema = Schema::enumeration(vec![
            Case::new("string_value", Schema::string()),
            Case::new("int_value", Schema::int()),
        ]);
        let bytes = encode(&schema, &Value::case(1, Value::Int(482))).unwrap();
        assert_eq!(&bytes[..], &[0x10, 0xE2, 0x03]);

        let err = encode(&schema, &Value::case(7, Value::Int(1))).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn transform_reverse_failure_emits_nothing() {
        let schema = Schema::transform(Schema::int(), Ok, |_| Err("reverse refused".to_owned()));
        assert_eq!(
            encode(&schema, &Value::Int(1)),
            Err(Error::Transformation("reverse refused".to_owned()))
        );
    }

    #[test]
    fn duration_is_a_zigzag_pair() {
        let schema = Schema::Primitive(StandardType::Duration(Default::default()));
        let bytes = encode(
            &schema,
            &Value::Duration {
                seconds: -2,
                nanos: 500,
            },
        )
        .unwrap();
        // field 1, len 3: zigzag(-2) = 3, zigzag(500) = 1000 = E8 07.
        assert_eq!(&bytes[..], &[0x0A, 0x03, 0x03, 0xE8, 0x07]);
    }

    #[test]
    fn length_pass_matches_write_pass_for_nested_value() {
        let schema = single_field(Schema::record(vec![
            Field::new("name", Schema::string()),
            Field::new("scores", Schema::sequence(Schema::long())),
        ]));
        let value = Value::record(vec![Value::record(vec![
            Value::from("nested"),
            Value::sequence(vec![Value::Long(1), Value::Long(-1), Value::Long(1 << 40)]),
        ])]);
        let bytes = encode(&schema, &value).unwrap();
        assert_eq!(bytes.len(), top_len(&schema, &value).unwrap());
    }
}
