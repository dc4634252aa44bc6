//! Schema-walking decoder.
//!
//! A frame decodes as a loop over `key → payload` entries: the schema picks
//! the expected field by 1-based ordinal, unknown ordinals are skipped by
//! wire type, repeated sequence entries accumulate, and everything left
//! unseen when the frame is exhausted takes its type default. Nested frames
//! decode from an exact sub-slice, so a truncated length prefix surfaces as
//! `Unexpected end of chunk` before any payload is misread.

use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::schema::{Case, Schema, StandardType};
use crate::temporal::{
    parse_instant, parse_local_date, parse_local_date_time, parse_local_time,
    parse_offset_date_time, parse_offset_time, parse_zoned_date_time,
};
use crate::value::{default_of, Value};
use crate::varint::{decode_varint, zigzag_decode};
use crate::bignum::{BigDecimal, BigInteger};
use crate::wire::{decode_key, read_len_prefixed, skip_field, WireType};

#[cfg(feature = "smallvec")]
type SlotVec = smallvec::SmallVec<[Option<Value>; 8]>;
#[cfg(not(feature = "smallvec"))]
type SlotVec = Vec<Option<Value>>;

/// Decode one value of `schema` from `bytes`.
///
/// A `Fail` schema refuses before looking at the input; an empty input is
/// `no bytes to decode` (the streaming path instead yields nothing).
/// Decoding consumes keyed entries until the input is drained; fields never
/// seen take their type defaults.
pub fn decode(schema: &Schema, bytes: &[u8]) -> Result<Value, Error> {
    if let Schema::Fail(message) = schema {
        return Err(Error::SchemaFail(message.clone()));
    }
    if bytes.is_empty() {
        return Err(Error::NoBytesToDecode);
    }
    let mut buf = bytes;
    decode_frame_body(schema, &mut buf)
}

/// Strip `Transform` layers without touching values.
fn resolved(schema: &Schema) -> &Schema {
    let mut schema = schema;
    while let Schema::Transform(transform) = schema {
        schema = transform.inner();
    }
    schema
}

/// Run every `Transform` forward map over a value decoded at the resolved
/// (innermost) schema, innermost map first.
fn apply_forwards(schema: &Schema, raw: Value) -> Result<Value, Error> {
    match schema {
        Schema::Transform(transform) => {
            let inner = apply_forwards(transform.inner(), raw)?;
            transform.apply_forward(inner)
        }
        _ => Ok(raw),
    }
}

fn expect_wire(expected: WireType, actual: WireType) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::UnexpectedWireType { expected, actual })
    }
}

/// Decode the body of one frame: the whole input at the top level, or the
/// contents of a length-delimited payload for a nested composite.
pub(crate) fn decode_frame_body(schema: &Schema, buf: &mut &[u8]) -> Result<Value, Error> {
    match schema {
        Schema::Transform(transform) => {
            let raw = decode_frame_body(transform.inner(), buf)?;
            transform.apply_forward(raw)
        }
        Schema::Fail(message) => Err(Error::SchemaFail(message.clone())),
        Schema::Record(fields) => {
            let mut slots: SlotVec = (0..fields.len()).map(|_| None).collect();
            while !buf.is_empty() {
                let (wire_type, field_number) = decode_key(buf)?;
                let index = field_number as usize - 1;
                match fields.get(index) {
                    Some(field) => decode_into_slot(&mut slots[index], &field.schema, wire_type, buf)?,
                    None => skip_field(wire_type, buf)?,
                }
            }
            let mut values = Vec::with_capacity(fields.len());
            for (field, slot) in fields.iter().zip(slots) {
                values.push(finish_slot(&field.schema, slot)?);
            }
            Ok(Value::Record(values))
        }
        Schema::Tuple(left, right) => {
            let mut slots: [Option<Value>; 2] = [None, None];
            while !buf.is_empty() {
                let (wire_type, field_number) = decode_key(buf)?;
                match field_number {
                    1 => decode_into_slot(&mut slots[0], left, wire_type, buf)?,
                    2 => decode_into_slot(&mut slots[1], right, wire_type, buf)?,
                    _ => skip_field(wire_type, buf)?,
                }
            }
            let [first, second] = slots;
            Ok(Value::tuple(
                finish_slot(left, first)?,
                finish_slot(right, second)?,
            ))
        }
        Schema::Enumeration(cases) => decode_enumeration_body(cases, buf),
        Schema::Optional(inner) => {
            let mut slot = None;
            while !buf.is_empty() {
                let (wire_type, field_number) = decode_key(buf)?;
                if field_number == 1 {
                    decode_into_slot(&mut slot, inner, wire_type, buf)?;
                } else {
                    skip_field(wire_type, buf)?;
                }
            }
            match slot {
                Some(raw) => Ok(Value::some(apply_forwards(inner, raw)?)),
                None => Ok(Value::none()),
            }
        }
        Schema::Sequence(element) => {
            let mut items = Vec::new();
            while !buf.is_empty() {
                let (wire_type, field_number) = decode_key(buf)?;
                if field_number == 1 {
                    decode_sequence_occurrence(element, wire_type, buf, &mut items)?;
                } else {
                    skip_field(wire_type, buf)?;
                }
            }
            Ok(Value::Sequence(items))
        }
        // A bare primitive decodes through the implicit single-field record:
        // the last field-1 payload wins, anything else is skipped, and an
        // input that never mentions field 1 yields the type default.
        Schema::Primitive(_) => {
            let mut slot = None;
            while !buf.is_empty() {
                let (wire_type, field_number) = decode_key(buf)?;
                if field_number == 1 {
                    decode_into_slot(&mut slot, schema, wire_type, buf)?;
                } else {
                    skip_field(wire_type, buf)?;
                }
            }
            finish_slot(schema, slot)
        }
    }
}

/// Decode one keyed occurrence of a field into its accumulator slot.
///
/// Sequence-shaped fields append (packed or one element at a time); every
/// other shape overwrites, giving duplicate keys last-write-wins.
fn decode_into_slot(
    slot: &mut Option<Value>,
    schema: &Schema,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<(), Error> {
    let schema = resolved(schema);
    if let Schema::Sequence(element) = schema {
        let items = match slot {
            Some(Value::Sequence(items)) => items,
            _ => {
                *slot = Some(Value::Sequence(Vec::new()));
                match slot {
                    Some(Value::Sequence(items)) => items,
                    _ => unreachable!("slot was just set to a sequence"),
                }
            }
        };
        decode_sequence_occurrence(element, wire_type, buf, items)
    } else {
        *slot = Some(decode_payload(schema, wire_type, buf)?);
        Ok(())
    }
}

/// Turn an accumulator slot into the final field value: run the field's
/// transform chain over what was seen, or derive the type default.
fn finish_slot(schema: &Schema, slot: Option<Value>) -> Result<Value, Error> {
    match slot {
        Some(raw) => apply_forwards(schema, raw),
        None => default_of(schema),
    }
}

/// One wire occurrence of a sequence field.
///
/// A length-delimited payload for a non-length-delimited element is a packed
/// run: elements parse back to back until the frame is gone. Anything else
/// appends a single element; repeated occurrences concatenate.
fn decode_sequence_occurrence(
    element: &Schema,
    wire_type: WireType,
    buf: &mut &[u8],
    items: &mut Vec<Value>,
) -> Result<(), Error> {
    let element_wire = element.wire_type();
    if wire_type == WireType::Len && element_wire != WireType::Len {
        let mut frame = read_len_prefixed(buf)?;
        while !frame.is_empty() {
            items.push(decode_payload(element, element_wire, &mut frame)?);
        }
        Ok(())
    } else {
        items.push(decode_payload(element, wire_type, buf)?);
        Ok(())
    }
}

fn decode_enumeration_body(cases: &[Case], buf: &mut &[u8]) -> Result<Value, Error> {
    // Last recognised ordinal wins; re-keyed occurrences of the same
    // sequence-shaped case keep accumulating into it.
    let mut current: Option<(usize, Option<Value>)> = None;
    while !buf.is_empty() {
        let (wire_type, field_number) = decode_key(buf)?;
        let index = field_number as usize - 1;
        match cases.get(index) {
            Some(case) => match &mut current {
                Some((active, slot)) if *active == index => {
                    decode_into_slot(slot, &case.schema, wire_type, buf)?;
                }
                _ => {
                    let mut slot = None;
                    decode_into_slot(&mut slot, &case.schema, wire_type, buf)?;
                    current = Some((index, slot));
                }
            },
            None => skip_field(wire_type, buf)?,
        }
    }
    match current {
        Some((index, Some(raw))) => Ok(Value::case(
            index,
            apply_forwards(&cases[index].schema, raw)?,
        )),
        _ => Err(Error::MissingEnumerationCase),
    }
}

/// Decode one payload (the bytes after a key) as a value of `schema`.
fn decode_payload(schema: &Schema, wire_type: WireType, buf: &mut &[u8]) -> Result<Value, Error> {
    match schema {
        Schema::Transform(transform) => {
            let raw = decode_payload(transform.inner(), wire_type, buf)?;
            transform.apply_forward(raw)
        }
        Schema::Fail(message) => Err(Error::SchemaFail(message.clone())),
        Schema::Primitive(standard) => decode_standard_payload(standard, wire_type, buf),
        Schema::Record(_)
        | Schema::Tuple(_, _)
        | Schema::Enumeration(_)
        | Schema::Optional(_)
        | Schema::Sequence(_) => {
            expect_wire(WireType::Len, wire_type)?;
            let mut frame = read_len_prefixed(buf)?;
            decode_frame_body(schema, &mut frame)
        }
    }
}

fn decode_standard_payload(
    standard: &StandardType,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<Value, Error> {
    match standard.wire_type() {
        WireType::Varint => {
            expect_wire(WireType::Varint, wire_type)?;
            let raw = decode_varint(buf)?;
            varint_value(standard, raw)
        }
        WireType::I32 => {
            expect_wire(WireType::I32, wire_type)?;
            if buf.len() < 4 {
                return Err(Error::UnexpectedEndOfChunk);
            }
            Ok(Value::Float(buf.get_f32_le()))
        }
        WireType::I64 => {
            expect_wire(WireType::I64, wire_type)?;
            if buf.len() < 8 {
                return Err(Error::UnexpectedEndOfChunk);
            }
            Ok(Value::Double(buf.get_f64_le()))
        }
        WireType::Len => {
            expect_wire(WireType::Len, wire_type)?;
            let frame = read_len_prefixed(buf)?;
            standard_from_frame(standard, frame)
        }
    }
}

/// Interpret a raw varint as a value of an integer-shaped atom.
///
/// The wire carries the sign-extended 64-bit form; narrowing that loses
/// information is an overflow.
fn varint_value(standard: &StandardType, raw: u64) -> Result<Value, Error> {
    let signed = raw as i64;
    match standard {
        StandardType::Bool => Ok(Value::Bool(raw != 0)),
        StandardType::Byte => i8::try_from(signed)
            .map(Value::Byte)
            .map_err(|_| Error::overflow("byte")),
        StandardType::Short => i16::try_from(signed)
            .map(Value::Short)
            .map_err(|_| Error::overflow("short")),
        StandardType::Int => i32::try_from(signed)
            .map(Value::Int)
            .map_err(|_| Error::overflow("int")),
        StandardType::Long => Ok(Value::Long(signed)),
        StandardType::Char => {
            let code = u32::try_from(raw).map_err(|_| Error::overflow("char"))?;
            char::from_u32(code)
                .map(Value::Char)
                .ok_or_else(|| Error::malformed("char code point", code.to_string()))
        }
        StandardType::DayOfWeek => match signed {
            1..=7 => Ok(Value::DayOfWeek(signed as u8)),
            _ => Err(Error::malformed("day of week", signed.to_string())),
        },
        StandardType::Month => match signed {
            1..=12 => Ok(Value::Month(signed as u8)),
            _ => Err(Error::malformed("month", signed.to_string())),
        },
        StandardType::Year => i32::try_from(signed)
            .map(Value::Year)
            .map_err(|_| Error::overflow("year")),
        StandardType::ZoneOffset => i32::try_from(signed)
            .map(Value::ZoneOffset)
            .map_err(|_| Error::overflow("zone offset")),
        _ => Err(Error::TypeMismatch {
            expected: standard.name(),
        }),
    }
}

/// Interpret a complete length-delimited payload for a `Len`-shaped atom.
fn standard_from_frame(standard: &StandardType, frame: &[u8]) -> Result<Value, Error> {
    match standard {
        StandardType::Unit => Ok(Value::Unit),
        StandardType::String => Ok(Value::String(frame_text(frame)?.to_owned())),
        StandardType::BinaryBytes => Ok(Value::Bytes(Bytes::copy_from_slice(frame))),
        StandardType::BigInteger => BigInteger::parse(frame_text(frame)?).map(Value::BigInteger),
        StandardType::BigDecimal => BigDecimal::parse(frame_text(frame)?).map(Value::BigDecimal),
        StandardType::ZoneId => Ok(Value::ZoneId(frame_text(frame)?.to_owned())),
        StandardType::Duration(_) => {
            let mut frame = frame;
            let seconds = zigzag_decode(decode_varint(&mut frame)?);
            let nanos = zigzag_decode(decode_varint(&mut frame)?);
            if !(0..1_000_000_000).contains(&nanos) {
                return Err(Error::malformed("duration nanos", nanos.to_string()));
            }
            Ok(Value::Duration {
                seconds,
                nanos: nanos as u32,
            })
        }
        StandardType::MonthDay => {
            let [month, day] = decode_int_fields::<2>(frame)?;
            Ok(Value::MonthDay {
                month: narrow_month(month.unwrap_or(1))?,
                day: narrow_day(day.unwrap_or(1))?,
            })
        }
        StandardType::YearMonth => {
            let [year, month] = decode_int_fields::<2>(frame)?;
            Ok(Value::YearMonth {
                year: narrow_i32(year.unwrap_or(1970), "year")?,
                month: narrow_month(month.unwrap_or(1))?,
            })
        }
        StandardType::Period => {
            let [years, months, days] = decode_int_fields::<3>(frame)?;
            Ok(Value::Period {
                years: narrow_i32(years.unwrap_or(0), "period years")?,
                months: narrow_i32(months.unwrap_or(0), "period months")?,
                days: narrow_i32(days.unwrap_or(0), "period days")?,
            })
        }
        StandardType::Instant(format) => {
            parse_instant(frame_text(frame)?, *format).map(Value::Instant)
        }
        StandardType::LocalDate(format) => {
            parse_local_date(frame_text(frame)?, *format).map(Value::LocalDate)
        }
        StandardType::LocalTime(format) => {
            parse_local_time(frame_text(frame)?, *format).map(Value::LocalTime)
        }
        StandardType::LocalDateTime(format) => {
            parse_local_date_time(frame_text(frame)?, *format).map(Value::LocalDateTime)
        }
        StandardType::OffsetTime(format) => parse_offset_time(frame_text(frame)?, *format)
            .map(|(time, offset)| Value::OffsetTime { time, offset }),
        StandardType::OffsetDateTime(format) => parse_offset_date_time(frame_text(frame)?, *format)
            .map(|(datetime, offset)| Value::OffsetDateTime { datetime, offset }),
        StandardType::ZonedDateTime(format) => parse_zoned_date_time(frame_text(frame)?, *format)
            .map(|(datetime, offset, zone)| Value::ZonedDateTime {
                datetime,
                offset,
                zone,
            }),
        _ => Err(Error::TypeMismatch {
            expected: standard.name(),
        }),
    }
}

fn frame_text(frame: &[u8]) -> Result<&str, Error> {
    core::str::from_utf8(frame).map_err(|_| Error::MalformedUtf8)
}

/// Decode a tiny all-varint record (the numeric-pair temporal payloads).
fn decode_int_fields<const N: usize>(mut frame: &[u8]) -> Result<[Option<i64>; N], Error> {
    let mut slots = [None; N];
    while !frame.is_empty() {
        let (wire_type, field_number) = decode_key(&mut frame)?;
        let index = field_number as usize - 1;
        if index < N {
            expect_wire(WireType::Varint, wire_type)?;
            slots[index] = Some(decode_varint(&mut frame)? as i64);
        } else {
            skip_field(wire_type, &mut frame)?;
        }
    }
    Ok(slots)
}

fn narrow_i32(value: i64, target: &'static str) -> Result<i32, Error> {
    i32::try_from(value).map_err(|_| Error::overflow(target))
}

fn narrow_month(value: i64) -> Result<u8, Error> {
    match value {
        1..=12 => Ok(value as u8),
        _ => Err(Error::malformed("month", value.to_string())),
    }
}

fn narrow_day(value: i64) -> Result<u8, Error> {
    match value {
        1..=31 => Ok(value as u8),
        _ => Err(Error::malformed("day of month", value.to_string())),
    }
}
