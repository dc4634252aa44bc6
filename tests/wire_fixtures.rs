//! Bit-exact wire fixtures, checked in both directions.

use schemabuf::{decode, decoder, encode, Case, Error, Field, Schema, Value};

fn single_field(schema: Schema) -> Schema {
    Schema::record(vec![Field::new("value", schema)])
}

fn single(value: Value) -> Value {
    Value::record(vec![value])
}

#[track_caller]
fn assert_fixture(schema: &Schema, value: &Value, hex: &[u8]) {
    let bytes = encode(schema, value).expect("encode failed");
    assert_eq!(&bytes[..], hex, "encoded bytes differ from fixture");
    assert_eq!(
        decode(schema, hex).expect("decode failed"),
        *value,
        "fixture bytes decode to a different value"
    );
}

#[test]
fn basic_int() {
    assert_fixture(
        &single_field(Schema::int()),
        &single(Value::Int(150)),
        &[0x08, 0x96, 0x01],
    );
}

#[test]
fn basic_string() {
    assert_fixture(
        &single_field(Schema::string()),
        &single(Value::from("testing")),
        &[0x0A, 0x07, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6E, 0x67],
    );
}

#[test]
fn basic_float() {
    assert_fixture(
        &single_field(Schema::float()),
        &single(Value::Float(0.001)),
        &[0x0D, 0x6F, 0x12, 0x83, 0x3A],
    );
}

#[test]
fn basic_double() {
    assert_fixture(
        &single_field(Schema::double()),
        &single(Value::Double(0.001)),
        &[0x09, 0xFC, 0xA9, 0xF1, 0xD2, 0x4D, 0x62, 0x50, 0x3F],
    );
}

#[test]
fn embedded_message() {
    let schema = single_field(single_field(Schema::int()));
    assert_fixture(
        &schema,
        &single(single(Value::Int(150))),
        &[0x0A, 0x03, 0x08, 0x96, 0x01],
    );
}

#[test]
fn packed_list() {
    let schema = single_field(Schema::sequence(Schema::int()));
    assert_fixture(
        &schema,
        &single(Value::sequence(vec![
            Value::Int(3),
            Value::Int(270),
            Value::Int(86942),
        ])),
        &[0x0A, 0x06, 0x03, 0x8E, 0x02, 0x9E, 0xA7, 0x05],
    );
}

#[test]
fn unpacked_list() {
    let schema = single_field(Schema::sequence(Schema::string()));
    assert_fixture(
        &schema,
        &single(Value::sequence(vec![
            Value::from("foo"),
            Value::from("bar"),
            Value::from("baz"),
        ])),
        &[
            0x0A, 0x03, 0x66, 0x6F, 0x6F, // "foo"
            0x0A, 0x03, 0x62, 0x61, 0x72, // "bar"
            0x0A, 0x03, 0x62, 0x61, 0x7A, // "baz"
        ],
    );
}

fn name_count_record() -> Schema {
    Schema::record(vec![
        Field::new("name", Schema::string()),
        Field::new("count", Schema::int()),
    ])
}

#[test]
fn two_field_record() {
    assert_fixture(
        &name_count_record(),
        &Value::record(vec![Value::from("Foo"), Value::from(123)]),
        &[0x0A, 0x03, 0x46, 0x6F, 0x6F, 0x10, 0x7B],
    );
}

fn value_enumeration() -> Schema {
    Schema::enumeration(vec![
        Case::new("string_value", Schema::string()),
        Case::new("int_value", Schema::int()),
        Case::new("bool_value", Schema::boolean()),
    ])
}

#[test]
fn enumeration_int_case() {
    assert_fixture(
        &value_enumeration(),
        &Value::case(1, Value::Int(482)),
        &[0x10, 0xE2, 0x03],
    );
}

// --- behaviours beyond the byte fixtures ---------------------------------

#[test]
fn record_default_fill() {
    assert_eq!(
        decode(&name_count_record(), &[0x10, 0x7B]).unwrap(),
        Value::record(vec![Value::String(String::new()), Value::Int(123)])
    );
}

#[test]
fn tuple_default_fill() {
    let schema = Schema::tuple(Schema::int(), Schema::string());
    assert_eq!(
        decode(&schema, &[0x08, 0x7B]).unwrap(),
        Value::tuple(Value::Int(123), Value::String(String::new()))
    );
}

#[test]
fn empty_input_streaming_vs_plain() {
    // The streaming path yields an empty sequence for empty input...
    let mut stream = decoder(Schema::int());
    assert!(stream.feed(&[]).unwrap().is_empty());
    assert!(stream.finish().unwrap().is_empty());

    // ...while the plain decoder refuses it.
    let err = decode(&Schema::int(), &[]).unwrap_err();
    assert_eq!(err.to_string(), "no bytes to decode");
}

#[test]
fn unknown_wire_type_message() {
    let err = decode(&name_count_record(), &[0x0F]).unwrap_err();
    assert_eq!(err.to_string(), "Failed decoding key: unknown wire type");
}

#[test]
fn invalid_field_number_message() {
    let err = decode(&name_count_record(), &[0x00]).unwrap_err();
    assert_eq!(err.to_string(), "Failed decoding key: invalid field number");
}

#[test]
fn truncated_payload_message() {
    let err = decode(&name_count_record(), &[0x0A, 0x03, 0x46]).unwrap_err();
    assert_eq!(err.to_string(), "Unexpected end of chunk");
}

#[test]
fn fail_schema_both_directions() {
    let schema = Schema::fail("failing schema");

    let bytes = encode(&schema, &Value::Int(1)).unwrap();
    assert!(bytes.is_empty());

    let err = decode(&schema, &[0x08, 0x01]).unwrap_err();
    assert_eq!(err, Error::SchemaFail("failing schema".to_owned()));
    // The message wins even over empty input.
    let err = decode(&schema, &[]).unwrap_err();
    assert_eq!(err.to_string(), "failing schema");
}
