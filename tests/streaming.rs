//! Streaming behaviour: equivalence with the plain codec and indifference
//! to chunk boundaries.

use proptest::prelude::*;
use schemabuf::{decode, decoder, encode, encoder, Case, Error, Field, Schema, Value};

fn person_schema() -> Schema {
    Schema::record(vec![
        Field::new("name", Schema::string()),
        Field::new("age", Schema::int()),
        Field::new("scores", Schema::sequence(Schema::long())),
        Field::new("email", Schema::optional(Schema::string())),
    ])
}

fn person_value() -> Value {
    Value::record(vec![
        Value::from("Alice"),
        Value::from(30),
        Value::sequence(vec![Value::Long(-1), Value::Long(1 << 40)]),
        Value::some(Value::from("alice@example.com")),
    ])
}

#[test]
fn stream_encoder_equals_plain_encode() {
    let schema = person_schema();
    let value = person_value();
    let stream = encoder(schema.clone());
    assert_eq!(
        stream.feed(&value).unwrap(),
        encode(&schema, &value).unwrap()
    );
}

#[test]
fn encoder_to_decoder_pipe() {
    let schema = person_schema();
    let value = person_value();

    let bytes = encoder(schema.clone()).feed(&value).unwrap();
    let mut stream = decoder(schema);
    stream.feed(&bytes).unwrap();
    assert_eq!(stream.finish().unwrap(), vec![value]);
}

#[test]
fn byte_at_a_time() {
    let schema = person_schema();
    let value = person_value();
    let bytes = encode(&schema, &value).unwrap();

    let mut stream = decoder(schema);
    for byte in bytes.iter() {
        assert!(stream.feed(std::slice::from_ref(byte)).unwrap().is_empty());
    }
    assert_eq!(stream.finish().unwrap(), vec![value]);
}

#[test]
fn empty_chunks_are_harmless() {
    let schema = person_schema();
    let value = person_value();
    let bytes = encode(&schema, &value).unwrap();

    let mut stream = decoder(schema);
    stream.feed(&[]).unwrap();
    stream.feed(&bytes[..3]).unwrap();
    stream.feed(&[]).unwrap();
    stream.feed(&bytes[3..]).unwrap();
    assert_eq!(stream.finish().unwrap(), vec![value]);
}

#[test]
fn enumeration_survives_chunk_split() {
    let schema = Schema::enumeration(vec![
        Case::new("text", Schema::string()),
        Case::new("number", Schema::int()),
    ]);
    let value = Value::case(1, Value::Int(482));
    let bytes = encode(&schema, &value).unwrap();

    // Split between the case key and its payload.
    let mut stream = decoder(schema);
    stream.feed(&bytes[..1]).unwrap();
    stream.feed(&bytes[1..]).unwrap();
    assert_eq!(stream.finish().unwrap(), vec![value]);
}

#[test]
fn truncated_stream_fails_at_finish() {
    let schema = person_schema();
    let bytes = encode(&schema, &person_value()).unwrap();

    let mut stream = decoder(schema);
    stream.feed(&bytes[..bytes.len() - 1]).unwrap();
    assert_eq!(stream.finish(), Err(Error::UnexpectedEndOfChunk));
}

#[test]
fn malformed_stream_poisons_the_decoder() {
    let mut stream = decoder(person_schema());
    // Wire type 7 in the first key is a terminal error.
    stream.feed(&[0x0F]).unwrap();
    let err = stream.finish().unwrap_err();
    assert_eq!(err.to_string(), "Failed decoding key: unknown wire type");

    assert!(stream.feed(&[0x08]).is_err());
    assert!(stream.finish().is_err());
}

#[test]
fn fail_schema_terminates_the_stream() {
    // A failing schema needs no input, so the very first feed reports it.
    let mut stream = decoder(Schema::fail("failing schema"));
    assert_eq!(
        stream.feed(&[0x08, 0x01]),
        Err(Error::SchemaFail("failing schema".to_owned()))
    );
    assert_eq!(
        stream.finish(),
        Err(Error::SchemaFail("failing schema".to_owned()))
    );
}

#[test]
fn fresh_decoder_restarts_the_frame() {
    let schema = person_schema();
    let value = person_value();
    let bytes = encode(&schema, &value).unwrap();

    // Drop a decoder mid-frame; a new one is unaffected by the old state.
    let mut stream = decoder(schema.clone());
    stream.feed(&bytes[..2]).unwrap();
    drop(stream);

    let mut stream = decoder(schema);
    stream.feed(&bytes).unwrap();
    assert_eq!(stream.finish().unwrap(), vec![value]);
}

proptest! {
    /// Any partitioning of the same bytes decodes to the same value.
    #[test]
    fn proptest_chunk_boundary_invariance(
        age in 0i32..200,
        name in ".{0,12}",
        scores in proptest::collection::vec(any::<i64>(), 0..6),
        cuts in proptest::collection::vec(0usize..64, 0..6),
    ) {
        let schema = person_schema();
        let value = Value::record(vec![
            Value::String(name),
            Value::Int(age),
            Value::sequence(scores.into_iter().map(Value::Long).collect()),
            Value::none(),
        ]);
        let bytes = encode(&schema, &value).unwrap();

        // Reference: the whole stream in one chunk.
        let mut reference = decoder(schema.clone());
        reference.feed(&bytes).unwrap();
        let expected = reference.finish().unwrap();
        prop_assert_eq!(&expected, &vec![value.clone()]);
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);

        // Split at the sorted, clamped cut points.
        let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c % (bytes.len() + 1)).collect();
        cuts.sort_unstable();
        let mut stream = decoder(schema);
        let mut start = 0;
        for cut in cuts {
            stream.feed(&bytes[start..cut.max(start)]).unwrap();
            start = cut.max(start);
        }
        stream.feed(&bytes[start..]).unwrap();
        prop_assert_eq!(stream.finish().unwrap(), expected);
    }
}
