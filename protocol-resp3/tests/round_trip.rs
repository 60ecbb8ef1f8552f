//! End-to-end tests through the public API: values are encoded, handed to the
//! decoder in the pieces a socket might deliver, and compared on the way out.

use protocol_resp3::{
    Decoder, Map, ParseError, Record, RecordResponse, ScalarRecord, Value, decode,
    read_line_crlf,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn round_trip(value: &Value) -> Value {
    let wire = value.encode();
    let (decoded, consumed) = decode(wire.as_bytes()).unwrap();
    assert_eq!(consumed, wire.len(), "trailing bytes for {wire:?}");
    decoded
}

/// Feed `wire` to a fresh decoder split at `at`.
fn decode_split(wire: &[u8], at: usize) -> Vec<Value> {
    let mut decoder = Decoder::new();
    decoder.extend(&wire[..at]);
    let mut values = decoder.decode_all().unwrap();
    decoder.extend(&wire[at..]);
    values.extend(decoder.decode_all().unwrap());
    decoder.finish().unwrap();
    values
}

// ── Scalars ─────────────────────────────────────────────────────────────

#[test]
fn scalars_round_trip() {
    let values = [
        Value::from("hello"),
        Value::from("This is a long string of length > 16"),
        Value::from(""),
        Value::from(i64::MIN),
        Value::from(0),
        Value::from(42.04),
        Value::from(-0.25),
        Value::from(true),
        Value::from(false),
        Value::Null,
        Value::error("ERR unknown command"),
    ];
    for value in &values {
        assert_eq!(&round_trip(value), value);
    }
}

#[test]
fn float_formatting_is_fixed_precision() {
    let value = Value::from(0.1 + 0.2);
    assert_eq!(value.encode(), ",0.300000\r\n");
    assert_eq!(round_trip(&value), Value::Float(0.3));
}

#[test]
fn blob_error_decodes_but_encodes_as_simple_error() {
    let (value, _) = decode(b"!21\r\nSYNTAX invalid syntax\r\n").unwrap();
    assert_eq!(value, Value::BlobError("SYNTAX invalid syntax".into()));
    assert_eq!(value.encode(), "-SYNTAX invalid syntax\r\n");
}

// ── Aggregates ──────────────────────────────────────────────────────────

#[test]
fn nested_aggregates_round_trip() {
    let value = Value::map(vec![
        ("name".into(), "ringbuffer".into()),
        ("sizes".into(), vec![64, 128, 256].into()),
        (
            "owners".into(),
            Value::map(vec![(1.into(), "alice".into()), (2.into(), "bob".into())]),
        ),
        ("tags".into(), Value::array(vec!["hot".into(), 7.into(), Value::Null])),
        ("empty".into(), Value::Map(Map::default())),
    ]);
    assert_eq!(round_trip(&value), value);
}

#[test]
fn mixed_key_map_round_trip() {
    let value = Value::map(vec![
        ("a".into(), 1.into()),
        (2.into(), true.into()),
        (Value::Boolean(false), "no".into()),
    ]);
    assert!(matches!(value.as_map(), Some(Map::Mixed(_))));
    assert_eq!(round_trip(&value), value);
}

#[test]
fn null_and_empty_are_distinct() {
    assert_eq!(decode(b"$-1\r\n"), Ok((Value::Null, 5)));
    assert_eq!(decode(b"$0\r\n\r\n"), Ok((Value::BulkString(String::new()), 6)));
    assert_eq!(decode(b"*-1\r\n"), Ok((Value::Null, 5)));
    assert_eq!(decode(b"*0\r\n"), Ok((Value::Array(vec![]), 4)));
}

// ── Partial input ───────────────────────────────────────────────────────

#[test]
fn partial_bulk_string_completes_after_more_bytes() {
    let mut buf = b"$6\r\nfoo".to_vec();
    assert_eq!(decode(&buf), Err(ParseError::Incomplete));
    buf.extend_from_slice(b"bar\r\n");
    assert_eq!(decode(&buf), Ok((Value::BulkString("foobar".into()), 11)));
}

#[test]
fn partial_integer_is_not_malformed() {
    let err = decode(b":").unwrap_err();
    assert!(err.is_incomplete());
    assert!(!err.is_malformed());
}

#[test]
fn every_split_point_yields_the_same_records() {
    let records = [
        Value::from("OK"),
        Value::map(vec![("key1".into(), "value1".into()), (":".into(), 2.into())]),
        Value::from(vec![1.5, 2.5]),
        Value::from("a bulk string that spans\r\nlines"),
    ];
    let wire: String = records.iter().map(Value::encode).collect();
    let wire = wire.as_bytes();
    for at in 0..=wire.len() {
        assert_eq!(decode_split(wire, at), records, "split at {at}");
    }
}

#[test]
fn stream_closed_mid_record_is_reported() {
    let mut decoder = Decoder::new();
    decoder.extend(b"*2\r\n:1\r\n");
    assert_eq!(decoder.decode(), Ok(None));
    assert_eq!(decoder.finish(), Err(ParseError::Incomplete));
}

#[test]
fn clean_end_between_records() {
    assert_eq!(decode(b""), Err(ParseError::EndOfInput));
    assert_eq!(read_line_crlf(b""), Err(ParseError::EndOfInput));
}

// ── Malformed input ─────────────────────────────────────────────────────

#[test]
fn unsupported_tag_is_malformed() {
    let err = decode(b"&\r\n").unwrap_err();
    assert_eq!(err, ParseError::UnsupportedType(b'&'));
    assert!(err.is_malformed());
    assert!(!err.is_incomplete());
}

#[test]
fn nested_malformed_element_propagates() {
    let err = decode(b"%2\r\n+k\r\n:notanumber\r\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidInteger(_)));
}

// ── Records ─────────────────────────────────────────────────────────────

#[test]
fn record_types_decode_as_text_maps() {
    let record = ScalarRecord {
        value: Value::from(vec!["a", "b"]),
        kind: 3,
        lat: 1_700_000_000_000,
        expiry: 0,
    };
    let decoded = round_trip(&record.to_value());
    let map = decoded.as_map().unwrap();
    assert_eq!(map.len(), 4);
    assert_eq!(map.get_text("Type"), Some(&Value::Integer(3)));
    assert_eq!(map.get_text("LAT"), Some(&Value::Integer(1_700_000_000_000)));

    let response = RecordResponse::new(Value::Null, 404);
    assert_eq!(response.encode(), "%4\r\n+Value\r\n_\r\n+Code\r\n:404\r\n");
}

#[cfg(feature = "serde")]
#[test]
fn serde_and_record_projections_agree() {
    let response = RecordResponse::new(Value::map(vec![(1.into(), "one".into())]), 200);
    assert_eq!(protocol_resp3::encode(&response).unwrap(), response.encode());

    let record = ScalarRecord {
        value: Value::from("v"),
        kind: 1,
        lat: 10,
        expiry: -1,
    };
    assert_eq!(protocol_resp3::to_value(&record).unwrap(), record.to_value());
}
