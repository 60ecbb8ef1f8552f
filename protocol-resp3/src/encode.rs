//! RESP3 encoding.
//!
//! Framing rules:
//! - Text up to [`SIMPLE_STRING_MAX_LEN`] bytes is a simple string, longer text
//!   is a bulk string with its exact byte length.
//! - Inside a heterogeneous array text uses [`MIXED_ARRAY_SIMPLE_STRING_MAX_LEN`]
//!   instead. An array is homogeneous when every element is the same scalar kind.
//! - Map keys that are text are always simple strings.
//! - Floats use six fractional digits (`,3.140000\r\n`).
//! - Both error values encode as simple errors.

use crate::value::{Map, Value};
use bytes::{BufMut, BytesMut};

/// Longest text, in bytes, that encodes as a simple string.
pub const SIMPLE_STRING_MAX_LEN: usize = 16;

/// Longest text, in bytes, that encodes as a simple string inside a
/// heterogeneous array.
pub const MIXED_ARRAY_SIMPLE_STRING_MAX_LEN: usize = 12;

/// Destination for encoded output.
pub trait Sink {
    /// Append `s` to the output.
    fn put(&mut self, s: &str);
}

impl Sink for String {
    #[inline]
    fn put(&mut self, s: &str) {
        self.push_str(s);
    }
}

impl Sink for BytesMut {
    #[inline]
    fn put(&mut self, s: &str) {
        self.put_slice(s.as_bytes());
    }
}

impl Sink for Vec<u8> {
    #[inline]
    fn put(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
    }
}

/// Counts bytes without storing them.
#[derive(Default)]
struct Counter(usize);

impl Sink for Counter {
    #[inline]
    fn put(&mut self, s: &str) {
        self.0 += s.len();
    }
}

impl Value {
    /// Encode this value into its wire form.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Encode this value, appending to `out`.
    pub fn encode_into<S: Sink + ?Sized>(&self, out: &mut S) {
        write_value(out, self);
    }

    /// Encode this value into a byte buffer.
    pub fn encode_bytes(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        write_value(buf, self);
    }

    /// Calculate the encoded length of this value.
    pub fn encoded_len(&self) -> usize {
        let mut counter = Counter::default();
        write_value(&mut counter, self);
        counter.0
    }
}

// ============================================================================
// Encoding helpers
// ============================================================================

fn write_value<S: Sink + ?Sized>(out: &mut S, value: &Value) {
    match value {
        Value::SimpleString(s) | Value::BulkString(s) | Value::VerbatimString(s) => {
            write_text(out, s, SIMPLE_STRING_MAX_LEN)
        }
        Value::Integer(n) => write_integer(out, *n),
        Value::Float(f) => write_float(out, *f),
        Value::Boolean(b) => out.put(if *b { "#t\r\n" } else { "#f\r\n" }),
        Value::Null => out.put("_\r\n"),
        Value::SimpleError(msg) | Value::BlobError(msg) => write_line(out, "-", msg),
        Value::Array(elements) => write_array(out, elements),
        Value::Map(map) => write_map(out, map),
    }
}

/// Simple string up to `max_simple` bytes, bulk string beyond.
fn write_text<S: Sink + ?Sized>(out: &mut S, s: &str, max_simple: usize) {
    if s.len() <= max_simple {
        write_line(out, "+", s);
    } else {
        write_header(out, "$", s.len());
        out.put(s);
        out.put("\r\n");
    }
}

fn write_line<S: Sink + ?Sized>(out: &mut S, tag: &str, s: &str) {
    out.put(tag);
    out.put(s);
    out.put("\r\n");
}

fn write_header<S: Sink + ?Sized>(out: &mut S, tag: &str, len: usize) {
    let mut buf = itoa::Buffer::new();
    out.put(tag);
    out.put(buf.format(len));
    out.put("\r\n");
}

fn write_integer<S: Sink + ?Sized>(out: &mut S, n: i64) {
    let mut buf = itoa::Buffer::new();
    out.put(":");
    out.put(buf.format(n));
    out.put("\r\n");
}

fn write_float<S: Sink + ?Sized>(out: &mut S, f: f64) {
    out.put(",");
    if f.is_nan() {
        out.put("nan");
    } else if f.is_infinite() {
        out.put(if f.is_sign_positive() { "inf" } else { "-inf" });
    } else {
        out.put(&format!("{f:.6}"));
    }
    out.put("\r\n");
}

fn write_array<S: Sink + ?Sized>(out: &mut S, elements: &[Value]) {
    write_header(out, "*", elements.len());
    if is_homogeneous(elements) {
        for element in elements {
            write_value(out, element);
        }
        return;
    }
    for element in elements {
        match element.as_str() {
            Some(s) => write_text(out, s, MIXED_ARRAY_SIMPLE_STRING_MAX_LEN),
            None => write_value(out, element),
        }
    }
}

/// An array is homogeneous when all elements share one scalar kind.
fn is_homogeneous(elements: &[Value]) -> bool {
    let Some(first) = elements.first() else {
        return true;
    };
    let kind = first.kind();
    kind.is_scalar() && elements.iter().all(|e| e.kind() == kind)
}

fn write_map<S: Sink + ?Sized>(out: &mut S, map: &Map) {
    write_header(out, "%", map.len() * 2);
    match map {
        Map::Text(entries) => {
            for (key, value) in entries {
                write_line(out, "+", key);
                write_value(out, value);
            }
        }
        Map::Integer(entries) => {
            for (key, value) in entries {
                write_integer(out, *key);
                write_value(out, value);
            }
        }
        Map::Mixed(entries) => {
            for (key, value) in entries {
                write_key(out, key);
                write_value(out, value);
            }
        }
    }
}

fn write_key<S: Sink + ?Sized>(out: &mut S, key: &Value) {
    match key.as_str() {
        Some(s) => write_line(out, "+", s),
        None => write_value(out, key),
    }
}
