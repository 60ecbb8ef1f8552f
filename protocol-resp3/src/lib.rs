//! RESP3 value codec with partial-input detection.
//!
//! This crate converts values to and from a RESP3-style wire format. Decoding
//! tells three outcomes apart, so a caller reading from a socket knows whether
//! to wait for more bytes, stop, or give up:
//!
//! - **ok**: a complete record was decoded, along with its length in bytes.
//! - [`ParseError::Incomplete`]: the buffer holds part of a record. Append more
//!   bytes and decode again from the record's first byte.
//! - [`ParseError::EndOfInput`]: the buffer is empty. The stream ended cleanly
//!   between records.
//! - anything else: the input is malformed.
//!
//! Supported types:
//!   - Simple String (`+OK\r\n`)
//!   - Bulk String (`$6\r\nfoobar\r\n`)
//!   - Verbatim String (`=<len>\r\ntxt:<data>\r\n`)
//!   - Integer (`:1000\r\n`)
//!   - Float (`,3.140000\r\n`)
//!   - Boolean (`#t`/`#f`)
//!   - Null (`_\r\n`)
//!   - Simple Error (`-ERR message\r\n`)
//!   - Blob Error (`!<len>\r\n<error>\r\n`)
//!   - Array (`*<len>\r\n<elem>...`)
//!   - Map (`%<len>\r\n<key><val>...`)
//!
//! # Features
//!
//! - `serde` (default) - Encode any `serde::Serialize` type with [`encode`] and
//!   [`to_value`].
//!
//! # Example
//!
//! ```
//! use protocol_resp3::{ParseError, Value};
//!
//! let value = Value::array(vec!["key".into(), 42.into()]);
//! let wire = value.encode();
//! assert_eq!(wire, "*2\r\n+key\r\n:42\r\n");
//!
//! let (decoded, consumed) = Value::parse(wire.as_bytes()).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(consumed, wire.len());
//!
//! assert_eq!(Value::parse(b"$6\r\nfoo"), Err(ParseError::Incomplete));
//! assert_eq!(Value::parse(b""), Err(ParseError::EndOfInput));
//! ```

mod decode;
mod encode;
mod error;
mod line;
mod record;
#[cfg(feature = "serde")]
mod ser;
pub mod streaming;
mod value;

pub use decode::{
    DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_COLLECTION_ELEMENTS, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_TOTAL_ITEMS, DecodeOptions,
};
pub use encode::{MIXED_ARRAY_SIMPLE_STRING_MAX_LEN, SIMPLE_STRING_MAX_LEN, Sink};
pub use error::{EncodeError, ParseError};
pub use line::read_line_crlf;
pub use record::{Record, RecordResponse, ScalarRecord};
#[cfg(feature = "serde")]
pub use ser::{ValueSerializer, encode, to_value};
pub use streaming::Decoder;
pub use value::{Kind, Map, Value};

/// Decode one record from the front of `data`.
///
/// Equivalent to [`Value::parse`].
#[inline]
pub fn decode(data: &[u8]) -> Result<(Value, usize), ParseError> {
    Value::parse(data)
}
