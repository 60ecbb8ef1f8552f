//! Incremental decoding over bytes that arrive in pieces.
//!
//! [`Decoder`] buffers everything it is given and hands whole records back
//! one at a time. A record split across reads is retried from its first byte
//! once the rest has arrived.
//!
//! ```
//! use protocol_resp3::{Decoder, Value};
//!
//! let mut decoder = Decoder::new();
//! decoder.extend(b"$6\r\nfoo");
//! assert_eq!(decoder.decode(), Ok(None));
//!
//! decoder.extend(b"bar\r\n:1\r\n");
//! assert_eq!(decoder.decode(), Ok(Some(Value::BulkString("foobar".into()))));
//! assert_eq!(decoder.decode(), Ok(Some(Value::Integer(1))));
//! assert_eq!(decoder.finish(), Ok(()));
//! ```

use crate::decode::DecodeOptions;
use crate::error::ParseError;
use crate::value::Value;
use bytes::{Buf, BytesMut};

/// Default initial buffer capacity.
const DEFAULT_CAPACITY: usize = 4096;

/// Accumulating RESP3 decoder.
///
/// Bytes that belong to a record not yet complete stay buffered. Decoded
/// records are dropped from the front in O(1) via `BytesMut::advance`.
#[derive(Debug)]
pub struct Decoder {
    buf: BytesMut,
    options: DecodeOptions,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Create a decoder with default limits.
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    /// Create a decoder with custom limits.
    pub fn with_options(options: DecodeOptions) -> Self {
        Decoder {
            buf: BytesMut::with_capacity(DEFAULT_CAPACITY),
            options,
        }
    }

    /// Append received bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes received but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discard all buffered bytes.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Decode the next complete record.
    ///
    /// Returns `Ok(None)` when the buffer is empty or holds only part of a
    /// record; nothing is consumed in that case.
    ///
    /// # Errors
    ///
    /// Returns the decode error for malformed input. The offending bytes stay
    /// buffered, so the stream cannot make progress until [`Decoder::reset`].
    pub fn decode(&mut self) -> Result<Option<Value>, ParseError> {
        match Value::parse_with_options(&self.buf, &self.options) {
            Ok((value, consumed)) => {
                self.buf.advance(consumed);
                Ok(Some(value))
            }
            Err(ParseError::Incomplete | ParseError::EndOfInput) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decode every complete record currently buffered.
    pub fn decode_all(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut values = Vec::new();
        while let Some(value) = self.decode()? {
            values.push(value);
        }
        Ok(values)
    }

    /// Signal that no more bytes will arrive.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Incomplete` if the stream ended mid-record.
    pub fn finish(&self) -> Result<(), ParseError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(ParseError::Incomplete)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_decoder() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(), Ok(None));
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.finish(), Ok(()));
    }

    #[test]
    fn test_byte_at_a_time() {
        let wire = b"*2\r\n+key1\r\n$6\r\nvalue1\r\n";
        let mut decoder = Decoder::new();
        for (i, byte) in wire.iter().enumerate() {
            decoder.extend(std::slice::from_ref(byte));
            let decoded = decoder.decode().unwrap();
            if i + 1 < wire.len() {
                assert_eq!(decoded, None, "decoded early at byte {i}");
            } else {
                assert_eq!(
                    decoded,
                    Some(Value::Array(vec![
                        Value::SimpleString("key1".into()),
                        Value::BulkString("value1".into()),
                    ]))
                );
            }
        }
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_pipelined_records() {
        let mut decoder = Decoder::new();
        decoder.extend(b"+OK\r\n:42\r\n#f\r\n_\r\n$3\r\nfo");
        assert_eq!(
            decoder.decode_all(),
            Ok(vec![
                Value::SimpleString("OK".into()),
                Value::Integer(42),
                Value::Boolean(false),
                Value::Null,
            ])
        );
        assert_eq!(decoder.buffered(), 6);
        assert_eq!(decoder.finish(), Err(ParseError::Incomplete));

        decoder.extend(b"o\r\n");
        assert_eq!(decoder.decode(), Ok(Some(Value::BulkString("foo".into()))));
        assert_eq!(decoder.finish(), Ok(()));
    }

    #[test]
    fn test_malformed_is_reported_and_kept() {
        let mut decoder = Decoder::new();
        decoder.extend(b"&\r\n");
        assert_eq!(decoder.decode(), Err(ParseError::UnsupportedType(b'&')));
        assert_eq!(decoder.buffered(), 3);
        decoder.reset();
        assert_eq!(decoder.decode(), Ok(None));
    }

    #[test]
    fn test_options_apply() {
        let mut decoder = Decoder::with_options(DecodeOptions::new().max_bulk_len(2));
        decoder.extend(b"$3\r\nabc\r\n");
        assert_eq!(
            decoder.decode(),
            Err(ParseError::BulkStringTooLong { len: 3, max: 2 })
        );
    }
}
