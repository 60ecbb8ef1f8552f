//! RESP3 decoding.
//!
//! A record is decoded from the front of a byte buffer. The buffer is never
//! modified: on success the caller learns how many bytes the record occupied,
//! and on [`ParseError::Incomplete`] the caller appends more bytes and decodes
//! again from the same start. Decoding does not resume mid-record.

use crate::error::ParseError;
use crate::line::Reader;
use crate::value::{Map, Value};

/// Default maximum nesting depth for arrays and maps.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum declared element count of a single array or map.
pub const DEFAULT_MAX_COLLECTION_ELEMENTS: usize = 1024 * 1024;

/// Default maximum declared payload length of a bulk string, verbatim string
/// or blob error (512MB, the RESP bulk string limit).
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default maximum element count summed over every array and map in one
/// record.
///
/// The per-collection limit alone does not bound nested headers: each level
/// may declare a full-size collection before any element has arrived.
pub const DEFAULT_MAX_TOTAL_ITEMS: usize = 1024 * 1024;

/// Smallest possible encoded record (`_\r\n`).
const MIN_RECORD_LEN: usize = 3;

/// Configuration options for RESP3 decoding.
///
/// Limits are checked against declared lengths before anything is allocated.
/// Exceeding one is a malformed-input error, not a partial one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth for arrays and maps.
    pub max_depth: usize,
    /// Maximum declared element count of an array, or value count of a map.
    pub max_collection_elements: usize,
    /// Maximum declared length of a length-prefixed payload.
    pub max_bulk_len: usize,
    /// Maximum declared element count across all collections in one record.
    pub max_total_items: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    /// Create new decode options with default values.
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_elements: DEFAULT_MAX_COLLECTION_ELEMENTS,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_total_items: DEFAULT_MAX_TOTAL_ITEMS,
        }
    }

    /// Set the maximum nesting depth.
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum collection element count.
    pub const fn max_collection_elements(mut self, count: usize) -> Self {
        self.max_collection_elements = count;
        self
    }

    /// Set the maximum bulk payload length.
    pub const fn max_bulk_len(mut self, len: usize) -> Self {
        self.max_bulk_len = len;
        self
    }

    /// Set the maximum total element count across nested collections.
    pub const fn max_total_items(mut self, count: usize) -> Self {
        self.max_total_items = count;
        self
    }
}

impl Value {
    /// Parse a RESP3 value from the front of a byte buffer.
    ///
    /// Returns the parsed value and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::EndOfInput` if `data` is empty.
    /// Returns `ParseError::Incomplete` if more data is needed to complete the record.
    /// Returns other errors for malformed data.
    #[inline]
    pub fn parse(data: &[u8]) -> Result<(Self, usize), ParseError> {
        Self::parse_with_options(data, &DecodeOptions::default())
    }

    /// Parse a RESP3 value with custom limits.
    pub fn parse_with_options(
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<(Self, usize), ParseError> {
        if data.is_empty() {
            return Err(ParseError::EndOfInput);
        }
        let mut reader = Reader::new(data);
        let mut total_items = 0;
        let value = decode_value(&mut reader, options, 0, &mut total_items)?;
        Ok((value, reader.position()))
    }
}

/// Decode one record. The tag byte must be present; exhaustion anywhere
/// below this point is partial.
fn decode_value(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
    total_items: &mut usize,
) -> Result<Value, ParseError> {
    match reader.read_byte()? {
        b'+' => Ok(Value::SimpleString(read_text_line(reader)?)),
        b'-' => Ok(Value::SimpleError(read_text_line(reader)?)),
        b':' => decode_integer(reader),
        b',' => decode_float(reader),
        b'$' => Ok(decode_bulk(reader, options)?.map_or(Value::Null, Value::BulkString)),
        b'=' => decode_verbatim(reader, options),
        b'!' => decode_blob_error(reader, options),
        b'#' => decode_boolean(reader),
        b'_' => {
            reader.skip(2)?;
            Ok(Value::Null)
        }
        b'*' => decode_array(reader, options, depth, total_items),
        b'%' => decode_map(reader, options, depth, total_items),
        other => Err(ParseError::UnsupportedType(other)),
    }
}

// ============================================================================
// Scalars
// ============================================================================

fn read_text_line(reader: &mut Reader<'_>) -> Result<String, ParseError> {
    let line = reader.read_line()?;
    to_text(line)
}

fn to_text(bytes: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| ParseError::InvalidUtf8)
}

/// Parse an integer: :1000\r\n
fn decode_integer(reader: &mut Reader<'_>) -> Result<Value, ParseError> {
    let line = reader.read_line()?;
    if line.is_empty() {
        return Err(ParseError::Incomplete);
    }
    let s = std::str::from_utf8(line).map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    let value: i64 = s
        .parse()
        .map_err(|e: std::num::ParseIntError| ParseError::InvalidInteger(e.to_string()))?;
    Ok(Value::Integer(value))
}

/// Parse a float: ,3.14\r\n
fn decode_float(reader: &mut Reader<'_>) -> Result<Value, ParseError> {
    let line = reader.read_line()?;
    let s = std::str::from_utf8(line).map_err(|e| ParseError::InvalidDouble(e.to_string()))?;
    let value = match s {
        "inf" => f64::INFINITY,
        "-inf" => f64::NEG_INFINITY,
        "nan" => f64::NAN,
        _ => s
            .parse()
            .map_err(|e: std::num::ParseFloatError| ParseError::InvalidDouble(e.to_string()))?,
    };
    Ok(Value::Float(value))
}

/// Parse a boolean: #t\r\n. Anything other than `t` is false and the two
/// bytes after it are not inspected.
fn decode_boolean(reader: &mut Reader<'_>) -> Result<Value, ParseError> {
    let flag = reader.read_exact(3)?[0];
    Ok(Value::Boolean(flag == b't'))
}

// ============================================================================
// Length-prefixed payloads
// ============================================================================

/// Read a length or count header line.
fn read_length(reader: &mut Reader<'_>) -> Result<i64, ParseError> {
    let line = reader.read_line()?;
    let s = std::str::from_utf8(line).map_err(|e| ParseError::InvalidLength(e.to_string()))?;
    s.parse()
        .map_err(|e: std::num::ParseIntError| ParseError::InvalidLength(e.to_string()))
}

/// Validate a non-negative payload length against the options.
fn payload_len(len: i64, options: &DecodeOptions) -> Result<usize, ParseError> {
    let len = usize::try_from(len).map_err(|_| ParseError::InvalidLength(len.to_string()))?;
    if len > options.max_bulk_len {
        return Err(ParseError::BulkStringTooLong {
            len,
            max: options.max_bulk_len,
        });
    }
    Ok(len)
}

/// Read `len` payload bytes and their trailing CRLF. The whole span must be
/// available before anything is consumed.
fn read_payload<'a>(reader: &mut Reader<'a>, len: usize) -> Result<&'a [u8], ParseError> {
    let total = len
        .checked_add(2)
        .ok_or_else(|| ParseError::InvalidLength("length overflow".to_string()))?;
    let framed = reader.read_exact(total)?;
    if &framed[len..] != b"\r\n" {
        return Err(ParseError::Protocol("missing trailing CRLF".to_string()));
    }
    Ok(&framed[..len])
}

/// Parse a bulk string body: 6\r\nfoobar\r\n. `None` for the null length.
fn decode_bulk(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
) -> Result<Option<String>, ParseError> {
    let len = read_length(reader)?;
    if len == -1 {
        return Ok(None);
    }
    let len = payload_len(len, options)?;
    let payload = read_payload(reader, len)?;
    to_text(payload).map(Some)
}

/// Parse a verbatim string: =15\r\ntxt:Some string\r\n
///
/// A `xxx:` format prefix is dropped. A zero length yields an empty string
/// with nothing after the header.
fn decode_verbatim(reader: &mut Reader<'_>, options: &DecodeOptions) -> Result<Value, ParseError> {
    let len = read_length(reader)?;
    match len {
        -1 => return Ok(Value::Null),
        0 => return Ok(Value::VerbatimString(String::new())),
        _ => {}
    }
    let len = payload_len(len, options)?;
    let payload = read_payload(reader, len)?;
    let data = match payload {
        [_, _, _, b':', data @ ..] => data,
        _ => payload,
    };
    to_text(data).map(Value::VerbatimString)
}

/// Parse a blob error: !21\r\nSYNTAX invalid syntax\r\n
fn decode_blob_error(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
) -> Result<Value, ParseError> {
    let len = read_length(reader)?;
    let len = payload_len(len, options)?;
    let payload = read_payload(reader, len)?;
    to_text(payload).map(Value::BlobError)
}

// ============================================================================
// Aggregates
// ============================================================================

/// Read an aggregate's count header. `None` for the null count (-1).
///
/// The count is charged to `total_items` before the caller allocates.
fn read_count(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
    total_items: &mut usize,
) -> Result<Option<usize>, ParseError> {
    if depth >= options.max_depth {
        return Err(ParseError::NestingTooDeep(depth));
    }
    let count = read_length(reader)?;
    if count == -1 {
        return Ok(None);
    }
    let count = usize::try_from(count).map_err(|_| ParseError::InvalidLength(count.to_string()))?;
    if count > options.max_collection_elements {
        return Err(ParseError::CollectionTooLarge(count));
    }
    *total_items = total_items
        .checked_add(count)
        .ok_or(ParseError::CollectionTooLarge(usize::MAX))?;
    if *total_items > options.max_total_items {
        return Err(ParseError::CollectionTooLarge(*total_items));
    }
    // Every element needs at least MIN_RECORD_LEN bytes.
    if reader.remaining() < count.saturating_mul(MIN_RECORD_LEN) {
        return Err(ParseError::Incomplete);
    }
    Ok(Some(count))
}

/// Decode a nested element. The parent's tag was already read, so running
/// out of bytes here is partial.
#[inline]
fn decode_element(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
    total_items: &mut usize,
) -> Result<Value, ParseError> {
    decode_value(reader, options, depth + 1, total_items)
}

/// Parse an array: *2\r\n...
fn decode_array(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
    total_items: &mut usize,
) -> Result<Value, ParseError> {
    let Some(count) = read_count(reader, options, depth, total_items)? else {
        return Ok(Value::Null);
    };
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(decode_element(reader, options, depth, total_items)?);
    }
    Ok(Value::Array(elements))
}

/// Parse a map: %4\r\n<key><val><key><val>. The header counts keys and values.
fn decode_map(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
    total_items: &mut usize,
) -> Result<Value, ParseError> {
    let Some(count) = read_count(reader, options, depth, total_items)? else {
        return Ok(Value::Null);
    };
    if count % 2 == 1 {
        return Err(ParseError::Protocol(format!(
            "map declares {count} elements, expected an even count"
        )));
    }
    let mut pairs = Vec::with_capacity(count / 2);
    for _ in 0..count / 2 {
        let key = decode_element(reader, options, depth, total_items)?;
        let value = decode_element(reader, options, depth, total_items)?;
        pairs.push((key, value));
    }
    Ok(Value::Map(resolve_map(pairs)))
}

/// Pick the container for a fully decoded map.
///
/// Runs only after every pair is decoded, since the kind of a later key is
/// unknown until it is parsed. Pairs whose key is null are dropped.
pub(crate) fn resolve_map(pairs: Vec<(Value, Value)>) -> Map {
    let pairs = pairs.into_iter().filter(|(key, _)| !key.is_null()).collect();
    Map::from_pairs(pairs)
}
