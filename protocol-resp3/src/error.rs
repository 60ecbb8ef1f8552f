//! Error types for RESP3 encoding and decoding.

/// Error type for RESP3 decoding operations.
///
/// Three outcomes are distinguished: [`ParseError::Incomplete`] (retry once
/// more bytes have arrived), [`ParseError::EndOfInput`] (clean end between
/// records) and everything else, which is malformed input and not retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Need more data to complete parsing.
    /// This is not a fatal error - the caller should buffer more data and retry
    /// from the start of the record.
    #[error("incomplete data")]
    Incomplete,

    /// No bytes were available where a new top-level record would start.
    #[error("end of input")]
    EndOfInput,

    /// Tag byte not in the RESP3 grammar.
    #[error("unsupported data type: {0:#04x}")]
    UnsupportedType(u8),

    /// Invalid integer format.
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid floating point number.
    #[error("invalid double: {0}")]
    InvalidDouble(String),

    /// Invalid length or count header.
    #[error("invalid length: {0}")]
    InvalidLength(String),

    /// A text payload is not valid UTF-8.
    #[error("invalid utf-8 in text payload")]
    InvalidUtf8,

    /// Protocol violation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Collection size exceeds maximum allowed limit.
    #[error("collection too large: {0} elements exceeds limit")]
    CollectionTooLarge(usize),

    /// Nesting depth exceeds maximum allowed limit.
    #[error("nesting too deep: depth {0} exceeds limit")]
    NestingTooDeep(usize),

    /// Bulk payload exceeds maximum allowed size.
    #[error("bulk string too long: {len} bytes exceeds {max} byte limit")]
    BulkStringTooLong { len: usize, max: usize },
}

impl ParseError {
    /// Returns true if this error indicates more data is needed.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete)
    }

    /// Returns true if the input ended cleanly before a new record.
    #[inline]
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, ParseError::EndOfInput)
    }

    /// Returns true if the input violates the wire format.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        !self.is_incomplete() && !self.is_end_of_input()
    }
}

/// Error type for RESP3 encoding operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The input has no encoding rule.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// An integer does not fit the signed 64-bit wire integer.
    #[error("integer out of range: {0}")]
    IntegerOutOfRange(String),

    /// Error raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),
}

#[cfg(feature = "serde")]
impl serde::ser::Error for EncodeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        EncodeError::Custom(msg.to_string())
    }
}
