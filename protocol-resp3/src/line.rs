//! CRLF line reading over a byte buffer.
//!
//! Both framing and parsing build on [`read_line_crlf`]. It separates a buffer
//! that ended mid-line ([`ParseError::Incomplete`]) from one that had nothing
//! to read at all ([`ParseError::EndOfInput`]).

use crate::error::ParseError;

/// Read one `\r\n`-terminated line from the front of `data`.
///
/// Returns the line without its terminator and the number of bytes consumed,
/// terminator included. The line content is not interpreted.
///
/// # Errors
///
/// - [`ParseError::EndOfInput`] if `data` is empty.
/// - [`ParseError::Incomplete`] if no `\n` has arrived yet, or if the byte
///   before the first `\n` is not `\r`.
pub fn read_line_crlf(data: &[u8]) -> Result<(&[u8], usize), ParseError> {
    if data.is_empty() {
        return Err(ParseError::EndOfInput);
    }
    let newline = memchr::memchr(b'\n', data).ok_or(ParseError::Incomplete)?;
    if newline == 0 || data[newline - 1] != b'\r' {
        return Err(ParseError::Incomplete);
    }
    Ok((&data[..newline - 1], newline + 1))
}

/// Forward-only cursor over a byte buffer.
///
/// Every read checks that the bytes it needs are already present and fails
/// with [`ParseError::Incomplete`] otherwise, without advancing.
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Bytes available without waiting for more input.
    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn read_byte(&mut self) -> Result<u8, ParseError> {
        let byte = *self.data.get(self.pos).ok_or(ParseError::Incomplete)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a line inside a record. Running out of bytes here is always
    /// partial, never a clean end.
    pub(crate) fn read_line(&mut self) -> Result<&'a [u8], ParseError> {
        let data = self.data;
        let (line, consumed) = match read_line_crlf(&data[self.pos..]) {
            Err(ParseError::EndOfInput) => return Err(ParseError::Incomplete),
            other => other?,
        };
        self.pos += consumed;
        Ok(line)
    }

    pub(crate) fn read_exact(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < n {
            return Err(ParseError::Incomplete);
        }
        let data = self.data;
        let bytes = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        self.read_exact(n).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_with_crlf() {
        assert_eq!(
            read_line_crlf(b"Hello, World!\r\n"),
            Ok((&b"Hello, World!"[..], 15))
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(read_line_crlf(b"\r\n"), Ok((&b""[..], 2)));
    }

    #[test]
    fn test_line_ending_with_bare_lf_is_partial() {
        assert_eq!(read_line_crlf(b"Hello, World!\n"), Err(ParseError::Incomplete));
        assert_eq!(read_line_crlf(b"\n"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_line_without_terminator_is_partial() {
        assert_eq!(read_line_crlf(b"Incomplete line"), Err(ParseError::Incomplete));
        assert_eq!(read_line_crlf(b"Hello, World!\r"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_no_bytes_is_end_of_input() {
        assert_eq!(read_line_crlf(b""), Err(ParseError::EndOfInput));
    }

    #[test]
    fn test_reads_only_first_line() {
        assert_eq!(
            read_line_crlf(b"Hello\r\nWorld!\r\n"),
            Ok((&b"Hello"[..], 7))
        );
        assert_eq!(
            read_line_crlf(b"Hello, World!\r\nExtra data"),
            Ok((&b"Hello, World!"[..], 15))
        );
    }

    #[test]
    fn test_reader_sequence() {
        let mut reader = Reader::new(b"+OK\r\nab");
        assert_eq!(reader.read_byte(), Ok(b'+'));
        assert_eq!(reader.read_line(), Ok(&b"OK"[..]));
        assert_eq!(reader.position(), 5);
        assert_eq!(reader.read_exact(3), Err(ParseError::Incomplete));
        assert_eq!(reader.position(), 5);
        assert_eq!(reader.read_exact(2), Ok(&b"ab"[..]));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_exhaustion_is_partial() {
        let mut reader = Reader::new(b"");
        assert_eq!(reader.read_byte(), Err(ParseError::Incomplete));
        assert_eq!(reader.read_line(), Err(ParseError::Incomplete));
        assert_eq!(reader.skip(2), Err(ParseError::Incomplete));
    }
}
