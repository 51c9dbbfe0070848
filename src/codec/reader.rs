//! Byte Stream Reader
//!
//! Byte, line and fixed-size reads over any buffered source, tracking
//! the offset for error messages.

use bytes::Bytes;
use std::io::{self, BufRead, Read};

use crate::error::{Error, Result};

pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: BufRead> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Look at the next byte without consuming it
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Next byte, or `None` at end of stream
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.inner.consume(1);
            self.position += 1;
        }
        Ok(byte)
    }

    /// Consume the next byte only if it equals `expected`
    pub fn skip_byte_if(&mut self, expected: u8) -> Result<bool> {
        if self.peek_byte()? == Some(expected) {
            self.read_byte()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Next line without its `\n` / `\r\n` terminator, or `None` at end of stream
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let n = self.inner.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Ok(None);
        }
        self.position += n as u64;

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Exactly `len` bytes; a short stream is a format error
    ///
    /// The buffer grows with the data actually read, so a bogus `len`
    /// fails on the short stream instead of allocating up front.
    pub fn read_exact(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = Vec::new();
        let n = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.position += n as u64;
        if n < len {
            return Err(Error::format(format!(
                "truncated payload: expected {} bytes, found {} before offset {}",
                len, n, self.position
            )));
        }
        Ok(Bytes::from(buf))
    }
}
