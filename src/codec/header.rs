//! Embedding File Header
//!
//! Both embedding formats open with the line `"<vocab_size> <vector_size>"`.

use std::io::{BufRead, Write};

use super::reader::ByteReader;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub vocab_size: usize,
    pub vector_size: usize,
}

impl Header {
    pub fn new(vocab_size: usize, vector_size: usize) -> Self {
        Self {
            vocab_size,
            vector_size,
        }
    }

    /// Parse the header line text
    pub fn parse(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 2 {
            return Err(Error::format(format!(
                "header must be \"<vocab_size> <vector_size>\", got {:?}",
                line
            )));
        }

        let parse = |token: &str, name: &str| {
            token.parse::<usize>().map_err(|_| {
                Error::format(format!("header {} is not an integer: {:?}", name, token))
            })
        };

        Ok(Self {
            vocab_size: parse(tokens[0], "vocab_size")?,
            vector_size: parse(tokens[1], "vector_size")?,
        })
    }

    /// Read and parse the first line of a stream
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let line = reader
            .read_line()?
            .ok_or_else(|| Error::format("empty file: missing header"))?;
        // Digits and spaces only, so any byte mapping works here.
        Self::parse(&String::from_utf8_lossy(&line))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{} {}", self.vocab_size, self.vector_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(Header::parse("71291 200").unwrap(), Header::new(71291, 200));
        assert_eq!(Header::parse("  3   4  ").unwrap(), Header::new(3, 4));
    }

    #[test]
    fn test_malformed_header() {
        for line in ["", "3", "3 4 5", "three 4", "3 4.5", "-1 4"] {
            let result = Header::parse(line);
            assert!(matches!(result, Err(Error::Format(_))), "{:?}", line);
        }
    }

    #[test]
    fn test_write_header() {
        let mut out = Vec::new();
        Header::new(2, 3).write(&mut out).unwrap();
        assert_eq!(out, b"2 3\n");
    }
}
