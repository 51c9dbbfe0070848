//! Single-Byte Word Decoding
//!
//! Word bytes in embedding files map one byte to one character.

use hashbrown::HashMap;

use crate::error::{Error, Result};

/// Byte to character table, with its inverse for writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteDecoder {
    table: [char; 256],
    reverse: HashMap<char, u8>,
}

impl Default for ByteDecoder {
    fn default() -> Self {
        Self::latin1()
    }
}

impl ByteDecoder {
    /// ISO-8859-1: byte `b` is code point `U+00b`
    pub fn latin1() -> Self {
        let mut table = ['\0'; 256];
        for (byte, slot) in table.iter_mut().enumerate() {
            *slot = char::from(byte as u8);
        }
        Self::from_table(table)
    }

    /// Custom code page. Later bytes win when two bytes share a character.
    pub fn from_table(table: [char; 256]) -> Self {
        let reverse = table
            .iter()
            .enumerate()
            .map(|(byte, ch)| (*ch, byte as u8))
            .collect();
        Self { table, reverse }
    }

    #[inline]
    pub fn decode_byte(&self, byte: u8) -> char {
        self.table[byte as usize]
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|b| self.decode_byte(*b)).collect()
    }

    /// Map characters back to their bytes
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        text.chars()
            .map(|ch| {
                self.reverse.get(&ch).copied().ok_or_else(|| {
                    Error::format(format!(
                        "character {:?} in {:?} has no single-byte encoding",
                        ch, text
                    ))
                })
            })
            .collect()
    }
}
