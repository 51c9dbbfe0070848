//! word2vec Binary Format
//!
//! ```text
//! <vocab_size> <vector_size>\n
//! <word bytes> 0x20 <vector_size x f32 LE> \n      (vocab_size times)
//! ```
//!
//! Words carry no length prefix; they are read byte by byte up to the
//! first space.

use bytes::{Buf, BufMut, BytesMut};
use std::io::{BufRead, Write};
use tracing::debug;

use super::header::Header;
use super::prealloc_rows;
use super::reader::ByteReader;
use super::ByteDecoder;
use crate::config::LoadConfig;
use crate::error::{Error, Result};
use crate::vector::{normalize_vector, VectorMatrix, VectorRows};

const F32_SIZE: usize = std::mem::size_of::<f32>();

/// Parse a binary embedding stream into unit-normalized rows
///
/// Words rejected by `config.desired_vocab` are still read to keep the
/// stream aligned, then dropped; retained rows keep their file order.
pub fn parse_binary<R: BufRead>(
    reader: R,
    config: &LoadConfig,
) -> Result<(Vec<String>, VectorMatrix)> {
    config.validate()?;
    let mut reader = ByteReader::new(reader);
    let header = Header::read(&mut reader)?;

    let declared = config
        .desired_vocab
        .as_ref()
        .map(|set| set.len().min(header.vocab_size))
        .unwrap_or(header.vocab_size);
    let capacity = prealloc_rows(declared, header.vector_size);
    let mut vocab = Vec::with_capacity(capacity);
    let mut vectors = VectorMatrix::with_capacity(header.vector_size, capacity);
    let mut row = Vec::new();
    let payload_len = header
        .vector_size
        .checked_mul(F32_SIZE)
        .ok_or_else(|| Error::format(format!("vector size {} is too large", header.vector_size)))?;

    for record in 0..header.vocab_size {
        let word = read_word(&mut reader, config, record)?;
        let mut payload = reader.read_exact(payload_len)?;

        if config.wants(&word) {
            row.clear();
            row.extend((0..header.vector_size).map(|_| payload.get_f32_le()));
            normalize_vector(&mut row);
            vocab.push(word);
            vectors.push_row(&row)?;
        }

        reader.skip_byte_if(b'\n')?;
    }

    debug!(
        records = header.vocab_size,
        kept = vocab.len(),
        dim = header.vector_size,
        "Parsed binary embeddings"
    );
    Ok((vocab, vectors))
}

/// Read one space-terminated word
fn read_word<R: BufRead>(
    reader: &mut ByteReader<R>,
    config: &LoadConfig,
    record: usize,
) -> Result<String> {
    let mut word = String::new();
    loop {
        match reader.read_byte()? {
            Some(b' ') => break,
            Some(byte) => word.push(config.decoder.decode_byte(byte)),
            None => {
                return Err(Error::format(format!(
                    "unexpected end of file in word of record {} at offset {}",
                    record,
                    reader.position()
                )))
            }
        }
    }
    Ok(config.clamp_word(word))
}

/// Write rows in the binary format
pub fn write_binary<W, M>(
    writer: &mut W,
    vocab: &[String],
    vectors: &M,
    decoder: &ByteDecoder,
) -> Result<()>
where
    W: Write,
    M: VectorRows + ?Sized,
{
    if vocab.len() != vectors.len() {
        return Err(Error::DimensionMismatch {
            expected: vocab.len(),
            actual: vectors.len(),
        });
    }

    Header::new(vocab.len(), vectors.dim()).write(writer)?;

    let mut buf = BytesMut::with_capacity(vectors.dim() * F32_SIZE + 64);
    for (i, word) in vocab.iter().enumerate() {
        buf.clear();
        buf.put_slice(&decoder.encode(word)?);
        buf.put_u8(b' ');
        for x in vectors.row(i) {
            buf.put_f32_le(*x);
        }
        buf.put_u8(b'\n');
        writer.write_all(&buf)?;
    }
    writer.flush()?;
    Ok(())
}
