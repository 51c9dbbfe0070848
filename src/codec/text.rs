//! word2vec Text Format
//!
//! Header line, then one `<word> <f32> ... <f32>` line per word.

use std::io::{BufRead, Write};
use tracing::debug;

use super::header::Header;
use super::reader::ByteReader;
use super::ByteDecoder;
use crate::config::LoadConfig;
use crate::error::{Error, Result};
use crate::vector::{normalize_vector, VectorMatrix, VectorRows};

/// Parse a text embedding stream into unit-normalized rows
///
/// Lines for words outside `config.desired_vocab` are skipped without
/// parsing their numbers.
pub fn parse_text<R: BufRead>(
    reader: R,
    config: &LoadConfig,
) -> Result<(Vec<String>, VectorMatrix)> {
    config.validate()?;
    let mut reader = ByteReader::new(reader);
    let header = Header::read(&mut reader)?;

    let mut vocab = Vec::new();
    let mut vectors = VectorMatrix::with_capacity(header.vector_size, 0);
    let mut row = Vec::new();

    for record in 0..header.vocab_size {
        let line = reader.read_line()?.ok_or_else(|| {
            Error::format(format!(
                "expected {} records, file ends after {}",
                header.vocab_size, record
            ))
        })?;
        let line = config.decoder.decode(&line);
        let mut fields = line.split_whitespace();

        let word = fields
            .next()
            .ok_or_else(|| Error::format(format!("record {} is empty", record)))?;
        let word = config.clamp_word(word.to_string());
        if !config.wants(&word) {
            continue;
        }

        row.clear();
        for token in fields {
            let value = token.parse::<f32>().map_err(|_| {
                Error::format(format!(
                    "record {} ({:?}): not a number: {:?}",
                    record, word, token
                ))
            })?;
            row.push(value);
        }
        if row.len() != header.vector_size {
            return Err(Error::format(format!(
                "record {} ({:?}): expected {} values, found {}",
                record,
                word,
                header.vector_size,
                row.len()
            )));
        }

        normalize_vector(&mut row);
        vocab.push(word);
        vectors.push_row(&row)?;
    }

    debug!(
        records = header.vocab_size,
        kept = vocab.len(),
        dim = header.vector_size,
        "Parsed text embeddings"
    );
    Ok((vocab, vectors))
}

/// Write rows in the text format
pub fn write_text<W, M>(
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

    for (i, word) in vocab.iter().enumerate() {
        writer.write_all(&decoder.encode(word)?)?;
        for x in vectors.row(i) {
            write!(writer, " {}", x)?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
