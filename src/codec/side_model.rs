//! Hidden-Layer File Parsing
//!
//! `<base>.syn1`: a header of `key value` integer pairs, then
//! `<key> <f32> ... <f32>` rows. `<base>.vocab` (hierarchical softmax
//! only): `<word> <codelen> <point>{codelen} <code>{codelen}` lines.

use hashbrown::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::reader::ByteReader;
use super::ByteDecoder;
use crate::error::{Error, Result};
use crate::training::{HuffmanCode, Syn1Key, TrainSideModel};

const KNOWN_KEYS: &[&str] = &["layer1_size", "window", "cbow", "hs", "neg", "syn1_size"];

/// `<base>.<extension>`, appended rather than replacing any extension
pub fn sibling_path(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Load the side model stored next to `base`
///
/// Returns `Ok(None)` when `<base>.syn1` does not exist. When the header
/// enables hierarchical softmax, `<base>.vocab` must exist.
pub fn parse_side_model(base: &Path, decoder: &ByteDecoder) -> Result<Option<TrainSideModel>> {
    let syn1_path = sibling_path(base, "syn1");
    if !syn1_path.is_file() {
        debug!(path = %syn1_path.display(), "No hidden-layer model");
        return Ok(None);
    }

    let mut model = parse_syn1(BufReader::new(File::open(&syn1_path)?), decoder)?;

    if model.hs {
        let vocab_path = sibling_path(base, "vocab");
        if !vocab_path.is_file() {
            return Err(Error::format(format!(
                "{} enables hierarchical softmax but {} is missing",
                syn1_path.display(),
                vocab_path.display()
            )));
        }
        let codes = parse_huffman_vocab(BufReader::new(File::open(&vocab_path)?), decoder)?;
        model.vocab = Some(codes);
    }

    debug!(
        layer1_size = model.layer1_size,
        window = model.window,
        cbow = model.cbow,
        hs = model.hs,
        neg = model.neg,
        rows = model.syn1.len(),
        "Loaded hidden-layer model"
    );
    Ok(Some(model))
}

/// Parse a `.syn1` stream; `vocab` is left empty
pub fn parse_syn1<R: BufRead>(reader: R, decoder: &ByteDecoder) -> Result<TrainSideModel> {
    let mut reader = ByteReader::new(reader);
    let header = reader
        .read_line()?
        .ok_or_else(|| Error::format("empty syn1 file: missing header"))?;
    let params = parse_params(&decoder.decode(&header))?;

    let field = |key: &str| -> Result<usize> {
        let value = params
            .get(key)
            .copied()
            .ok_or_else(|| Error::format(format!("syn1 header is missing {:?}", key)))?;
        usize::try_from(value)
            .map_err(|_| Error::format(format!("syn1 header {:?} is negative: {}", key, value)))
    };

    let layer1_size = field("layer1_size")?;
    let window = field("window")?;
    let cbow = field("cbow")? != 0;
    let hs = field("hs")? != 0;
    let neg = field("neg")?;

    let mut syn1 = HashMap::new();
    let mut line_no = 1;
    while let Some(line) = reader.read_line()? {
        line_no += 1;
        let line = decoder.decode(&line);
        let mut fields = line.split_whitespace();
        let Some(key) = fields.next() else {
            continue;
        };

        let key = if hs {
            Syn1Key::Node(key.parse().map_err(|_| {
                Error::format(format!("syn1 line {}: node id is not an integer: {:?}", line_no, key))
            })?)
        } else {
            Syn1Key::Word(key.to_string())
        };

        let weights = fields
            .map(|token| {
                token.parse::<f32>().map_err(|_| {
                    Error::format(format!("syn1 line {}: not a number: {:?}", line_no, token))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        if weights.len() != layer1_size {
            return Err(Error::format(format!(
                "syn1 line {}: expected {} values, found {}",
                line_no,
                layer1_size,
                weights.len()
            )));
        }

        if syn1.insert(key.clone(), weights).is_some() {
            return Err(Error::format(format!("syn1 line {}: duplicate {}", line_no, key)));
        }
    }

    let syn1_size = match params.get("syn1_size") {
        Some(_) => field("syn1_size")?,
        None => syn1.len(),
    };

    Ok(TrainSideModel {
        layer1_size,
        window,
        cbow,
        hs,
        neg,
        syn1_size,
        syn1,
        vocab: None,
    })
}

fn parse_params(line: &str) -> Result<HashMap<String, i64>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(Error::format(format!(
            "syn1 header must hold key/value pairs, got {} tokens",
            tokens.len()
        )));
    }

    let mut params = HashMap::new();
    for pair in tokens.chunks_exact(2) {
        let value = pair[1].parse::<i64>().map_err(|_| {
            Error::format(format!(
                "syn1 header value for {:?} is not an integer: {:?}",
                pair[0], pair[1]
            ))
        })?;
        if !KNOWN_KEYS.contains(&pair[0]) {
            warn!(key = pair[0], value, "Ignoring unknown syn1 header key");
        }
        params.insert(pair[0].to_string(), value);
    }
    Ok(params)
}

/// Parse a `.vocab` stream of Huffman paths
pub fn parse_huffman_vocab<R: BufRead>(
    reader: R,
    decoder: &ByteDecoder,
) -> Result<HashMap<String, HuffmanCode>> {
    let mut reader = ByteReader::new(reader);
    let mut codes = HashMap::new();
    let mut line_no = 0;

    while let Some(line) = reader.read_line()? {
        line_no += 1;
        let line = decoder.decode(&line);
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < 2 {
            return Err(Error::format(format!("vocab line {}: missing codelen", line_no)));
        }

        let codelen: usize = tokens[1].parse().map_err(|_| {
            Error::format(format!("vocab line {}: codelen is not an integer: {:?}", line_no, tokens[1]))
        })?;
        let fields = codelen
            .checked_mul(2)
            .and_then(|n| n.checked_add(2))
            .ok_or_else(|| Error::format(format!("vocab line {}: codelen {} is too large", line_no, codelen)))?;
        if tokens.len() != fields {
            return Err(Error::format(format!(
                "vocab line {}: codelen {} needs {} fields, found {}",
                line_no,
                codelen,
                fields,
                tokens.len()
            )));
        }

        let parse_all = |slice: &[&str], what: &str| -> Result<Vec<u32>> {
            slice
                .iter()
                .map(|t| {
                    t.parse::<u32>().map_err(|_| {
                        Error::format(format!("vocab line {}: bad {} {:?}", line_no, what, t))
                    })
                })
                .collect()
        };
        let point = parse_all(&tokens[2..2 + codelen], "point")?;
        let code = parse_all(&tokens[2 + codelen..], "code")?
            .into_iter()
            .map(|bit| u8::try_from(bit).unwrap_or(u8::MAX))
            .collect();

        codes.insert(tokens[0].to_string(), HuffmanCode::new(point, code)?);
    }

    Ok(codes)
}
