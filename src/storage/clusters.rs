//! Word Clusters
//!
//! `<word> <cluster_id>` lines as written by word2vec's `-classes` option.

use hashbrown::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::codec::{ByteDecoder, ByteReader};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Clusters {
    ids: HashMap<String, i64>,
}

impl Clusters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: impl Into<String>, cluster: i64) {
        self.ids.insert(word.into(), cluster);
    }

    pub fn get(&self, word: &str) -> Option<i64> {
        self.ids.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn from_text<R: BufRead>(reader: R, decoder: &ByteDecoder) -> Result<Self> {
        let mut reader = ByteReader::new(reader);
        let mut clusters = Self::new();
        let mut line_no = 0;

        while let Some(line) = reader.read_line()? {
            line_no += 1;
            let line = decoder.decode(&line);
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [word, id] => {
                    let id = id.parse::<i64>().map_err(|_| {
                        Error::format(format!(
                            "clusters line {}: cluster id is not an integer: {:?}",
                            line_no, id
                        ))
                    })?;
                    clusters.insert(*word, id);
                }
                _ => {
                    return Err(Error::format(format!(
                        "clusters line {}: expected \"<word> <cluster>\", got {:?}",
                        line_no, line
                    )))
                }
            }
        }

        Ok(clusters)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, decoder: &ByteDecoder) -> Result<Self> {
        Self::from_text(BufReader::new(File::open(path)?), decoder)
    }

    /// Cluster id for each word of `vocab`, in order
    pub fn align(&self, vocab: &[String]) -> Result<Vec<i64>> {
        vocab
            .iter()
            .map(|word| self.get(word).ok_or_else(|| Error::KeyNotFound(word.clone())))
            .collect()
    }
}
