//! Hidden-Layer Side Model
//!
//! Output-layer weights (`syn1`) and Huffman paths written next to a
//! word2vec model, needed for online training.

use hashbrown::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Key of a `syn1` row
///
/// Hierarchical softmax addresses inner Huffman tree nodes; negative
/// sampling addresses vocabulary words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Syn1Key {
    Node(u32),
    Word(String),
}

impl fmt::Display for Syn1Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syn1Key::Node(id) => write!(f, "node {}", id),
            Syn1Key::Word(word) => write!(f, "word {:?}", word),
        }
    }
}

/// Root-to-leaf path of one word in the Huffman tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Inner node ids along the path
    pub point: Vec<u32>,
    /// Branch bits, one per node
    pub code: Vec<u8>,
}

impl HuffmanCode {
    pub fn new(point: Vec<u32>, code: Vec<u8>) -> Result<Self> {
        if point.len() != code.len() {
            return Err(Error::format(format!(
                "huffman path has {} points but {} code bits",
                point.len(),
                code.len()
            )));
        }
        if let Some(bit) = code.iter().find(|b| **b > 1) {
            return Err(Error::format(format!("huffman code bit must be 0 or 1, got {}", bit)));
        }
        Ok(Self { point, code })
    }

    pub fn codelen(&self) -> usize {
        self.point.len()
    }
}

/// Hidden-layer state loaded from `<base>.syn1` and `<base>.vocab`
#[derive(Debug, Clone)]
pub struct TrainSideModel {
    /// Embedding dimensionality
    pub layer1_size: usize,
    /// Context radius
    pub window: usize,
    /// Continuous bag of words
    pub cbow: bool,
    /// Hierarchical softmax (otherwise negative sampling)
    pub hs: bool,
    /// Negative samples per target
    pub neg: usize,
    /// Number of vocabulary rows eligible as negative samples
    pub syn1_size: usize,
    /// Output layer weights
    pub syn1: HashMap<Syn1Key, Vec<f32>>,
    /// Huffman paths by word, present iff `hs`
    pub vocab: Option<HashMap<String, HuffmanCode>>,
}

impl TrainSideModel {
    /// Output weights for `key`
    pub fn syn1_row(&self, key: &Syn1Key) -> Result<&[f32]> {
        self.syn1.get(key).map(Vec::as_slice).ok_or_else(|| {
            Error::InvalidConfig(format!("hidden layer has no row for {}", key))
        })
    }

    /// Huffman path for `word`
    pub fn huffman_code(&self, word: &str) -> Result<&HuffmanCode> {
        self.vocab
            .as_ref()
            .ok_or_else(|| {
                Error::InvalidConfig("hierarchical softmax model has no Huffman vocabulary".into())
            })?
            .get(word)
            .ok_or_else(|| Error::KeyNotFound(word.to_string()))
    }
}
