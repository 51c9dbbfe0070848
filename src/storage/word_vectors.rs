//! Word Vector Store
//!
//! Vocabulary, unit-normalized rows and the word index, with cosine
//! and analogy queries over them.

use hashbrown::{HashMap, HashSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use super::clusters::Clusters;
use crate::codec::{parse_binary, parse_side_model, parse_text};
use crate::config::{LoadConfig, TrainConfig};
use crate::error::{Error, Result};
use crate::training::{OnlineTrainer, TrainSideModel};
use crate::vector::{add_scaled, scale, top_k_descending, VectorMatrix, VectorRows};

/// One row of a query response
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub word: String,
    pub score: f32,
    /// Present only when the store has clusters and they were requested
    pub cluster: Option<i64>,
}

/// Read-only word embedding store
///
/// Nothing is mutable after construction, so a store can be shared
/// across threads behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct WordVectors<M = VectorMatrix> {
    vocab: Vec<String>,
    vectors: M,
    index_map: HashMap<String, usize>,
    clusters: Option<Vec<i64>>,
    train: Option<TrainSideModel>,
}

impl<M: VectorRows> WordVectors<M> {
    /// Build a store; `vectors` row `i` belongs to `vocab[i]`
    pub fn new(vocab: Vec<String>, vectors: M) -> Result<Self> {
        if vocab.len() != vectors.len() {
            return Err(Error::DimensionMismatch {
                expected: vocab.len(),
                actual: vectors.len(),
            });
        }

        let mut index_map = HashMap::with_capacity(vocab.len());
        for (idx, word) in vocab.iter().enumerate() {
            if index_map.insert(word.clone(), idx).is_some() {
                return Err(Error::DuplicateWord(word.clone()));
            }
        }

        Ok(Self {
            vocab,
            vectors,
            index_map,
            clusters: None,
            train: None,
        })
    }

    /// Attach cluster ids looked up by word
    pub fn with_clusters(self, clusters: &Clusters) -> Result<Self> {
        let ids = clusters.align(&self.vocab)?;
        self.with_cluster_ids(ids)
    }

    /// Attach cluster ids parallel to the vocabulary
    pub fn with_cluster_ids(mut self, ids: Vec<i64>) -> Result<Self> {
        if ids.len() != self.vocab.len() {
            return Err(Error::DimensionMismatch {
                expected: self.vocab.len(),
                actual: ids.len(),
            });
        }
        self.clusters = Some(ids);
        Ok(self)
    }

    pub fn with_side_model(mut self, train: Option<TrainSideModel>) -> Self {
        self.train = train;
        self
    }

    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    pub fn vectors(&self) -> &M {
        &self.vectors
    }

    pub fn clusters(&self) -> Option<&[i64]> {
        self.clusters.as_deref()
    }

    pub fn side_model(&self) -> Option<&TrainSideModel> {
        self.train.as_ref()
    }

    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.dim()
    }

    /// Row index of `word`
    pub fn ix(&self, word: &str) -> Result<usize> {
        self.index_map
            .get(word)
            .copied()
            .ok_or_else(|| Error::KeyNotFound(word.to_string()))
    }

    /// Unit vector of `word`
    pub fn get_vector(&self, word: &str) -> Result<&[f32]> {
        Ok(self.vectors.row(self.ix(word)?))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index_map.contains_key(word)
    }

    /// The `n` words closest to `word` by cosine similarity
    ///
    /// The query word itself is never part of the result.
    pub fn cosine(&self, word: &str, n: usize) -> Result<Vec<(usize, f32)>> {
        let query = self.ix(word)?;
        let scores = self.vectors.dot_all(self.vectors.row(query));

        Ok(top_k_descending(&scores, n.saturating_add(1))
            .into_iter()
            .filter(|&i| i != query)
            .take(n)
            .map(|i| (i, scores[i]))
            .collect())
    }

    /// Cosine ranking for an arbitrary vector
    ///
    /// The top-ranked row is always dropped, on the assumption that
    /// `vector` came from the store. Callers querying with a foreign
    /// vector lose their best match.
    pub fn cosine_vec(&self, vector: &[f32], n: usize) -> Result<Vec<(usize, f32)>> {
        if vector.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                actual: vector.len(),
            });
        }
        let scores = self.vectors.dot_all(vector);

        Ok(top_k_descending(&scores, n.saturating_add(1))
            .into_iter()
            .skip(1)
            .map(|i| (i, scores[i]))
            .collect())
    }

    /// Rank words by the mean of `positive` vectors minus `negative` vectors
    ///
    /// `king - man + woman` is `analogy(&["king", "woman"], &["man"], n)`.
    /// Input words are removed from the result.
    pub fn analogy<S: AsRef<str>>(
        &self,
        positive: &[S],
        negative: &[S],
        n: usize,
    ) -> Result<Vec<(usize, f32)>> {
        let count = positive.len() + negative.len();
        if count == 0 {
            return Err(Error::InvalidQuery(
                "analogy needs at least one word".to_string(),
            ));
        }

        let mut mean = vec![0.0f32; self.dim()];
        let mut exclude = HashSet::with_capacity(count);
        let signed = positive
            .iter()
            .map(|w| (w, 1.0))
            .chain(negative.iter().map(|w| (w, -1.0)));
        for (word, direction) in signed {
            let idx = self.ix(word.as_ref())?;
            add_scaled(&mut mean, self.vectors.row(idx), direction);
            exclude.insert(idx);
        }
        scale(&mut mean, 1.0 / count as f32);

        let scores = self.vectors.dot_all(&mean);
        Ok(top_k_descending(&scores, n.saturating_add(count))
            .into_iter()
            .filter(|i| !exclude.contains(i))
            .take(n)
            .map(|i| (i, scores[i]))
            .collect())
    }

    /// Attach words (and clusters, if present and requested) to ranked rows
    pub fn generate_response(
        &self,
        matches: &[(usize, f32)],
        include_clusters: bool,
    ) -> Result<Vec<Neighbor>> {
        let clusters = self.clusters.as_deref().filter(|_| include_clusters);
        matches
            .iter()
            .map(|&(index, score)| {
                let word = self.vocab.get(index).ok_or(Error::IndexOutOfBounds {
                    index,
                    count: self.vocab.len(),
                })?;
                Ok(Neighbor {
                    word: word.clone(),
                    score,
                    cluster: clusters.map(|ids| ids[index]),
                })
            })
            .collect()
    }

    /// Learn an embedding for `sentence` against the hidden-layer model
    pub fn train_sentence(&self, sentence: &str, config: &TrainConfig) -> Result<Vec<f32>> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        OnlineTrainer::new(self, rng)?.train_sentence(sentence, config.epochs, config.alpha)
    }

    /// Attach `<path>.syn1`/`<path>.vocab` and the clusters file per `config`
    pub(crate) fn attach_side_files(mut self, path: &Path, config: &LoadConfig) -> Result<Self> {
        if config.load_side_model {
            self.train = parse_side_model(path, &config.decoder)?;
        }
        if let Some(clusters_path) = &config.clusters_path {
            let clusters = Clusters::from_file(clusters_path, &config.decoder)?;
            self = self.with_clusters(&clusters)?;
        }
        Ok(self)
    }
}

impl WordVectors<VectorMatrix> {
    /// Read a binary embedding stream
    pub fn from_binary<R: BufRead>(reader: R, config: &LoadConfig) -> Result<Self> {
        let (vocab, vectors) = parse_binary(reader, config)?;
        Self::new(vocab, vectors)
    }

    /// Read a text embedding stream
    pub fn from_text<R: BufRead>(reader: R, config: &LoadConfig) -> Result<Self> {
        let (vocab, vectors) = parse_text(reader, config)?;
        Self::new(vocab, vectors)
    }

    /// Load a binary model file plus its side files
    pub fn from_binary_file<P: AsRef<Path>>(path: P, config: &LoadConfig) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::from_binary(BufReader::new(File::open(path)?), config)?
            .attach_side_files(path, config)?;
        info!(
            path = %path.display(),
            words = store.len(),
            dim = store.dim(),
            trainable = store.train.is_some(),
            "Loaded binary word vectors"
        );
        Ok(store)
    }

    /// Load a text model file plus its side files
    pub fn from_text_file<P: AsRef<Path>>(path: P, config: &LoadConfig) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::from_text(BufReader::new(File::open(path)?), config)?
            .attach_side_files(path, config)?;
        info!(
            path = %path.display(),
            words = store.len(),
            dim = store.dim(),
            trainable = store.train.is_some(),
            "Loaded text word vectors"
        );
        Ok(store)
    }
}
