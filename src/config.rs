//! Load and Training Configuration

use hashbrown::HashSet;
use std::path::PathBuf;

use crate::codec::ByteDecoder;
use crate::error::{Error, Result};

/// Longest word kept from an embedding file, in characters
pub const DEFAULT_MAX_WORD_LENGTH: usize = 78;

/// Options for reading embedding files
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Words longer than this are truncated
    pub max_word_length: usize,

    /// When set, only these words are kept
    pub desired_vocab: Option<HashSet<String>>,

    /// Byte to character table for word bytes
    pub decoder: ByteDecoder,

    /// Look for `<path>.syn1` / `<path>.vocab` next to the model
    pub load_side_model: bool,

    /// Optional `<word> <cluster>` file to attach
    pub clusters_path: Option<PathBuf>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_word_length: DEFAULT_MAX_WORD_LENGTH,
            desired_vocab: None,
            decoder: ByteDecoder::latin1(),
            load_side_model: true,
            clusters_path: None,
        }
    }
}

impl LoadConfig {
    pub fn with_max_word_length(mut self, len: usize) -> Self {
        self.max_word_length = len;
        self
    }

    pub fn with_desired_vocab<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.desired_vocab = Some(words.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_decoder(mut self, decoder: ByteDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_side_model(mut self, enabled: bool) -> Self {
        self.load_side_model = enabled;
        self
    }

    pub fn with_clusters<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.clusters_path = Some(path.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_word_length == 0 {
            return Err(Error::InvalidConfig(
                "max_word_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `word` survives the desired-vocabulary filter
    pub(crate) fn wants(&self, word: &str) -> bool {
        self.desired_vocab
            .as_ref()
            .map(|set| set.contains(word))
            .unwrap_or(true)
    }

    /// Clamp a decoded word to `max_word_length` characters
    pub(crate) fn clamp_word(&self, mut word: String) -> String {
        if let Some((cut, _)) = word.char_indices().nth(self.max_word_length) {
            word.truncate(cut);
        }
        word
    }
}

/// Options for one online training call
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Passes over the sentence
    pub epochs: usize,

    /// Initial learning rate
    pub alpha: f32,

    /// Seed for the sampling generator (None = seeded from OS entropy)
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            alpha: 0.05,
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
