//! Online Sentence Training
//!
//! Learns an embedding for one sentence by gradient steps against a
//! frozen word2vec hidden layer. Word rows and `syn1` are never
//! written; only the returned sentence vector changes.

use rand::Rng;
use tracing::debug;

use super::model::{Syn1Key, TrainSideModel};
use crate::error::{Error, Result};
use crate::storage::WordVectors;
use crate::vector::{add_scaled, dot_product, scale, VectorRows};

/// Learning rate floor reached at the end of the schedule
pub const MIN_ALPHA: f32 = 1e-4;

/// Dot products are clipped to `[-MAX_EXP, MAX_EXP]` before the sigmoid
pub const MAX_EXP: f32 = 3.0;

/// Lower bound on negatives drawn per target
pub const MIN_NEGATIVE_SAMPLES: usize = 3;

#[inline]
fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-MAX_EXP, MAX_EXP);
    1.0 / (1.0 + (-x).exp())
}

/// Single-sentence trainer bound to a store and a random source
pub struct OnlineTrainer<'a, M, G> {
    store: &'a WordVectors<M>,
    model: &'a TrainSideModel,
    rng: G,
}

impl<'a, M: VectorRows, G: Rng> OnlineTrainer<'a, M, G> {
    /// Check the side model is usable for training with `store`
    pub fn new(store: &'a WordVectors<M>, rng: G) -> Result<Self> {
        let model = store.side_model().ok_or(Error::ModelMissing)?;

        if model.layer1_size != store.dim() {
            return Err(Error::InvalidConfig(format!(
                "hidden layer size {} does not match vector size {}",
                model.layer1_size,
                store.dim()
            )));
        }
        if model.hs {
            if model.vocab.is_none() {
                return Err(Error::InvalidConfig(
                    "hierarchical softmax model has no Huffman vocabulary".to_string(),
                ));
            }
        } else {
            if model.neg < 1 {
                return Err(Error::InvalidConfig(
                    "negative sampling requires neg >= 1 when hs is off".to_string(),
                ));
            }
            if model.syn1_size.min(store.len()) == 0 {
                return Err(Error::InvalidConfig(
                    "no vocabulary rows available for negative sampling".to_string(),
                ));
            }
        }

        Ok(Self { store, model, rng })
    }

    /// Split on whitespace and train
    pub fn train_sentence(&mut self, sentence: &str, epochs: usize, alpha: f32) -> Result<Vec<f32>> {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        self.train_words(&words, epochs, alpha)
    }

    /// Run `epochs` passes over `words` and return the sentence vector
    ///
    /// `alpha` decays linearly towards [`MIN_ALPHA`] over all
    /// `epochs * words.len()` steps.
    pub fn train_words<S: AsRef<str>>(
        &mut self,
        words: &[S],
        epochs: usize,
        alpha: f32,
    ) -> Result<Vec<f32>> {
        if words.is_empty() {
            return Err(Error::InvalidQuery("sentence has no words".to_string()));
        }
        if epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be at least 1".to_string()));
        }
        if !(alpha > 0.0 && alpha.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "alpha must be a positive number, got {}",
                alpha
            )));
        }

        // Resolve every word up front so a bad word fails before any work.
        let rows = words
            .iter()
            .map(|w| self.store.ix(w.as_ref()))
            .collect::<Result<Vec<usize>>>()?;
        if self.model.hs {
            for w in words {
                self.model.huffman_code(w.as_ref())?;
            }
        }

        let dim = self.store.dim();
        let len = rows.len();
        let mut sentence: Vec<f32> = (0..dim).map(|_| self.rng.gen::<f32>()).collect();
        let mut hidden = vec![0.0f32; dim];
        let mut grad = vec![0.0f32; dim];

        let step = (alpha - alpha.min(MIN_ALPHA)) / (len * epochs) as f32;
        let mut alpha = alpha;

        for epoch in 0..epochs {
            for pos in 0..len {
                grad.fill(0.0);

                if self.model.cbow {
                    self.context_mean(&rows, pos, &sentence, &mut hidden);
                    self.accumulate(&hidden, rows[pos], alpha, &mut grad)?;
                } else {
                    self.accumulate(&sentence, rows[pos], alpha, &mut grad)?;
                }

                add_scaled(&mut sentence, &grad, 1.0);
                alpha -= step;
            }
            debug!(epoch, alpha, "Finished training epoch");
        }

        Ok(sentence)
    }

    /// Mean of the window around `pos` and the sentence vector
    fn context_mean(&mut self, rows: &[usize], pos: usize, sentence: &[f32], hidden: &mut [f32]) {
        let window = self.model.window;
        let shrink = if window > 0 {
            self.rng.gen_range(0..window)
        } else {
            0
        };

        hidden.fill(0.0);
        let start = pos.saturating_sub(window - shrink);
        let end = (pos + window - shrink).min(rows.len() - 1);
        let mut count = 0usize;
        for c in start..=end {
            if c == pos {
                continue;
            }
            add_scaled(hidden, self.store.vectors().row(rows[c]), 1.0);
            count += 1;
        }

        add_scaled(hidden, sentence, 1.0);
        count += 1;
        scale(hidden, 1.0 / count as f32);
    }

    /// Add the gradient for predicting row `target` from `hidden` into `grad`
    fn accumulate(&mut self, hidden: &[f32], target: usize, alpha: f32, grad: &mut [f32]) -> Result<()> {
        let model = self.model;
        let store = self.store;
        let vocab = store.vocab();

        if model.hs {
            let path = model.huffman_code(&vocab[target])?;
            for (&node, &bit) in path.point.iter().zip(&path.code) {
                let weights = model.syn1_row(&Syn1Key::Node(node))?;
                let f = sigmoid(dot_product(hidden, weights));
                let g = (1.0 - bit as f32 - f) * alpha;
                add_scaled(grad, weights, g);
            }
            return Ok(());
        }

        let pool = model.syn1_size.min(vocab.len());
        let negatives = model.neg.max(MIN_NEGATIVE_SAMPLES);
        for d in 0..=negatives {
            let (sample, label) = if d == 0 {
                (target, 1.0)
            } else {
                let sample = self.rng.gen_range(0..pool);
                if sample == target {
                    continue;
                }
                (sample, 0.0)
            };

            let weights = model.syn1_row(&Syn1Key::Word(vocab[sample].clone()))?;
            let f = sigmoid(dot_product(hidden, weights));
            let g = (label - f) * alpha;
            add_scaled(grad, weights, g);
        }
        Ok(())
    }
}
