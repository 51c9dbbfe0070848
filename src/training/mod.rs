//! Online Training
//!
//! Hidden-layer side model and the single-sentence trainer.

mod model;
mod trainer;

pub use model::{HuffmanCode, Syn1Key, TrainSideModel};
pub use trainer::{OnlineTrainer, MAX_EXP, MIN_ALPHA, MIN_NEGATIVE_SAMPLES};
