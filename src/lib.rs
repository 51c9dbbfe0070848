//! wordvec - In-Memory Word Embedding Store
//!
//! Loads word2vec models (binary or text), answers cosine and analogy
//! queries over unit-normalized rows, and learns embeddings for new
//! sentences against the model's hidden layer.

pub mod codec;
pub mod config;
pub mod error;
pub mod persistence;
pub mod query;
pub mod storage;
pub mod training;
pub mod vector;

pub use codec::ByteDecoder;
pub use config::{LoadConfig, TrainConfig};
pub use error::{Error, Result};
pub use persistence::{MappedVectors, Snapshot, SnapshotInfo};
pub use query::{Command, Handler, Response};
pub use storage::{Clusters, Neighbor, WordVectors};
pub use training::{OnlineTrainer, TrainSideModel};
pub use vector::{VectorMatrix, VectorRows};
