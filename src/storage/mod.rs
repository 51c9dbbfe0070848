//! Storage Engine
//!
//! In-memory word vector store and its cluster annotations.

mod clusters;
mod word_vectors;

pub use clusters::Clusters;
pub use word_vectors::{Neighbor, WordVectors};
