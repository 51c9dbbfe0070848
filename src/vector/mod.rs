//! Vector Module
//!
//! Dense row storage and the similarity primitives built on it.

mod matrix;
mod similarity;

pub use matrix::{VectorMatrix, VectorRows};
pub use similarity::{
    add_scaled, argsort_descending, dot_product, magnitude, normalize_vector, normalized, scale,
    top_k_descending,
};
