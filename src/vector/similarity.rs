//! Vector Similarity Functions
//!
//! Dense float primitives used by the store and the trainer.

use std::cmp::Ordering;

/// Compute dot product of two vectors
///
/// Uses unrolled loop for better CPU performance.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len().min(b.len());
    let mut sum = 0.0f32;

    // Process 4 elements at a time (manual unrolling)
    let chunks = len / 4;
    let remainder = len % 4;

    for i in 0..chunks {
        let idx = i * 4;
        sum += a[idx] * b[idx];
        sum += a[idx + 1] * b[idx + 1];
        sum += a[idx + 2] * b[idx + 2];
        sum += a[idx + 3] * b[idx + 3];
    }

    // Handle remainder
    for i in (len - remainder)..len {
        sum += a[i] * b[i];
    }

    sum
}

/// Euclidean length of a vector
#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector in place
///
/// An all-zero vector is left untouched.
pub fn normalize_vector(v: &mut [f32]) {
    let mag = magnitude(v);
    if mag > 0.0 {
        for x in v.iter_mut() {
            *x /= mag;
        }
    }
}

/// Normalize and return a new vector
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    normalize_vector(&mut result);
    result
}

/// `acc += scale * v`
#[inline]
pub fn add_scaled(acc: &mut [f32], v: &[f32], scale: f32) {
    debug_assert_eq!(acc.len(), v.len(), "Vector dimensions must match");
    for (a, x) in acc.iter_mut().zip(v) {
        *a += scale * x;
    }
}

/// Multiply every component by `factor`
#[inline]
pub fn scale(v: &mut [f32], factor: f32) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}

/// Descending by score, ascending by index on ties.
#[inline]
fn rank_order(scores: &[f32], a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then(a.cmp(&b))
}

/// Indices of `scores` ordered from highest to lowest score
pub fn argsort_descending(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| rank_order(scores, a, b));
    order
}

/// The first `k` entries of [`argsort_descending`], without sorting the tail
pub fn top_k_descending(scores: &[f32], k: usize) -> Vec<usize> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    if k < order.len() {
        order.select_nth_unstable_by(k - 1, |&a, &b| rank_order(scores, a, b));
        order.truncate(k);
    }
    order.sort_unstable_by(|&a, &b| rank_order(scores, a, b));
    order
}
