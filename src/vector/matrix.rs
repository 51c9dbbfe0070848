//! Vector Matrix
//!
//! Row-major storage for the embedding rows and the read contract
//! shared with the memory-mapped backing.

use crate::error::{Error, Result};

use super::similarity::dot_product;

/// Read access to a set of equal-width embedding rows
pub trait VectorRows {
    /// Number of rows
    fn len(&self) -> usize;

    /// Width of every row
    fn dim(&self) -> usize;

    /// Row `index`; callers guarantee `index < len()`
    fn row(&self, index: usize) -> &[f32];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dot product of every row with `query`
    fn dot_all(&self, query: &[f32]) -> Vec<f32> {
        (0..self.len())
            .map(|i| dot_product(self.row(i), query))
            .collect()
    }
}

/// Owned V x D matrix of f32
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatrix {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
}

impl VectorMatrix {
    /// Create an empty matrix with room for `capacity` rows
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(dim * capacity),
            rows: 0,
            dim,
        }
    }

    /// Build from a flat row-major buffer
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            if !data.is_empty() {
                return Err(Error::DimensionMismatch {
                    expected: 0,
                    actual: data.len(),
                });
            }
            return Ok(Self { data, rows: 0, dim });
        }
        if data.len() % dim != 0 {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: data.len() % dim,
            });
        }
        Ok(Self {
            rows: data.len() / dim,
            data,
            dim,
        })
    }

    /// Build from individual rows
    pub fn from_rows(dim: usize, rows: &[Vec<f32>]) -> Result<Self> {
        let mut matrix = Self::with_capacity(dim, rows.len());
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Append a row
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    /// The raw row-major buffer
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl VectorRows for VectorMatrix {
    #[inline]
    fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dim;
        &self.data[start..start + self.dim]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_rows() {
        let mut m = VectorMatrix::with_capacity(3, 2);
        m.push_row(&[1.0, 2.0, 3.0]).unwrap();
        m.push_row(&[4.0, 5.0, 6.0]).unwrap();

        assert_eq!(m.len(), 2);
        assert_eq!(m.dim(), 3);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.as_slice().len(), 6);
    }

    #[test]
    fn test_push_wrong_width() {
        let mut m = VectorMatrix::with_capacity(3, 1);
        let result = m.push_row(&[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_from_flat_rejects_ragged_buffer() {
        assert!(VectorMatrix::from_flat(4, vec![0.0; 10]).is_err());
        let m = VectorMatrix::from_flat(2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_dot_all() {
        let m = VectorMatrix::from_rows(2, &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]])
            .unwrap();
        let scores = m.dot_all(&[1.0, 0.0]);
        assert_eq!(scores, vec![1.0, 0.0, 0.6]);
    }
}
