//! Memory-Mapped Rows
//!
//! Serves the vector payload of a snapshot straight from the OS page
//! cache; rows are paged in on first access.

use memmap2::Mmap;
use std::fmt;

use crate::error::{Error, Result};
use crate::vector::VectorRows;

const F32_SIZE: usize = std::mem::size_of::<f32>();

pub struct MappedVectors {
    mmap: Mmap,
    offset: usize,
    rows: usize,
    dim: usize,
}

impl MappedVectors {
    /// Wrap `rows * dim` little-endian f32 starting at `offset`
    pub(crate) fn new(mmap: Mmap, offset: usize, rows: usize, dim: usize) -> Result<Self> {
        if cfg!(target_endian = "big") {
            return Err(Error::Snapshot(
                "mapped snapshots require a little-endian host".to_string(),
            ));
        }

        let end = rows
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(F32_SIZE))
            .and_then(|n| n.checked_add(offset))
            .ok_or_else(|| Error::Snapshot("vector payload size overflows".to_string()))?;
        if mmap.len() < end {
            return Err(Error::Snapshot(format!(
                "file truncated: expected {} bytes, got {}",
                end,
                mmap.len()
            )));
        }

        // Checked once here so `row` can cast without failing.
        bytemuck::try_cast_slice::<u8, f32>(&mmap[offset..end])
            .map_err(|_| Error::Snapshot("vector payload is not aligned to f32".to_string()))?;

        Ok(Self {
            mmap,
            offset,
            rows,
            dim,
        })
    }

    /// Size of the whole mapped file
    pub fn memory_bytes(&self) -> usize {
        self.mmap.len()
    }
}

impl VectorRows for MappedVectors {
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
        let width = self.dim * F32_SIZE;
        let start = self.offset + index * width;
        bytemuck::cast_slice(&self.mmap[start..start + width])
    }
}

impl fmt::Debug for MappedVectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedVectors")
            .field("rows", &self.rows)
            .field("dim", &self.dim)
            .field("offset", &self.offset)
            .field("mapped_bytes", &self.mmap.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn map(bytes: &[u8]) -> (tempfile::TempDir, Mmap) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.bin");
        fs::write(&path, bytes).unwrap();
        let file = File::open(&path).unwrap();
        let mmap = unsafe { Mmap::map(&file).unwrap() };
        (dir, mmap)
    }

    #[test]
    fn test_rows_from_mapping() {
        let mut bytes = vec![0u8; 8];
        for x in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            bytes.extend_from_slice(&x.to_le_bytes());
        }
        let (_dir, mmap) = map(&bytes);

        let rows = MappedVectors::new(mmap, 8, 2, 3).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(rows.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(rows.memory_bytes(), 32);
    }

    #[test]
    fn test_truncated_mapping() {
        let (_dir, mmap) = map(&[0u8; 12]);
        let result = MappedVectors::new(mmap, 8, 2, 3);
        assert!(matches!(result, Err(Error::Snapshot(_))));
    }

    #[test]
    fn test_misaligned_offset() {
        let (_dir, mmap) = map(&[0u8; 32]);
        let result = MappedVectors::new(mmap, 3, 1, 2);
        assert!(matches!(result, Err(Error::Snapshot(_))));
    }
}
