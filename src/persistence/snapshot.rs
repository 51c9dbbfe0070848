//! Snapshot Persistence
//!
//! Whole-store snapshot for fast reload, either eagerly into memory or
//! lazily through a memory map.

use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, Utc};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::mapped::MappedVectors;
use crate::config::LoadConfig;
use crate::error::{Error, Result};
use crate::storage::WordVectors;
use crate::vector::{VectorMatrix, VectorRows};

/// Snapshot file format:
/// - Magic: 4 bytes "WVSN"
/// - Version: 1 byte
/// - Flags: 1 byte (bit 0 = cluster ids present)
/// - Reserved: 2 bytes
/// - Created at: 8 bytes (unix millis)
/// - Word count: 8 bytes
/// - Dimension: 8 bytes
/// - Vectors offset: 8 bytes
/// - Reserved: 8 bytes
/// - Words: [len (4) + UTF-8 bytes]*
/// - Cluster ids: [i64]* if flagged
/// - Zero padding to an 8-byte boundary
/// - Vectors: row-major f32
///
/// All integers and floats are little-endian.
const SNAPSHOT_MAGIC: &[u8] = b"WVSN";
const SNAPSHOT_VERSION: u8 = 1;
const HEADER_SIZE: usize = 48;
const FLAG_CLUSTERS: u8 = 0x01;
const PAYLOAD_ALIGN: usize = 8;
const F32_SIZE: usize = std::mem::size_of::<f32>();

/// Header summary of a snapshot file
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub version: u8,
    pub created_at: DateTime<Utc>,
    pub words: usize,
    pub dim: usize,
    pub has_clusters: bool,
}

/// Decoded metadata preceding the vector payload
struct Layout {
    info: SnapshotInfo,
    vocab: Vec<String>,
    clusters: Option<Vec<i64>>,
    vectors_offset: usize,
}

/// Snapshot writer/reader
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    config: LoadConfig,
}

impl Snapshot {
    /// `config` controls side-model and clusters loading on restore
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    /// Write `store` to `path`
    ///
    /// The file is written next to `path` and renamed into place, so
    /// readers never observe a partial snapshot.
    pub fn save<M: VectorRows>(&self, store: &WordVectors<M>, path: &Path) -> Result<SnapshotInfo> {
        let created_at = Utc::now();
        let info = SnapshotInfo {
            version: SNAPSHOT_VERSION,
            created_at,
            words: store.len(),
            dim: store.dim(),
            has_clusters: store.clusters().is_some(),
        };

        let mut meta = BytesMut::new();
        for word in store.vocab() {
            meta.put_u32_le(word.len() as u32);
            meta.put_slice(word.as_bytes());
        }
        if let Some(ids) = store.clusters() {
            for id in ids {
                meta.put_i64_le(*id);
            }
        }
        let vectors_offset = align_up(HEADER_SIZE + meta.len());
        meta.put_bytes(0, vectors_offset - HEADER_SIZE - meta.len());

        let mut header = BytesMut::with_capacity(HEADER_SIZE);
        header.put_slice(SNAPSHOT_MAGIC);
        header.put_u8(SNAPSHOT_VERSION);
        header.put_u8(if info.has_clusters { FLAG_CLUSTERS } else { 0 });
        header.put_u16_le(0);
        header.put_i64_le(created_at.timestamp_millis());
        header.put_u64_le(info.words as u64);
        header.put_u64_le(info.dim as u64);
        header.put_u64_le(vectors_offset as u64);
        header.put_u64_le(0);

        let tmp_path = tmp_path(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(&header)?;
            writer.write_all(&meta)?;

            let vectors = store.vectors();
            let mut row_buf = BytesMut::with_capacity(vectors.dim() * 4);
            for i in 0..vectors.len() {
                row_buf.clear();
                for x in vectors.row(i) {
                    row_buf.put_f32_le(*x);
                }
                writer.write_all(&row_buf)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        info!(
            path = %path.display(),
            words = info.words,
            dim = info.dim,
            "Saved word vector snapshot"
        );
        Ok(info)
    }

    /// Read the header of a snapshot without loading it
    pub fn info(path: &Path) -> Result<SnapshotInfo> {
        Ok(read_layout(&fs::read(path)?)?.info)
    }

    /// Load a snapshot fully into memory
    pub fn load(&self, path: &Path) -> Result<WordVectors<VectorMatrix>> {
        let bytes = fs::read(path)?;
        let layout = read_layout(&bytes)?;

        let count = layout
            .info
            .words
            .checked_mul(layout.info.dim)
            .ok_or_else(|| Error::Snapshot("vector payload size overflows".to_string()))?;
        let payload_len = count
            .checked_mul(F32_SIZE)
            .ok_or_else(|| Error::Snapshot("vector payload size overflows".to_string()))?;
        let mut payload = bytes
            .get(layout.vectors_offset..)
            .filter(|rest| rest.len() >= payload_len)
            .ok_or_else(|| Error::Snapshot("vector payload is truncated".to_string()))?;
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            data.push(payload.get_f32_le());
        }

        let vectors = VectorMatrix::from_flat(layout.info.dim, data)?;
        let store = self.assemble(path, layout, vectors)?;
        info!(path = %path.display(), words = store.len(), "Loaded snapshot");
        Ok(store)
    }

    /// Open a snapshot with rows backed by a memory map
    pub fn open_mapped(&self, path: &Path) -> Result<WordVectors<MappedVectors>> {
        let file = File::open(path)?;
        // Safety: the snapshot must not be modified or truncated while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        let layout = read_layout(&mmap)?;

        let vectors = MappedVectors::new(
            mmap,
            layout.vectors_offset,
            layout.info.words,
            layout.info.dim,
        )?;
        let store = self.assemble(path, layout, vectors)?;
        info!(path = %path.display(), words = store.len(), "Mapped snapshot");
        Ok(store)
    }

    fn assemble<M: VectorRows>(
        &self,
        path: &Path,
        layout: Layout,
        vectors: M,
    ) -> Result<WordVectors<M>> {
        let mut store = WordVectors::new(layout.vocab, vectors)?;
        if let Some(ids) = layout.clusters {
            store = store.with_cluster_ids(ids)?;
        }
        store.attach_side_files(path, &self.config)
    }
}

fn align_up(n: usize) -> usize {
    n.div_ceil(PAYLOAD_ALIGN) * PAYLOAD_ALIGN
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn ensure(buf: &[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(Error::Snapshot(format!("truncated while reading {}", what)));
    }
    Ok(())
}

fn read_layout(bytes: &[u8]) -> Result<Layout> {
    let mut buf = bytes;
    ensure(buf, HEADER_SIZE, "header")?;

    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if magic != SNAPSHOT_MAGIC {
        return Err(Error::Snapshot("Invalid snapshot magic".to_string()));
    }

    let version = buf.get_u8();
    if version != SNAPSHOT_VERSION {
        return Err(Error::Snapshot(format!(
            "Unsupported snapshot version: {}",
            version
        )));
    }
    let flags = buf.get_u8();
    let _reserved = buf.get_u16_le();
    let created_ms = buf.get_i64_le();
    let words = buf.get_u64_le() as usize;
    let dim = buf.get_u64_le() as usize;
    let vectors_offset = buf.get_u64_le() as usize;
    let _reserved = buf.get_u64_le();

    let created_at = DateTime::from_timestamp_millis(created_ms)
        .ok_or_else(|| Error::Snapshot(format!("invalid timestamp {}", created_ms)))?;

    let mut vocab = Vec::with_capacity(words.min(buf.remaining() / 4));
    for i in 0..words {
        ensure(buf, 4, "word length")?;
        let len = buf.get_u32_le() as usize;
        ensure(buf, len, "word")?;
        let word = std::str::from_utf8(&buf[..len])
            .map_err(|_| Error::Snapshot(format!("word {} is not valid UTF-8", i)))?
            .to_string();
        buf.advance(len);
        vocab.push(word);
    }

    let has_clusters = flags & FLAG_CLUSTERS != 0;
    let clusters = if has_clusters {
        let mut ids = Vec::with_capacity(words.min(buf.remaining() / 8));
        for _ in 0..words {
            ensure(buf, 8, "cluster id")?;
            ids.push(buf.get_i64_le());
        }
        Some(ids)
    } else {
        None
    };

    let consumed = bytes.len() - buf.remaining();
    if vectors_offset < consumed || vectors_offset % PAYLOAD_ALIGN != 0 {
        return Err(Error::Snapshot(format!(
            "bad vectors offset {}",
            vectors_offset
        )));
    }

    Ok(Layout {
        info: SnapshotInfo {
            version,
            created_at,
            words,
            dim,
            has_clusters,
        },
        vocab,
        clusters,
        vectors_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::normalized;
    use tempfile::tempdir;

    fn sample_store() -> WordVectors {
        let rows: Vec<Vec<f32>> = [[1.0, 2.0, 2.0], [0.0, 1.0, 0.0], [3.0, 0.0, 4.0]]
            .iter()
            .map(|r| normalized(r))
            .collect();
        let vocab = vec!["ünïcode".to_string(), "b".to_string(), "c".to_string()];
        WordVectors::new(vocab, VectorMatrix::from_rows(3, &rows).unwrap()).unwrap()
    }

    #[test]
    fn test_snapshot_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.wvsn");
        let store = sample_store().with_cluster_ids(vec![5, -1, 5]).unwrap();

        let snapshot = Snapshot::default();
        let saved = snapshot.save(&store, &path).unwrap();
        assert_eq!(saved.words, 3);
        assert!(saved.has_clusters);
        assert!(!tmp_path(&path).exists());

        let loaded = snapshot.load(&path).unwrap();
        assert_eq!(loaded.vocab(), store.vocab());
        assert_eq!(loaded.vectors(), store.vectors());
        assert_eq!(loaded.clusters(), Some(&[5, -1, 5][..]));
        assert!(loaded.side_model().is_none());

        let info = Snapshot::info(&path).unwrap();
        assert_eq!(info.dim, 3);
        assert_eq!(info.created_at.timestamp_millis(), saved.created_at.timestamp_millis());
    }

    #[test]
    fn test_mapped_matches_eager() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.wvsn");
        let store = sample_store();

        let snapshot = Snapshot::default();
        snapshot.save(&store, &path).unwrap();
        let mapped = snapshot.open_mapped(&path).unwrap();

        assert_eq!(mapped.len(), 3);
        assert!(mapped.clusters().is_none());
        for word in store.vocab() {
            assert_eq!(mapped.get_vector(word).unwrap(), store.get_vector(word).unwrap());
        }
        assert_eq!(mapped.cosine("b", 2).unwrap(), store.cosine("b", 2).unwrap());
    }

    #[test]
    fn test_invalid_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wvsn");
        fs::write(&path, vec![0u8; 64]).unwrap();

        let result = Snapshot::default().load(&path);
        assert!(matches!(result, Err(Error::Snapshot(_))));
    }

    #[test]
    fn test_oversized_dimension_in_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.wvsn");
        Snapshot::default().save(&sample_store(), &path).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[24..32].copy_from_slice(&u64::MAX.to_le_bytes());
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(Snapshot::default().load(&path), Err(Error::Snapshot(_))));
        assert!(matches!(
            Snapshot::default().open_mapped(&path),
            Err(Error::Snapshot(_))
        ));
    }

    #[test]
    fn test_truncated_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.wvsn");
        Snapshot::default().save(&sample_store(), &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(Snapshot::default().load(&path), Err(Error::Snapshot(_))));
        assert!(matches!(
            Snapshot::default().open_mapped(&path),
            Err(Error::Snapshot(_))
        ));

        fs::write(&path, &bytes[..20]).unwrap();
        assert!(matches!(Snapshot::info(&path), Err(Error::Snapshot(_))));
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(48), 48);
        assert_eq!(align_up(49), 56);
        assert_eq!(align_up(55), 56);
    }
}
