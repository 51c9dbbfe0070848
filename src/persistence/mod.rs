//! Persistence Module
//!
//! Whole-store snapshots, restored eagerly or through a memory map.

mod mapped;
mod snapshot;

pub use mapped::MappedVectors;
pub use snapshot::{Snapshot, SnapshotInfo};
