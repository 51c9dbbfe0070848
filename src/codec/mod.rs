//! Embedding File Codecs
//!
//! Readers and writers for the word2vec binary and text formats and the
//! hidden-layer side files.

mod binary;
mod decoder;
mod header;
mod reader;
mod side_model;
mod text;

pub use binary::{parse_binary, write_binary};
pub use decoder::ByteDecoder;
pub use header::Header;
pub use reader::ByteReader;
pub use side_model::{parse_huffman_vocab, parse_side_model, parse_syn1, sibling_path};
pub use text::{parse_text, write_text};

/// Bounds on what is reserved ahead of reading, whatever a header claims
const MAX_PREALLOC_ROWS: usize = 1 << 16;
const MAX_PREALLOC_VALUES: usize = 1 << 22;

/// Rows worth reserving for a header declaring `declared` rows of `dim`
pub(crate) fn prealloc_rows(declared: usize, dim: usize) -> usize {
    declared
        .min(MAX_PREALLOC_ROWS)
        .min(MAX_PREALLOC_VALUES / dim.max(1))
}
