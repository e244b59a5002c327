//! ZIP archive writing and reading.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures for ZIP format records, with their
//!   byte encodings in both directions
//! - [`writer`]: Streaming archive writer used to build new archives
//! - [`parser`]: Low-level Central Directory decoding
//! - [`extractor`]: High-level read API for listing and decoding entries
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Writing: DEFLATE entries with UTF-8 names, classic (non-ZIP64) layout
//! - Reading: STORED and DEFLATE entries, ZIP64 central directories
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{MAX_ENTRIES, ZipWriter};
