//! ZIP archive reading and writing.
//!
//! A live script is an ordinary ZIP container, so this module covers just
//! enough of the format to take one apart and put it back together.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Decompression and extraction of entries
//! - [`writer`]: Building a new archive in memory
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
//! - Reading standard and ZIP64 archives
//! - STORED and DEFLATE methods, both directions
//! - CRC-32 verification on extraction
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - The writer never emits ZIP64 records

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::ZipWriter;
