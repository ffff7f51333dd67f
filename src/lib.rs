//! # mlx-remove-code
//!
//! Turns a MATLAB live-script solution into an assignment template.
//!
//! A live script (`.mlx`) is a ZIP archive whose `matlab/document.xml` holds
//! the notebook as WordprocessingML. Paragraphs styled `code` carry the
//! MATLAB source. This crate expands the archive, replaces the first text
//! run of each code paragraph with a placeholder, and packs everything back
//! up, leaving every other entry untouched.
//!
//! ## Pipeline
//!
//! 1. [`archive::unpack`] extracts the archive into a scratch directory
//! 2. [`xml::rewrite_document`] blanks the code paragraphs
//! 3. [`archive::repack`] writes a new archive from the scratch directory
//!
//! [`process_mlx_file`] runs all three and cleans up the scratch directory.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use mlx_remove_code::{Config, derive_output_name, process_mlx_file};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let input = "lesson1_soln.mlx";
//!     let output = derive_output_name(input);
//!     let config = Config::default().without_debug_copy();
//!
//!     let outcome = process_mlx_file(Path::new(input), Path::new(&output), &config).await?;
//!     println!("replaced {} code paragraphs", outcome.report.replaced);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod xml;
pub mod zip;

pub use cli::Cli;
pub use config::Config;
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt};
pub use naming::derive_output_name;
pub use pipeline::{Outcome, process_mlx_file};
pub use xml::TransformReport;
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};
