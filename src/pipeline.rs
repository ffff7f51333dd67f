//! The end-to-end transformation: unpack, blank code paragraphs, repack.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::archive::{self, entry_path};
use crate::config::Config;
use crate::error::{Error, IoContext, Result};
use crate::xml::{TransformReport, rewrite_document};

/// What one run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub report: TransformReport,
    /// Entries written to the output archive.
    pub entries: usize,
}

/// Turn the live script at `input` into an assignment template at `output`.
///
/// The archive is expanded into a fresh scratch directory under
/// `config.scratch_root` (the system temp dir by default), which is removed
/// when this function returns, whether it succeeds or not. `output` is
/// replaced if it already exists.
///
/// # Errors
///
/// - [`Error::Archive`] / [`Error::Io`] if `input` is missing or not a ZIP
/// - [`Error::MissingDocument`] if the archive lacks `config.document_path`
/// - [`Error::Xml`] / [`Error::MalformedDocument`] if the document is not well-formed
/// - [`Error::Io`] if the output or debug copy cannot be written
pub async fn process_mlx_file(input: &Path, output: &Path, config: &Config) -> Result<Outcome> {
    let scratch_root = config.scratch_root.clone().unwrap_or_else(std::env::temp_dir);
    let scratch = tempfile::Builder::new()
        .prefix("mlx-remove-code-")
        .tempdir_in(&scratch_root)
        .at(&scratch_root)?;
    debug!(scratch = %scratch.path().display(), "created scratch directory");

    let manifest = archive::unpack(input, scratch.path()).await?;
    if !manifest.contains_file(&config.document_path) {
        return Err(Error::MissingDocument(config.document_path.clone()));
    }

    let document = scratch.path().join(entry_path(&config.document_path)?);
    let xml = tokio::fs::read(&document).await.at(&document)?;
    let (rewritten, report) = rewrite_document(&xml, config)?;
    tokio::fs::write(&document, &rewritten).await.at(&document)?;
    info!(
        paragraphs = report.paragraphs,
        code = report.code_paragraphs,
        replaced = report.replaced,
        "rewrote {}",
        config.document_path
    );

    if let Some(copy) = &config.debug_copy {
        tokio::fs::write(copy, &rewritten).await.at(copy)?;
        debug!(path = %copy.display(), "wrote debug copy of document");
    }

    let entries = archive::repack(scratch.path(), &manifest, output).await?;

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!(scratch = %scratch_path.display(), error = %e, "could not remove scratch directory");
    } else {
        debug!("removed scratch directory");
    }

    Ok(Outcome { report, entries })
}
