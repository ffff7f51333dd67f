//! Error types for live-script processing.
//!
//! Every fallible operation in the library returns [`Result<T>`]. The
//! variants follow the three ways a run can fail: the archive itself is
//! unusable, the document inside it is missing or not well-formed, or the
//! filesystem refuses a read or write.

use std::path::{Path, PathBuf};

/// Errors produced while unpacking, transforming or repacking a live script.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not a ZIP archive or contains something we cannot read.
    #[error("invalid archive: {0}")]
    Archive(String),

    /// The archive does not contain the document we need to rewrite.
    #[error("archive does not contain {0}")]
    MissingDocument(String),

    /// The document could not be tokenized as XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document tokenized but its element structure is broken.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A filesystem operation failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O failure with no single path attached (in-memory buffers, walks).
    #[error(transparent)]
    Stream(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn archive(msg: impl Into<String>) -> Self {
        Error::Archive(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedDocument(msg.into())
    }
}

/// Attach a path to an `io::Result`.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err: Result<()> = Err(std::io::Error::from(std::io::ErrorKind::NotFound))
            .at(Path::new("missing/lesson.mlx"));
        let msg = err.unwrap_err().to_string();
        assert!(msg.starts_with("missing/lesson.mlx: "), "{msg}");
    }

    #[test]
    fn missing_document_message() {
        let err = Error::MissingDocument("matlab/document.xml".into());
        assert_eq!(
            err.to_string(),
            "archive does not contain matlab/document.xml"
        );
    }
}
