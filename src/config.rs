//! Run configuration.
//!
//! The values that identify code paragraphs and what replaces them are
//! plain data so other live-script producers (different style names,
//! different placeholder conventions) can be handled without code changes.

use std::path::PathBuf;

/// Paragraph style that marks a paragraph as code.
pub const DEFAULT_CODE_STYLE: &str = "code";

/// Text written in place of removed code. The trailing spaces are intentional.
pub const DEFAULT_PLACEHOLDER: &str = "% Your code here.       ";

/// Location of the rewritten document inside the live-script archive.
pub const DOCUMENT_PATH: &str = "matlab/document.xml";

/// Where the debug copy of the rewritten document goes unless told otherwise.
pub const DEFAULT_DEBUG_COPY: &str = "./tmp.xml";

/// Settings for one processing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Exact, case-sensitive `w:val` of the `w:pStyle` that marks code.
    pub code_style: String,
    /// Literal text stored in each blanked run.
    pub placeholder: String,
    /// Archive-relative path of the document to rewrite.
    pub document_path: String,
    /// Also write the rewritten document here; `None` disables the copy.
    pub debug_copy: Option<PathBuf>,
    /// Parent of the per-run scratch directory; `None` uses the system temp dir.
    pub scratch_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            code_style: DEFAULT_CODE_STYLE.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            document_path: DOCUMENT_PATH.to_string(),
            debug_copy: Some(PathBuf::from(DEFAULT_DEBUG_COPY)),
            scratch_root: None,
        }
    }
}

impl Config {
    /// Same settings without the debug copy.
    pub fn without_debug_copy(mut self) -> Self {
        self.debug_copy = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_script_conventions() {
        let config = Config::default();
        assert_eq!(config.code_style, "code");
        assert_eq!(config.document_path, "matlab/document.xml");
        assert_eq!(config.placeholder, "% Your code here.       ");
        assert_eq!(config.debug_copy.as_deref(), Some(std::path::Path::new("./tmp.xml")));
        assert_eq!(config.scratch_root, None);
    }

    #[test]
    fn debug_copy_can_be_switched_off() {
        assert_eq!(Config::default().without_debug_copy().debug_copy, None);
    }
}
