//! Live-script document handling.
//!
//! [`tree`] is a generic, round-trip-safe XML tree; [`paragraph`] holds the
//! WordprocessingML knowledge needed to recognise and blank code paragraphs.

pub mod paragraph;
pub mod tree;

pub use paragraph::{
    TransformReport, WORDPROCESSING_NS, is_code_paragraph, is_paragraph, is_text_run,
    paragraph_style, replace_code_paragraphs, rewrite_document,
};
pub use tree::{Document, Element, Node, TextEncoding};
