//! Code-paragraph detection and blanking.
//!
//! A live script stores each paragraph as `w:p`. Its style sits in
//! `w:pPr/w:pStyle/@w:val`; code paragraphs use the style `code` and keep
//! their source in `w:t` runs, usually as CDATA.

use tracing::debug;

use crate::config::Config;
use crate::error::Result;

use super::tree::{Document, Element};

/// WordprocessingML main namespace.
pub const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Counts from one document rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// `w:p` elements seen.
    pub paragraphs: usize,
    /// Paragraphs whose style matched.
    pub code_paragraphs: usize,
    /// Code paragraphs whose text was replaced.
    pub replaced: usize,
}

pub fn is_paragraph(el: &Element) -> bool {
    el.is(WORDPROCESSING_NS, "p")
}

pub fn is_text_run(el: &Element) -> bool {
    el.is(WORDPROCESSING_NS, "t")
}

/// Style id of a paragraph: `w:val` of the first `w:pPr/w:pStyle` below it.
pub fn paragraph_style(paragraph: &Element) -> Option<&str> {
    paragraph
        .find_first(|e| {
            e.is(WORDPROCESSING_NS, "pPr") && e.child(WORDPROCESSING_NS, "pStyle").is_some()
        })?
        .child(WORDPROCESSING_NS, "pStyle")?
        .attribute(Some(WORDPROCESSING_NS), "val")
}

/// True for a `w:p` whose style is exactly `style`.
pub fn is_code_paragraph(el: &Element, style: &str) -> bool {
    is_paragraph(el) && paragraph_style(el) == Some(style)
}

/// Replace the first text run of every code paragraph with `placeholder`.
///
/// The run keeps its encoding: CDATA stays CDATA, escaped text stays
/// escaped. Code paragraphs with no `w:t` are left as they are.
pub fn replace_code_paragraphs(
    doc: &mut Document,
    style: &str,
    placeholder: &str,
) -> TransformReport {
    let mut report = TransformReport::default();

    doc.root_mut().visit_mut(&mut |el: &mut Element| {
        if !is_paragraph(el) {
            return;
        }
        report.paragraphs += 1;
        if !is_code_paragraph(el, style) {
            return;
        }
        report.code_paragraphs += 1;

        match el.find_first_mut(is_text_run) {
            Some(run) => {
                debug!(previous = %run.text(), "blanking code paragraph");
                let encoding = run.text_encoding();
                run.set_text(placeholder, encoding);
                report.replaced += 1;
            }
            None => debug!("code paragraph has no text run, skipping"),
        }
    });

    report
}

/// Parse `xml`, blank its code paragraphs per `config`, and serialize.
pub fn rewrite_document(xml: &[u8], config: &Config) -> Result<(Vec<u8>, TransformReport)> {
    let mut doc = Document::parse(xml)?;
    let report = replace_code_paragraphs(&mut doc, &config.code_style, &config.placeholder);
    Ok((doc.to_bytes()?, report))
}
