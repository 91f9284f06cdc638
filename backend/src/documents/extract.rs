//! Text extraction from uploaded PDFs, used when converting an upload into an
//! editable template.
//!
//! Structural extraction runs first. Only when no page yields any text is the
//! whole document handed to OCR, one page per rayon task. Both paths share the
//! same paragraph heuristic: a run of two or more whitespace characters ends a
//! paragraph.

use crate::documents::ocr::OcrEngine;
use crate::documents::pdf;
use crate::error::{AppError, AppResult};
use common::model::markup::escape_text;
use log::{info, warn};
use rayon::prelude::*;
use regex::Regex;
use std::io::Write;
use tempfile::NamedTempFile;

pub const NO_TEXT_NOTICE: &str = "No text could be extracted from this PDF. It may be encrypted or corrupted. Try creating from editor and typing your content, or use a different PDF.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Structural,
    Optical,
    /// Neither path found text; the result is the placeholder paragraph.
    Degraded,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    /// Escaped `<p>` blocks in document order.
    pub paragraphs: Vec<String>,
    pub source: ExtractionSource,
}

impl Extraction {
    pub fn to_markup(&self) -> String {
        self.paragraphs.join("\n")
    }

    pub fn notice(&self) -> Option<&'static str> {
        match self.source {
            ExtractionSource::Degraded => Some(NO_TEXT_NOTICE),
            _ => None,
        }
    }
}

pub struct Paragraphs {
    boundary: Regex,
    whitespace: Regex,
}

impl Paragraphs {
    pub fn new() -> AppResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AppError::Internal(format!("bad pattern: {}", e)))
        };
        Ok(Paragraphs {
            boundary: compile(r"\s{2,}")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Plain-text paragraphs of one page, whitespace collapsed and trimmed.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.boundary
            .split(text)
            .map(|block| self.whitespace.replace_all(block, " ").trim().to_string())
            .filter(|block| !block.is_empty())
            .collect()
    }

    fn blocks(&self, text: &str) -> Vec<String> {
        self.split(text)
            .into_iter()
            .map(|block| format!("<p>{}</p>", escape_text(&block)))
            .collect()
    }
}

/// Extracts paragraph blocks from `bytes`. Never fails on a readable PDF that
/// simply has no text.
pub fn extract(bytes: &[u8], ocr: &dyn OcrEngine) -> AppResult<Extraction> {
    let doc = pdf::load(bytes)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let paragraphs = Paragraphs::new()?;

    let mut structural = Vec::new();
    for &page in &page_numbers {
        match doc.extract_text(&[page]) {
            Ok(text) => structural.extend(paragraphs.blocks(&text)),
            Err(e) => warn!("No text layer on page {}: {}", page, e),
        }
    }
    if !structural.is_empty() {
        return Ok(Extraction {
            paragraphs: structural,
            source: ExtractionSource::Structural,
        });
    }

    info!(
        "No structural text in {} page(s), falling back to OCR",
        page_numbers.len()
    );
    let optical = recognize_all(bytes, &page_numbers, ocr, &paragraphs)?;
    if !optical.is_empty() {
        return Ok(Extraction {
            paragraphs: optical,
            source: ExtractionSource::Optical,
        });
    }

    warn!("OCR recovered no text, using the placeholder paragraph");
    Ok(Extraction {
        paragraphs: vec![format!("<p>{}</p>", escape_text(NO_TEXT_NOTICE))],
        source: ExtractionSource::Degraded,
    })
}

fn recognize_all(
    bytes: &[u8],
    page_numbers: &[u32],
    ocr: &dyn OcrEngine,
    paragraphs: &Paragraphs,
) -> AppResult<Vec<String>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    let path = file.path();

    let pages: Vec<Vec<String>> = page_numbers
        .par_iter()
        .map(|&page| match ocr.recognize_page(path, page) {
            Ok(text) => paragraphs.blocks(&text),
            Err(e) => {
                warn!("OCR failed on page {}: {}", page, e);
                Vec::new()
            }
        })
        .collect();
    Ok(pages.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::pdf::fixtures::pdf_with_pages;
    use std::collections::HashMap;
    use std::path::Path;

    struct ScriptedOcr(HashMap<u32, String>);

    impl OcrEngine for ScriptedOcr {
        fn recognize_page(&self, _pdf: &Path, page_number: u32) -> AppResult<String> {
            Ok(self.0.get(&page_number).cloned().unwrap_or_default())
        }
    }

    fn no_ocr() -> ScriptedOcr {
        ScriptedOcr(HashMap::new())
    }

    #[test]
    fn double_whitespace_separates_paragraphs() {
        let p = Paragraphs::new().unwrap();
        assert_eq!(
            p.split("TERMS  The client agrees\nto pay.\n\n  Venue:   Old Mill"),
            vec!["TERMS", "The client agrees to pay.", "Venue:", "Old Mill"]
        );
        assert!(p.split("   \n\t ").is_empty());
    }

    #[test]
    fn structural_text_wins_and_is_escaped() {
        let bytes = pdf_with_pages(2, Some("A & B"));
        let extraction = extract(&bytes, &no_ocr()).unwrap();
        assert_eq!(extraction.source, ExtractionSource::Structural);
        assert_eq!(extraction.paragraphs.len(), 2);
        assert!(extraction.paragraphs[0].contains("A &amp; B 1"));
        assert!(extraction.paragraphs[1].contains("A &amp; B 2"));
        assert_eq!(extraction.notice(), None);
    }

    #[test]
    fn image_only_documents_fall_back_to_ocr_in_page_order() {
        let bytes = pdf_with_pages(2, None);
        let ocr = ScriptedOcr(HashMap::from([
            (1, "First page  <intro>".to_string()),
            (2, "Second page".to_string()),
        ]));
        let extraction = extract(&bytes, &ocr).unwrap();
        assert_eq!(extraction.source, ExtractionSource::Optical);
        assert_eq!(
            extraction.to_markup(),
            "<p>First page</p>\n<p>&lt;intro&gt;</p>\n<p>Second page</p>"
        );
    }

    #[test]
    fn nothing_recoverable_yields_the_placeholder() {
        let bytes = pdf_with_pages(1, None);
        let extraction = extract(&bytes, &no_ocr()).unwrap();
        assert_eq!(extraction.source, ExtractionSource::Degraded);
        assert_eq!(extraction.paragraphs.len(), 1);
        assert!(extraction.paragraphs[0].contains("No text could be extracted"));
        assert_eq!(extraction.notice(), Some(NO_TEXT_NOTICE));
    }

    #[test]
    fn unreadable_input_is_rejected() {
        assert!(matches!(
            extract(b"plain text, not a document", &no_ocr()),
            Err(AppError::Unprocessable(_))
        ));
    }
}
