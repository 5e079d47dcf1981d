//! Collaborator seams for refined layout analysis and OCR.
//!
//! The core never decodes PDF content itself. It can, however, ask a
//! [`DetailedAnalyzer`] to re-examine the few pages that carry font-size
//! outliers, and an [`OcrEngine`] to recognize pages the provider flagged
//! as image-only. Both are optional.
//!
//! # Example
//!
//! ```
//! use pdf_outline::provider::{OcrEngine, PrecomputedPages};
//! use pdf_outline::{BoundingBox, FontDescriptor, PageInfo, TextFragment};
//!
//! let mut ocr = PrecomputedPages::new("scan");
//! ocr.insert(2, vec![TextFragment::new(
//!     "Appendix A",
//!     2,
//!     BoundingBox::new(72.0, 80.0, 120.0, 18.0),
//!     FontDescriptor::new("OCR", 18.0),
//! )]);
//!
//! let recognized = ocr.recognize_page(&PageInfo::letter(2).image_only()).unwrap();
//! assert_eq!(recognized.len(), 1);
//! ```

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{PageInfo, TextFragment};

/// Refines the fragments of a single key page.
pub trait DetailedAnalyzer: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Return the refined fragments for `page`, replacing `fragments`.
    fn analyze_page(&self, page: u32, fragments: &[TextFragment]) -> Result<Vec<TextFragment>>;
}

/// Recognizes text on image-only pages.
pub trait OcrEngine: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Return recognized fragments for the page.
    fn recognize_page(&self, page: &PageInfo) -> Result<Vec<TextFragment>>;
}

/// Serves fragments computed ahead of time, keyed by page number.
///
/// Pages without an entry keep their original fragments (analysis) or
/// yield nothing (OCR).
#[derive(Debug, Clone, Default)]
pub struct PrecomputedPages {
    name: String,
    pages: HashMap<u32, Vec<TextFragment>>,
}

impl PrecomputedPages {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: HashMap::new(),
        }
    }

    /// Set the fragments for a page.
    pub fn insert(&mut self, page: u32, fragments: Vec<TextFragment>) {
        self.pages.insert(page, fragments);
    }

    /// Number of pages with an entry.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has an entry.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl DetailedAnalyzer for PrecomputedPages {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze_page(&self, page: u32, fragments: &[TextFragment]) -> Result<Vec<TextFragment>> {
        Ok(self
            .pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| fragments.to_vec()))
    }
}

impl OcrEngine for PrecomputedPages {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize_page(&self, page: &PageInfo) -> Result<Vec<TextFragment>> {
        Ok(self.pages.get(&page.number).cloned().unwrap_or_default())
    }
}
