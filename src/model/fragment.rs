//! Positioned text fragments as supplied by the layout provider.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{Error, Result};

/// US Letter width in points, used when a page has no usable dimensions.
pub const DEFAULT_PAGE_WIDTH: f32 = 612.0;
/// US Letter height in points.
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Bounding box with a top-left origin (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width of the box
    pub width: f32,
    /// Height of the box
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal midpoint.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Font information attached to a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Font family name (e.g., "Helvetica-Bold")
    pub family: String,
    /// Font size in points
    pub size: f32,
    /// Bold flag reported by the provider
    #[serde(default)]
    pub bold: bool,
    /// Italic flag reported by the provider
    #[serde(default)]
    pub italic: bool,
    /// Weight class (100-900), 400 when unknown
    #[serde(default = "default_weight")]
    pub weight: u16,
}

fn default_weight() -> u16 {
    400
}

impl FontDescriptor {
    /// Create a regular-weight font descriptor.
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
            weight: default_weight(),
        }
    }

    /// Mark the font as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Mark the font as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Set the weight class.
    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    /// Whether the font renders bold, from the flag, the weight class, or the family name.
    pub fn is_bold(&self) -> bool {
        if self.bold || self.weight >= 600 {
            return true;
        }
        let family = self.family.to_lowercase();
        family.contains("bold") || family.contains("black") || family.contains("heavy")
    }

    /// Whether the font renders italic.
    pub fn is_italic(&self) -> bool {
        if self.italic {
            return true;
        }
        let family = self.family.to_lowercase();
        family.contains("italic") || family.contains("oblique")
    }
}

/// A contiguous run of text with uniform font and a bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// The text content
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Position on the page
    pub bbox: BoundingBox,
    /// Font information
    pub font: FontDescriptor,
    /// Reading-order index, assigned by [`DocumentInput::normalize`]
    #[serde(default)]
    pub order: usize,
}

impl TextFragment {
    /// Create a new fragment.
    pub fn new(text: impl Into<String>, page: u32, bbox: BoundingBox, font: FontDescriptor) -> Self {
        Self {
            text: text.into(),
            page,
            bbox,
            font,
            order: 0,
        }
    }

    /// Trimmed text.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Character count of the trimmed text.
    pub fn char_len(&self) -> usize {
        self.trimmed().chars().count()
    }

    /// Check the fragment for values the scorers cannot handle.
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.page == 0 {
            return Err(Error::malformed(index, "page numbers are 1-based"));
        }
        if !self.font.size.is_finite() || self.font.size < 0.0 {
            return Err(Error::malformed(
                index,
                format!("invalid font size {}", self.font.size),
            ));
        }
        if !self.bbox.is_finite() {
            return Err(Error::malformed(index, "non-finite geometry"));
        }
        if self.bbox.width < 0.0 || self.bbox.height < 0.0 {
            return Err(Error::malformed(index, "negative box dimensions"));
        }
        Ok(())
    }

    /// Reading order: page, then top-to-bottom, then left-to-right.
    pub fn reading_cmp(&self, other: &Self) -> Ordering {
        self.page
            .cmp(&other.page)
            .then_with(|| self.bbox.y.total_cmp(&other.bbox.y))
            .then_with(|| self.bbox.x.total_cmp(&other.bbox.x))
    }
}

/// Page dimensions and provider flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Page has (near) zero extractable text and needs OCR
    #[serde(default)]
    pub image_only: bool,
}

impl PageInfo {
    /// Create a new page.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            image_only: false,
        }
    }

    /// Create a US Letter page.
    pub fn letter(number: u32) -> Self {
        Self::new(number, DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
    }

    /// Flag the page as image-only.
    pub fn image_only(mut self) -> Self {
        self.image_only = true;
        self
    }

    /// Whether the dimensions can be used as normalization baselines.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One document's worth of provider output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Source file name
    pub filename: String,
    /// Page dimensions, one entry per page
    #[serde(default)]
    pub pages: Vec<PageInfo>,
    /// Text fragments
    #[serde(default)]
    pub fragments: Vec<TextFragment>,
}

impl DocumentInput {
    /// Create an empty document input.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            pages: Vec::new(),
            fragments: Vec::new(),
        }
    }

    /// Add a page.
    pub fn with_page(mut self, page: PageInfo) -> Self {
        self.pages.push(page);
        self
    }

    /// Add a fragment.
    pub fn with_fragment(mut self, fragment: TextFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// Number of pages, from page info or the highest fragment page.
    pub fn page_count(&self) -> u32 {
        let from_pages = self.pages.iter().map(|p| p.number).max().unwrap_or(0);
        let from_fragments = self.fragments.iter().map(|f| f.page).max().unwrap_or(0);
        from_pages.max(from_fragments)
    }

    /// Look up page info by number.
    pub fn page(&self, number: u32) -> Option<&PageInfo> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Validate, drop blank fragments, and sort into reading order.
    ///
    /// In strict mode the first malformed fragment is returned as an error;
    /// otherwise malformed fragments are dropped with a warning.
    pub fn normalize(fragments: &[TextFragment], strict: bool) -> Result<Vec<TextFragment>> {
        let mut kept = Vec::with_capacity(fragments.len());
        for (index, fragment) in fragments.iter().enumerate() {
            if let Err(e) = fragment.validate(index) {
                if strict {
                    return Err(e);
                }
                log::warn!("Dropping fragment: {}", e);
                continue;
            }
            if fragment.trimmed().is_empty() {
                continue;
            }
            kept.push(fragment.clone());
        }

        kept.sort_by(|a, b| a.reading_cmp(b));
        for (order, fragment) in kept.iter_mut().enumerate() {
            fragment.order = order;
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, page: u32, x: f32, y: f32) -> TextFragment {
        TextFragment::new(
            text,
            page,
            BoundingBox::new(x, y, 100.0, 12.0),
            FontDescriptor::new("Times", 12.0),
        )
    }

    #[test]
    fn test_bold_detection() {
        assert!(FontDescriptor::new("Helvetica-Bold", 12.0).is_bold());
        assert!(FontDescriptor::new("Arial", 12.0).bold().is_bold());
        assert!(FontDescriptor::new("Arial", 12.0).with_weight(700).is_bold());
        assert!(!FontDescriptor::new("Helvetica-Oblique", 12.0).is_bold());
        assert!(FontDescriptor::new("Helvetica-Oblique", 12.0).is_italic());
    }

    #[test]
    fn test_validate_rejects_negative_size() {
        let mut f = fragment("Text", 1, 0.0, 0.0);
        f.font.size = -3.0;
        assert!(matches!(
            f.validate(7),
            Err(Error::MalformedFragment { index: 7, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_page_zero() {
        let f = fragment("Text", 0, 0.0, 0.0);
        assert!(f.validate(0).is_err());
    }

    #[test]
    fn test_normalize_reading_order() {
        let fragments = vec![
            fragment("page two", 2, 50.0, 10.0),
            fragment("right", 1, 300.0, 100.0),
            fragment("left", 1, 50.0, 100.0),
            fragment("top", 1, 50.0, 20.0),
            fragment("   ", 1, 50.0, 5.0),
        ];
        let sorted = DocumentInput::normalize(&fragments, true).unwrap();
        let texts: Vec<_> = sorted.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "left", "right", "page two"]);
        assert_eq!(
            sorted.iter().map(|f| f.order).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_normalize_lenient_drops_malformed() {
        let mut bad = fragment("bad", 1, 0.0, 0.0);
        bad.bbox.width = f32::NAN;
        let fragments = vec![fragment("good", 1, 0.0, 0.0), bad];

        assert!(DocumentInput::normalize(&fragments, true).is_err());
        let kept = DocumentInput::normalize(&fragments, false).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "good");
    }

    #[test]
    fn test_page_count() {
        let input = DocumentInput::new("doc.pdf")
            .with_page(PageInfo::letter(1))
            .with_fragment(fragment("late", 3, 0.0, 0.0));
        assert_eq!(input.page_count(), 3);
        assert!(input.page(1).is_some());
        assert!(input.page(2).is_none());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "text": "Intro",
            "page": 1,
            "bbox": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
            "font": {"family": "Times", "size": 12.0}
        }"#;
        let f: TextFragment = serde_json::from_str(json).unwrap();
        assert_eq!(f.font.weight, 400);
        assert!(!f.font.bold);
        assert_eq!(f.order, 0);
    }
}
