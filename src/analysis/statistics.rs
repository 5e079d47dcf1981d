//! Document-relative normalization baselines.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::language::Language;
use crate::model::{PageInfo, TextFragment, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH};

/// Share of font sizes trimmed from each end before averaging.
const TRIM_SHARE: f32 = 0.1;

/// Font and page statistics for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Trimmed mean font size of body-like fragments
    pub avg_font_size: f32,
    /// Median font size
    pub median_font_size: f32,
    /// Standard deviation of font sizes
    pub font_size_std: f32,
    /// Most common font family
    pub primary_font: String,
    /// Resolved dimensions for every page
    pub pages: Vec<PageInfo>,
    /// Detected language
    pub language: Language,
    /// Number of fragments the statistics were computed from
    pub fragment_count: usize,
}

impl DocumentStats {
    /// Statistics for a document without fragments.
    pub fn empty() -> Self {
        Self {
            avg_font_size: 0.0,
            median_font_size: 0.0,
            font_size_std: 0.0,
            primary_font: String::new(),
            pages: Vec::new(),
            language: Language::default(),
            fragment_count: 0,
        }
    }

    /// Attach the detected language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Whether there is anything to score.
    pub fn is_empty(&self) -> bool {
        self.fragment_count == 0
    }

    /// Font size relative to the body size, 1.0 when the baseline is degenerate.
    pub fn size_ratio(&self, size: f32) -> f32 {
        if self.avg_font_size.is_nan() || self.avg_font_size <= f32::EPSILON || !size.is_finite() {
            return 1.0;
        }
        size / self.avg_font_size
    }

    /// Width and height of a page.
    pub fn page_size(&self, page: u32) -> (f32, f32) {
        self.pages
            .iter()
            .find(|p| p.number == page)
            .map(|p| (p.width, p.height))
            .unwrap_or((DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT))
    }

    /// Pages holding at least one fragment larger than `ratio` times the body size.
    pub fn key_pages(&self, fragments: &[TextFragment], ratio: f32) -> Vec<u32> {
        let threshold = self.avg_font_size * ratio;
        let pages: BTreeSet<u32> = fragments
            .iter()
            .filter(|f| f.font.size > threshold)
            .map(|f| f.page)
            .collect();
        pages.into_iter().collect()
    }
}

/// Computes [`DocumentStats`] from a fragment stream.
pub struct DocumentStatistics;

impl DocumentStatistics {
    /// Compute statistics. Pure function of its inputs.
    pub fn compute(fragments: &[TextFragment], pages: &[PageInfo]) -> DocumentStats {
        let mut stats = DocumentStats::empty();
        stats.pages = resolve_pages(fragments, pages);
        if fragments.is_empty() {
            return stats;
        }

        let mut sizes: Vec<f32> = fragments.iter().map(|f| f.font.size).collect();
        sizes.sort_by(|a, b| a.total_cmp(b));

        stats.fragment_count = fragments.len();
        stats.avg_font_size = trimmed_mean(&sizes);
        stats.median_font_size = median(&sizes);
        stats.font_size_std = std_dev(&sizes);
        stats.primary_font = modal_family(fragments);

        log::debug!(
            "Document stats - avg font size: {:.1}, median: {:.1}, primary font: {}",
            stats.avg_font_size,
            stats.median_font_size,
            stats.primary_font
        );
        stats
    }
}

/// Mean of the sizes with the top and bottom tails removed, so a single
/// oversized title cannot drag the body baseline upward.
fn trimmed_mean(sorted: &[f32]) -> f32 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let trim = if n >= 3 {
        ((n as f32 * TRIM_SHARE).ceil() as usize).min((n - 1) / 2)
    } else {
        0
    };
    let body = &sorted[trim..n - trim];
    body.iter().sum::<f32>() / body.len() as f32
}

fn median(sorted: &[f32]) -> f32 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}

/// Most frequent family; ties go to the alphabetically first name.
fn modal_family(fragments: &[TextFragment]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for fragment in fragments {
        *counts.entry(fragment.font.family.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (family, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((family, count));
        }
    }
    best.map(|(family, _)| family.to_string()).unwrap_or_default()
}

/// One entry per page number seen in either input, falling back to the
/// fragments' extent and then to US Letter.
fn resolve_pages(fragments: &[TextFragment], pages: &[PageInfo]) -> Vec<PageInfo> {
    let mut numbers: BTreeSet<u32> = pages.iter().map(|p| p.number).collect();
    numbers.extend(fragments.iter().map(|f| f.page));

    numbers
        .into_iter()
        .map(|number| {
            if let Some(page) = pages.iter().find(|p| p.number == number && p.is_usable()) {
                return *page;
            }
            let image_only = pages.iter().any(|p| p.number == number && p.image_only);
            let (width, height) = fragments
                .iter()
                .filter(|f| f.page == number)
                .fold((0.0f32, 0.0f32), |(w, h), f| {
                    (w.max(f.bbox.right()), h.max(f.bbox.bottom()))
                });
            let mut page = if width > 0.0 && height > 0.0 {
                PageInfo::new(number, width, height)
            } else {
                PageInfo::letter(number)
            };
            page.image_only = image_only;
            page
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, FontDescriptor};

    fn fragment(size: f32, family: &str, page: u32) -> TextFragment {
        TextFragment::new(
            "text",
            page,
            BoundingBox::new(72.0, 100.0, 200.0, size),
            FontDescriptor::new(family, size),
        )
    }

    #[test]
    fn test_trimmed_mean_ignores_title_outlier() {
        let mut fragments = vec![fragment(36.0, "Times-Bold", 1)];
        for _ in 0..9 {
            fragments.push(fragment(12.0, "Times", 1));
        }
        let stats = DocumentStatistics::compute(&fragments, &[]);
        assert!((stats.avg_font_size - 12.0).abs() < 0.01);
        assert_eq!(stats.primary_font, "Times");
        assert!((stats.median_font_size - 12.0).abs() < 0.01);
        assert!(stats.font_size_std > 0.0);
    }

    #[test]
    fn test_small_document_trims_tails() {
        let fragments = vec![
            fragment(24.0, "A", 1),
            fragment(12.0, "B", 1),
            fragment(12.0, "B", 1),
            fragment(10.0, "B", 1),
        ];
        let stats = DocumentStatistics::compute(&fragments, &[]);
        assert!((stats.avg_font_size - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_stream() {
        let stats = DocumentStatistics::compute(&[], &[PageInfo::letter(1)]);
        assert!(stats.is_empty());
        assert_eq!(stats.avg_font_size, 0.0);
        assert_eq!(stats.size_ratio(14.0), 1.0);
        assert_eq!(stats.pages.len(), 1);
    }

    #[test]
    fn test_zero_sizes_fall_back_to_unit_ratio() {
        let fragments = vec![fragment(0.0, "A", 1), fragment(0.0, "A", 1)];
        let stats = DocumentStatistics::compute(&fragments, &[]);
        assert_eq!(stats.size_ratio(0.0), 1.0);
    }

    #[test]
    fn test_uniform_sizes_give_unit_ratio() {
        let fragments = vec![fragment(11.0, "A", 1), fragment(11.0, "A", 1)];
        let stats = DocumentStatistics::compute(&fragments, &[]);
        assert!((stats.size_ratio(11.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_modal_family_tie_is_deterministic() {
        let fragments = vec![fragment(12.0, "Zapf", 1), fragment(12.0, "Arial", 1)];
        let stats = DocumentStatistics::compute(&fragments, &[]);
        assert_eq!(stats.primary_font, "Arial");
    }

    #[test]
    fn test_page_resolution() {
        let fragments = vec![fragment(12.0, "A", 1), fragment(12.0, "A", 2)];
        let pages = vec![PageInfo::new(1, 595.0, 842.0)];
        let stats = DocumentStatistics::compute(&fragments, &pages);
        assert_eq!(stats.page_size(1), (595.0, 842.0));
        // Page 2 falls back to the fragment extent
        assert_eq!(stats.page_size(2), (272.0, 112.0));
        // Unknown pages fall back to Letter
        assert_eq!(stats.page_size(9), (612.0, 792.0));
    }

    #[test]
    fn test_key_pages() {
        let fragments = vec![
            fragment(12.0, "A", 1),
            fragment(12.0, "A", 1),
            fragment(12.0, "A", 2),
            fragment(30.0, "A", 3),
            fragment(12.0, "A", 3),
        ];
        let stats = DocumentStatistics::compute(&fragments, &[]);
        assert_eq!(stats.key_pages(&fragments, 1.5), vec![3]);
    }
}
