//! Structural and quality checks for emitted outlines.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{OutlineDocument, OutlineEntry};

/// Headings below this confidence count as low-confidence.
const LOW_CONFIDENCE: f32 = 0.5;
/// Titles longer than this are reported as long.
const LONG_TITLE_CHARS: usize = 100;
/// Characters of a heading title quoted in messages.
const QUOTE_CHARS: usize = 50;

/// Result of validating one outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// No errors were found
    pub is_valid: bool,
    /// Structural problems
    pub errors: Vec<String>,
    /// Suspicious but well-formed output
    pub warnings: Vec<String>,
    /// Hints for tuning the extraction
    pub suggestions: Vec<String>,
    /// Overall score in [0, 1]
    pub quality_score: f32,
    /// Descriptive statistics, absent for an empty outline
    pub statistics: Option<QualityStatistics>,
}

/// Descriptive statistics over an outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStatistics {
    /// Number of outline entries
    pub outline_length: usize,
    /// Entries per level (H1, H2, H3)
    pub level_distribution: [usize; 3],
    /// Lowest confidence
    pub min_confidence: f32,
    /// Highest confidence
    pub max_confidence: f32,
    /// Mean confidence
    pub avg_confidence: f32,
    /// Entries below the low-confidence threshold
    pub low_confidence_count: usize,
    /// Page of the first heading
    pub first_heading_page: u32,
    /// Page of the last heading
    pub last_heading_page: u32,
    /// Distinct pages holding a heading
    pub pages_with_headings: usize,
    /// Pages in the document
    pub total_pages: u32,
    /// Mean title length in characters
    pub avg_title_length: f32,
    /// Shortest title
    pub min_title_length: usize,
    /// Longest title
    pub max_title_length: usize,
    /// Titles over the long-title threshold
    pub long_titles_count: usize,
    /// Font analysis, when entries carry font summaries
    pub fonts: Option<FontAnalysis>,
}

/// Font sizes and families over an outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAnalysis {
    /// Smallest heading size
    pub min_size: f32,
    /// Largest heading size
    pub max_size: f32,
    /// Mean heading size
    pub avg_size: f32,
    /// Distinct sizes at 0.1 pt resolution
    pub unique_sizes: usize,
    /// Most common families, at most five
    pub families: Vec<(String, usize)>,
}

/// Checks outlines for hierarchy errors and scores their quality.
#[derive(Debug, Clone)]
pub struct OutlineValidator {
    slow_page_secs: f64,
    time_budget: Duration,
}

impl Default for OutlineValidator {
    fn default() -> Self {
        Self {
            slow_page_secs: 0.5,
            time_budget: Duration::from_secs(10),
        }
    }
}

impl OutlineValidator {
    /// Create a validator with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Score performance against this per-document budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Load an outline JSON file and validate it.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<QualityReport> {
        let content = std::fs::read_to_string(path)?;
        let doc: OutlineDocument = serde_json::from_str(&content)?;
        Ok(self.validate(&doc))
    }

    /// Validate an outline document.
    pub fn validate(&self, doc: &OutlineDocument) -> QualityReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut suggestions = Vec::new();
        let outline = &doc.outline;
        let pages = doc.document.pages;
        let stats = &doc.statistics;

        errors.extend(field_errors(outline));

        if pages > 0 {
            let per_page = doc.document.processing_time / f64::from(pages);
            if per_page > self.slow_page_secs {
                warnings.push(format!("Slow processing: {:.2}s per page", per_page));
                if per_page > 2.0 * self.slow_page_secs {
                    suggestions.push(
                        "Consider optimizing processing pipeline for better performance".into(),
                    );
                }
            }
        }

        if outline.is_empty() {
            warnings.push("No headings detected in document".into());
            suggestions
                .push("Check if document contains headings or adjust detection parameters".into());
        } else {
            errors.extend(hierarchy_errors(outline));

            let low = low_confidence_count(outline);
            if low * 2 > outline.len() {
                warnings.push(format!(
                    "Many headings have low confidence ({}/{})",
                    low,
                    outline.len()
                ));
                suggestions.push(
                    "Consider adjusting detection thresholds or reviewing document quality".into(),
                );
            }

            if pages > 0 {
                let coverage = coverage(outline, pages);
                if coverage < 0.1 {
                    warnings.push(format!(
                        "Low page coverage: headings found on only {:.1}% of pages",
                        coverage * 100.0
                    ));
                    suggestions
                        .push("Review heading detection parameters or document structure".into());
                }
            }
        }

        if stats.total_headings != outline.len() {
            errors.push(format!(
                "Statistics mismatch: total_headings ({}) != outline length ({})",
                stats.total_headings,
                outline.len()
            ));
        }
        if stats.h1_count == 0 && stats.total_headings > 0 {
            warnings.push("No H1 headings found - document structure may be unclear".into());
            suggestions.push("Review font size thresholds or heading detection logic".into());
        }
        if stats.h2_count > stats.h1_count.saturating_mul(10) {
            warnings.push("Very high H2 to H1 ratio - possible over-detection".into());
            suggestions.push("Consider increasing confidence thresholds for H2 headings".into());
        }

        QualityReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            suggestions,
            quality_score: self.quality_score(doc),
            statistics: describe(doc),
        }
    }

    /// Weighted score: confidence 30, hierarchy 25, coverage 20,
    /// distribution 15, performance 10.
    pub fn quality_score(&self, doc: &OutlineDocument) -> f32 {
        let outline = &doc.outline;
        if outline.is_empty() {
            return 0.0;
        }
        let stats = &doc.statistics;
        let mut score = stats.average_confidence * 30.0;

        let hierarchy_penalty = hierarchy_errors(outline).len() as f32 * 5.0;
        score += (25.0 - hierarchy_penalty).max(0.0);

        score += coverage(outline, doc.document.pages.max(1)) * 20.0;

        if stats.h1_count > 0 {
            score += 5.0;
        }
        if stats.h2_count > 0 {
            score += 5.0;
        }
        if stats.h1_count > 0 && stats.h2_count <= stats.h1_count.saturating_mul(5) {
            score += 5.0;
        }

        let budget = self.time_budget.as_secs_f64();
        let elapsed = doc.document.processing_time;
        if elapsed <= budget {
            score += 10.0;
        } else if elapsed <= 2.0 * budget {
            score += 5.0;
        }

        (score / 100.0).min(1.0)
    }
}

/// Level jumps and orphaned H2/H3 entries.
pub fn hierarchy_errors(outline: &[OutlineEntry]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut previous = 0u8;
    let mut h1_seen = false;
    let mut h2_seen = false;

    for (i, entry) in outline.iter().enumerate() {
        match entry.level {
            1 => h1_seen = true,
            2 => h2_seen = true,
            _ => {}
        }
        if entry.level > previous.saturating_add(1) {
            errors.push(format!(
                "Heading {}: Level jump from {} to {} - '{}'",
                i + 1,
                previous,
                entry.level,
                quote(&entry.title)
            ));
        }
        if entry.level == 2 && !h1_seen {
            errors.push(format!(
                "Heading {}: H2 without preceding H1 - '{}'",
                i + 1,
                quote(&entry.title)
            ));
        } else if entry.level == 3 && !h2_seen {
            errors.push(format!(
                "Heading {}: H3 without preceding H2 - '{}'",
                i + 1,
                quote(&entry.title)
            ));
        }
        previous = entry.level;
    }
    errors
}

fn field_errors(outline: &[OutlineEntry]) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, entry) in outline.iter().enumerate() {
        if !(1..=3).contains(&entry.level) {
            errors.push(format!("Heading {}: level {} out of range", i + 1, entry.level));
        }
        if entry.title.trim().is_empty() {
            errors.push(format!("Heading {}: empty title", i + 1));
        }
        if entry.page == 0 {
            errors.push(format!("Heading {}: page numbers are 1-based", i + 1));
        }
        if !(0.0..=1.0).contains(&entry.confidence) {
            errors.push(format!(
                "Heading {}: confidence {} outside [0, 1]",
                i + 1,
                entry.confidence
            ));
        }
    }
    errors
}

fn quote(title: &str) -> String {
    title.chars().take(QUOTE_CHARS).collect()
}

fn low_confidence_count(outline: &[OutlineEntry]) -> usize {
    outline
        .iter()
        .filter(|e| e.confidence < LOW_CONFIDENCE)
        .count()
}

fn coverage(outline: &[OutlineEntry], pages: u32) -> f32 {
    let with_headings: BTreeSet<u32> = outline.iter().map(|e| e.page).collect();
    with_headings.len() as f32 / pages as f32
}

fn describe(doc: &OutlineDocument) -> Option<QualityStatistics> {
    let outline = &doc.outline;
    if outline.is_empty() {
        return None;
    }

    let mut level_distribution = [0usize; 3];
    for entry in outline {
        if (1..=3).contains(&entry.level) {
            level_distribution[usize::from(entry.level) - 1] += 1;
        }
    }

    let confidences: Vec<f32> = outline.iter().map(|e| e.confidence).collect();
    let pages: Vec<u32> = outline.iter().map(|e| e.page).collect();
    let lengths: Vec<usize> = outline.iter().map(|e| e.title.chars().count()).collect();

    Some(QualityStatistics {
        outline_length: outline.len(),
        level_distribution,
        min_confidence: confidences.iter().copied().fold(f32::INFINITY, f32::min),
        max_confidence: confidences.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        avg_confidence: confidences.iter().sum::<f32>() / confidences.len() as f32,
        low_confidence_count: low_confidence_count(outline),
        first_heading_page: pages.iter().copied().min().unwrap_or(0),
        last_heading_page: pages.iter().copied().max().unwrap_or(0),
        pages_with_headings: pages.iter().collect::<BTreeSet<_>>().len(),
        total_pages: doc.document.pages,
        avg_title_length: lengths.iter().sum::<usize>() as f32 / lengths.len() as f32,
        min_title_length: lengths.iter().copied().min().unwrap_or(0),
        max_title_length: lengths.iter().copied().max().unwrap_or(0),
        long_titles_count: lengths.iter().filter(|&&l| l > LONG_TITLE_CHARS).count(),
        fonts: font_analysis(outline),
    })
}

fn font_analysis(outline: &[OutlineEntry]) -> Option<FontAnalysis> {
    let fonts: Vec<_> = outline.iter().filter_map(|e| e.font.as_ref()).collect();
    if fonts.is_empty() {
        return None;
    }

    let sizes: Vec<f32> = fonts.iter().map(|f| f.size).collect();
    let unique: BTreeSet<i64> = sizes
        .iter()
        .map(|s| (f64::from(*s) * 10.0).round() as i64)
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for font in &fonts {
        *counts.entry(font.family.as_str()).or_insert(0) += 1;
    }
    let mut families: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(family, count)| (family.to_string(), count))
        .collect();
    families.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    families.truncate(5);

    Some(FontAnalysis {
        min_size: sizes.iter().copied().fold(f32::INFINITY, f32::min),
        max_size: sizes.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        avg_size: sizes.iter().sum::<f32>() / sizes.len() as f32,
        unique_sizes: unique.len(),
        families,
    })
}
