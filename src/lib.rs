//! # pdf-outline
//!
//! Heading detection and outline extraction for PDF text layouts.
//!
//! This library takes the positioned, font-annotated text fragments a PDF
//! layout provider emits and turns them into a validated outline: a
//! document title plus up to three heading levels, each with a confidence.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_outline::{extract_outline_file, to_json, JsonFormat, OutlineConfig};
//!
//! fn main() -> pdf_outline::Result<()> {
//!     let doc = extract_outline_file("report.fragments.json", &OutlineConfig::default())?;
//!     println!("{}", to_json(&doc, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## How it works
//!
//! - **Statistics**: body font size (trimmed mean), primary font, page sizes
//! - **Language**: script detection selects numbering and keyword tables
//! - **Scoring**: six weighted signals per fragment (size, style, position,
//!   numbering, keywords, length)
//! - **Classification**: font-size groups become H1-H3, plus an optional title
//! - **Repair**: a level stack removes jumps such as an H3 directly under H1
//! - **Batch**: documents run concurrently on a Rayon pool, each under its
//!   own time budget

pub mod analysis;
pub mod assemble;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;

// Re-export commonly used types
pub use analysis::{
    CandidateFilter, DocumentStatistics, DocumentStats, ErrorMode, FilterVerdict,
    HeuristicScorer, HierarchyValidator, Language, LanguageProfile, LevelClassifier, LevelStack,
    OutlineConfig, RuleSet, RuleSetKind, TimeBudget,
};
pub use assemble::{to_json, JsonFormat, OutlineAssembler, OutlineValidator, QualityReport};
pub use error::{Error, Result};
pub use model::{
    BoundingBox, ComponentScores, DocumentInfo, DocumentInput, FontDescriptor, HeadingRole,
    LeveledHeading, Outline, OutlineDocument, OutlineEntry, OutlineNode, OutlineStatistics,
    PageInfo, ScoredCandidate, TextFragment,
};
pub use pipeline::{load_document, BatchEvent, BatchOutcome, CandidateReport, OutlineExtractor};
pub use provider::{DetailedAnalyzer, OcrEngine};

use std::path::Path;

/// Extract the outline of one document.
///
/// # Example
///
/// ```
/// use pdf_outline::{extract_outline, DocumentInput, OutlineConfig};
///
/// let doc = extract_outline(&DocumentInput::new("empty.pdf"), &OutlineConfig::default()).unwrap();
/// assert!(doc.outline.is_empty());
/// ```
pub fn extract_outline(input: &DocumentInput, config: &OutlineConfig) -> Result<OutlineDocument> {
    OutlineExtractor::new(config.clone())?.extract(input)
}

/// Load a fragment-stream JSON file and extract its outline.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{extract_outline_file, OutlineConfig};
///
/// let config = OutlineConfig::new().lenient().with_min_confidence(0.6);
/// let doc = extract_outline_file("paper.json", &config).unwrap();
/// println!("{} headings", doc.statistics.total_headings);
/// ```
pub fn extract_outline_file<P: AsRef<Path>>(path: P, config: &OutlineConfig) -> Result<OutlineDocument> {
    let input = load_document(path)?;
    extract_outline(&input, config)
}

/// Load a fragment-stream JSON file with `tokio::fs` and extract its
/// outline on the blocking pool.
#[cfg(feature = "async")]
pub async fn extract_file_async<P: AsRef<Path>>(
    path: P,
    config: OutlineConfig,
) -> Result<OutlineDocument> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let input = pipeline::parse_document(&content, path)?;
    let extractor = OutlineExtractor::new(config)?;

    tokio::task::spawn_blocking(move || extractor.extract(&input))
        .await
        .map_err(|e| Error::WorkerPanic(format!("{}: {}", path.display(), e)))?
}
