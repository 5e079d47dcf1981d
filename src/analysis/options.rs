//! Outline extraction options and configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Options for heading detection and outline assembly.
///
/// The pipeline never reads ambient settings; a single value of this type
/// is passed explicitly into every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Minimum composite confidence for a heading candidate
    pub min_confidence: f32,

    /// Minimum trimmed heading length in characters
    pub min_heading_length: usize,

    /// Maximum trimmed heading length in characters
    pub max_heading_length: usize,

    /// Size-ratio thresholds for the 0.8 / 0.6 / 0.4 font-size score buckets
    pub size_multipliers: [f32; 3],

    /// Wall-clock budget per document
    #[serde(with = "duration_secs")]
    pub time_budget: Duration,

    /// Number of documents processed concurrently in a batch
    pub batch_size: usize,

    /// How malformed input and collaborator failures are handled
    pub error_mode: ErrorMode,

    /// Left edges within this share of the page width count as left-aligned
    pub left_margin_ratio: f32,

    /// Tops within this share of the page height count as top-of-page
    pub top_margin_ratio: f32,

    /// Maximum midpoint offset, as a share of page width, to count as centered
    pub centering_tolerance: f32,

    /// Font sizes within this many points fall into one size group
    pub size_tolerance: f32,

    /// Share of the time budget after which optional passes are skipped
    pub budget_approach_ratio: f32,

    /// Keep only the first candidate per case-insensitive text
    pub deduplicate: bool,

    /// Drop long sentence-like candidates ending in punctuation
    pub reject_sentences: bool,

    /// Promote a title candidate from the first page
    pub promote_title: bool,
}

impl OutlineConfig {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum confidence.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Set the accepted heading length range.
    pub fn with_length_range(mut self, min: usize, max: usize) -> Self {
        self.min_heading_length = min;
        self.max_heading_length = max;
        self
    }

    /// Set the font-size bucket multipliers.
    pub fn with_size_multipliers(mut self, multipliers: [f32; 3]) -> Self {
        self.size_multipliers = multipliers;
        self
    }

    /// Set the per-document time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Set the batch concurrency width.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (drop malformed input).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable duplicate suppression.
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Enable or disable rejection of sentence-like candidates.
    pub fn with_sentence_rejection(mut self, reject: bool) -> Self {
        self.reject_sentences = reject;
        self
    }

    /// Enable or disable title promotion.
    pub fn with_title_promotion(mut self, promote: bool) -> Self {
        self.promote_title = promote;
        self
    }

    /// Set the near-equal font size tolerance in points.
    pub fn with_size_tolerance(mut self, tolerance: f32) -> Self {
        self.size_tolerance = tolerance;
        self
    }

    /// Whether malformed input is an error.
    pub fn is_strict(&self) -> bool {
        self.error_mode == ErrorMode::Strict
    }

    /// Check that every value lies in its accepted range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfig(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.min_heading_length == 0 || self.min_heading_length > self.max_heading_length {
            return Err(Error::InvalidConfig(format!(
                "heading length range {}..={} is empty",
                self.min_heading_length, self.max_heading_length
            )));
        }
        let [m1, m2, m3] = self.size_multipliers;
        if !(m3 > 0.0 && m2 > m3 && m1 > m2 && m1 < 2.0) {
            return Err(Error::InvalidConfig(format!(
                "size multipliers must be positive, strictly descending and below 2.0, got {:?}",
                self.size_multipliers
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        for (name, ratio) in [
            ("left_margin_ratio", self.left_margin_ratio),
            ("top_margin_ratio", self.top_margin_ratio),
            ("centering_tolerance", self.centering_tolerance),
            ("budget_approach_ratio", self.budget_approach_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if self.size_tolerance.is_nan() || self.size_tolerance < 0.0 {
            return Err(Error::InvalidConfig(
                "size_tolerance must not be negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            min_heading_length: 3,
            max_heading_length: 200,
            size_multipliers: [1.5, 1.3, 1.15],
            time_budget: Duration::from_secs(10),
            batch_size: 5,
            error_mode: ErrorMode::Strict,
            left_margin_ratio: 0.15,
            top_margin_ratio: 0.15,
            centering_tolerance: 0.05,
            size_tolerance: 0.5,
            budget_approach_ratio: 0.8,
            deduplicate: true,
            reject_sentences: false,
            promote_title: true,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Fail the document on malformed input
    #[default]
    Strict,
    /// Skip invalid content and continue
    Lenient,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("time budget must be a non-negative number"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
