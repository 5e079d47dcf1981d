//! Threshold filtering of scored candidates.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::options::OutlineConfig;
use crate::model::ScoredCandidate;

/// Sentence-like candidates must be longer than this to be rejected.
const SENTENCE_MIN_CHARS: usize = 20;

/// Why a candidate was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVerdict {
    /// Candidate survives the filter
    Accepted,
    /// Composite confidence below the minimum
    LowConfidence,
    /// Trimmed text shorter than the minimum length
    TooShort,
    /// Trimmed text longer than the maximum length
    TooLong,
    /// Long text ending in sentence punctuation
    Sentence,
    /// Same text as an earlier accepted candidate
    Duplicate,
}

impl FilterVerdict {
    /// Whether the candidate survives.
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterVerdict::Accepted)
    }
}

impl fmt::Display for FilterVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterVerdict::Accepted => "accepted",
            FilterVerdict::LowConfidence => "low confidence",
            FilterVerdict::TooShort => "too short",
            FilterVerdict::TooLong => "too long",
            FilterVerdict::Sentence => "sentence",
            FilterVerdict::Duplicate => "duplicate",
        };
        f.write_str(s)
    }
}

/// Drops candidates below the confidence and length thresholds.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    min_confidence: f32,
    min_length: usize,
    max_length: usize,
    reject_sentences: bool,
    deduplicate: bool,
}

impl CandidateFilter {
    /// Create a filter from the configuration.
    pub fn new(config: &OutlineConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            min_length: config.min_heading_length,
            max_length: config.max_heading_length,
            reject_sentences: config.reject_sentences,
            deduplicate: config.deduplicate,
        }
    }

    /// Keep the surviving candidates, in their original order.
    pub fn apply<'a>(&self, candidates: Vec<ScoredCandidate<'a>>) -> Vec<ScoredCandidate<'a>> {
        let verdicts = self.verdicts(&candidates);
        candidates
            .into_iter()
            .zip(verdicts)
            .filter(|(_, verdict)| verdict.is_accepted())
            .map(|(candidate, _)| candidate)
            .collect()
    }

    /// The verdict for every candidate, in order.
    pub fn verdicts(&self, candidates: &[ScoredCandidate<'_>]) -> Vec<FilterVerdict> {
        let mut seen: HashSet<String> = HashSet::new();
        candidates
            .iter()
            .map(|candidate| {
                let verdict = self.check(candidate);
                if !verdict.is_accepted() || !self.deduplicate {
                    return verdict;
                }
                if seen.insert(candidate.text().to_lowercase()) {
                    FilterVerdict::Accepted
                } else {
                    FilterVerdict::Duplicate
                }
            })
            .collect()
    }

    /// Verdict for one candidate, ignoring duplicates.
    pub fn check(&self, candidate: &ScoredCandidate<'_>) -> FilterVerdict {
        let length = candidate.fragment.char_len();
        if candidate.confidence < self.min_confidence {
            FilterVerdict::LowConfidence
        } else if length < self.min_length {
            FilterVerdict::TooShort
        } else if length > self.max_length {
            FilterVerdict::TooLong
        } else if self.reject_sentences && is_sentence(candidate.text(), length) {
            FilterVerdict::Sentence
        } else {
            FilterVerdict::Accepted
        }
    }
}

fn is_sentence(text: &str, length: usize) -> bool {
    length > SENTENCE_MIN_CHARS && text.ends_with(['.', '!', '?', ';', ':'])
}
