//! Level repair and confidence adjustment.
//!
//! Headings are replayed in reading order against a stack of open ancestor
//! levels. A heading may open at most one level below the innermost open
//! one; deeper headings are demoted and penalized. The title never enters
//! the stack.

use std::collections::BTreeMap;

use crate::model::{clamp_unit, HeadingRole, LeveledHeading};

/// Confidence multiplier for a demoted heading.
pub const REPAIR_PENALTY: f32 = 0.9;
/// Confidence bonus for numbered headings.
pub const NUMBERING_BONUS: f32 = 0.1;
/// Headings longer than this are penalized.
pub const LONG_HEADING_CHARS: usize = 80;
/// Confidence multiplier for long headings.
pub const LONG_HEADING_PENALTY: f32 = 0.8;
/// Confidence multiplier for headings matching their level's dominant size.
pub const CONSISTENCY_REWARD: f32 = 1.1;

/// Current nesting state of the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingState {
    /// No heading is open
    Root,
    /// The innermost open heading has this level
    Depth(u8),
}

/// Result of placing one heading on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Level the heading was placed at
    pub level: u8,
    /// Whether the proposed level had to be lowered
    pub demoted: bool,
}

/// Stack of open ancestor levels.
#[derive(Debug, Clone, Default)]
pub struct LevelStack {
    levels: Vec<u8>,
}

impl LevelStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of the innermost open heading, 0 at the root.
    pub fn top(&self) -> u8 {
        self.levels.last().copied().unwrap_or(0)
    }

    /// Current state.
    pub fn state(&self) -> NestingState {
        match self.levels.last() {
            None => NestingState::Root,
            Some(&level) => NestingState::Depth(level),
        }
    }

    /// Open levels from the outermost inward.
    pub fn open_levels(&self) -> &[u8] {
        &self.levels
    }

    /// Place a heading with the proposed level, closing any open headings
    /// at the same or a deeper level.
    pub fn place(&mut self, proposed: u8) -> Placement {
        let proposed = proposed.max(1);
        let allowed = self.top() + 1;
        let (level, demoted) = if proposed > allowed {
            (allowed, true)
        } else {
            (proposed, false)
        };

        while self.levels.last().is_some_and(|&open| open >= level) {
            self.levels.pop();
        }
        self.levels.push(level);
        Placement { level, demoted }
    }
}

/// Font sizes seen so far per level, bucketed to 0.1 pt.
#[derive(Debug, Default)]
struct SizeHistogram {
    levels: BTreeMap<u8, BTreeMap<i64, usize>>,
}

impl SizeHistogram {
    fn bucket(size: f32) -> i64 {
        (f64::from(size) * 10.0).round() as i64
    }

    /// Most frequent bucket for a level, ties going to the larger size.
    fn dominant(&self, level: u8) -> Option<i64> {
        let counts = self.levels.get(&level)?;
        let mut best: Option<(i64, usize)> = None;
        for (&bucket, &count) in counts {
            // Ascending buckets, so `>=` lets the larger size win ties.
            if best.map_or(true, |(_, c)| count >= c) {
                best = Some((bucket, count));
            }
        }
        best.map(|(bucket, _)| bucket)
    }

    fn record(&mut self, level: u8, size: f32) {
        *self
            .levels
            .entry(level)
            .or_default()
            .entry(Self::bucket(size))
            .or_insert(0) += 1;
    }
}

/// Enforces monotonic nesting and applies confidence adjustments.
#[derive(Debug, Clone, Default)]
pub struct HierarchyValidator;

impl HierarchyValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self
    }

    /// Replay headings in the given order and return them repaired.
    pub fn validate<'a>(&self, headings: Vec<LeveledHeading<'a>>) -> Vec<LeveledHeading<'a>> {
        let mut stack = LevelStack::new();
        let mut sizes = SizeHistogram::default();
        let mut repaired_count = 0usize;

        let result: Vec<_> = headings
            .into_iter()
            .map(|mut heading| {
                let placement = stack.place(heading.proposed.level());
                if placement.demoted {
                    repaired_count += 1;
                    log::debug!(
                        "Demoting '{}' from H{} to H{}",
                        heading.text(),
                        heading.proposed.level(),
                        placement.level
                    );
                    heading.confidence *= REPAIR_PENALTY;
                    heading.repaired = true;
                }
                heading.role = HeadingRole::Level(placement.level);
                heading.confidence = adjust_confidence(&heading, &sizes);
                sizes.record(placement.level, heading.candidate.font_size());
                heading
            })
            .collect();

        if repaired_count > 0 {
            log::debug!("Repaired {} heading level(s)", repaired_count);
        }
        result
    }
}

fn adjust_confidence(heading: &LeveledHeading<'_>, sizes: &SizeHistogram) -> f32 {
    let mut confidence = heading.confidence;
    if heading.candidate.is_numbered() {
        confidence = (confidence + NUMBERING_BONUS).min(1.0);
    }
    if heading.fragment().char_len() > LONG_HEADING_CHARS {
        confidence *= LONG_HEADING_PENALTY;
    }
    let bucket = SizeHistogram::bucket(heading.candidate.font_size());
    if sizes.dominant(heading.level()) == Some(bucket) {
        confidence *= CONSISTENCY_REWARD;
    }
    clamp_unit(confidence)
}
