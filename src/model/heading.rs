//! Intermediate heading types produced by the scoring pipeline.

use serde::{Deserialize, Serialize};

use super::TextFragment;

/// Weight of the font-size component in the composite confidence.
pub const SIZE_WEIGHT: f32 = 0.30;
/// Weight of the font-style component.
pub const STYLE_WEIGHT: f32 = 0.20;
/// Weight of the position component.
pub const POSITION_WEIGHT: f32 = 0.15;
/// Weight of the numbering component.
pub const NUMBERING_WEIGHT: f32 = 0.15;
/// Weight of the keyword component.
pub const KEYWORD_WEIGHT: f32 = 0.10;
/// Weight of the length component.
pub const LENGTH_WEIGHT: f32 = 0.10;

/// The six per-fragment heuristic scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Font size relative to the body size
    pub font_size: f32,
    /// Bold / distinct family / uppercase
    pub font_style: f32,
    /// Margin, top-of-page and isolation signals
    pub position: f32,
    /// Leading numbering pattern
    pub numbering: f32,
    /// Heading keywords
    pub keyword: f32,
    /// Text length bucket
    pub length: f32,
}

impl ComponentScores {
    /// Clamp every component into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            font_size: clamp_unit(self.font_size),
            font_style: clamp_unit(self.font_style),
            position: clamp_unit(self.position),
            numbering: clamp_unit(self.numbering),
            keyword: clamp_unit(self.keyword),
            length: clamp_unit(self.length),
        }
    }

    /// Weighted convex combination of the clamped components.
    pub fn composite(&self) -> f32 {
        let s = self.clamped();
        clamp_unit(
            SIZE_WEIGHT * s.font_size
                + STYLE_WEIGHT * s.font_style
                + POSITION_WEIGHT * s.position
                + NUMBERING_WEIGHT * s.numbering
                + KEYWORD_WEIGHT * s.keyword
                + LENGTH_WEIGHT * s.length,
        )
    }

    /// Named components, in weight order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("font_size", self.font_size),
            ("font_style", self.font_style),
            ("position", self.position),
            ("numbering", self.numbering),
            ("keyword", self.keyword),
            ("length", self.length),
        ]
        .into_iter()
    }
}

/// Clamp a score into [0, 1], mapping NaN to 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A fragment with its component scores and composite confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    /// The scored fragment
    pub fragment: &'a TextFragment,
    /// Component scores
    pub scores: ComponentScores,
    /// Composite confidence
    pub confidence: f32,
    /// Horizontal midpoint is near the page midpoint
    pub centered: bool,
}

impl<'a> ScoredCandidate<'a> {
    /// Trimmed text of the fragment.
    pub fn text(&self) -> &'a str {
        self.fragment.trimmed()
    }

    /// Font size of the fragment.
    pub fn font_size(&self) -> f32 {
        self.fragment.font.size
    }

    /// Whether the text matched a numbering pattern.
    pub fn is_numbered(&self) -> bool {
        self.scores.numbering > 0.0
    }
}

/// Role a candidate is promoted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingRole {
    /// Document title
    Title,
    /// Heading level 1-3
    Level(u8),
}

impl HeadingRole {
    /// Numeric level, 0 for the title.
    pub fn level(&self) -> u8 {
        match self {
            HeadingRole::Title => 0,
            HeadingRole::Level(l) => *l,
        }
    }
}

/// A candidate with an assigned role and final confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledHeading<'a> {
    /// The underlying scored candidate
    pub candidate: ScoredCandidate<'a>,
    /// Assigned role
    pub role: HeadingRole,
    /// Level proposed by the classifier, before repair
    pub proposed: HeadingRole,
    /// Confidence after repair adjustments
    pub confidence: f32,
    /// Whether the validator had to demote this heading
    pub repaired: bool,
}

impl<'a> LeveledHeading<'a> {
    /// Create a heading with the candidate's composite confidence.
    pub fn new(candidate: ScoredCandidate<'a>, role: HeadingRole) -> Self {
        let confidence = candidate.confidence;
        Self {
            candidate,
            role,
            proposed: role,
            confidence,
            repaired: false,
        }
    }

    /// Numeric level, 0 for the title.
    pub fn level(&self) -> u8 {
        self.role.level()
    }

    /// The source fragment.
    pub fn fragment(&self) -> &'a TextFragment {
        self.candidate.fragment
    }

    /// Trimmed heading text.
    pub fn text(&self) -> &'a str {
        self.candidate.text()
    }
}
