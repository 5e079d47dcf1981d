//! Data model shared by the outline pipeline.
//!
//! Fragments flow in from the layout provider, are scored into
//! [`ScoredCandidate`]s, promoted to [`LeveledHeading`]s, and finally
//! assembled into an [`Outline`] tree wrapped in an [`OutlineDocument`].

mod fragment;
mod heading;
mod outline;

pub use fragment::{
    BoundingBox, DocumentInput, FontDescriptor, PageInfo, TextFragment, DEFAULT_PAGE_HEIGHT,
    DEFAULT_PAGE_WIDTH,
};
pub use heading::{
    clamp_unit, ComponentScores, HeadingRole, LeveledHeading, ScoredCandidate, KEYWORD_WEIGHT,
    LENGTH_WEIGHT, NUMBERING_WEIGHT, POSITION_WEIGHT, SIZE_WEIGHT, STYLE_WEIGHT,
};
pub use outline::{
    DocumentInfo, FontSummary, Outline, OutlineDocument, OutlineEntry, OutlineNode,
    OutlineStatistics,
};
