//! Heading analysis stages.
//!
//! Each stage consumes the previous stage's output and produces a new
//! value: statistics and language profile, per-fragment scores, filtered
//! candidates, leveled headings and finally the repaired hierarchy.

pub mod budget;
pub mod classifier;
pub mod filter;
pub mod hierarchy;
pub mod language;
pub mod options;
pub mod scorer;
pub mod statistics;

pub use budget::{CancelHandle, TimeBudget};
pub use classifier::{Classification, LevelClassifier, MAX_LEVELS};
pub use filter::{CandidateFilter, FilterVerdict};
pub use hierarchy::{HierarchyValidator, LevelStack, NestingState, Placement};
pub use language::{Language, LanguageProfile, NumberingPattern, RuleSet, RuleSetKind};
pub use options::{ErrorMode, OutlineConfig};
pub use scorer::HeuristicScorer;
pub use statistics::{DocumentStatistics, DocumentStats};
