//! Outline assembly, rendering and quality checks.

mod assembler;
mod json;
mod quality;

pub use assembler::OutlineAssembler;
pub use json::{to_json, JsonFormat};
pub use quality::{hierarchy_errors, FontAnalysis, OutlineValidator, QualityReport, QualityStatistics};
