//! Outline tree and the serialized output document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node of the outline tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineNode {
    /// Heading level (0 = title, 1-3 = headings)
    pub level: u8,
    /// Heading text
    pub title: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Final confidence
    pub confidence: f32,
    /// Font of the source fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSummary>,
    /// Nested headings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Create a new leaf node.
    pub fn new(level: u8, title: impl Into<String>, page: u32, confidence: f32) -> Self {
        Self {
            level,
            title: title.into(),
            page,
            confidence,
            font: None,
            children: Vec::new(),
        }
    }

    /// Add a child node.
    pub fn add_child(&mut self, child: OutlineNode) {
        self.children.push(child);
    }

    /// Flat entry for this node, without children.
    pub fn entry(&self) -> OutlineEntry {
        OutlineEntry {
            level: self.level,
            title: self.title.clone(),
            page: self.page,
            confidence: self.confidence,
            font: self.font.clone(),
        }
    }
}

/// Font size and family of a heading's source fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSummary {
    /// Font size in points
    pub size: f32,
    /// Font family
    pub family: String,
}

/// The assembled outline: an optional title plus the heading forest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Document title
    pub title: Option<OutlineNode>,
    /// Top-level headings
    pub nodes: Vec<OutlineNode>,
}

impl Outline {
    /// Create a new empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the outline has no headings (the title does not count).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of headings, including nested ones.
    pub fn total_items(&self) -> usize {
        fn count_items(nodes: &[OutlineNode]) -> usize {
            nodes.iter().map(|n| 1 + count_items(&n.children)).sum()
        }
        count_items(&self.nodes)
    }

    /// Pre-order flattening, which is the reading order of the headings.
    pub fn flatten(&self) -> Vec<OutlineEntry> {
        fn walk(nodes: &[OutlineNode], out: &mut Vec<OutlineEntry>) {
            for node in nodes {
                out.push(node.entry());
                walk(&node.children, out);
            }
        }
        let mut out = Vec::with_capacity(self.total_items());
        walk(&self.nodes, &mut out);
        out
    }
}

/// A flat outline entry as emitted to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level (1-3)
    pub level: u8,
    /// Heading text
    pub title: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Final confidence
    pub confidence: f32,
    /// Font of the source fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSummary>,
}

/// Summary counts over the outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineStatistics {
    /// Number of headings (title excluded)
    pub total_headings: usize,
    /// Number of level-1 headings
    pub h1_count: usize,
    /// Number of level-2 headings
    pub h2_count: usize,
    /// Number of level-3 headings
    pub h3_count: usize,
    /// Mean confidence over all headings
    pub average_confidence: f32,
}

impl OutlineStatistics {
    /// Count headings per level.
    pub fn from_entries(entries: &[OutlineEntry]) -> Self {
        let mut stats = Self {
            total_headings: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            match entry.level {
                1 => stats.h1_count += 1,
                2 => stats.h2_count += 1,
                3 => stats.h3_count += 1,
                _ => {}
            }
        }
        if !entries.is_empty() {
            let sum: f32 = entries.iter().map(|e| e.confidence).sum();
            stats.average_confidence = sum / entries.len() as f32;
        }
        stats
    }
}

/// Per-document information attached to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Source file name
    pub filename: String,
    /// Number of pages
    pub pages: u32,
    /// When the outline was produced
    pub processed_at: DateTime<Utc>,
    /// Wall-clock processing time in seconds
    pub processing_time: f64,
    /// Detected language tag
    #[serde(default)]
    pub language: String,
    /// The time budget cut optional analysis short
    #[serde(default)]
    pub degraded: bool,
}

/// The complete output for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineDocument {
    /// Document information
    pub document: DocumentInfo,
    /// Document title, if one was promoted
    pub title: Option<OutlineEntry>,
    /// Flat outline in reading order
    pub outline: Vec<OutlineEntry>,
    /// Summary counts
    pub statistics: OutlineStatistics,
    /// Nested outline tree
    #[serde(skip)]
    pub tree: Outline,
}

impl OutlineDocument {
    /// Build the output document from an assembled outline.
    pub fn new(document: DocumentInfo, tree: Outline) -> Self {
        let outline = tree.flatten();
        let statistics = OutlineStatistics::from_entries(&outline);
        Self {
            document,
            title: tree.title.as_ref().map(OutlineNode::entry),
            outline,
            statistics,
            tree,
        }
    }

    /// Compare everything except the wall-clock fields.
    pub fn outline_eq(&self, other: &Self) -> bool {
        self.document.filename == other.document.filename
            && self.document.pages == other.document.pages
            && self.document.language == other.document.language
            && self.title == other.title
            && self.outline == other.outline
            && self.statistics == other.statistics
    }
}
