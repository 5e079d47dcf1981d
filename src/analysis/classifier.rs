//! Font-size clustering into a title and up to three heading levels.

use super::options::OutlineConfig;
use crate::model::{HeadingRole, LeveledHeading, ScoredCandidate};

/// Number of heading levels.
pub const MAX_LEVELS: usize = 3;

/// Output of the classifier.
#[derive(Debug, Clone, Default)]
pub struct Classification<'a> {
    /// Promoted title, if any
    pub title: Option<LeveledHeading<'a>>,
    /// Leveled headings in reading order
    pub headings: Vec<LeveledHeading<'a>>,
    /// Candidates outside the top size groups
    pub discarded: usize,
}

/// Assigns levels by font-size group.
#[derive(Debug, Clone)]
pub struct LevelClassifier {
    size_tolerance: f32,
    promote_title: bool,
}

impl LevelClassifier {
    /// Create a classifier from the configuration.
    pub fn new(config: &OutlineConfig) -> Self {
        Self {
            size_tolerance: config.size_tolerance,
            promote_title: config.promote_title,
        }
    }

    /// Classify filtered candidates.
    pub fn classify<'a>(&self, mut candidates: Vec<ScoredCandidate<'a>>) -> Classification<'a> {
        candidates.sort_by(|a, b| {
            a.fragment
                .reading_cmp(b.fragment)
                .then_with(|| a.fragment.order.cmp(&b.fragment.order))
        });

        let title = if self.promote_title {
            self.select_title(&candidates)
                .map(|index| LeveledHeading::new(candidates.remove(index), HeadingRole::Title))
        } else {
            None
        };

        let sizes: Vec<f32> = candidates.iter().map(|c| c.font_size()).collect();
        let groups = self.size_groups(&sizes);
        log::debug!("Font size groups: {:?}", groups);

        let total = candidates.len();
        let headings: Vec<LeveledHeading<'a>> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let level = self.level_for(candidate.font_size(), &groups)?;
                Some(LeveledHeading::new(candidate, HeadingRole::Level(level)))
            })
            .collect();

        Classification {
            title,
            discarded: total - headings.len(),
            headings,
        }
    }

    /// Index of the title candidate: the highest-scoring candidate on the
    /// first page, kept only if it is strictly larger than every other
    /// candidate or centered.
    fn select_title(&self, candidates: &[ScoredCandidate<'_>]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.fragment.page != 1 {
                continue;
            }
            if best.map_or(true, |b| candidate.confidence > candidates[b].confidence) {
                best = Some(i);
            }
        }
        let index = best?;
        let chosen = &candidates[index];

        let largest_other = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| c.font_size())
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));
        let dominates = largest_other.map_or(true, |other| {
            chosen.font_size() > other + self.size_tolerance
        });

        if dominates || chosen.centered {
            log::debug!("Promoting title: {}", chosen.text());
            Some(index)
        } else {
            None
        }
    }

    /// Distinct size groups, largest first. A size joins the current group
    /// while it is within tolerance of the group's largest size.
    pub fn size_groups(&self, sizes: &[f32]) -> Vec<f32> {
        let mut sorted = sizes.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let mut groups: Vec<f32> = Vec::new();
        for size in sorted {
            match groups.last() {
                Some(&anchor) if anchor - size <= self.size_tolerance => {}
                _ => groups.push(size),
            }
        }
        groups
    }

    /// Level (1-based) of a size, or `None` outside the top groups.
    pub fn level_for(&self, size: f32, groups: &[f32]) -> Option<u8> {
        let index = groups
            .iter()
            .position(|&anchor| anchor - size <= self.size_tolerance)?;
        (index < MAX_LEVELS).then(|| index as u8 + 1)
    }
}
