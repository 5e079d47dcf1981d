//! Six-signal heuristic scoring of text fragments.

use std::collections::BTreeMap;

use super::language::RuleSet;
use super::options::OutlineConfig;
use super::statistics::DocumentStats;
use crate::model::{clamp_unit, ComponentScores, ScoredCandidate, TextFragment};

/// Ratio at or above which the font-size score saturates.
const SIZE_RATIO_MAX: f32 = 2.0;
/// Gap to the nearest fragment above, in fragment heights, that counts as isolation.
const ISOLATION_GAP: f32 = 1.5;
/// Uppercase text shorter than this gets the style bonus.
const UPPERCASE_MAX_CHARS: usize = 50;

/// Scores fragments against document-relative baselines.
///
/// The scorer is a pure function of its inputs: the same fragments,
/// statistics and rule set always produce the same candidates.
pub struct HeuristicScorer<'c> {
    config: &'c OutlineConfig,
    stats: &'c DocumentStats,
    rules: &'static RuleSet,
}

impl<'c> HeuristicScorer<'c> {
    /// Create a scorer for one document.
    pub fn new(config: &'c OutlineConfig, stats: &'c DocumentStats, rules: &'static RuleSet) -> Self {
        Self {
            config,
            stats,
            rules,
        }
    }

    /// Score every fragment. One candidate per fragment, in input order.
    pub fn score_all<'a>(&self, fragments: &'a [TextFragment]) -> Vec<ScoredCandidate<'a>> {
        let isolated = isolation_flags(fragments);
        fragments
            .iter()
            .zip(isolated)
            .map(|(fragment, isolated)| self.score(fragment, isolated))
            .collect()
    }

    /// Score a single fragment, given whether it is isolated from the text above.
    pub fn score<'a>(&self, fragment: &'a TextFragment, isolated: bool) -> ScoredCandidate<'a> {
        let text = fragment.trimmed();
        let scores = ComponentScores {
            font_size: self.font_size_score(fragment.font.size),
            font_style: self.font_style_score(fragment),
            position: self.position_score(fragment, isolated),
            numbering: self.rules.numbering_score(text),
            keyword: self.rules.keyword_score(text),
            length: length_score(fragment.char_len()),
        }
        .clamped();

        ScoredCandidate {
            fragment,
            confidence: scores.composite(),
            scores,
            centered: self.is_centered(fragment),
        }
    }

    /// Bucketed size ratio against the body font size.
    pub fn font_size_score(&self, size: f32) -> f32 {
        let ratio = self.stats.size_ratio(size);
        let [m1, m2, m3] = self.config.size_multipliers;
        if ratio >= SIZE_RATIO_MAX {
            1.0
        } else if ratio >= m1 {
            0.8
        } else if ratio >= m2 {
            0.6
        } else if ratio >= m3 {
            0.4
        } else {
            0.1
        }
    }

    /// Bold, non-primary family and short all-uppercase text.
    pub fn font_style_score(&self, fragment: &TextFragment) -> f32 {
        let mut score = 0.0;
        if fragment.font.is_bold() {
            score += 0.6;
        }
        if !self.stats.primary_font.is_empty() && fragment.font.family != self.stats.primary_font {
            score += 0.3;
        }
        if is_uppercase(fragment.trimmed()) && fragment.char_len() < UPPERCASE_MAX_CHARS {
            score += 0.2;
        }
        clamp_unit(score)
    }

    /// Left margin, top of page and isolation.
    pub fn position_score(&self, fragment: &TextFragment, isolated: bool) -> f32 {
        let (width, height) = self.stats.page_size(fragment.page);
        let mut score = 0.0;
        if fragment.bbox.x <= width * self.config.left_margin_ratio {
            score += 0.4;
        }
        if fragment.bbox.y <= height * self.config.top_margin_ratio {
            score += 0.3;
        }
        if isolated {
            score += 0.3;
        }
        clamp_unit(score)
    }

    /// Horizontal midpoint within tolerance of the page midpoint.
    pub fn is_centered(&self, fragment: &TextFragment) -> bool {
        let (width, _) = self.stats.page_size(fragment.page);
        (fragment.bbox.center_x() - width / 2.0).abs() <= width * self.config.centering_tolerance
    }
}

/// Bucketed trimmed character count.
pub fn length_score(chars: usize) -> f32 {
    match chars {
        0..=10 => 0.3,
        11..=30 => 1.0,
        31..=60 => 0.7,
        61..=100 => 0.4,
        _ => 0.1,
    }
}

fn is_uppercase(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_uppercase())
}

/// For each fragment, whether the gap to the nearest fragment above it on
/// the same page exceeds the isolation threshold. A fragment with nothing
/// above it counts as isolated.
///
/// One sweep per page in top-to-bottom order, keeping the lowest bottom
/// edge seen so far. Fragments sharing a `y` do not shadow each other.
fn isolation_flags(fragments: &[TextFragment]) -> Vec<bool> {
    let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, fragment) in fragments.iter().enumerate() {
        by_page.entry(fragment.page).or_default().push(i);
    }

    let mut flags = vec![true; fragments.len()];
    for indices in by_page.values_mut() {
        // Stable; normalized input is already in this order
        indices.sort_by(|&a, &b| fragments[a].bbox.y.total_cmp(&fragments[b].bbox.y));

        let mut lowest_bottom: Option<f32> = None;
        let mut start = 0;
        while start < indices.len() {
            let y = fragments[indices[start]].bbox.y;
            let end = indices[start + 1..]
                .iter()
                .position(|&j| fragments[j].bbox.y != y)
                .map_or(indices.len(), |offset| start + 1 + offset);

            for &i in &indices[start..end] {
                if let Some(bottom) = lowest_bottom {
                    let current = &fragments[i];
                    flags[i] = current.bbox.y - bottom > ISOLATION_GAP * current.bbox.height;
                }
            }
            for &i in &indices[start..end] {
                let bottom = fragments[i].bbox.bottom();
                lowest_bottom = Some(lowest_bottom.map_or(bottom, |b| b.max(bottom)));
            }
            start = end;
        }
    }
    flags
}
