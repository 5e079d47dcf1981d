//! Script detection and language-specific rule tables.
//!
//! Every [`RuleSet`] has the same shape: an ordered numbering-pattern table
//! and a keyword table. The scorer only ever talks to the tables, so it
//! never branches on language itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::model::{clamp_unit, TextFragment};

/// Share of CJK letters above which a document is treated as CJK.
const CJK_SHARE: f32 = 0.3;
/// Share of Latin letters required for the Latin rule set.
const LATIN_SHARE: f32 = 0.6;

/// Detected document language / script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Latin-script text
    Latin,
    /// Chinese (Han without kana or Hangul)
    Chinese,
    /// Japanese (kana present)
    Japanese,
    /// Korean (Hangul dominant)
    Korean,
    /// Empty, unknown or mixed script
    #[default]
    Unknown,
}

impl Language {
    /// Short language tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Latin => "latin",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Unknown => "und",
        }
    }
}

/// Identifies one of the closed set of rule-set variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetKind {
    /// Latin-script tables, also the fallback
    Default,
    /// Chinese tables
    Chinese,
    /// Japanese tables
    Japanese,
    /// Korean tables
    Korean,
}

/// A numbering pattern anchored at the start of the text.
#[derive(Debug)]
pub struct NumberingPattern {
    /// Short pattern name
    pub name: &'static str,
    /// Compiled pattern
    pub regex: Regex,
    /// Score assigned when this is the first matching pattern
    pub confidence: f32,
}

impl NumberingPattern {
    fn new(name: &'static str, pattern: &str, confidence: f32) -> Self {
        Self {
            name,
            // Patterns are literals in this module and covered by tests.
            regex: Regex::new(pattern).expect("numbering pattern must compile"),
            confidence,
        }
    }
}

/// A language's numbering-pattern and keyword tables.
#[derive(Debug)]
pub struct RuleSet {
    kind: RuleSetKind,
    numbering: Vec<NumberingPattern>,
    keywords: Vec<(&'static str, f32)>,
}

impl RuleSet {
    /// The shared, read-only rule set for a language.
    pub fn for_language(language: Language) -> &'static RuleSet {
        match language {
            Language::Chinese => &CHINESE,
            Language::Japanese => &JAPANESE,
            Language::Korean => &KOREAN,
            Language::Latin | Language::Unknown => &DEFAULT,
        }
    }

    /// Which variant this is.
    pub fn kind(&self) -> RuleSetKind {
        self.kind
    }

    /// The ordered numbering patterns.
    pub fn numbering_patterns(&self) -> &[NumberingPattern] {
        &self.numbering
    }

    /// The keyword table.
    pub fn keywords(&self) -> &[(&'static str, f32)] {
        &self.keywords
    }

    /// First pattern matching the start of `text`.
    pub fn match_numbering(&self, text: &str) -> Option<&NumberingPattern> {
        let text = normalize_text(text);
        self.numbering.iter().find(|p| p.regex.is_match(&text))
    }

    /// Base confidence of the first matching pattern, 0 when none match.
    pub fn numbering_score(&self, text: &str) -> f32 {
        self.match_numbering(text).map_or(0.0, |p| p.confidence)
    }

    /// Sum of the weights of all keywords contained in `text`, clamped to 1.
    pub fn keyword_score(&self, text: &str) -> f32 {
        let text = normalize_text(text).to_lowercase();
        let sum: f32 = self
            .keywords
            .iter()
            .filter(|(term, _)| text.contains(term))
            .map(|(_, weight)| weight)
            .sum();
        clamp_unit(sum)
    }
}

/// NFKC-normalize and trim, so full-width digits and punctuation match the tables.
pub fn normalize_text(text: &str) -> String {
    text.trim().nfkc().collect()
}

/// The language detected for a document and its rule set.
#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    language: Language,
    rule_set: &'static RuleSet,
}

impl LanguageProfile {
    /// Profile for a known language.
    pub fn for_language(language: Language) -> Self {
        Self {
            language,
            rule_set: RuleSet::for_language(language),
        }
    }

    /// Classify the aggregate text of a fragment stream.
    pub fn detect(fragments: &[TextFragment]) -> Self {
        let counts = fragments
            .iter()
            .fold(ScriptCounts::default(), |mut acc, f| {
                acc.add(&f.text);
                acc
            });
        let language = counts.classify();
        log::debug!(
            "Detected language {} ({:?}), using {:?} rule set",
            language.tag(),
            counts,
            RuleSet::for_language(language).kind()
        );
        Self::for_language(language)
    }

    /// Classify a single string.
    pub fn from_text(text: &str) -> Self {
        let mut counts = ScriptCounts::default();
        counts.add(text);
        Self::for_language(counts.classify())
    }

    /// Detected language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Selected rule set.
    pub fn rule_set(&self) -> &'static RuleSet {
        self.rule_set
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ScriptCounts {
    latin: usize,
    han: usize,
    kana: usize,
    hangul: usize,
    other: usize,
}

impl ScriptCounts {
    fn add(&mut self, text: &str) {
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            let code = c as u32;
            if c.is_ascii_alphabetic() || (0x00C0..=0x024F).contains(&code) {
                self.latin += 1;
            } else if (0x4E00..=0x9FFF).contains(&code) || (0x3400..=0x4DBF).contains(&code) {
                self.han += 1;
            } else if (0x3040..=0x30FF).contains(&code) {
                self.kana += 1;
            } else if (0xAC00..=0xD7AF).contains(&code) || (0x1100..=0x11FF).contains(&code) {
                self.hangul += 1;
            } else {
                self.other += 1;
            }
        }
    }

    fn classify(&self) -> Language {
        let cjk = self.han + self.kana + self.hangul;
        let total = cjk + self.latin + self.other;
        if total == 0 {
            return Language::Unknown;
        }
        if cjk as f32 / total as f32 >= CJK_SHARE {
            if self.hangul > self.han + self.kana {
                return Language::Korean;
            }
            if self.kana > 0 {
                return Language::Japanese;
            }
            if self.han > 0 {
                return Language::Chinese;
            }
        }
        if self.latin as f32 / total as f32 >= LATIN_SHARE {
            Language::Latin
        } else {
            Language::Unknown
        }
    }
}

fn latin_numbering() -> Vec<NumberingPattern> {
    vec![
        NumberingPattern::new(
            "chapter",
            r"(?i)^(chapter|section|part)\s+(\d+|[ivxlc]+|[a-z])\b",
            0.9,
        ),
        NumberingPattern::new("appendix", r"(?i)^appendix\s+[a-z0-9]+\b", 0.9),
        NumberingPattern::new("decimal-3", r"^\d+\.\d+\.\d+\.?(\s|$)", 0.8),
        NumberingPattern::new("decimal-2", r"^\d+\.\d+\.?(\s|$)", 0.8),
        NumberingPattern::new("decimal", r"^\d+\.(\s|$|\p{L})", 0.8),
        NumberingPattern::new("letter", r"^[A-Z]\.(\s|$)", 0.7),
        NumberingPattern::new("roman", r"(?i)^[ivxlc]+\.(\s|$)", 0.7),
        NumberingPattern::new(
            "parenthetical",
            r"(?i)^\(\s*(\d+|[a-z]|[ivxlc]+)\s*\)(\s|$)",
            0.6,
        ),
        NumberingPattern::new("closing-paren", r"^(\d+|[a-z])\)\s", 0.5),
    ]
}

const LATIN_KEYWORDS: &[(&str, f32)] = &[
    ("introduction", 0.5),
    ("abstract", 0.5),
    ("conclusion", 0.5),
    ("references", 0.5),
    ("bibliography", 0.5),
    ("appendix", 0.5),
    ("contents", 0.5),
    ("summary", 0.4),
    ("background", 0.4),
    ("methodology", 0.4),
    ("results", 0.4),
    ("discussion", 0.4),
    ("acknowledg", 0.4),
    ("preface", 0.4),
    ("glossary", 0.4),
    ("overview", 0.3),
    ("chapter", 0.3),
    ("section", 0.3),
];

const CHINESE_KEYWORDS: &[(&str, f32)] = &[
    ("摘要", 0.5),
    ("引言", 0.5),
    ("绪论", 0.5),
    ("结论", 0.5),
    ("参考文献", 0.5),
    ("附录", 0.5),
    ("目录", 0.5),
    ("前言", 0.4),
    ("概述", 0.4),
    ("致谢", 0.4),
    ("背景", 0.3),
    ("方法", 0.3),
    ("结果", 0.3),
    ("讨论", 0.3),
];

const JAPANESE_KEYWORDS: &[(&str, f32)] = &[
    ("はじめに", 0.5),
    ("概要", 0.5),
    ("序論", 0.5),
    ("結論", 0.5),
    ("参考文献", 0.5),
    ("付録", 0.5),
    ("目次", 0.5),
    ("考察", 0.4),
    ("まとめ", 0.4),
    ("謝辞", 0.4),
    ("背景", 0.3),
    ("方法", 0.3),
    ("結果", 0.3),
];

const KOREAN_KEYWORDS: &[(&str, f32)] = &[
    ("서론", 0.5),
    ("요약", 0.5),
    ("결론", 0.5),
    ("참고문헌", 0.5),
    ("부록", 0.5),
    ("목차", 0.5),
    ("개요", 0.4),
    ("감사의 글", 0.4),
    ("배경", 0.3),
    ("방법", 0.3),
    ("결과", 0.3),
    ("논의", 0.3),
];

/// Language-specific table followed by the shared Latin entries.
fn with_latin_keywords(own: &[(&'static str, f32)]) -> Vec<(&'static str, f32)> {
    own.iter().chain(LATIN_KEYWORDS.iter()).copied().collect()
}

fn with_latin_numbering(mut own: Vec<NumberingPattern>) -> Vec<NumberingPattern> {
    own.extend(latin_numbering());
    own
}

static DEFAULT: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    kind: RuleSetKind::Default,
    numbering: latin_numbering(),
    keywords: LATIN_KEYWORDS.to_vec(),
});

static CHINESE: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    kind: RuleSetKind::Chinese,
    numbering: with_latin_numbering(vec![
        NumberingPattern::new(
            "cjk-chapter",
            r"^第\s*[一二三四五六七八九十百千零〇两\d]+\s*[章节篇部编卷]",
            0.9,
        ),
        NumberingPattern::new("cjk-ordinal", r"^[一二三四五六七八九十]+[、.]", 0.8),
        NumberingPattern::new("cjk-parenthetical", r"^\([一二三四五六七八九十]+\)", 0.6),
    ]),
    keywords: with_latin_keywords(CHINESE_KEYWORDS),
});

static JAPANESE: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    kind: RuleSetKind::Japanese,
    numbering: with_latin_numbering(vec![
        NumberingPattern::new(
            "cjk-chapter",
            r"^第\s*[一二三四五六七八九十百千零〇\d]+\s*[章節部編条]",
            0.9,
        ),
        NumberingPattern::new("cjk-ordinal", r"^[一二三四五六七八九十]+[、.]", 0.8),
        NumberingPattern::new("cjk-parenthetical", r"^\([一二三四五六七八九十]+\)", 0.6),
    ]),
    keywords: with_latin_keywords(JAPANESE_KEYWORDS),
});

static KOREAN: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    kind: RuleSetKind::Korean,
    numbering: with_latin_numbering(vec![
        NumberingPattern::new("korean-chapter", r"^제\s*\d+\s*[장절편부조]", 0.9),
        NumberingPattern::new("korean-ordinal", r"^[가나다라마바사아자차카타파하][.)]\s", 0.7),
    ]),
    keywords: with_latin_keywords(KOREAN_KEYWORDS),
});
