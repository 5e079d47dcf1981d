//! Integration tests for the outline pipeline.

use pdf_outline::assemble::hierarchy_errors;
use pdf_outline::{
    BoundingBox, DocumentInput, DocumentStatistics, FilterVerdict, FontDescriptor,
    HeuristicScorer, Language, LanguageProfile, OutlineAssembler, OutlineConfig, OutlineExtractor,
    PageInfo, RuleSet, TextFragment,
};

const BODY: &str = "Body text that runs across the page for a while";

fn body(page: u32, y: f32) -> TextFragment {
    TextFragment::new(
        BODY,
        page,
        BoundingBox::new(72.0, y, 450.0, 11.0),
        FontDescriptor::new("Times", 11.0),
    )
}

fn heading(text: &str, page: u32, y: f32, size: f32) -> TextFragment {
    TextFragment::new(
        text,
        page,
        BoundingBox::new(72.0, y, 250.0, size),
        FontDescriptor::new("Helvetica-Bold", size).bold(),
    )
}

fn body_block(page: u32, top: f32, lines: usize) -> Vec<TextFragment> {
    (0..lines).map(|i| body(page, top + i as f32 * 13.0)).collect()
}

fn extractor() -> OutlineExtractor {
    OutlineExtractor::new(OutlineConfig::default()).unwrap()
}

/// Title on page 1, a level-3 sized heading right after it, then
/// level-1 and level-2 headings on page 2.
fn titled_report() -> DocumentInput {
    let mut input = DocumentInput::new("report.pdf")
        .with_page(PageInfo::letter(1))
        .with_page(PageInfo::letter(2));
    input.fragments.push(TextFragment::new(
        "Annual Summary Report",
        1,
        BoundingBox::new(186.0, 60.0, 240.0, 30.0),
        FontDescriptor::new("Helvetica-Bold", 30.0).bold(),
    ));
    input.fragments.push(heading("A. Overview", 1, 150.0, 14.0));
    input.fragments.extend(body_block(1, 180.0, 12));
    input.fragments.push(heading("1. Introduction", 2, 150.0, 20.0));
    input.fragments.extend(body_block(2, 180.0, 12));
    input.fragments.push(heading("1.1 Scope", 2, 400.0, 16.0));
    input
}

/// Deterministic pseudo-random document.
fn synthetic(seed: u64, pages: u32) -> DocumentInput {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as f32 / (1u64 << 31) as f32
    };

    let mut input = DocumentInput::new(format!("synthetic-{}.pdf", seed));
    let labels = ["Introduction", "Methods", "Results", "Discussion", "Notes", "Overview"];
    for page in 1..=pages {
        input.pages.push(PageInfo::letter(page));
        let mut y = 60.0;
        while y < 720.0 {
            let roll = next();
            if roll < 0.15 {
                let size = [22.0, 18.0, 15.0, 13.5][(next() * 4.0) as usize % 4];
                let label = labels[(next() * labels.len() as f32) as usize % labels.len()];
                let text = format!("{}.{} {}", page, (y as u32) % 7, label);
                input.fragments.push(heading(&text, page, y, size));
                y += size + 20.0;
            } else {
                input.fragments.push(body(page, y));
                y += 13.0;
            }
        }
    }
    input
}

#[test]
fn test_numbered_heading_scenario() {
    let mut fragments = body_block(1, 400.0, 20);
    fragments.push(TextFragment::new(
        "1. Introduction",
        1,
        BoundingBox::new(50.0, 300.0, 200.0, 17.6),
        FontDescriptor::new("Arial-Bold", 17.6).bold(),
    ));
    let stats = DocumentStatistics::compute(&fragments, &[PageInfo::letter(1)]);
    let config = OutlineConfig::default();
    let scorer = HeuristicScorer::new(&config, &stats, RuleSet::for_language(Language::Latin));

    let candidate = scorer.score_all(&fragments).pop().unwrap();
    assert_eq!(candidate.scores.font_size, 0.8);
    assert!((candidate.scores.font_style - 0.9).abs() < 1e-6);
    assert_eq!(candidate.scores.numbering, 0.8);
    assert_eq!(candidate.scores.length, 1.0);
    assert!(candidate.confidence > 0.5);
}

#[test]
fn test_body_sentence_is_filtered() {
    let mut input = titled_report();
    input.fragments.push(body(2, 600.0));
    input.fragments.push(TextFragment::new(
        "This is body text describing the section in detail and continuing for a while longer.",
        2,
        BoundingBox::new(72.0, 613.0, 450.0, 11.0),
        FontDescriptor::new("Times", 11.0),
    ));

    let reports = extractor().inspect(&input).unwrap();
    let sentence = reports
        .iter()
        .find(|r| r.text.starts_with("This is body text"))
        .unwrap();
    assert!(sentence.confidence < 0.5);
    assert_eq!(sentence.verdict, FilterVerdict::LowConfidence);

    let doc = extractor().extract(&input).unwrap();
    assert!(!doc.outline.iter().any(|e| e.title.starts_with("This is")));
}

#[test]
fn test_title_then_deep_heading_is_repaired() {
    let input = titled_report();
    let doc = extractor().extract(&input).unwrap();

    let title = doc.title.as_ref().unwrap();
    assert_eq!(title.title, "Annual Summary Report");
    assert_eq!(title.level, 0);

    let summary: Vec<_> = doc
        .outline
        .iter()
        .map(|e| (e.title.as_str(), e.level))
        .collect();
    assert_eq!(
        summary,
        vec![("A. Overview", 1), ("1. Introduction", 1), ("1.1 Scope", 2)]
    );

    // Demotion penalty, then the numbering bonus
    let composite = extractor()
        .inspect(&input)
        .unwrap()
        .into_iter()
        .find(|r| r.text == "A. Overview")
        .unwrap()
        .confidence;
    let expected = (composite * 0.9 + 0.1).min(1.0);
    assert!((doc.outline[0].confidence - expected).abs() < 1e-3);
}

#[test]
fn test_shared_largest_size_both_level_one() {
    let mut input = DocumentInput::new("two.pdf").with_page(PageInfo::letter(1));
    input.fragments.push(heading("1. Background", 1, 150.0, 20.0));
    input.fragments.extend(body_block(1, 180.0, 6));
    input.fragments.push(heading("2. Approach", 1, 300.0, 20.0));
    input.fragments.extend(body_block(1, 330.0, 6));
    input.fragments.push(heading("2.1 Data Sources", 1, 450.0, 16.0));
    input.fragments.extend(body_block(1, 480.0, 6));

    let doc = extractor().extract(&input).unwrap();
    assert!(doc.title.is_none());
    let summary: Vec<_> = doc
        .outline
        .iter()
        .map(|e| (e.title.as_str(), e.level))
        .collect();
    assert_eq!(
        summary,
        vec![("1. Background", 1), ("2. Approach", 1), ("2.1 Data Sources", 2)]
    );
}

#[test]
fn test_outline_follows_reading_order() {
    let mut input = titled_report();
    input.fragments.reverse();
    let doc = extractor().extract(&input).unwrap();

    let pages: Vec<_> = doc.outline.iter().map(|e| e.page).collect();
    assert!(pages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(doc.outline[1].title, "1. Introduction");
    assert_eq!(doc.outline[2].title, "1.1 Scope");
}

#[test]
fn test_scores_in_unit_range() {
    for seed in 1..=5 {
        let reports = extractor().inspect(&synthetic(seed, 3)).unwrap();
        for r in reports {
            assert!((0.0..=1.0).contains(&r.confidence));
            for (name, value) in r.scores.iter() {
                assert!((0.0..=1.0).contains(&value), "{} = {}", name, value);
            }
        }
    }
}

#[test]
fn test_no_level_jumps_survive_repair() {
    for seed in 1..=8 {
        let doc = extractor().extract(&synthetic(seed, 4)).unwrap();
        let mut previous = 0u8;
        for entry in &doc.outline {
            assert!((1..=3).contains(&entry.level));
            assert!(entry.level <= previous + 1, "seed {}: {:?}", seed, doc.outline);
            previous = entry.level;
        }
        assert!(hierarchy_errors(&doc.outline)
            .iter()
            .all(|e| !e.contains("Level jump")));
    }
}

#[test]
fn test_extraction_is_deterministic() {
    let input = synthetic(42, 5);
    let first = extractor().extract(&input).unwrap();
    let second = extractor().extract(&input).unwrap();

    assert!(first.outline_eq(&second));
    assert_eq!(
        serde_json::to_string(&first.outline).unwrap(),
        serde_json::to_string(&second.outline).unwrap()
    );
}

#[test]
fn test_reassembly_is_idempotent() {
    let doc = extractor().extract(&titled_report()).unwrap();
    let rebuilt = OutlineAssembler::new().from_entries(doc.title.as_ref(), &doc.outline);
    assert_eq!(rebuilt, doc.tree);
}

#[test]
fn test_statistics_match_outline() {
    let doc = extractor().extract(&synthetic(7, 4)).unwrap();
    let stats = &doc.statistics;
    assert_eq!(stats.total_headings, doc.outline.len());
    assert_eq!(
        stats.h1_count + stats.h2_count + stats.h3_count,
        stats.total_headings
    );
    assert_eq!(doc.tree.total_items(), stats.total_headings);
}

#[test]
fn test_empty_input() {
    let doc = extractor()
        .extract(&DocumentInput::new("blank.pdf").with_page(PageInfo::letter(1)))
        .unwrap();
    assert!(doc.outline.is_empty());
    assert!(doc.title.is_none());
    assert_eq!(doc.statistics.total_headings, 0);
    assert_eq!(doc.statistics.average_confidence, 0.0);
    assert_eq!(doc.document.pages, 1);
}

#[test]
fn test_uniform_font_sizes() {
    let mut input = DocumentInput::new("flat.pdf");
    input.fragments.extend(body_block(1, 100.0, 30));
    let reports = extractor().inspect(&input).unwrap();
    assert!(reports.iter().all(|r| r.scores.font_size == 0.1));
    let doc = extractor().extract(&input).unwrap();
    assert!(doc.outline.is_empty());
}

#[test]
fn test_min_confidence_is_respected() {
    let strict = OutlineExtractor::new(OutlineConfig::default().with_min_confidence(0.99)).unwrap();
    let doc = strict.extract(&titled_report()).unwrap();
    assert!(doc.outline.is_empty());
}

#[test]
fn test_chinese_document_uses_cjk_rules() {
    let mut input = DocumentInput::new("zh.pdf").with_page(PageInfo::letter(1));
    input.fragments.push(TextFragment::new(
        "第一章 总则",
        1,
        BoundingBox::new(72.0, 150.0, 200.0, 20.0),
        FontDescriptor::new("SimHei", 20.0).bold(),
    ));
    for i in 0..12 {
        input.fragments.push(TextFragment::new(
            "本规定适用于公司内部的所有部门和员工的日常工作",
            1,
            BoundingBox::new(72.0, 190.0 + i as f32 * 14.0, 450.0, 11.0),
            FontDescriptor::new("SimSun", 11.0),
        ));
    }

    assert_eq!(
        LanguageProfile::detect(&input.fragments).language(),
        Language::Chinese
    );
    let reports = extractor().inspect(&input).unwrap();
    let chapter = reports.iter().find(|r| r.text == "第一章 总则").unwrap();
    assert_eq!(chapter.scores.numbering, 0.9);

    let doc = extractor().extract(&input).unwrap();
    assert_eq!(doc.document.language, "zh");
    let titles: Vec<_> = doc
        .title
        .iter()
        .chain(doc.outline.iter())
        .map(|e| e.title.as_str())
        .collect();
    assert_eq!(titles, vec!["第一章 总则"]);
}

#[test]
fn test_config_loaded_from_json() {
    let config: OutlineConfig =
        serde_json::from_str(r#"{"min_confidence": 0.99, "error_mode": "lenient"}"#).unwrap();
    assert!(!config.is_strict());
    let doc = OutlineExtractor::new(config)
        .unwrap()
        .extract(&titled_report())
        .unwrap();
    assert!(doc.outline.is_empty());
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_extract_file_async() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    std::fs::write(&path, serde_json::to_string(&titled_report()).unwrap()).unwrap();

    let doc = pdf_outline::extract_file_async(&path, OutlineConfig::default())
        .await
        .unwrap();
    assert_eq!(doc.statistics.total_headings, 3);
}
