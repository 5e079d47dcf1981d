//! Per-document outline pipeline and batch processing.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    CandidateFilter, DocumentStatistics, DocumentStats, FilterVerdict, HeuristicScorer,
    HierarchyValidator, LanguageProfile, LevelClassifier, OutlineConfig, TimeBudget,
};
use crate::assemble::OutlineAssembler;
use crate::error::{Error, Result};
use crate::model::{ComponentScores, DocumentInfo, DocumentInput, OutlineDocument, TextFragment};
use crate::provider::{DetailedAnalyzer, OcrEngine};

/// Pages holding a fragment larger than this multiple of the body size get
/// the detailed analysis pass.
pub const KEY_PAGE_RATIO: f32 = 1.5;

/// Extracts outlines from fragment streams.
///
/// # Example
///
/// ```
/// use pdf_outline::{BoundingBox, DocumentInput, FontDescriptor, OutlineConfig, OutlineExtractor, TextFragment};
///
/// let mut input = DocumentInput::new("report.pdf");
/// input.fragments.push(TextFragment::new(
///     "1. Introduction",
///     1,
///     BoundingBox::new(72.0, 300.0, 200.0, 20.0),
///     FontDescriptor::new("Helvetica-Bold", 20.0),
/// ));
/// for i in 0..10 {
///     input.fragments.push(TextFragment::new(
///         "Body text of the report continues here.",
///         1,
///         BoundingBox::new(72.0, 330.0 + i as f32 * 14.0, 400.0, 11.0),
///         FontDescriptor::new("Times", 11.0),
///     ));
/// }
///
/// let extractor = OutlineExtractor::new(OutlineConfig::default())?;
/// let doc = extractor.extract(&input)?;
/// assert_eq!(doc.document.filename, "report.pdf");
/// # Ok::<(), pdf_outline::Error>(())
/// ```
#[derive(Clone)]
pub struct OutlineExtractor {
    config: OutlineConfig,
    analyzer: Option<Arc<dyn DetailedAnalyzer>>,
    ocr: Option<Arc<dyn OcrEngine>>,
}

/// Fragments and baselines ready for scoring.
struct Prepared {
    fragments: Vec<TextFragment>,
    stats: DocumentStats,
    profile: LanguageProfile,
    degraded: bool,
}

/// Per-fragment scoring details, as shown by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Trimmed fragment text
    pub text: String,
    /// Page number
    pub page: u32,
    /// Font size in points
    pub font_size: f32,
    /// Component scores
    pub scores: ComponentScores,
    /// Composite confidence
    pub confidence: f32,
    /// Horizontally centered on the page
    pub centered: bool,
    /// Filter outcome
    pub verdict: FilterVerdict,
}

/// Outcome of one document in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Source name (input filename or path)
    pub filename: String,
    /// The outline, or this document's error
    pub result: Result<OutlineDocument>,
}

impl BatchOutcome {
    /// Whether the document was processed.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Progress notifications from a running batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// A worker picked up a document
    Started {
        /// Position in the batch
        index: usize,
        /// Document name
        filename: String,
    },
    /// A worker finished a document
    Finished {
        /// Position in the batch
        index: usize,
        /// Document name
        filename: String,
        /// Whether it produced an outline
        success: bool,
    },
}

impl OutlineExtractor {
    /// Create an extractor, validating the configuration.
    pub fn new(config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            analyzer: None,
            ocr: None,
        })
    }

    /// Use a detailed analyzer for key pages.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn DetailedAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Use an OCR engine for image-only pages.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Extract the outline of one document under a fresh time budget.
    pub fn extract(&self, input: &DocumentInput) -> Result<OutlineDocument> {
        let budget = TimeBudget::start(self.config.time_budget, self.config.budget_approach_ratio);
        self.extract_with_budget(input, &budget)
    }

    /// Extract the outline of one document under the given budget.
    pub fn extract_with_budget(
        &self,
        input: &DocumentInput,
        budget: &TimeBudget,
    ) -> Result<OutlineDocument> {
        info!("Extracting outline from {}", input.filename);
        let prepared = self.prepare(input, budget)?;

        let scorer = HeuristicScorer::new(&self.config, &prepared.stats, prepared.profile.rule_set());
        let candidates = scorer.score_all(&prepared.fragments);
        let filtered = CandidateFilter::new(&self.config).apply(candidates);
        debug!("{} candidate(s) passed the filter", filtered.len());

        let classification = LevelClassifier::new(&self.config).classify(filtered);
        if classification.discarded > 0 {
            debug!(
                "Discarded {} candidate(s) outside the top size groups",
                classification.discarded
            );
        }
        let headings = HierarchyValidator::new().validate(classification.headings);
        let outline = OutlineAssembler::new().assemble(classification.title.as_ref(), &headings);

        let degraded = prepared.degraded || budget.is_exhausted();
        if degraded {
            warn!(
                "{}: time budget of {:.1}s reached, outline is degraded",
                input.filename,
                budget.limit().as_secs_f64()
            );
        }

        let info = DocumentInfo {
            filename: input.filename.clone(),
            pages: input.page_count(),
            processed_at: Utc::now(),
            processing_time: budget.elapsed().as_secs_f64(),
            language: prepared.profile.language().tag().to_string(),
            degraded,
        };
        let doc = OutlineDocument::new(info, outline);
        info!(
            "Found {} headings: H1={}, H2={}, H3={}",
            doc.statistics.total_headings,
            doc.statistics.h1_count,
            doc.statistics.h2_count,
            doc.statistics.h3_count
        );
        Ok(doc)
    }

    /// Score every fragment and report the filter verdicts.
    pub fn inspect(&self, input: &DocumentInput) -> Result<Vec<CandidateReport>> {
        let budget = TimeBudget::start(self.config.time_budget, self.config.budget_approach_ratio);
        let prepared = self.prepare(input, &budget)?;

        let scorer = HeuristicScorer::new(&self.config, &prepared.stats, prepared.profile.rule_set());
        let candidates = scorer.score_all(&prepared.fragments);
        let verdicts = CandidateFilter::new(&self.config).verdicts(&candidates);

        Ok(candidates
            .iter()
            .zip(verdicts)
            .map(|(c, verdict)| CandidateReport {
                text: c.text().to_string(),
                page: c.fragment.page,
                font_size: c.font_size(),
                scores: c.scores,
                confidence: c.confidence,
                centered: c.centered,
                verdict,
            })
            .collect())
    }

    /// Process documents concurrently, `batch_size` at a time. Outcomes keep
    /// the input order; a failing document only fails its own outcome.
    pub fn extract_batch(&self, inputs: &[DocumentInput]) -> Result<Vec<BatchOutcome>> {
        let names = inputs.iter().map(|i| i.filename.clone()).collect();
        self.run_batch(names, None, |index| self.extract(&inputs[index]))
    }

    /// Like [`extract_batch`](Self::extract_batch), reporting progress on `events`.
    pub fn extract_batch_with_events(
        &self,
        inputs: &[DocumentInput],
        events: &Sender<BatchEvent>,
    ) -> Result<Vec<BatchOutcome>> {
        let names = inputs.iter().map(|i| i.filename.clone()).collect();
        self.run_batch(names, Some(events), |index| self.extract(&inputs[index]))
    }

    /// Load and process fragment-stream JSON files concurrently.
    pub fn extract_files(
        &self,
        paths: &[PathBuf],
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<Vec<BatchOutcome>> {
        let names = paths.iter().map(|p| p.display().to_string()).collect();
        self.run_batch(names, events, |index| {
            let input = load_document(&paths[index])?;
            self.extract(&input)
        })
    }

    fn run_batch<F>(
        &self,
        names: Vec<String>,
        events: Option<&Sender<BatchEvent>>,
        job: F,
    ) -> Result<Vec<BatchOutcome>>
    where
        F: Fn(usize) -> Result<OutlineDocument> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.batch_size)
            .thread_name(|i| format!("outline-worker-{}", i))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        info!(
            "Processing {} document(s) with {} worker(s)",
            names.len(),
            self.config.batch_size
        );

        let outcomes: Vec<BatchOutcome> = pool.install(|| {
            names
                .par_iter()
                .enumerate()
                .map(|(index, filename)| {
                    if let Some(tx) = events {
                        // A dropped receiver only loses progress reports.
                        let _ = tx.send(BatchEvent::Started {
                            index,
                            filename: filename.clone(),
                        });
                    }

                    let result = panic::catch_unwind(AssertUnwindSafe(|| job(index)))
                        .unwrap_or_else(|_| Err(Error::WorkerPanic(filename.clone())));
                    if let Err(e) = &result {
                        warn!("Failed to process {}: {}", filename, e);
                    }

                    if let Some(tx) = events {
                        let _ = tx.send(BatchEvent::Finished {
                            index,
                            filename: filename.clone(),
                            success: result.is_ok(),
                        });
                    }
                    BatchOutcome {
                        filename: filename.clone(),
                        result,
                    }
                })
                .collect()
        });

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            "Batch finished: {} succeeded, {} failed",
            outcomes.len() - failed,
            failed
        );
        Ok(outcomes)
    }

    /// Normalize, run the optional passes, and compute baselines.
    fn prepare(&self, input: &DocumentInput, budget: &TimeBudget) -> Result<Prepared> {
        let strict = self.config.is_strict();
        let mut fragments = DocumentInput::normalize(&input.fragments, strict)?;
        let mut degraded = false;

        if let Some(ocr) = &self.ocr {
            let (recognized, cut_short) = self.ocr_pass(ocr.as_ref(), input, &fragments, budget)?;
            degraded |= cut_short;
            if !recognized.is_empty() {
                fragments.extend(recognized);
                fragments = DocumentInput::normalize(&fragments, strict)?;
            }
        }

        if fragments.is_empty() {
            debug!("{}: no text fragments", input.filename);
            return Ok(Prepared {
                stats: DocumentStatistics::compute(&[], &input.pages),
                profile: LanguageProfile::detect(&[]),
                fragments,
                degraded,
            });
        }

        let mut stats = DocumentStatistics::compute(&fragments, &input.pages);
        if let Some(analyzer) = &self.analyzer {
            let (refined, cut_short) =
                self.detailed_pass(analyzer.as_ref(), &stats, &fragments, budget)?;
            degraded |= cut_short;
            if let Some(refined) = refined {
                fragments = DocumentInput::normalize(&refined, strict)?;
                stats = DocumentStatistics::compute(&fragments, &input.pages);
            }
        }

        let profile = LanguageProfile::detect(&fragments);
        Ok(Prepared {
            stats: stats.with_language(profile.language()),
            profile,
            fragments,
            degraded,
        })
    }

    /// Recognize image-only pages that carry no extracted text.
    fn ocr_pass(
        &self,
        ocr: &dyn OcrEngine,
        input: &DocumentInput,
        fragments: &[TextFragment],
        budget: &TimeBudget,
    ) -> Result<(Vec<TextFragment>, bool)> {
        let mut pages: Vec<_> = input
            .pages
            .iter()
            .filter(|p| p.image_only && !fragments.iter().any(|f| f.page == p.number))
            .collect();
        pages.sort_by_key(|p| p.number);

        let mut recognized = Vec::new();
        for page in pages {
            if budget.is_approaching() {
                warn!(
                    "{}: skipping OCR from page {} on, time budget nearly spent",
                    input.filename, page.number
                );
                return Ok((recognized, true));
            }
            match ocr.recognize_page(page) {
                Ok(mut found) => {
                    debug!("{} recognized {} fragment(s) on page {}", ocr.name(), found.len(), page.number);
                    for fragment in &mut found {
                        fragment.page = page.number;
                    }
                    recognized.extend(found);
                }
                Err(e) if self.config.is_strict() => {
                    return Err(Error::Provider(format!("{} failed on page {}: {}", ocr.name(), page.number, e)));
                }
                Err(e) => warn!("{} failed on page {}: {}", ocr.name(), page.number, e),
            }
        }
        Ok((recognized, false))
    }

    /// Replace key-page fragments with the analyzer's refined ones. Returns
    /// `None` when no page was analyzed.
    fn detailed_pass(
        &self,
        analyzer: &dyn DetailedAnalyzer,
        stats: &DocumentStats,
        fragments: &[TextFragment],
        budget: &TimeBudget,
    ) -> Result<(Option<Vec<TextFragment>>, bool)> {
        let key_pages = stats.key_pages(fragments, KEY_PAGE_RATIO);
        if key_pages.is_empty() {
            return Ok((None, false));
        }
        debug!("Key pages for detailed analysis: {:?}", key_pages);

        let mut refined: Vec<TextFragment> = fragments.to_vec();
        let mut analyzed = 0usize;
        let mut cut_short = false;
        for page in key_pages {
            if budget.is_approaching() {
                warn!(
                    "Skipping detailed analysis from page {} on, time budget nearly spent",
                    page
                );
                cut_short = true;
                break;
            }
            let on_page: Vec<TextFragment> =
                refined.iter().filter(|f| f.page == page).cloned().collect();
            match analyzer.analyze_page(page, &on_page) {
                Ok(mut replacement) => {
                    for fragment in &mut replacement {
                        fragment.page = page;
                    }
                    refined.retain(|f| f.page != page);
                    refined.extend(replacement);
                    analyzed += 1;
                }
                Err(e) if self.config.is_strict() => {
                    return Err(Error::Provider(format!(
                        "{} failed on page {}: {}",
                        analyzer.name(),
                        page,
                        e
                    )));
                }
                Err(e) => warn!("{} failed on page {}: {}", analyzer.name(), page, e),
            }
        }

        Ok(((analyzed > 0).then_some(refined), cut_short))
    }
}

/// Load a fragment-stream JSON file. A missing filename is taken from the path.
pub fn load_document(path: impl AsRef<Path>) -> Result<DocumentInput> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    parse_document(&content, path)
}

pub(crate) fn parse_document(content: &str, path: &Path) -> Result<DocumentInput> {
    let mut input: DocumentInput = serde_json::from_str(content)?;
    if input.filename.is_empty() {
        input.filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, FontDescriptor, PageInfo};
    use crate::provider::PrecomputedPages;
    use std::time::Duration;

    fn body(page: u32, y: f32) -> TextFragment {
        TextFragment::new(
            "Body text that runs across the page for a while",
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

    fn sample() -> DocumentInput {
        let mut input = DocumentInput::new("sample.pdf")
            .with_page(PageInfo::letter(1))
            .with_page(PageInfo::letter(2));
        input.fragments.push(heading("1. Introduction", 1, 200.0, 20.0));
        input.fragments.push(heading("1.1 Scope", 1, 400.0, 16.0));
        for i in 0..12 {
            input.fragments.push(body(1, 230.0 + i as f32 * 13.0));
            input.fragments.push(body(2, 230.0 + i as f32 * 13.0));
        }
        input.fragments.push(heading("2. Methods", 2, 150.0, 20.0));
        input
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(
            OutlineExtractor::new(OutlineConfig::new().with_batch_size(0)),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_extract_sample() {
        let extractor = OutlineExtractor::new(OutlineConfig::default()).unwrap();
        let doc = extractor.extract(&sample()).unwrap();

        let titles: Vec<_> = doc.outline.iter().map(|e| (e.title.as_str(), e.level)).collect();
        assert_eq!(
            titles,
            vec![("1. Introduction", 1), ("1.1 Scope", 2), ("2. Methods", 1)]
        );
        assert_eq!(doc.document.pages, 2);
        assert_eq!(doc.document.language, "latin");
        assert!(!doc.document.degraded);
    }

    #[test]
    fn test_empty_document() {
        let extractor = OutlineExtractor::new(OutlineConfig::default()).unwrap();
        let doc = extractor.extract(&DocumentInput::new("empty.pdf")).unwrap();
        assert!(doc.outline.is_empty());
        assert!(doc.title.is_none());
        assert_eq!(doc.statistics.total_headings, 0);
    }

    #[test]
    fn test_malformed_fragment_strict_and_lenient() {
        let mut input = sample();
        input.fragments[3].font.size = -1.0;

        let strict = OutlineExtractor::new(OutlineConfig::default()).unwrap();
        assert!(matches!(
            strict.extract(&input),
            Err(Error::MalformedFragment { index: 3, .. })
        ));

        let lenient = OutlineExtractor::new(OutlineConfig::default().lenient()).unwrap();
        assert_eq!(lenient.extract(&input).unwrap().statistics.total_headings, 3);
    }

    #[test]
    fn test_inspect_reports_every_fragment() {
        let extractor = OutlineExtractor::new(OutlineConfig::default()).unwrap();
        let input = sample();
        let reports = extractor.inspect(&input).unwrap();
        assert_eq!(reports.len(), input.fragments.len());
        assert_eq!(
            reports.iter().filter(|r| r.verdict.is_accepted()).count(),
            3
        );
    }

    #[test]
    fn test_ocr_fills_image_only_pages() {
        let mut ocr = PrecomputedPages::new("ocr");
        ocr.insert(3, vec![heading("3. Appendix Scan", 0, 100.0, 20.0)]);
        let input = sample().with_page(PageInfo::letter(3).image_only());

        let extractor = OutlineExtractor::new(OutlineConfig::default())
            .unwrap()
            .with_ocr(Arc::new(ocr));
        let doc = extractor.extract(&input).unwrap();

        let last = doc.outline.last().unwrap();
        assert_eq!(last.title, "3. Appendix Scan");
        assert_eq!(last.page, 3);
    }

    #[test]
    fn test_exhausted_budget_skips_optional_passes() {
        let mut ocr = PrecomputedPages::new("ocr");
        ocr.insert(3, vec![heading("3. Appendix Scan", 3, 100.0, 20.0)]);
        let input = sample().with_page(PageInfo::letter(3).image_only());

        let extractor = OutlineExtractor::new(OutlineConfig::default())
            .unwrap()
            .with_ocr(Arc::new(ocr));
        let budget = TimeBudget::start(Duration::ZERO, 0.8);
        let doc = extractor.extract_with_budget(&input, &budget).unwrap();

        assert!(doc.document.degraded);
        assert_eq!(doc.statistics.total_headings, 3);
    }

    #[test]
    fn test_detailed_analysis_replaces_key_page() {
        let mut analyzer = PrecomputedPages::new("detail");
        let mut refined: Vec<_> = (0..12).map(|i| body(2, 230.0 + i as f32 * 13.0)).collect();
        refined.push(heading("2. Materials and Methods", 2, 150.0, 20.0));
        analyzer.insert(2, refined);

        let extractor = OutlineExtractor::new(OutlineConfig::default())
            .unwrap()
            .with_analyzer(Arc::new(analyzer));
        let doc = extractor.extract(&sample()).unwrap();
        assert!(doc.outline.iter().any(|e| e.title == "2. Materials and Methods"));
        assert!(!doc.outline.iter().any(|e| e.title == "2. Methods"));
    }

    #[test]
    fn test_load_document_fills_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.json");
        let mut input = sample();
        input.filename.clear();
        std::fs::write(&path, serde_json::to_string(&input).unwrap()).unwrap();

        let loaded = load_document(&path).unwrap();
        assert_eq!(loaded.filename, "paper.json");
        assert_eq!(loaded.fragments.len(), input.fragments.len());
    }
}
