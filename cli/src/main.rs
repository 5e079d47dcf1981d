//! pdf-outline CLI - heading outline extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_outline::{
    load_document, to_json, BatchEvent, JsonFormat, OutlineConfig, OutlineExtractor,
    OutlineValidator, QualityReport,
};

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract heading outlines from PDF text layouts", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Drop malformed fragments instead of failing the document
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the outline of one fragment-stream JSON file
    Extract {
        /// Input fragment JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Minimum heading confidence (0-1)
        #[arg(long)]
        min_confidence: Option<f32>,

        /// Time budget per document in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,
    },

    /// Extract outlines for every JSON file in a directory
    Batch {
        /// Directory of fragment JSON files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory (defaults to the input directory)
        #[arg(value_name = "OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Number of documents processed concurrently
        #[arg(short, long, env = "PDF_OUTLINE_JOBS")]
        jobs: Option<usize>,

        /// Time budget per document in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,

        /// Minimum heading confidence (0-1)
        #[arg(long)]
        min_confidence: Option<f32>,
    },

    /// Validate outline JSON files and score their quality
    Validate {
        /// Outline JSON files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Only show errors and warnings
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show per-fragment heading scores
    Inspect {
        /// Input fragment JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Number of rows, highest confidence first
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
            min_confidence,
            timeout,
        } => {
            let config = build_config(cli.lenient, min_confidence, timeout, None);
            cmd_extract(&input, output.as_deref(), compact, config)
        }
        Commands::Batch {
            input,
            output,
            jobs,
            timeout,
            min_confidence,
        } => {
            let config = build_config(cli.lenient, min_confidence, timeout, jobs);
            cmd_batch(&input, output.as_deref(), config)
        }
        Commands::Validate { files, json, quiet } => cmd_validate(&files, json, quiet),
        Commands::Inspect { input, limit } => {
            cmd_inspect(&input, limit, build_config(cli.lenient, None, None, None))
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_config(
    lenient: bool,
    min_confidence: Option<f32>,
    timeout: Option<f64>,
    jobs: Option<usize>,
) -> OutlineConfig {
    let mut config = OutlineConfig::new();
    if lenient {
        config = config.lenient();
    }
    if let Some(confidence) = min_confidence {
        config = config.with_min_confidence(confidence);
    }
    if let Some(secs) = timeout.filter(|s| s.is_finite() && *s >= 0.0) {
        config = config.with_time_budget(Duration::from_secs_f64(secs));
    }
    if let Some(jobs) = jobs {
        config = config.with_batch_size(jobs);
    }
    config
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    config: OutlineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = OutlineExtractor::new(config)?;
    let doc = extractor.extract(&load_document(input)?)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = to_json(&doc, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!(
            "{} {} ({} headings: H1={}, H2={}, H3={})",
            "Saved to".green(),
            path.display(),
            doc.statistics.total_headings,
            doc.statistics.h1_count,
            doc.statistics.h2_count,
            doc.statistics.h3_count
        );
        if doc.document.degraded {
            println!("{}", "Time budget reached, outline is partial".yellow());
        }
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: Option<&Path>,
    config: OutlineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output_dir.unwrap_or(input_dir).to_path_buf();
    fs::create_dir_all(&output_dir)?;

    let paths = fragment_files(input_dir)?;
    log::debug!("Found {} fragment file(s) in {}", paths.len(), input_dir.display());
    if paths.is_empty() {
        println!("{} {}", "No JSON files found in".yellow(), input_dir.display());
        return Ok(());
    }

    let extractor = OutlineExtractor::new(config)?;
    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let outcomes = std::thread::scope(|s| {
        let extractor = &extractor;
        let paths = &paths;
        let handle = s.spawn(move || extractor.extract_files(paths, Some(&tx)));

        for event in rx.iter() {
            match event {
                BatchEvent::Started { filename, .. } => pb.set_message(short_name(&filename)),
                BatchEvent::Finished { .. } => pb.inc(1),
            }
        }
        handle.join()
    })
    .map_err(|_| "batch worker thread panicked")??;
    pb.finish_with_message("Done!");

    let mut failed = 0usize;
    for (path, outcome) in paths.iter().zip(&outcomes) {
        match &outcome.result {
            Ok(doc) => {
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                let out = output_dir.join(format!("{}_outline.json", stem));
                fs::write(&out, to_json(doc, JsonFormat::Pretty)?)?;
                log::debug!("Wrote {} for {}", out.display(), outcome.filename);
                let marker = if doc.document.degraded {
                    "~".yellow()
                } else {
                    "✓".green()
                };
                println!(
                    "  {} {} ({} headings, {:.2}s)",
                    marker,
                    out.display(),
                    doc.statistics.total_headings,
                    doc.document.processing_time
                );
            }
            Err(e) => {
                failed += 1;
                log::debug!("Skipping output for {}: {:?}", outcome.filename, e);
                println!("  {} {}: {}", "✗".red(), outcome.filename, e);
            }
        }
    }

    println!(
        "\n{} {} processed, {} failed",
        "Batch complete:".green().bold(),
        outcomes.len() - failed,
        failed
    );
    if failed > 0 {
        return Err(format!("{} document(s) failed", failed).into());
    }
    Ok(())
}

/// Fragment JSON files in a directory, skipping previously written outlines.
fn fragment_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .filter(|p| {
            !p.file_stem()
                .is_some_and(|s| s.to_string_lossy().ends_with("_outline"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn short_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn cmd_validate(
    files: &[PathBuf],
    json: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let validator = OutlineValidator::new();
    let mut results: Vec<(&PathBuf, QualityReport)> = Vec::new();

    for path in files {
        if !path.exists() {
            eprintln!("{}: File not found: {}", "Error".red().bold(), path.display());
            continue;
        }
        let report = match validator.validate_file(path) {
            Ok(report) => report,
            Err(e) => QualityReport {
                is_valid: false,
                errors: vec![format!("Could not read outline: {}", e)],
                warnings: Vec::new(),
                suggestions: Vec::new(),
                quality_score: 0.0,
                statistics: None,
            },
        };

        if json {
            let value = serde_json::json!({
                "file": path.display().to_string(),
                "report": &report,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else if quiet {
            if !report.errors.is_empty() || !report.warnings.is_empty() {
                println!("\n{}:", path.display());
                for error in &report.errors {
                    println!("  {} {}", "ERROR:".red(), error);
                }
                for warning in &report.warnings {
                    println!("  {} {}", "WARNING:".yellow(), warning);
                }
            }
        } else {
            print_report(path, &report);
        }
        results.push((path, report));
    }

    if results.len() > 1 && !json {
        let valid = results.iter().filter(|(_, r)| r.is_valid).count();
        let avg = results.iter().map(|(_, r)| r.quality_score).sum::<f32>() / results.len() as f32;
        println!();
        println!("{}", "Summary".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "Files".bold(), results.len());
        println!("{}: {}/{}", "Valid".bold(), valid, results.len());
        println!("{}: {:.1}%", "Average quality".bold(), avg * 100.0);
    }

    Ok(())
}

fn print_report(path: &Path, report: &QualityReport) {
    println!();
    println!("{}", format!("Validation report: {}", path.display()).cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let status = if report.is_valid {
        "VALID".green().bold()
    } else {
        "INVALID".red().bold()
    };
    println!("{}: {}", "Status".bold(), status);
    println!("{}: {:.1}%", "Quality".bold(), report.quality_score * 100.0);

    for (title, items, color) in [
        ("Errors", &report.errors, "red"),
        ("Warnings", &report.warnings, "yellow"),
        ("Suggestions", &report.suggestions, "cyan"),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("\n{}", format!("{} ({})", title, items.len()).color(color).bold());
        for (i, item) in items.iter().enumerate() {
            println!("  {}. {}", i + 1, item);
        }
    }

    if let Some(stats) = &report.statistics {
        println!("\n{}", "Statistics".cyan().bold());
        let [h1, h2, h3] = stats.level_distribution;
        println!("  {}: {}", "Headings".bold(), stats.outline_length);
        println!("  {}: H1={}, H2={}, H3={}", "Levels".bold(), h1, h2, h3);
        println!(
            "  {}: avg={:.3}, range={:.3}-{:.3}",
            "Confidence".bold(),
            stats.avg_confidence,
            stats.min_confidence,
            stats.max_confidence
        );
        if stats.total_pages > 0 {
            println!(
                "  {}: {}/{}",
                "Page coverage".bold(),
                stats.pages_with_headings,
                stats.total_pages
            );
        }
        println!(
            "  {}: avg={:.1}, range={}-{}",
            "Title length".bold(),
            stats.avg_title_length,
            stats.min_title_length,
            stats.max_title_length
        );
    }
}

fn cmd_inspect(
    input: &Path,
    limit: usize,
    config: OutlineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = OutlineExtractor::new(config)?;
    let mut reports = extractor.inspect(&load_document(input)?)?;
    reports.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    println!("{}", "Heading candidates".cyan().bold());
    println!("{}", "─".repeat(96).dimmed());
    println!(
        "{:>4} {:>6} {:>5} | {:>4} {:>4} {:>4} {:>4} {:>4} {:>4} | {:<14} {}",
        "page", "size", "conf", "size", "sty", "pos", "num", "kw", "len", "verdict", "text"
    );
    println!("{}", "─".repeat(96).dimmed());

    for report in reports.iter().take(limit) {
        let s = &report.scores;
        let verdict = format!("{:<14}", report.verdict.to_string());
        let verdict = if report.verdict.is_accepted() {
            verdict.green()
        } else {
            verdict.dimmed()
        };
        let text: String = report.text.chars().take(40).collect();
        println!(
            "{:>4} {:>6.1} {:>5.3} | {:>4.1} {:>4.1} {:>4.1} {:>4.1} {:>4.1} {:>4.1} | {} {}",
            report.page,
            report.font_size,
            report.confidence,
            s.font_size,
            s.font_style,
            s.position,
            s.numbering,
            s.keyword,
            s.length,
            verdict,
            text
        );
    }

    let accepted = reports.iter().filter(|r| r.verdict.is_accepted()).count();
    println!(
        "\n{} of {} fragments pass the filter",
        accepted.to_string().green().bold(),
        reports.len()
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdf-outline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Heading outline extraction for PDF text layouts");
    println!();
    println!("License: MIT");
}
