//! Chapter Split CLI - split a document into chapter files
//!
//! Usage: chapter-split [OPTIONS] <DOCUMENT>
//!
//! Detects chapters by heading pattern (or explicit page ranges from a JSON
//! file) and writes them under the output directory.

use clap::Parser;
use chapter_split_lib::{utils, ChapterRanges, HeadingPattern, Segmenter, Settings};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chapter-split")]
#[command(version, about = "Split a PDF or text document into chapters", long_about = None)]
struct Cli {
    /// Document to split (.pdf, .txt, .md)
    document: PathBuf,

    /// Heading regex (default: "Chapter"/"CHAPTER" followed by a number or Roman numeral)
    #[arg(long, short)]
    pattern: Option<String>,

    /// JSON file mapping chapter names to [start_page, end_page] (0-indexed, inclusive)
    #[arg(long, short)]
    ranges: Option<PathBuf>,

    /// Output directory (default from settings, then ./output)
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Settings file (default: <config dir>/chapter-split/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detect and list chapters without writing files
    #[arg(long)]
    dry_run: bool,

    /// Output as JSON for scripting
    #[arg(long)]
    json: bool,

    /// Suppress progress output
    #[arg(long, short, conflicts_with = "verbose")]
    quiet: bool,

    /// Detailed logging
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("chapter_split_lib={level},chapter_split={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), String> {
    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&config_path)
        .map_err(|e| e.to_string())?
        .with_env_overrides()
        .with_overrides(cli.pattern.clone(), cli.output_dir.clone());

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        settings.log_level.as_str()
    };
    init_logging(level);
    tracing::debug!("Settings loaded from {}", config_path.display());

    let pattern: HeadingPattern = settings.heading_pattern().map_err(|e| e.to_string())?;
    let ranges = match &cli.ranges {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read ranges file {}: {}", path.display(), e))?;
            Some(ChapterRanges::from_json(&content).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let mut segmenter = Segmenter::open(&cli.document).map_err(|e| e.to_string())?;
    let chapters = segmenter.detect_chapters(Some(pattern), ranges).clone();

    let saved = if cli.dry_run {
        None
    } else {
        Some(segmenter.save(&settings.output_dir).map_err(|e| e.to_string())?)
    };

    if cli.json {
        let output = serde_json::json!({
            "document": segmenter.document_name(),
            "chapters": chapters.keys().collect::<Vec<_>>(),
            "headings": segmenter.headings().iter().map(|h| serde_json::json!({
                "chapter": h.chapter,
                "heading": h.heading,
                "page": h.page,
            })).collect::<Vec<_>>(),
            "saved_to": saved.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?);
        return Ok(());
    }

    if !cli.quiet {
        println!("Detected {} chapters:", chapters.len());
        for (name, text) in chapters.iter() {
            let page = segmenter
                .headings()
                .iter()
                .find(|h| h.chapter == name)
                .map(|h| format!(" (page {})", h.page + 1))
                .unwrap_or_default();
            println!("- {}{}: {}", name, page, utils::preview(text, 60));
        }
    }
    if let Some(path) = saved {
        println!("Chapters saved to {}", path.display());
    }

    Ok(())
}
