//! pdfoutline CLI - PDF heading outline extraction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfoutline::batch::{BatchRunner, DocumentOutcome};
use pdfoutline::relevance::{self, LexicalScorer};
use pdfoutline::{schema, HeadingLevel, JsonFormat, OutlineConfig, Outliner, RankingConfig};

#[derive(Parser)]
#[command(name = "pdfoutline")]
#[command(version)]
#[command(about = "Extract a title and H1-H3 outline from PDF files", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the outline of one PDF as JSON
    Outline {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Heuristics config (JSON)
        #[arg(long, value_name = "FILE", env = "PDFOUTLINE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Write one outline JSON per PDF in a directory
    Batch {
        /// Directory containing PDF files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Directory for the JSON files
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,

        /// Heuristics config (JSON)
        #[arg(long, value_name = "FILE", env = "PDFOUTLINE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Rank sections of document collections for their persona
    Rank {
        /// Collection directories (or a parent containing them)
        #[arg(value_name = "COLLECTION_DIR", required = true)]
        dirs: Vec<PathBuf>,

        /// Number of sections to report
        #[arg(long, default_value = "5")]
        top: usize,

        /// Minimum similarity for a refined passage
        #[arg(long, value_name = "SCORE")]
        threshold: Option<f32>,
    },

    /// Validate a previously written outline JSON file
    Check {
        /// Outline JSON file
        #[arg(value_name = "JSON")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Outline {
            input,
            output,
            compact,
            config,
        }) => cmd_outline(&input, output.as_deref(), compact, config.as_deref()),
        Some(Commands::Batch {
            input,
            output,
            config,
        }) => cmd_batch(&input, &output, config.as_deref()),
        Some(Commands::Rank {
            dirs,
            top,
            threshold,
        }) => cmd_rank(&dirs, top, threshold),
        Some(Commands::Check { input }) => cmd_check(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: print the outline if input is provided
            if let Some(input) = cli.input {
                cmd_outline(&input, None, false, None)
            } else {
                println!("{}", "Usage: pdfoutline <FILE>".yellow());
                println!("       pdfoutline --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<OutlineConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => OutlineConfig::from_json_file(p)?,
        None => OutlineConfig::default(),
    })
}

fn cmd_outline(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outliner = Outliner::new(load_config(config)?)?;
    let outline = outliner.extract_file(input)?;
    schema::validate(&outline)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = outline.to_json(format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
        println!(
            "  {} H1 {}, H2 {}, H3 {}",
            "└─".dimmed(),
            outline.count_at(HeadingLevel::H1),
            outline.count_at(HeadingLevel::H2),
            outline.count_at(HeadingLevel::H3)
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = BatchRunner::new(load_config(config)?)?;
    let total = BatchRunner::list_inputs(input)?.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = runner.run_with_progress(input, output, |outcome| {
        let name = match outcome {
            DocumentOutcome::Written(t) => t.input.display().to_string(),
            DocumentOutcome::Failed(f) => f.input.display().to_string(),
        };
        pb.set_message(name);
        pb.inc(1);
    })?;
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} written, {} failed",
        "Batch complete:".green().bold(),
        report.succeeded.len(),
        report.failed.len()
    );
    if let Some(avg) = report.average() {
        println!("  {} average {:.2}s per PDF", "├─".dimmed(), avg.as_secs_f64());
    }
    println!("  {} {}", "└─".dimmed(), output.display());

    for failure in &report.failed {
        let kind = if failure.unreadable {
            "unreadable"
        } else {
            "invalid outline"
        };
        println!(
            "  {} {} ({}): {}",
            "✗".red(),
            failure.input.display(),
            kind,
            failure.message
        );
    }

    Ok(())
}

fn cmd_rank(
    dirs: &[PathBuf],
    top: usize,
    threshold: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RankingConfig::new().with_top_n(top);
    if let Some(threshold) = threshold {
        config = config.with_threshold(threshold);
    }

    let mut collections = Vec::new();
    for dir in dirs {
        if dir.join(relevance::INPUT_FILE).is_file() {
            collections.push(dir.clone());
        } else {
            collections.extend(relevance::find_collections(dir)?);
        }
    }

    log::debug!("ranking {} collections", collections.len());
    if collections.is_empty() {
        println!("{}", "No collections found".yellow());
        return Ok(());
    }

    let failed = rank_collections(&collections, &config);
    println!(
        "\n{} {} ranked, {} failed",
        "Ranking complete:".green().bold(),
        collections.len() - failed,
        failed
    );

    Ok(())
}

/// Rank each collection, reporting failures without stopping. Returns the failure count.
fn rank_collections(collections: &[PathBuf], config: &RankingConfig) -> usize {
    let mut failed = 0;
    for dir in collections {
        match relevance::process_collection(dir, &LexicalScorer, config) {
            Ok(report) => println!(
                "{} {} ({} sections, {} passages)",
                "Ranked".green(),
                dir.join(relevance::OUTPUT_FILE).display(),
                report.extracted_sections.len(),
                report.subsection_analysis.len()
            ),
            Err(e) => {
                log::error!("✗ {}: {}", dir.display(), e);
                println!("  {} {}: {}", "✗".red(), dir.display(), e);
                failed += 1;
            }
        }
    }
    failed
}

fn cmd_check(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(input)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    schema::validate_outline(&value)?;
    println!("{} {}", "Valid outline:".green(), input.display());
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfoutline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF heading outline extraction tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_default_and_file() {
        assert_eq!(load_config(None).unwrap(), OutlineConfig::default());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"max_words": 8, "first_page": 1}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.max_words, 8);
        assert_eq!(config.first_page, 1);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"num_levels": 7}"#).unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_bad_collection_does_not_stop_ranking() {
        let base = TempDir::new().unwrap();
        let broken = base.path().join("a_broken");
        let travel = base.path().join("b_travel");
        fs::create_dir(&broken).unwrap();
        fs::create_dir(&travel).unwrap();
        fs::write(broken.join(relevance::INPUT_FILE), "{ not json").unwrap();
        fs::write(
            travel.join(relevance::INPUT_FILE),
            r#"{"documents": [],
                "persona": {"role": "Travel Planner"},
                "job_to_be_done": {"task": "Plan a trip"}}"#,
        )
        .unwrap();

        let collections = relevance::find_collections(base.path()).unwrap();
        let failed = rank_collections(&collections, &RankingConfig::new().with_threshold(0.5));
        assert_eq!(failed, 1);
        assert!(!broken.join(relevance::OUTPUT_FILE).exists());
        assert!(travel.join(relevance::OUTPUT_FILE).is_file());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["pdfoutline", "batch", "in", "out"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Batch { .. })));

        let cli = Cli::try_parse_from(["pdfoutline", "rank", "cols", "--threshold", "0.5"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Rank { threshold: Some(t), top: 5, .. }) if t == 0.5
        ));

        let cli = Cli::try_parse_from(["pdfoutline", "doc.pdf"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("doc.pdf")));
        assert!(cli.command.is_none());
    }
}
