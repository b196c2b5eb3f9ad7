//! Topicality: brand-level NYT sentiment and meme activity panel builder.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use topicality_core::PanelConfig;
use topicality_runtime::Pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "topicality", version, about = "Build the company × week media panel")]
struct Cli {
    /// Root data directory
    #[arg(long, global = true, env = "TOPICALITY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Parallel scoring workers
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Exclude articles published before this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    min_date: Option<NaiveDate>,

    /// Maximum sentences classified per article
    #[arg(long, global = true)]
    max_sentences: Option<usize>,

    /// Directory of NYT archive dumps
    #[arg(long, global = true)]
    nyt_dir: Option<PathBuf>,

    /// Company alias file
    #[arg(long, global = true)]
    synonyms: Option<PathBuf>,

    /// Sentiment model directory
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score NYT archives and write weekly sentiment
    Nyt,
    /// Build weekly meme activity from the predictions table
    Memes,
    /// Assemble the panel from the weekly tables on disk
    Panel,
    /// Run nyt, memes and panel in sequence
    Build,
    /// Print panel coverage and rewrite the coverage reports
    Diagnose,
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));
        if let Some(dir) = exe_dir {
            let parent_data = dir.join("../data");
            if parent_data.exists() {
                return parent_data;
            }
        }
        PathBuf::from("data")
    })
}

fn load_config(cli: &Cli) -> anyhow::Result<PanelConfig> {
    let data_dir = resolve_data_dir(cli.data_dir.clone());
    info!("Data directory: {}", data_dir.display());

    let mut config = PanelConfig::from_env(&data_dir)?;
    if let Some(n) = cli.workers {
        anyhow::ensure!(n > 0, "--workers must be positive");
        config.workers = n;
    }
    if let Some(date) = cli.min_date {
        config.min_date = date;
    }
    if let Some(n) = cli.max_sentences {
        anyhow::ensure!(n > 0, "--max-sentences must be positive");
        config.max_sentences = n;
    }
    if let Some(dir) = &cli.nyt_dir {
        config.data_paths.nyt_dir = dir.clone();
    }
    if let Some(file) = &cli.synonyms {
        config.data_paths.synonyms_file = file.clone();
    }
    if let Some(dir) = &cli.model_dir {
        config.data_paths.model_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(load_config(&cli)?);

    match cli.command {
        Command::Nyt => {
            let report = pipeline.run_nyt()?;
            println!("{}", serde_json::to_string_pretty(&report.stats)?);
        }
        Command::Memes => {
            let records = pipeline.run_memes()?;
            println!("{} weekly meme records", records.len());
        }
        Command::Panel => {
            let panel = pipeline.run_panel()?;
            println!(
                "{} panel rows over {} companies",
                panel.rows.len(),
                panel.companies()
            );
        }
        Command::Build => {
            let summary = pipeline.run_all()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Diagnose => {
            let diagnostics = pipeline.diagnose()?;
            println!("{:<16} {:>8} {:>8}  variables", "requirement", "rows_ok", "share");
            for line in &diagnostics.overview {
                println!(
                    "{:<16} {:>8} {:>7.1}%  {}",
                    line.requirement,
                    line.rows_ok,
                    line.share_ok * 100.0,
                    line.variables_required
                );
            }
            println!();
            println!(
                "{:<24} {:>6} {:>10} {:>10} {:>8} {:>8}",
                "company", "weeks", "sentiment", "mention>0", "L1", "L1..L4"
            );
            for c in &diagnostics.by_company {
                println!(
                    "{:<24} {:>6} {:>10} {:>10} {:>8} {:>8}",
                    c.company.as_str(),
                    c.weeks_total,
                    c.weeks_with_sentiment,
                    c.weeks_with_mention_gt0,
                    c.rows_ok_l1,
                    c.rows_ok_l4
                );
            }
            println!();
            println!("{:<40} {:>8} {:>8}", "missing (full lags)", "rows", "share");
            for v in diagnostics.missing_variables.iter().filter(|v| v.missing_rows > 0) {
                println!(
                    "{:<40} {:>8} {:>7.1}%",
                    v.variable,
                    v.missing_rows,
                    v.missing_share * 100.0
                );
            }
        }
    }

    Ok(())
}
