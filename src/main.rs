use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use critique_core::{CritiqueConfig, OutputFormat, API_KEY_ENV};
use critique_review::llm::LlmClient;
use critique_review::pipeline::ReviewPipeline;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = ".critique.toml";

#[derive(Parser)]
#[command(
    name = "critique",
    version,
    about = "LLM-backed code review for source files",
    long_about = "Send source files to a Messages-style LLM endpoint and print its review.\n\n\
                  Examples:\n  \
                    critique --file src/Main.java   Review one file\n  \
                    critique --dir src              Review every matching file under src/\n\n\
                  The API key is read from ANTHROPIC_API_KEY."
)]
struct Cli {
    /// Review a single file
    #[arg(long, value_name = "PATH", conflicts_with = "dir")]
    file: Option<PathBuf>,

    /// Review all matching files under a directory, recursively
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Path to configuration file (default: .critique.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: text, json, or markdown
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short)]
    verbose: bool,
}

fn print_usage() {
    println!("Usage:");
    println!("  Review a single file:");
    println!("    critique --file path/to/File.java");
    println!();
    println!("  Review a directory:");
    println!("    critique --dir path/to/src");
    println!();
    println!("Make sure to set your API key:");
    println!("  export {API_KEY_ENV}=\"your-key-here\"");
    println!();
    println!("Run 'critique --help' for all options.");
}

fn print_likely_causes() {
    eprintln!("\nPossible causes:");
    eprintln!("  - API key not set or invalid");
    eprintln!("  - File or directory not found");
    eprintln!("  - Network connectivity issues");
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CRITIQUE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CritiqueConfig> {
    let config = match path {
        Some(path) => CritiqueConfig::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                CritiqueConfig::from_file(default_path)?
            } else {
                CritiqueConfig::default()
            }
        }
    };
    Ok(config.with_env_overrides())
}

fn spinner(message: String, enabled: bool) -> Option<indicatif::ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let client = LlmClient::new(&config.api)?;
    let pipeline = ReviewPipeline::new(client, config.review.clone());
    let show_spinner = !cli.verbose && std::io::stderr().is_terminal();
    let banner = cli.format == OutputFormat::Text;

    if banner {
        println!("=== Code Review Assistant ===\n");
    }

    if let Some(path) = &cli.file {
        if banner {
            println!("Reviewing file: {}\n", path.display());
        }
        let pb = spinner(format!("Reviewing {}...", path.display()), show_spinner);
        let result = pipeline.review_file(path).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        let review = result?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&review).into_diagnostic()?)
            }
            OutputFormat::Markdown => print!("{}", review.to_markdown()),
            OutputFormat::Text => print!("{review}"),
        }
    } else if let Some(dir) = &cli.dir {
        if banner {
            println!("Reviewing directory: {}\n", dir.display());
        }
        let pb = spinner(format!("Reviewing {}...", dir.display()), show_spinner);
        let result = pipeline.review_directory(dir).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        let report = result?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?)
            }
            OutputFormat::Markdown => print!("{}", report.to_markdown()),
            OutputFormat::Text => print!("{report}"),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
    };

    if cli.file.is_none() && cli.dir.is_none() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("\nError: {report}");
            if let Some(help) = report.help() {
                eprintln!("  help: {help}");
            }
            print_likely_causes();
            ExitCode::FAILURE
        }
    }
}
