use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use pdf_fetch::config::{find_config_file, load_config, load_env_config, Config};
use pdf_fetch::models::{BatchEntry, BatchSummary};
use pdf_fetch::ui;
use pdf_fetch::{BatchDispatcher, Resolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Identifiers resolved when no subcommand is given
const SAMPLE_BATCH: &[&str] = &[
    "Atomic Habits",
    "past paper BICT2303 2023",
    "exam paper COMM1101 2024",
    "Python Crash Course",
];

/// pdf-fetch - Find and download PDFs for books, past papers and direct links
#[derive(Parser, Debug)]
#[command(name = "pdf-fetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Find and download PDFs for books, past papers and direct links",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// Maximum identifiers resolved at once in batch mode
    #[arg(long, global = true)]
    max_concurrent: Option<usize>,

    /// Skip cover image lookup
    #[arg(long, global = true)]
    no_cover: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl From<OutputFormat> for ui::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Auto => ui::OutputFormat::Auto,
            OutputFormat::Table => ui::OutputFormat::Table,
            OutputFormat::Json => ui::OutputFormat::Json,
            OutputFormat::Plain => ui::OutputFormat::Plain,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a single identifier (book title, past paper query or PDF URL)
    #[command(alias = "g")]
    Get {
        /// Identifier words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Fetch many identifiers concurrently
    #[command(alias = "b")]
    Batch {
        /// Identifiers to fetch
        identifiers: Vec<String>,

        /// Read identifiers from a file, one per line
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => load_env_config()?,
    };
    apply_overrides(&mut config, &cli);

    // Initialize tracing based on verbosity, falling back to the configured level
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pdf_fetch={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let identifiers = match cli.command {
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        Some(Commands::Get { words }) => vec![words.join(" ")],
        Some(Commands::Batch { identifiers, file }) => {
            let mut all = identifiers;
            if let Some(path) = file {
                all.extend(read_identifiers(&path).await?);
            }
            if all.is_empty() {
                anyhow::bail!("no identifiers given; pass them as arguments or with --file");
            }
            all
        }
        None => SAMPLE_BATCH.iter().map(|s| s.to_string()).collect(),
    };

    let limit = config.concurrency.limit();
    let resolver = Arc::new(Resolver::new(config).context("failed to build HTTP client")?);
    let dispatcher = BatchDispatcher::new(resolver, limit);

    let show_progress = !cli.quiet && identifiers.len() > 1 && std::io::stderr().is_terminal();
    let entries = if show_progress {
        let pb = ui::batch_progress_bar(identifiers.len() as u64);
        let entries = dispatcher
            .run_with(identifiers, |entry| ui::tick(&pb, entry))
            .await;
        pb.finish_and_clear();
        entries
    } else {
        dispatcher.run(identifiers).await
    };

    output_entries(&entries, cli.output, cli.quiet)?;

    if BatchSummary::from_entries(&entries).all_failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Fold CLI flags over the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.download_dir {
        config.downloads.directory = dir.clone();
    }
    if let Some(max) = cli.max_concurrent {
        config.concurrency.max_concurrent_downloads = max;
    }
    if cli.no_cover {
        config.downloads.fetch_covers = false;
    }
}

/// One identifier per line; blank lines and `#` comments are skipped
async fn read_identifiers(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_identifiers(&text))
}

fn parse_identifiers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn output_entries(entries: &[BatchEntry], format: OutputFormat, quiet: bool) -> Result<()> {
    let format = ui::OutputFormat::from(format).resolve();
    println!("{}", ui::render(entries, format)?);

    if !quiet && entries.len() > 1 && format != ui::OutputFormat::Json {
        println!("{}", ui::summary_line(&BatchSummary::from_entries(entries)));
    }
    Ok(())
}
