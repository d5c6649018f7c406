//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use artfill_core::{FillOptions, FillProgress, FillReport, RecordOutcome};
use artfill_extractor::{ExtractError, ImageExtractor};
use artfill_shared::{
    AppConfig, ArtworkRecord, FillDirection, init_config, load_config, load_config_from,
    resolve_store_auth_token, resolve_store_url,
};
use artfill_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// artfill: fill in missing artwork and image URLs.
#[derive(Parser)]
#[command(
    name = "artfill",
    version,
    about = "Fill in missing artwork and image URLs by scraping the pages they point to.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.artfill/artfill.toml).
    #[arg(long = "config", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fill a missing URL field on every record that lacks it.
    Fill {
        #[command(subcommand)]
        target: FillTarget,
    },

    /// Run the image extractor against a single URL and print the result.
    Probe {
        /// Page URL to fetch.
        url: String,
    },

    /// Check the store connection and report how many records are incomplete.
    Check {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Import artwork documents from a JSON array export.
    Seed {
        /// Path to the JSON file.
        file: PathBuf,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Which field a fill run writes.
#[derive(Subcommand)]
pub(crate) enum FillTarget {
    /// Scrape each record's artwork page for a missing image URL.
    Images(FillArgs),
    /// Scrape each record's image page for a missing artwork URL.
    ArtworkUrls(FillArgs),
}

impl FillTarget {
    fn split(self) -> (FillDirection, FillArgs) {
        match self {
            Self::Images(args) => (FillDirection::ImageUrl, args),
            Self::ArtworkUrls(args) => (FillDirection::ArtworkUrl, args),
        }
    }
}

/// Store selection shared by commands that open the database.
#[derive(Args, Clone)]
pub(crate) struct StoreArgs {
    /// Store connection string. Overrides the env var named in config.
    #[arg(long)]
    pub database: Option<String>,
}

#[derive(Args)]
pub(crate) struct FillArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Pause between page fetches in ms (overrides config).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Stop after this many records.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Extract URLs but do not write them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create a default config file at ~/.artfill/artfill.toml.
    Init,
    /// Print the current configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "artfill=info",
        1 => "artfill=debug",
        _ => "artfill=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config_file {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Fill { target } => {
            let (direction, args) = target.split();
            cmd_fill(&config, direction, args).await
        }
        Command::Probe { url } => cmd_probe(&config, &url).await,
        Command::Check { store } => cmd_check(&config, &store).await,
        Command::Seed { file, store } => cmd_seed(&config, &file, &store).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

/// Connection string from `--database`, else the env var named in config.
fn store_url(config: &AppConfig, store: &StoreArgs) -> Result<String> {
    match &store.database {
        Some(url) => Ok(url.clone()),
        None => Ok(resolve_store_url(config)?),
    }
}

async fn open_store(config: &AppConfig, store: &StoreArgs) -> Result<Storage> {
    let url = store_url(config, store)?;
    let storage = Storage::connect(&url, resolve_store_auth_token(config)).await?;
    info!(remote = artfill_storage::is_remote(&url), "store opened");
    Ok(storage)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fill(config: &AppConfig, direction: FillDirection, args: FillArgs) -> Result<()> {
    let storage = open_store(config, &args.store).await?;
    let extractor = ImageExtractor::new(&config.http)?;

    let mut options = FillOptions::new(direction, &config.updater);
    if let Some(ms) = args.delay_ms {
        options.delay = Duration::from_millis(ms);
    }
    options.limit = args.limit;
    options.dry_run = args.dry_run;

    info!(%direction, dry_run = options.dry_run, "starting fill run");

    let reporter = CliProgress::new();
    let result = artfill_core::fill(&storage, &extractor, &options, &reporter).await;
    storage.close();
    let report = result?;

    println!();
    println!(
        "  {} complete{}",
        direction,
        if options.dry_run { " (dry run)" } else { "" }
    );
    println!("  Processed:      {}", report.processed);
    println!("  Updated:        {}", report.updated);
    println!("  No result:      {}", report.no_result);
    println!("  Skipped:        {}", report.skipped);
    println!("  Write failures: {}", report.write_failures);
    println!("  Time:           {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_probe(config: &AppConfig, url: &str) -> Result<()> {
    let extractor = ImageExtractor::new(&config.http)?;

    match extractor.extract(url).await {
        Ok(found) => {
            println!("  Source:    {}", found.source);
            println!("  Image URL: {}", found.url);
        }
        Err(ExtractError::NoMatch { .. }) => {
            println!("  No image found on {url}");
        }
        Err(e) => {
            println!("  Fetch failed: {e}");
        }
    }
    Ok(())
}

async fn cmd_check(config: &AppConfig, store: &StoreArgs) -> Result<()> {
    let url = store_url(config, store)?;
    let storage = Storage::open_readonly(&url, resolve_store_auth_token(config))
        .await
        .map_err(|e| eyre!("could not open store: {e}"))?;

    let result = artfill_core::collect_stats(&storage).await;
    storage.close();
    let stats = result?;

    println!();
    println!("  Connected.");
    println!("  Artworks:            {}", stats.total);
    println!("  Complete:            {}", stats.complete);
    println!("  Missing image_url:   {}", stats.missing_image_url);
    println!("  Missing artwork_url: {}", stats.missing_artwork_url);
    match &stats.sample {
        Some(sample) => {
            println!();
            println!("  Sample artwork:");
            println!("{}", serde_json::to_string_pretty(sample)?);
        }
        None => println!("  No artworks found. Import some with `artfill seed <file>`."),
    }
    println!();

    Ok(())
}

async fn cmd_seed(config: &AppConfig, file: &Path, store: &StoreArgs) -> Result<()> {
    let storage = open_store(config, store).await?;
    let result = artfill_core::seed_from_path(&storage, file).await;
    storage.close();
    let report = result?;

    println!();
    println!("  Imported {}", file.display());
    println!("  Read:     {}", report.read);
    println!("  Inserted: {}", report.inserted);
    println!("  Existing: {}", report.existing);
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config file: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl FillProgress for CliProgress {
    fn started(&self, pending: u64) {
        self.bar.set_length(pending);
    }

    fn record_started(&self, record: &ArtworkRecord, _current: usize) {
        self.bar.set_message(record.label().to_string());
    }

    fn record_finished(&self, _record: &ArtworkRecord, outcome: &RecordOutcome) {
        if let RecordOutcome::WriteFailed(reason) = outcome {
            self.bar.println(format!("  write failed: {reason}"));
        }
        self.bar.inc(1);
    }

    fn done(&self, _report: &FillReport) {
        self.bar.finish_and_clear();
    }
}
