//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use manualmirror_scraper::{ScrapeProgress, TreeScraper};
use manualmirror_shared::{
    AppConfig, Classification, DocumentId, init_config, load_config, validate_api_token,
};
use manualmirror_sync::{HttpStore, sync_tree};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// manualmirror — mirror a policy manual site into a document store.
#[derive(Parser)]
#[command(
    name = "manualmirror",
    version,
    about = "Scrape a published policy manual and reconcile it against a document store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Scrape the manual and reconcile it against the document store.
    Sync {
        /// Existing document to reconcile against (overrides the config file).
        #[arg(long)]
        document_id: Option<String>,
    },

    /// Scrape the manual and write the document tree as JSON, without syncing.
    Scrape {
        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "manualmirror=info",
        1 => "manualmirror=debug",
        _ => "manualmirror=trace",
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
    match cli.command {
        Command::Sync { document_id } => cmd_sync(document_id.as_deref()).await,
        Command::Scrape { out } => cmd_scrape(out.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Scrape progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn phase(&self, msg: &str) {
        self.spinner.set_message(msg.to_string());
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ScrapeProgress for CliProgress {
    fn page_fetched(&self, url: &str, fetched: usize) {
        self.spinner.set_message(format!("Fetching [{fetched}] {url}"));
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_sync(document_id: Option<&str>) -> Result<()> {
    let config = load_config()?;
    validate_api_token(&config)?;

    let existing = resolve_document_id(document_id, &config)?;
    let token = std::env::var(&config.sync.api_token_env)
        .map_err(|_| eyre!("missing {} environment variable", config.sync.api_token_env))?;

    let classification = Classification {
        doc_type: config.sync.doc_type.clone(),
        subtype: config.sync.subtype.clone(),
        locale: config.sync.locale.clone(),
    };

    info!(
        base_url = %config.site.base_url,
        existing = ?existing.as_ref().map(ToString::to_string),
        "syncing policy manual"
    );

    let start = Instant::now();
    let progress = CliProgress::new();

    progress.phase("Scraping manual");
    let scraper = TreeScraper::new(config.site.clone())?;
    let manual = scraper.scrape(&progress).await?;

    progress.phase("Reconciling with document store");
    let store = HttpStore::new(&config.sync.api_url, token)?;
    let report = sync_tree(&store, &manual, existing.as_ref(), &classification).await?;

    progress.finish();

    println!();
    println!("  Sync finished: status ok");
    println!("  Document: {}", report.document_id);
    println!("  Pages:    {}", scraper.pages_fetched());
    println!("  Kept:     {}", report.kept);
    println!("  Updated:  {}", report.updated);
    println!("  Created:  {}", report.created);
    println!("  Deleted:  {}", report.deleted);
    println!("  Time:     {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_scrape(out: Option<&std::path::Path>) -> Result<()> {
    let config = load_config()?;

    info!(base_url = %config.site.base_url, "scraping policy manual");

    let progress = CliProgress::new();
    progress.phase("Scraping manual");

    let scraper = TreeScraper::new(config.site.clone())?;
    let manual = scraper.scrape(&progress).await?;

    progress.finish();

    let json = serde_json::to_string_pretty(&manual)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!(
                "Wrote {} nodes to {}",
                manual.node_count(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// The flag wins over the config file; absence of both means a fresh create.
fn resolve_document_id(flag: Option<&str>, config: &AppConfig) -> Result<Option<DocumentId>> {
    let raw = flag.or(config.sync.existing_document_id.as_deref());
    raw.map(|s| {
        s.parse::<DocumentId>()
            .map_err(|e| eyre!("invalid document id '{s}': {e}"))
    })
    .transpose()
}
