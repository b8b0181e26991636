//! geofix - message geo-fixing pipeline stage
//!
//! Reads newline-delimited JSON messages, attaches coordinates from the
//! author's stored profile where the message has none, and writes the
//! messages back out in the same order.
//!
//! # Usage
//!
//! ```bash
//! # Load author profiles into the store
//! geofix import-profiles --file profiles.jsonl
//!
//! # Geo-fix a message stream
//! cat messages.jsonl | geofix run > fixed.jsonl
//!
//! # Use a named profile store
//! geofix run --input messages.jsonl --db crowd
//! ```
//!
//! # Environment Variables
//!
//! - `GEOFIX_CONFIG`: Path to a TOML config file (default: ./geofix.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use geofix::config::{AppConfig, FromProfileOptions};
use geofix::pipeline::{JsonLinesSink, JsonLinesSource, ProcessingLoop};
use geofix::plugin::{PluginRegistry, FROM_PROFILE_PLUGIN};
use geofix::storage::{SledProfileStore, StoreSelector};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "geofix")]
#[command(about = "Geo-fix streamed messages from their authors' profiles")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides GEOFIX_CONFIG and ./geofix.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Profile database directory (overrides store.path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Geo-fix a JSON-lines message stream from a file or stdin to stdout
    Run {
        /// Input file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Plugin to run (overrides pipeline.plugin)
        #[arg(long)]
        plugin: Option<String>,

        /// Profile store selector for the fromprofile plugin
        #[arg(long)]
        db: Option<String>,

        /// Messages processed concurrently (overrides pipeline.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Load JSON-lines author profiles into the profile store
    ImportProfiles {
        /// File with one profile JSON object per line
        #[arg(long)]
        file: PathBuf,

        /// Profile store selector to import into (default store when omitted)
        #[arg(long)]
        db: Option<String>,
    },

    /// List the registered geo-fixing plugins
    Plugins,
}

// ============================================================================
// Configuration
// ============================================================================

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };

    if let Some(store) = &args.store {
        config.store.path.clone_from(store);
    }

    if let SubCommand::Run {
        plugin,
        db,
        concurrency,
        ..
    } = &args.command
    {
        if let Some(plugin) = plugin {
            config.pipeline.plugin.clone_from(plugin);
        }
        if let Some(concurrency) = concurrency {
            config.pipeline.concurrency = *concurrency;
        }
        if let Some(db) = db {
            let options = FromProfileOptions::with_db(db.as_str());
            let value = toml::Value::try_from(&options).context("Failed to encode --db option")?;
            config.plugins.insert(FROM_PROFILE_PLUGIN.to_string(), value);
        }
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ============================================================================
// Commands
// ============================================================================

async fn run_pipeline(config: &AppConfig, input: Option<PathBuf>) -> Result<()> {
    let store = SledProfileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open profile store at {}", config.store.path.display()))?;

    let registry = PluginRegistry::with_defaults(Arc::new(store));
    let plugin = config.pipeline.plugin.as_str();
    let operator = registry
        .build(plugin, &config.plugin_options(plugin))
        .context("Failed to build geo-fixing operator")?;

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, finishing in-flight messages");
            ctrl_c_token.cancel();
        }
    });

    let processing = ProcessingLoop::new(operator, config.pipeline.concurrency, cancel_token);
    let mut sink = JsonLinesSink::stdout();

    let stats = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            let name = path.display().to_string();
            let mut source = JsonLinesSource::new(tokio::io::BufReader::new(file), name);
            processing.run(&mut source, &mut sink).await?
        }
        None => {
            let mut source = JsonLinesSource::stdin();
            processing.run(&mut source, &mut sink).await?
        }
    };

    info!(
        processed = stats.processed,
        enriched = stats.enriched,
        "Geo-fixing complete"
    );
    Ok(())
}

fn import_profiles(config: &AppConfig, file: &Path, db: Option<&str>) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read profiles from {}", file.display()))?;

    let options = FromProfileOptions {
        db: db.map(str::to_string),
    };
    let problems = options.problems();
    if !problems.is_empty() {
        anyhow::bail!("Invalid --db: {}", problems.join("; "));
    }
    let selector: StoreSelector = options.store_selector();

    let store = SledProfileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open profile store at {}", config.store.path.display()))?;
    let repository = store
        .open_repository(&selector)
        .context("Failed to open profile tree")?;

    let stats = repository
        .import_json_lines(&contents)
        .context("Failed to import profiles")?;

    info!(
        store = %selector,
        imported = stats.imported,
        skipped = stats.skipped,
        total = repository.len(),
        "Profile import complete"
    );
    Ok(())
}

fn list_plugins() {
    // Listing needs no real store
    let registry = PluginRegistry::with_defaults(Arc::new(geofix::storage::InMemoryProfileStore::new()));
    for name in registry.names() {
        println!("{name}");
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr: stdout carries the message stream
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    if matches!(args.command, SubCommand::Plugins) {
        list_plugins();
        return Ok(());
    }

    let config = load_config(&args)?;

    match args.command {
        SubCommand::Run { input, .. } => run_pipeline(&config, input).await,
        SubCommand::ImportProfiles { file, db } => import_profiles(&config, &file, db.as_deref()),
        SubCommand::Plugins => Ok(()),
    }
}
