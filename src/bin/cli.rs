//! harvester CLI
//!
//! Local execution entry point for single harvest runs.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use harvester::{
    error::{AppError, Result},
    models::{Credential, FilterValue, HarvestConfig, QuerySpec, RecordKind, SortMode},
    services::Harvester,
    storage::{DiskCache, MemoryCache, ResultCache},
};

/// harvester - Resilient Paginated API Harvesting Client
#[derive(Parser, Debug)]
#[command(name = "harvester", version, about = "Resilient paginated API harvesting client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest records for a keyword
    Fetch {
        /// Search keyword
        keyword: String,

        /// Page to start from (resume point after a crash)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Record kind: search_result, product, article, or listing
        #[arg(long, default_value = "search_result")]
        kind: String,

        /// Sort mode: relevance, recency, asc, or desc
        #[arg(long, default_value = "relevance")]
        sort: String,

        /// Upstream filter as name=value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Bearer token; falls back to the HARVESTER_TOKEN env var
        #[arg(long)]
        token: Option<String>,

        /// Cache results under this directory instead of in memory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Print records as JSON lines instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_filters(raw: &[String]) -> Result<Vec<(String, FilterValue)>> {
    raw.iter()
        .map(|entry| {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| AppError::invalid_spec(format!("filter '{entry}' is not name=value")))?;
            let value = match value.parse::<i64>() {
                Ok(n) => FilterValue::Number(n),
                Err(_) => FilterValue::Text(value.to_string()),
            };
            Ok((name.to_string(), value))
        })
        .collect()
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = HarvestConfig::load_or_default(&cli.config);

    match cli.command {
        Command::Fetch {
            keyword,
            page,
            kind,
            sort,
            filters,
            token,
            cache_dir,
            json,
        } => {
            config.validate()?;

            let kind = RecordKind::from_str(&kind)
                .ok_or_else(|| AppError::invalid_spec(format!("unknown record kind '{kind}'")))?;
            let sort = SortMode::from_param(&sort)
                .ok_or_else(|| AppError::invalid_spec(format!("unknown sort mode '{sort}'")))?;

            let token = token
                .or_else(|| std::env::var("HARVESTER_TOKEN").ok())
                .ok_or_else(|| {
                    AppError::config("no credential: pass --token or set HARVESTER_TOKEN")
                })?;
            let credential = Credential::new(token);

            let mut spec = QuerySpec::new(keyword, page);
            spec.sort = sort;
            for (name, value) in parse_filters(&filters)? {
                spec.filters.insert(name, value);
            }

            let cache: Arc<dyn ResultCache> = match cache_dir {
                Some(dir) => Arc::new(DiskCache::new(dir)),
                None => Arc::new(MemoryCache::new()),
            };
            let harvester = Harvester::new(Arc::new(config))?.with_cache(cache);

            let cancel = CancellationToken::new();
            let canceller = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("interrupt received, cancelling...");
                    canceller.cancel();
                }
            });

            let outcome = harvester.harvest(&spec, &credential, kind, &cancel).await?;

            if json {
                for record in &outcome.records {
                    println!("{}", serde_json::to_string(record)?);
                }
            }

            log::info!(
                "Harvested {} record(s) across {} page(s)",
                outcome.records.len(),
                outcome.pages_fetched
            );
            if outcome.dropped_records > 0 {
                log::warn!("{} record(s) dropped for schema violations", outcome.dropped_records);
            }
            for failure in &outcome.failures {
                log::warn!("page {} failed: {}", failure.page, failure.error);
            }
            if !outcome.is_clean() {
                log::warn!("{} page(s) skipped", outcome.failures.len());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
