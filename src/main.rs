//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest video metadata
//! harvester.

use clap::{Parser, Subcommand};
use reel_harvest::config::{load_config_with_hash, Config};
use reel_harvest::crawler::Coordinator;
use reel_harvest::enrich::enrich_pending;
use reel_harvest::output::{load_statistics, print_channels, print_statistics, print_videos};
use reel_harvest::storage::{open_storage, SortOrder, Storage, VideoQuery};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reel-Harvest: A polite video metadata harvester
///
/// Reel-Harvest searches for videos, reads the metadata embedded in the
/// listing and watch pages, and keeps it in a local SQLite library that can
/// be enriched and browsed offline.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite video metadata harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl search queries and store the videos found
    Crawl {
        /// Query to crawl (repeatable; defaults to the configured queries)
        #[arg(short, long = "query", value_name = "QUERY")]
        queries: Vec<String>,

        /// Maximum videos per query
        #[arg(short, long)]
        limit: Option<usize>,

        /// Validate config and show what would be crawled without crawling
        #[arg(long)]
        dry_run: bool,
    },

    /// Derive summaries and tags for videos that lack them
    Enrich {
        /// Maximum number of videos to update
        #[arg(short, long, default_value_t = 200)]
        limit: usize,
    },

    /// List stored videos
    List {
        /// Text to find in title or description (ASCII letters match either case)
        #[arg(short, long)]
        search: Option<String>,

        /// Exact channel name
        #[arg(long)]
        channel: Option<String>,

        /// Required tag (repeatable, all must match)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Sort order: published-desc, published-asc, crawled-desc, crawled-asc, title, channel
        #[arg(long, default_value_t = SortOrder::PublishedDesc)]
        sort: SortOrder,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// List the channels in the library
    Channels,

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl {
            queries,
            limit,
            dry_run,
        } => {
            if let Some(limit) = limit {
                config.crawler.max_videos_per_query = limit;
                reel_harvest::config::validate(&config)?;
            }
            let queries = if queries.is_empty() {
                config.default_queries()
            } else {
                queries
            };

            if dry_run {
                handle_dry_run(&config, &queries);
            } else {
                handle_crawl(&config, &queries).await?;
            }
        }
        Command::Enrich { limit } => handle_enrich(&config, limit)?,
        Command::List {
            search,
            channel,
            tags,
            sort,
            limit,
            offset,
        } => {
            let query = VideoQuery {
                search,
                channel,
                tags,
                sort,
                limit,
                offset,
                ..VideoQuery::default()
            };
            handle_list(&config, &query)?;
        }
        Command::Channels => handle_channels(&config)?,
        Command::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

fn open(config: &Config) -> Result<impl Storage, Box<dyn std::error::Error>> {
    Ok(open_storage(Path::new(&config.output.database_path))?)
}

/// Handles `crawl --dry-run`: shows what would be crawled
fn handle_dry_run(config: &Config, queries: &[String]) {
    println!("=== Reel-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base delay: {}ms", config.crawler.base_delay_ms);
    println!(
        "  Max videos per query: {}",
        config.crawler.max_videos_per_query
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!(
        "  Max concurrent queries: {}",
        config.crawler.max_concurrent_queries
    );

    println!("\nIdentity:");
    println!("  User agent: {}", config.user_agent.user_agent);
    println!("  Accept-Language: {}", config.user_agent.accept_language);
    println!(
        "  Proxy: {}",
        config.user_agent.proxy.as_deref().unwrap_or("none")
    );

    println!("\nEndpoints:");
    println!("  Search: {}", config.endpoints.search_url);
    println!("  Watch: {}", config.endpoints.watch_url);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nQueries ({}):", queries.len());
    for query in queries {
        println!("  - {}", query);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch at most {} pages",
        pages_upper_bound(queries.len(), config.crawler.max_videos_per_query)
    );
}

/// One listing plus one watch page per kept video, for every query
fn pages_upper_bound(queries: usize, per_query: usize) -> usize {
    queries.saturating_mul(per_query.saturating_add(1))
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    queries: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open(config)?;
    let coordinator = Coordinator::new(config)?;

    match coordinator.run(queries, &mut storage).await {
        Ok(report) => {
            println!(
                "Stored {} videos ({} without watch page data); {} of {} queries failed",
                report.rows_affected,
                report.videos_degraded,
                report.queries_failed,
                queries.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn handle_enrich(config: &Config, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open(config)?;
    let updated = enrich_pending(&mut storage, limit)?;
    println!("Updated {} videos with summaries and tags", updated);
    Ok(())
}

fn handle_list(config: &Config, query: &VideoQuery) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open(config)?;
    print_videos(&storage.query_videos(query)?);
    Ok(())
}

fn handle_channels(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open(config)?;
    print_channels(&storage.distinct_channels()?);
    Ok(())
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}
