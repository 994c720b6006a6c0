use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use track_duel::api::{build_router, AppState};
use track_duel::catalog::{
    deduplicate, CatalogCache, CatalogService, CatalogSource, HttpCatalogSource,
    JsonlCatalogSource,
};
use track_duel::config::{AppConfig, CatalogSourceKind, StoreBackend};
use track_duel::models::{CollectionId, Item, ItemId, SortBy};
use track_duel::stats::{
    LeaderboardRanker, MemoryStatsStore, SqliteStatsStore, StatsStore, VoteRecorder,
};
use track_duel::storage::{JsonlReader, JsonlWriter, StorageConfig};
use track_duel::tournament::{advance, TournamentState};

#[derive(Parser)]
#[command(name = "track-duel")]
#[command(about = "Head-to-head track tournaments with persistent leaderboards")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Play a tournament in the terminal
    Play {
        /// Collection to play
        #[arg(long)]
        collection: String,
    },

    /// Print a collection's leaderboard
    Leaderboard {
        #[arg(long)]
        collection: String,

        /// Sort key: wins or winrate
        #[arg(long, default_value = "wins")]
        sort: String,

        /// Number of entries to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print one item's counters
    Stats {
        #[arg(long)]
        collection: String,

        #[arg(long)]
        item: String,
    },

    /// Deduplicate a JSONL file of items and print the canonical list
    Dedup {
        #[arg(long)]
        input: PathBuf,

        /// Write the canonical list as JSONL here instead of printing JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting track-duel v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let store = open_store(&config, &storage).await?;
            let catalog = Arc::new(build_catalog(&config, &storage)?);
            let state = AppState::new(store.clone(), catalog, config.leaderboard.clone());
            let app = build_router(state, &config.server.cors_origin);

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind to {}", addr))?;
            tracing::info!("Listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            store.close().await;
            tracing::info!("Server stopped");
        }
        Commands::Play { collection } => {
            let collection = CollectionId::parse(&collection)?;
            let store = open_store(&config, &storage).await?;
            let catalog = build_catalog(&config, &storage)?;
            let recorder = VoteRecorder::new(store.clone());

            let items = catalog.load(&collection).await?;
            let result = play(collection, items, &recorder).await;
            store.close().await;
            result?;
        }
        Commands::Leaderboard {
            collection,
            sort,
            limit,
        } => {
            let collection = CollectionId::parse(&collection)?;
            let sort_by: SortBy = sort.parse()?;
            let limit = limit
                .unwrap_or(config.leaderboard.default_limit)
                .min(config.leaderboard.max_limit);

            let store = open_store(&config, &storage).await?;
            let board = LeaderboardRanker::new(store.clone())
                .compute(&collection, sort_by, limit)
                .await;
            store.close().await;
            let board = board?;

            println!(
                "\n=== {} leaderboard (by {}) ===",
                board.collection_id, board.sorted_by
            );
            println!("{:<4} {:<32} {:>6} {:>8} {:>8}", "#", "Item", "Wins", "Battles", "Win %");
            for (rank, entry) in board.entries.iter().enumerate() {
                println!(
                    "{:<4} {:<32} {:>6} {:>8} {:>7.2}%",
                    rank + 1,
                    entry.item_id.as_str(),
                    entry.wins,
                    entry.battles,
                    entry.win_rate
                );
            }
            println!(
                "\n{} ranked of {} items with stats, {} battles in total",
                board.entries.len(),
                board.totals.items_with_stats,
                board.totals.total_battles
            );
        }
        Commands::Stats { collection, item } => {
            let collection = CollectionId::parse(&collection)?;
            let item = ItemId::parse(&item)?;

            let store = open_store(&config, &storage).await?;
            let stats = VoteRecorder::new(store.clone())
                .stats(&collection, &item)
                .await;
            store.close().await;
            let stats = stats?;

            println!("Wins:     {}", stats.wins);
            println!("Battles:  {}", stats.battles);
            println!("Win rate: {:.2}%", stats.win_rate());
        }
        Commands::Dedup { input, output } => {
            if !input.exists() {
                bail!("Input file not found: {}", input.display());
            }
            let raw: Vec<Item> = JsonlReader::new(input).read_all()?;
            let items = deduplicate(&raw, &config.dedup);
            tracing::info!("Deduplicated {} items into {}", raw.len(), items.len());

            match output {
                Some(path) => {
                    JsonlWriter::new(path).write_all(&items)?;
                }
                None => println!("{}", serde_json::to_string_pretty(&items)?),
            }
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig, storage: &StorageConfig) -> Result<Arc<dyn StatsStore>> {
    let store: Arc<dyn StatsStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory stats store; counters are lost on exit");
            Arc::new(MemoryStatsStore::new())
        }
        StoreBackend::Sqlite => {
            let max = config.store.max_connections;
            let store = match &config.store.database_url {
                Some(url) => SqliteStatsStore::connect(url, max).await?,
                None => SqliteStatsStore::open(&storage.stats_db_path(), max).await?,
            };
            Arc::new(store)
        }
    };
    Ok(store)
}

fn build_catalog(config: &AppConfig, storage: &StorageConfig) -> Result<CatalogService> {
    let source: Arc<dyn CatalogSource> = match config.catalog.source {
        CatalogSourceKind::Jsonl => {
            let dir = config
                .catalog
                .dir
                .clone()
                .unwrap_or_else(|| storage.catalog_dir());
            Arc::new(JsonlCatalogSource::new(dir))
        }
        CatalogSourceKind::Http => {
            let raw = config
                .catalog
                .base_url
                .as_deref()
                .context("catalog.base_url is required for the http source")?;
            let base_url = url::Url::parse(raw).context("Invalid catalog.base_url")?;
            Arc::new(HttpCatalogSource::new(base_url, config.catalog.timeout())?)
        }
    };

    let service = CatalogService::new(source, config.dedup.clone());
    Ok(match config.catalog.cache_ttl() {
        Some(ttl) => service.with_cache(CatalogCache::new(storage.cache_dir(), ttl)),
        None => service,
    })
}

/// Interactive run over stdin. Returns when the user quits or declines a rematch.
async fn play(collection: CollectionId, items: Vec<Item>, recorder: &VoteRecorder) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = TournamentState::start(collection, items, &mut rand::thread_rng())?;

    loop {
        while let Some((left, right)) = state.current_pair() {
            let progress = state.progress();
            println!("\nBattle {}/{}", progress.round, progress.total_rounds);
            println!("  1) {} [{}]", left.name, left.album_name);
            println!("  2) {} [{}]", right.name, right.album_name);
            println!("Pick 1 or 2 (q to quit):");

            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            let winner = match line.trim() {
                "1" => left.id.clone(),
                "2" => right.id.clone(),
                "q" | "quit" => return Ok(()),
                other => {
                    println!("Unrecognised choice: {}", other);
                    continue;
                }
            };

            let outcome = advance(&state, &winner, recorder).await?;
            if !outcome.recorded {
                println!("(vote could not be saved; continuing)");
            }
            state = outcome.state;
        }

        if let Some(survivor) = state.survivor() {
            println!("\nWinner: {} [{}]", survivor.name, survivor.album_name);
        }
        println!("Play again? [y/N]");
        match lines.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("y") => {
                state = state.restart(&mut rand::thread_rng())?;
            }
            _ => return Ok(()),
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
