//! CLI administration tool for random-image-proxy.
//!
//! Inspects and maintains the stored image pool without going through HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Show pool size, age and a sample of URLs
//! cargo run --bin admin -- pool show
//!
//! # Fetch the listing and merge it into the pool now
//! cargo run --bin admin -- pool refresh
//!
//! # Pick a URL the way the server would
//! cargo run --bin admin -- pool pick
//!
//! # Replace the pool with an empty one
//! cargo run --bin admin -- pool reset --yes
//!
//! # Check the store connection
//! cargo run --bin admin -- store check
//! ```
//!
//! # Environment Variables
//!
//! Reads the same variables as the server (`KV_BACKEND`, `REDIS_URL`,
//! `POOL_KEY`, `SOURCE_URL`, ...). See the `config` module.

use random_image_proxy::application::services::{
    PoolRefresher, PoolStore, RefreshOutcome, Selection, Selector,
};
use random_image_proxy::config::{self, Config, KvBackend, mask_connection_string};
use random_image_proxy::domain::entities::Pool;
use random_image_proxy::server::{build_origin, build_refresher, connect_store};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;

/// CLI tool for managing random-image-proxy.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect or modify the image pool
    Pool {
        #[command(subcommand)]
        action: PoolAction,
    },

    /// Key-value store operations
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

/// Pool subcommands.
#[derive(Subcommand)]
enum PoolAction {
    /// Show pool size, last update and sample URLs
    Show {
        /// Number of URLs to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Fetch the listing and merge it into the pool
    Refresh,

    /// Pick one URL at random
    Pick,

    /// Replace the pool with an empty one
    Reset {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Store subcommands.
#[derive(Subcommand)]
enum StoreAction {
    /// Check store connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;

    let store = connect_store(&config)
        .await
        .context("Key-value store is not available (check KV_BACKEND and REDIS_URL)")?;
    let pool_store = PoolStore::new(store, config.pool_key.clone());

    match cli.command {
        Commands::Pool { action } => handle_pool_action(action, &config, &pool_store).await?,
        Commands::Store { action } => handle_store_action(action, &config, &pool_store).await?,
    }

    Ok(())
}

/// Dispatches pool commands.
async fn handle_pool_action(action: PoolAction, config: &Config, store: &PoolStore) -> Result<()> {
    match action {
        PoolAction::Show { limit } => show_pool(config, store, limit).await?,
        PoolAction::Refresh => {
            let refresher = build_refresher(config, build_origin(config)?);
            refresh_pool(&refresher, store).await?;
        }
        PoolAction::Pick => pick_url(config, store).await?,
        PoolAction::Reset { yes } => reset_pool(store, yes).await?,
    }

    Ok(())
}

/// Prints pool statistics and the first entries.
///
/// # Output Format
///
/// ```text
/// 🖼  Image Pool
///
///   Size:          842
///   Last updated:  2024-01-15 10:30:12 UTC (12 min ago)
///   Status:        FRESH
///
///   URLs:
///   https://i.pximg.net/img-master/...
/// ```
async fn show_pool(config: &Config, store: &PoolStore, limit: usize) -> Result<()> {
    println!("{}", "🖼  Image Pool".bright_blue().bold());
    println!();

    let pool = store
        .load_for_update()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read pool: {}", e))?;

    if pool.is_empty() {
        println!("{}", "  Pool is empty".yellow());
        println!();
        println!(
            "  Populate it with: {} admin pool refresh",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    let now = Utc::now();
    let age = now - pool.last_updated;
    let status = if pool.is_stale(now, config.refresh_interval()) {
        "STALE".yellow()
    } else {
        "FRESH".green()
    };

    println!(
        "  Size:          {}",
        pool.len().to_string().bright_white().bold()
    );
    println!(
        "  Last updated:  {} ({} min ago)",
        pool.last_updated
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
            .cyan(),
        age.num_minutes().to_string().bright_black()
    );
    println!("  Status:        {}", status);
    println!();
    println!("  {}", "URLs:".bright_white().bold());
    println!("  {}", "─".repeat(75).bright_black());

    for url in pool.urls.iter().take(limit) {
        println!("  {}", url.bright_black());
    }

    println!();

    Ok(())
}

/// Runs one refresh in the foreground and reports the outcome.
async fn refresh_pool(refresher: &PoolRefresher, store: &PoolStore) -> Result<()> {
    println!("{}", "🔄 Refresh Pool".bright_blue().bold());
    println!();

    match refresher.refresh(store).await {
        RefreshOutcome::Updated { size } => {
            println!("{}", "✅ Pool updated".green().bold());
            println!("  Size: {}", size.to_string().bright_white().bold());
        }
        RefreshOutcome::EmptyListing => {
            println!(
                "{}",
                "⚠️  Listing returned no usable images, pool unchanged".yellow()
            );
        }
        RefreshOutcome::OriginFailed(e) => {
            anyhow::bail!("Listing fetch failed: {}", e);
        }
        RefreshOutcome::StoreFailed(e) => {
            anyhow::bail!("Store error, pool unchanged: {}", e);
        }
    }

    println!();

    Ok(())
}

/// Picks a URL with the same selector the server uses.
async fn pick_url(config: &Config, store: &PoolStore) -> Result<()> {
    let pool = store.load().await;
    let selector = Selector::new(config.fallback_image_url.clone());

    match selector.pick(&pool) {
        Selection::Pooled(url) => println!("{}", url.bright_yellow()),
        Selection::Fallback(url) => {
            println!("{}", "⚠️  Pool is empty, fallback image:".yellow());
            println!("{}", url.bright_yellow());
        }
    }

    Ok(())
}

/// Overwrites the stored pool with an empty one.
///
/// The next request to the server then triggers a full refresh.
async fn reset_pool(store: &PoolStore, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Reset Pool".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Discard every URL in the pool?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    store
        .save(Pool::empty())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reset pool: {}", e))?;

    println!("{}", "✅ Pool reset".green().bold());
    println!();

    Ok(())
}

/// Dispatches store commands.
async fn handle_store_action(
    action: StoreAction,
    config: &Config,
    store: &PoolStore,
) -> Result<()> {
    match action {
        StoreAction::Check => {
            println!("{}", "🔍 Checking store connection...".bright_blue());

            let backend = match (config.kv_backend, &config.redis_url) {
                (KvBackend::Memory, _) => "memory".to_string(),
                (KvBackend::Redis, Some(url)) => mask_connection_string(url),
                (KvBackend::Redis, None) => "redis (not configured)".to_string(),
            };
            println!("  Backend: {}", backend.cyan());

            if store.health_check().await {
                println!("{}", "✅ Store connection OK".green().bold());
            } else {
                anyhow::bail!("Store did not answer");
            }
        }
    }

    Ok(())
}
