//! Renamix - Telegram media rename bot
//!
//! Renames documents, videos and audio according to a per-user
//! template, with an ordered "sequence" mode for batches.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB integration (user settings)
//! - `cache` - LRU-based caching with Moka
//! - `core` - Format resolver, per-user queue, sequence tracker, router
//! - `media` - ffmpeg-backed rename/remux step
//! - `bot` - Telegram transport (with Throttle for API rate limiting)
//! - `plugins` - Command handlers (extensible)
//! - `events` - Event handlers (media, photos, pending-input text)
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod core;
mod database;
mod events;
mod media;
mod plugins;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::CacheRegistry;
use config::Config;
use database::Database;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("renamix=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Renamix bot...");

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    // Scratch space for downloads and ffmpeg output
    tokio::fs::create_dir_all(&config.download_dir).await?;

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let db = Arc::new(db);
    info!("Database connected");

    // Initialize cache registry
    let cache = Arc::new(CacheRegistry::new());
    info!("Cache registry initialized");

    // Initialize bot with Throttle for automatic rate limiting
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    // Build dispatcher
    let dispatcher = bot::build_dispatcher(bot.clone(), db, cache, &config);

    // Run the bot
    bot::run(&config, dispatcher, bot).await;

    Ok(())
}
