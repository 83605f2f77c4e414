//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command handlers and event handlers,
//! and wires the rename core (queue, sequence tracker, router) to the
//! Telegram transport.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use super::chat::TelegramChatIo;
use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::core::{
    BotPipeline, FileRouter, InteractionTracker, RenameQueue, SequenceTracker,
};
use crate::database::{Database, UserSettingsRepo};
use crate::events;
use crate::media::FfmpegProcessor;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// The production router wiring: real pipeline, settings-backed gate.
pub type BotRouter = FileRouter<BotPipeline, UserSettingsRepo>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Arc<Database>,

    /// Cache registry for creating/accessing caches.
    pub cache: Arc<CacheRegistry>,

    /// Per-user settings repository (also the ban gate and the
    /// sequence-stats sink).
    pub settings: Arc<UserSettingsRepo>,

    /// Dispatch router over the queue and the sequence tracker.
    pub router: Arc<BotRouter>,

    /// Owner user IDs (admin commands).
    pub owner_ids: Vec<u64>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        bot: ThrottledBot,
        db: Arc<Database>,
        cache: Arc<CacheRegistry>,
        config: &Config,
    ) -> Self {
        let settings = Arc::new(UserSettingsRepo::new(&db, &cache));

        let chat = Arc::new(TelegramChatIo::new(bot, config.download_dir.clone()));
        let media = Arc::new(FfmpegProcessor::new(
            config.download_dir.clone(),
            config.ffmpeg_bin.clone(),
        ));
        let pipeline = Arc::new(BotPipeline::new(chat, media, settings.clone()));

        let router = Arc::new(FileRouter::new(
            RenameQueue::new(pipeline),
            Arc::new(SequenceTracker::new()),
            InteractionTracker::new(&cache),
            settings.clone(),
        ));

        Self {
            db,
            cache,
            settings,
            router,
            owner_ids: config.owner_ids.clone(),
        }
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    db: Arc<Database>,
    cache: Arc<CacheRegistry>,
    config: &Config,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(bot.clone(), db, cache, config);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first, then media/photo/text events.
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(events::message_event_handler());

    dptree::entry().branch(message_handler)
}
