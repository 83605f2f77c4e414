//! User settings repository with hot caching.
//!
//! Every pipeline invocation reads settings, so documents are cached
//! aggressively. Reads are consistent within one invocation: the
//! pipeline loads the document once and works from that snapshot.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::core::{AccessGate, OwnerId, SequenceStats};
use crate::database::models::{MediaPreference, RenameMode, UserSettings};
use crate::database::Database;

/// Repository for per-user rename settings.
pub struct UserSettingsRepo {
    collection: Collection<UserSettings>,
    cache: TypedCache<u64, UserSettings>,
}

impl UserSettingsRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let settings_cache = cache.get_or_create(
            "user_settings",
            CacheConfig::with_capacity(10_000).ttl(Duration::from_secs(600)), // 10 minutes
        );

        Self {
            collection: db.collection("user_settings"),
            cache: settings_cache,
        }
    }

    /// Get settings, returning a fresh default document if none exist.
    pub async fn get_or_default(&self, user_id: u64) -> Result<UserSettings> {
        if let Some(settings) = self.cache.get(&user_id) {
            return Ok(settings);
        }

        let filter = doc! { "user_id": user_id as i64 };
        let result = self.collection.find_one(filter).await?;

        let settings = result.unwrap_or_else(|| UserSettings::new(user_id));
        self.cache.insert(user_id, settings.clone());

        Ok(settings)
    }

    /// Save settings (upsert) and refresh the cache.
    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        let filter = doc! { "user_id": settings.user_id as i64 };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(filter, settings)
            .with_options(options)
            .await?;

        self.cache.insert(settings.user_id, settings.clone());
        debug!("Saved settings for user {}", settings.user_id);

        Ok(())
    }

    /// Load-modify-save helper shared by all setters.
    async fn update<F>(&self, user_id: u64, mutate: F) -> Result<UserSettings>
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut settings = self.get_or_default(user_id).await?;
        mutate(&mut settings);
        settings.touch();
        self.save(&settings).await?;
        Ok(settings)
    }

    pub async fn get_format_template(&self, user_id: u64) -> Result<Option<String>> {
        Ok(self.get_or_default(user_id).await?.format_template)
    }

    pub async fn set_format_template(&self, user_id: u64, template: String) -> Result<()> {
        self.update(user_id, |s| s.format_template = Some(template))
            .await?;
        Ok(())
    }

    pub async fn get_media_type_preference(&self, user_id: u64) -> Result<Option<MediaPreference>> {
        Ok(self.get_or_default(user_id).await?.media_preference)
    }

    pub async fn set_media_preference(&self, user_id: u64, pref: MediaPreference) -> Result<()> {
        self.update(user_id, |s| s.media_preference = Some(pref))
            .await?;
        Ok(())
    }

    pub async fn get_mode(&self, user_id: u64) -> Result<RenameMode> {
        Ok(self.get_or_default(user_id).await?.rename_mode)
    }

    pub async fn set_rename_mode(&self, user_id: u64, mode: RenameMode) -> Result<()> {
        self.update(user_id, |s| s.rename_mode = mode).await?;
        Ok(())
    }

    pub async fn set_caption(&self, user_id: u64, caption: Option<String>) -> Result<()> {
        self.update(user_id, |s| s.caption = caption).await?;
        Ok(())
    }

    pub async fn set_thumbnail(&self, user_id: u64, file_id: Option<String>) -> Result<()> {
        self.update(user_id, |s| s.thumbnail_file_id = file_id)
            .await?;
        Ok(())
    }

    pub async fn set_metadata_enabled(&self, user_id: u64, enabled: bool) -> Result<()> {
        self.update(user_id, |s| s.metadata_enabled = enabled)
            .await?;
        Ok(())
    }

    pub async fn set_metadata_title(&self, user_id: u64, title: Option<String>) -> Result<()> {
        self.update(user_id, |s| s.metadata_title = title).await?;
        Ok(())
    }

    pub async fn set_metadata_author(&self, user_id: u64, author: Option<String>) -> Result<()> {
        self.update(user_id, |s| s.metadata_author = author).await?;
        Ok(())
    }

    pub async fn set_banned(&self, user_id: u64, banned: bool) -> Result<()> {
        self.update(user_id, |s| s.banned = banned).await?;
        Ok(())
    }

    pub async fn increment_sequence_count(&self, user_id: u64) -> Result<()> {
        self.update(user_id, |s| s.sequence_count += 1).await?;
        Ok(())
    }

    pub async fn set_last_sequence_time(&self, user_id: u64, timestamp: i64) -> Result<()> {
        self.update(user_id, |s| s.last_sequence_at = Some(timestamp))
            .await?;
        Ok(())
    }

    /// Total number of known users (for /stats).
    pub async fn count_users(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

#[async_trait]
impl AccessGate for UserSettingsRepo {
    async fn is_allowed(&self, owner: OwnerId) -> bool {
        match self.get_or_default(owner).await {
            Ok(settings) => !settings.banned,
            Err(error) => {
                // Store trouble should not lock everyone out.
                warn!(owner, %error, "ban check failed, allowing");
                true
            }
        }
    }
}

#[async_trait]
impl SequenceStats for UserSettingsRepo {
    async fn sequence_completed(&self, owner: OwnerId, _delivered: usize) -> Result<()> {
        self.increment_sequence_count(owner).await?;
        self.set_last_sequence_time(owner, chrono::Utc::now().timestamp())
            .await
    }
}
