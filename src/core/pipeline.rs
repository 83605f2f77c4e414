//! Rename pipeline: resolver -> media processor -> chat delivery.
//!
//! The queue and the sequence tracker both drive work through the
//! [`RenamePipeline`] trait, so tests can swap in a recording fake and
//! the production path stays in one place.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::bot::chat::ChatIo;
use crate::core::format;
use crate::core::source::{MediaKind, RenameableSource};
use crate::database::models::RenameMode;
use crate::database::UserSettingsRepo;
use crate::media::{MediaProcessor, MetadataOverrides};
use crate::utils::sanitize_filename;

/// One file's trip through rename and delivery.
#[async_trait]
pub trait RenamePipeline: Send + Sync + 'static {
    /// Process a single source to completion.
    ///
    /// Errors are recovered by the caller at the item boundary; they must
    /// never poison sibling items.
    async fn process(&self, source: &RenameableSource) -> Result<()>;

    /// Best-effort failure notice to the owner. Must not fail loudly.
    async fn notify_failure(&self, source: &RenameableSource, error: &anyhow::Error);
}

/// Production pipeline backed by Telegram and ffmpeg.
pub struct BotPipeline {
    chat: Arc<dyn ChatIo>,
    media: Arc<dyn MediaProcessor>,
    settings: Arc<UserSettingsRepo>,
}

impl BotPipeline {
    pub fn new(
        chat: Arc<dyn ChatIo>,
        media: Arc<dyn MediaProcessor>,
        settings: Arc<UserSettingsRepo>,
    ) -> Self {
        Self {
            chat,
            media,
            settings,
        }
    }

    /// Compute the target filename for a source under the given settings.
    fn target_name(
        &self,
        source: &RenameableSource,
        template: &str,
        mode: RenameMode,
    ) -> String {
        // Caption mode falls back to the filename when there is no caption.
        let source_text = match mode {
            RenameMode::Filename => source.file_name.as_deref(),
            RenameMode::Caption => source.caption.as_deref().or(source.file_name.as_deref()),
        }
        .unwrap_or("");

        let mut name = format::resolve(template, source_text, None);

        // Keep the original extension when the template does not carry one.
        if let Some(ext) = source.extension() {
            if !name.to_lowercase().ends_with(&format!(".{}", ext.to_lowercase())) {
                name.push('.');
                name.push_str(ext);
            }
        }

        sanitize_filename(&name)
    }
}

#[async_trait]
impl RenamePipeline for BotPipeline {
    async fn process(&self, source: &RenameableSource) -> Result<()> {
        let owner = source.owner;
        let settings = self.settings.get_or_default(owner).await?;

        let Some(template) = settings.format_template.clone() else {
            // Not a failure: the user simply has not configured a template.
            self.chat
                .send_text(
                    owner,
                    "No rename format set. Use /autorename <template> first.",
                )
                .await?;
            return Ok(());
        };

        let target = self.target_name(source, &template, settings.rename_mode);
        debug!(owner, target, "resolved rename target");

        let local = self.chat.redeem(&source.source).await?;

        let overrides = MetadataOverrides {
            enabled: settings.metadata_enabled,
            title: settings.metadata_title.clone(),
            author: settings.metadata_author.clone(),
        };
        let output = self.media.process(&local, &target, &overrides).await;

        // The downloaded scratch file is consumed (renamed) on success;
        // clean it up when processing failed before the move.
        if output.is_err() {
            let _ = tokio::fs::remove_file(&local).await;
        }
        let output = output?;

        let caption = settings
            .caption
            .as_deref()
            .map(|c| c.replace("{filename}", &target));

        let kind = match settings.media_preference {
            Some(pref) => pref.as_media_kind(),
            None => source.kind,
        };
        let kind = match (kind, source.kind) {
            // Never force a non-video upload method onto audio.
            (MediaKind::Video, MediaKind::Audio) => MediaKind::Audio,
            (k, _) => k,
        };

        let sent = self
            .chat
            .send_document(
                owner,
                &output,
                &target,
                caption.as_deref(),
                kind,
                settings.thumbnail_file_id.as_deref(),
            )
            .await;

        if let Err(e) = tokio::fs::remove_file(&output).await {
            warn!(owner, error = %e, "failed to remove processed file");
        }

        sent
    }

    async fn notify_failure(&self, source: &RenameableSource, error: &anyhow::Error) {
        let text = format!(
            "⚠️ Failed to process <code>{}</code>: {}",
            crate::utils::html_escape(source.display_name()),
            crate::utils::html_escape(&error.to_string()),
        );
        if let Err(e) = self.chat.send_text(source.owner, &text).await {
            warn!(owner = source.owner, error = %e, "failure notice could not be delivered");
        }
    }
}
