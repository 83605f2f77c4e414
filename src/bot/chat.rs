//! Chat I/O seam.
//!
//! The pipeline talks to Telegram only through [`ChatIo`]: send a text,
//! deliver a finished file, redeem a source handle for local bytes.
//! Keeping this behind a trait keeps the queue/sequence machinery free
//! of transport details.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::debug;

use super::dispatcher::ThrottledBot;
use crate::core::{MediaKind, OwnerId, SourceRef};
use crate::utils::sanitize_filename;

/// Abstract chat transport used by the rename pipeline.
#[async_trait]
pub trait ChatIo: Send + Sync + 'static {
    /// Send an HTML-formatted text message to the owner's private chat.
    async fn send_text(&self, owner: OwnerId, text: &str) -> Result<()>;

    /// Deliver a finished file under its new name.
    async fn send_document(
        &self,
        owner: OwnerId,
        path: &Path,
        name: &str,
        caption: Option<&str>,
        kind: MediaKind,
        thumbnail_file_id: Option<&str>,
    ) -> Result<()>;

    /// Download the source into the local scratch directory.
    async fn redeem(&self, source: &SourceRef) -> Result<PathBuf>;
}

/// Production chat I/O over the throttled teloxide bot.
pub struct TelegramChatIo {
    bot: ThrottledBot,
    download_dir: PathBuf,
}

impl TelegramChatIo {
    pub fn new(bot: ThrottledBot, download_dir: PathBuf) -> Self {
        Self { bot, download_dir }
    }

    /// Download any Telegram file id to a local path.
    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<()> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .context("getFile failed")?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut out = tokio::fs::File::create(dest)
            .await
            .context("creating download target")?;

        // Downloads bypass the throttle adaptor; they are not bot API
        // calls in the rate-limited sense.
        self.bot
            .inner()
            .download_file(&file.path, &mut out)
            .await
            .context("downloading file")?;
        Ok(())
    }
}

#[async_trait]
impl ChatIo for TelegramChatIo {
    async fn send_text(&self, owner: OwnerId, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(owner as i64), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_document(
        &self,
        owner: OwnerId,
        path: &Path,
        name: &str,
        caption: Option<&str>,
        kind: MediaKind,
        thumbnail_file_id: Option<&str>,
    ) -> Result<()> {
        let chat_id = ChatId(owner as i64);
        let input = InputFile::file(path.to_path_buf()).file_name(name.to_string());

        // Telegram does not accept reused file ids for thumbnails, so the
        // stored photo is re-downloaded and attached as a fresh upload.
        let thumb_path = match thumbnail_file_id {
            Some(file_id) => {
                let dest = self.download_dir.join(format!("thumb-{}.jpg", owner));
                match self.download_to(file_id, &dest).await {
                    Ok(()) => Some(dest),
                    Err(e) => {
                        debug!(owner, error = %e, "thumbnail unavailable, sending without");
                        None
                    }
                }
            }
            None => None,
        };
        let thumb = thumb_path.as_ref().map(|p| InputFile::file(p.clone()));

        let result = match kind {
            MediaKind::Document => {
                let mut req = self.bot.send_document(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c.to_string()).parse_mode(ParseMode::Html);
                }
                if let Some(t) = thumb {
                    req = req.thumbnail(t);
                }
                req.await.map(|_| ())
            }
            MediaKind::Video => {
                let mut req = self.bot.send_video(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c.to_string()).parse_mode(ParseMode::Html);
                }
                if let Some(t) = thumb {
                    req = req.thumbnail(t);
                }
                req.await.map(|_| ())
            }
            MediaKind::Audio => {
                let mut req = self.bot.send_audio(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c.to_string()).parse_mode(ParseMode::Html);
                }
                if let Some(t) = thumb {
                    req = req.thumbnail(t);
                }
                req.await.map(|_| ())
            }
        };

        if let Some(p) = thumb_path {
            let _ = tokio::fs::remove_file(p).await;
        }

        result?;
        Ok(())
    }

    async fn redeem(&self, source: &SourceRef) -> Result<PathBuf> {
        let dest = self
            .download_dir
            .join(sanitize_filename(&format!("dl-{}", source.file_unique_id)));
        debug!(file_id = %source.file_id, dest = %dest.display(), "redeeming source");
        self.download_to(&source.file_id, &dest).await?;
        Ok(dest)
    }
}
