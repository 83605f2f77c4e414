//! Incoming media and text events.
//!
//! Every document/video/audio in private chat becomes a
//! `RenameableSource` and goes through the dispatch router; photos set
//! the thumbnail; plain text satisfies a pending prompt when one is
//! armed.

use teloxide::prelude::*;
use tracing::debug;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::core::{MediaKind, PendingInput, RenameableSource, RouteOutcome, SourceRef};
use crate::plugins::{fileinfo, thumbnail};

/// True for private-chat messages carrying renameable media.
pub fn is_renameable_media(msg: Message) -> bool {
    msg.chat.is_private()
        && (msg.document().is_some() || msg.video().is_some() || msg.audio().is_some())
}

/// True for private-chat photo messages (thumbnail upload).
pub fn is_thumbnail_photo(msg: Message) -> bool {
    msg.chat.is_private() && msg.photo().is_some()
}

/// True for plain private-chat text that is not a command.
pub fn is_plain_text(msg: Message) -> bool {
    msg.chat.is_private()
        && msg
            .text()
            .map(|t| !t.starts_with('/'))
            .unwrap_or(false)
}

/// Build the router input from a media message.
fn source_from_message(msg: &Message) -> Option<RenameableSource> {
    let owner = msg.from.as_ref()?.id.0;
    let caption = msg.caption().map(|c| c.to_string());

    let (file, file_name, kind) = if let Some(doc) = msg.document() {
        (&doc.file, doc.file_name.clone(), MediaKind::Document)
    } else if let Some(video) = msg.video() {
        (&video.file, video.file_name.clone(), MediaKind::Video)
    } else if let Some(audio) = msg.audio() {
        (&audio.file, audio.file_name.clone(), MediaKind::Audio)
    } else {
        return None;
    };

    Some(RenameableSource::new(
        owner,
        SourceRef {
            file_id: file.id.clone(),
            file_unique_id: file.unique_id.clone(),
            file_size: file.size as u64,
        },
        file_name,
        caption,
        kind,
    ))
}

/// Handle an incoming media message: classify and dispatch.
pub async fn handle_incoming_media(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(source) = source_from_message(&msg) else {
        return Ok(());
    };
    let owner = source.owner;

    match state.router.route(source).await {
        RouteOutcome::Info(source) => {
            fileinfo::send_file_details(&bot, msg.chat.id, &source).await?;
        }
        RouteOutcome::Collected { count } => {
            bot.send_message(msg.chat.id, format!("➕ Added to sequence (#{count})."))
                .await?;
        }
        RouteOutcome::SequenceBusy => {
            bot.send_message(
                msg.chat.id,
                "⚠️ Your sequence is being finalized; send this file again once it finishes.",
            )
            .await?;
        }
        RouteOutcome::Rejected => {
            debug!(owner, "rejected upload from banned user");
            bot.send_message(msg.chat.id, "🚫 You are banned from using this bot.")
                .await?;
        }
        RouteOutcome::Enqueued { position } => {
            // Position 1 starts immediately; the result message is the
            // pipeline's to send.
            if position > 1 {
                bot.send_message(
                    msg.chat.id,
                    format!("⏳ Added to your queue at position {position}."),
                )
                .await?;
            }
        }
    }
    Ok(())
}

/// Handle a photo message: store it as the thumbnail.
pub async fn handle_photo(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    thumbnail::save_thumbnail(&bot, &msg, &state).await
}

/// Handle plain text: it may answer a pending prompt.
pub async fn handle_text(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = msg.from.as_ref().map(|u| u.id.0) else {
        return Ok(());
    };
    let Some(text) = msg.text().map(|t| t.trim().to_string()) else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }

    match state.router.interactions().take(user_id) {
        Some(PendingInput::Caption) => {
            state.settings.set_caption(user_id, Some(text)).await?;
            bot.send_message(msg.chat.id, "✅ Caption saved.").await?;
        }
        Some(PendingInput::MetadataTitle) => {
            state.settings.set_metadata_title(user_id, Some(text)).await?;
            bot.send_message(msg.chat.id, "✅ Title saved.").await?;
        }
        Some(PendingInput::MetadataAuthor) => {
            state
                .settings
                .set_metadata_author(user_id, Some(text))
                .await?;
            bot.send_message(msg.chat.id, "✅ Author saved.").await?;
        }
        Some(PendingInput::FileInfo) => {
            // Text cannot satisfy a file prompt; keep it armed.
            state
                .router
                .interactions()
                .set(user_id, PendingInput::FileInfo);
        }
        None => {}
    }
    Ok(())
}
