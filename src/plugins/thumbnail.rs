//! Thumbnail command handlers.
//!
//! Any photo sent in private chat becomes the stored thumbnail; these
//! commands inspect and delete it.

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};

fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

/// Handle /viewthumb - send back the stored thumbnail.
pub async fn viewthumb_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match state.settings.get_or_default(user_id).await?.thumbnail_file_id {
        Some(file_id) => {
            bot.send_photo(msg.chat.id, InputFile::file_id(file_id))
                .caption("Your saved thumbnail.")
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "No thumbnail saved. Send me a photo to set one.")
                .await?;
        }
    }
    Ok(())
}

/// Handle /delthumb.
pub async fn delthumb_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    state.settings.set_thumbnail(user_id, None).await?;
    bot.send_message(msg.chat.id, "🗑 Thumbnail deleted.").await?;
    Ok(())
}

/// Store an incoming photo as the user's thumbnail (called from events).
pub async fn save_thumbnail(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(msg) else {
        return Ok(());
    };
    // Largest size is last in the photo array.
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    state
        .settings
        .set_thumbnail(user_id, Some(photo.file.id.clone()))
        .await?;
    info!(user_id, "thumbnail updated");

    bot.send_message(msg.chat.id, "✅ Thumbnail saved. It will be attached to renamed files.")
        .await?;
    Ok(())
}
