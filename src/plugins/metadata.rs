//! Metadata command handlers.
//!
//! Toggle metadata embedding and set the title/author written into
//! output containers.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::core::PendingInput;

fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

/// Handle /metadata <on|off>.
pub async fn metadata_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match args.trim().to_lowercase().as_str() {
        "on" | "enable" => {
            state.settings.set_metadata_enabled(user_id, true).await?;
            bot.send_message(msg.chat.id, "✅ Metadata embedding enabled.")
                .await?;
        }
        "off" | "disable" => {
            state.settings.set_metadata_enabled(user_id, false).await?;
            bot.send_message(msg.chat.id, "Metadata embedding disabled.")
                .await?;
        }
        _ => {
            let settings = state.settings.get_or_default(user_id).await?;
            bot.send_message(
                msg.chat.id,
                format!(
                    "Metadata is {}.\nTitle: {}\nAuthor: {}\n\nUsage: /metadata <on|off>",
                    if settings.metadata_enabled { "on" } else { "off" },
                    settings.metadata_title.as_deref().unwrap_or("-"),
                    settings.metadata_author.as_deref().unwrap_or("-"),
                ),
            )
            .await?;
        }
    }
    Ok(())
}

/// Handle /settitle - with no args, waits for the next text message.
pub async fn settitle_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let title = args.trim().to_string();
    if title.is_empty() {
        state
            .router
            .interactions()
            .set(user_id, PendingInput::MetadataTitle);
        bot.send_message(msg.chat.id, "Send the title text now.")
            .await?;
        return Ok(());
    }

    state.settings.set_metadata_title(user_id, Some(title)).await?;
    bot.send_message(msg.chat.id, "✅ Title saved.").await?;
    Ok(())
}

/// Handle /setauthor - with no args, waits for the next text message.
pub async fn setauthor_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let author = args.trim().to_string();
    if author.is_empty() {
        state
            .router
            .interactions()
            .set(user_id, PendingInput::MetadataAuthor);
        bot.send_message(msg.chat.id, "Send the author text now.")
            .await?;
        return Ok(());
    }

    state
        .settings
        .set_metadata_author(user_id, Some(author))
        .await?;
    bot.send_message(msg.chat.id, "✅ Author saved.").await?;
    Ok(())
}
