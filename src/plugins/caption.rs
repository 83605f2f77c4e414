//! Caption command handlers.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::core::PendingInput;
use crate::utils::html_escape;

fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

/// Handle /setcaption - set the fixed output caption.
///
/// With no arguments the bot waits for the caption as the next message.
pub async fn setcaption_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let caption = args.trim().to_string();
    if caption.is_empty() {
        state
            .router
            .interactions()
            .set(user_id, PendingInput::Caption);
        bot.send_message(
            msg.chat.id,
            "Send the caption text now ({filename} will be replaced with the new name).",
        )
        .await?;
        return Ok(());
    }

    state.settings.set_caption(user_id, Some(caption)).await?;
    bot.send_message(msg.chat.id, "✅ Caption saved.").await?;
    Ok(())
}

/// Handle /seecaption.
pub async fn seecaption_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match state.settings.get_or_default(user_id).await?.caption {
        Some(caption) => format!("Current caption:\n<code>{}</code>", html_escape(&caption)),
        None => "No caption set. Use /setcaption.".to_string(),
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /delcaption.
pub async fn delcaption_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    state.settings.set_caption(user_id, None).await?;
    bot.send_message(msg.chat.id, "🗑 Caption deleted.").await?;
    Ok(())
}
