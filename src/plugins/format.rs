//! Rename-format command handlers.
//!
//! Template, upload method, and scan-mode preferences.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::core::format::{EPISODE_TOKEN, QUALITY_TOKEN, SEASON_TOKEN};
use crate::database::models::{MediaPreference, RenameMode};
use crate::utils::html_escape;

fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

/// Handle /autorename - set the rename template.
pub async fn autorename_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let template = args.trim().to_string();
    if template.is_empty() {
        bot.send_message(
            msg.chat.id,
            format!(
                "Usage: /autorename &lt;template&gt;\n\n\
                 Example: <code>My Show S{SEASON_TOKEN}E{EPISODE_TOKEN} {QUALITY_TOKEN}</code>\n\
                 Unrecognized tokens are kept as-is."
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    state
        .settings
        .set_format_template(user_id, template.clone())
        .await?;
    info!(user_id, "format template updated");

    bot.send_message(
        msg.chat.id,
        format!(
            "✅ Template saved:\n<code>{}</code>",
            html_escape(&template)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// Handle /viewformat - show the current template.
pub async fn viewformat_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match state.settings.get_format_template(user_id).await? {
        Some(template) => format!("Current template:\n<code>{}</code>", html_escape(&template)),
        None => "No template set. Use /autorename &lt;template&gt; first.".to_string(),
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /setmedia - choose document vs video upload.
pub async fn setmedia_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match MediaPreference::parse(&args) {
        Some(pref) => {
            state.settings.set_media_preference(user_id, pref).await?;
            bot.send_message(
                msg.chat.id,
                format!("✅ Files will be sent as {}.", pref.label()),
            )
            .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Usage: /setmedia <document|video>")
                .await?;
        }
    }
    Ok(())
}

/// Handle /mode - pick the text the resolver scans.
pub async fn mode_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match RenameMode::parse(&args) {
        Some(mode) => {
            state.settings.set_rename_mode(user_id, mode).await?;
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ Season/episode markers are now read from the {}.",
                    mode.label()
                ),
            )
            .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Usage: /mode <filename|caption>")
                .await?;
        }
    }
    Ok(())
}
