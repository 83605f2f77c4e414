//! File-info command and rendering.
//!
//! /fileinfo arms the info-lookup mode; the router hands the next file
//! back here to be inspected instead of renamed.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::core::format;
use crate::core::{PendingInput, RenameableSource};
use crate::utils::{format_file_size, html_escape};

/// Handle /fileinfo - inspect the next file instead of renaming it.
pub async fn fileinfo_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = msg.from.as_ref().map(|u| u.id.0) else {
        return Ok(());
    };

    state
        .router
        .interactions()
        .set(user_id, PendingInput::FileInfo);
    bot.send_message(
        msg.chat.id,
        "Send a file and I will report what I can read from it.",
    )
    .await?;
    Ok(())
}

/// Render details for a file consumed by info-lookup mode.
pub async fn send_file_details(
    bot: &ThrottledBot,
    chat_id: ChatId,
    source: &RenameableSource,
) -> anyhow::Result<()> {
    let detected = format::detect(source.display_name());

    let mut lines = vec![
        format!("📄 <b>{}</b>", html_escape(source.display_name())),
        format!("Kind: {:?}", source.kind),
        format!("Size: {}", format_file_size(source.source.file_size)),
    ];
    if let Some(season) = detected.season {
        lines.push(format!("Season: {season:02}"));
    }
    if let Some(episode) = detected.episode {
        lines.push(format!("Episode: {episode:02}"));
    }
    if let Some(quality) = &detected.quality {
        lines.push(format!("Quality: {}", html_escape(quality)));
    }
    if detected.season.is_none() && detected.episode.is_none() && detected.quality.is_none() {
        lines.push("No season/episode/quality markers detected.".to_string());
    }

    bot.send_message(chat_id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
