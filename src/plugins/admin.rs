//! Owner-only admin commands.

use teloxide::prelude::*;
use tracing::{info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};

fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

fn parse_target(args: &str) -> Option<u64> {
    args.trim().parse().ok()
}

/// Handle /ban <user_id>.
pub async fn ban_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };
    if !state.is_owner(user_id) {
        warn!(user_id, "non-owner attempted /ban");
        return Ok(());
    }

    let Some(target) = parse_target(&args) else {
        bot.send_message(msg.chat.id, "Usage: /ban <user_id>").await?;
        return Ok(());
    };

    state.settings.set_banned(target, true).await?;
    info!(target, by = user_id, "user banned");
    bot.send_message(msg.chat.id, format!("🚫 User {target} banned."))
        .await?;
    Ok(())
}

/// Handle /unban <user_id>.
pub async fn unban_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };
    if !state.is_owner(user_id) {
        return Ok(());
    }

    let Some(target) = parse_target(&args) else {
        bot.send_message(msg.chat.id, "Usage: /unban <user_id>").await?;
        return Ok(());
    };

    state.settings.set_banned(target, false).await?;
    info!(target, by = user_id, "user unbanned");
    bot.send_message(msg.chat.id, format!("✅ User {target} unbanned."))
        .await?;
    Ok(())
}

/// Handle /stats.
pub async fn stats_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };
    if !state.is_owner(user_id) {
        return Ok(());
    }

    let users = state.settings.count_users().await?;
    bot.send_message(msg.chat.id, format!("👥 Known users: {users}"))
        .await?;
    Ok(())
}
