//! Sequence-mode command handlers.
//!
//! Start/finish/cancel the ordered-batch mode and inspect the queue.

use teloxide::prelude::*;
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::core::ModeConflict;

fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

/// Handle /startsequence - open a collection session.
pub async fn startsequence_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match state.router.begin_sequence(user_id).await {
        Ok(()) => {
            bot.send_message(
                msg.chat.id,
                "🔢 Sequence started. Send your files, then /endsequence to \
                 get them back sorted by episode, or /cancelsequence to discard.",
            )
            .await?;
        }
        Err(conflict) => {
            bot.send_message(msg.chat.id, format!("⚠️ {conflict}")).await?;
        }
    }
    Ok(())
}

/// Handle /endsequence - sort and emit the batch.
pub async fn endsequence_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let collected = state.router.sequences().collected(user_id).unwrap_or(0);
    if collected > 0 {
        bot.send_message(
            msg.chat.id,
            format!("📤 Sending {collected} file(s) in order..."),
        )
        .await?;
    }

    match state
        .router
        .finish_sequence(user_id, state.settings.as_ref())
        .await
    {
        Ok(report) => {
            info!(user_id, delivered = report.delivered, "sequence emitted");
            let mut summary = format!("✅ Sequence done: {} delivered", report.delivered);
            if report.failed > 0 {
                summary.push_str(&format!(", {} failed", report.failed));
            }
            if report.discarded > 0 {
                summary.push_str(&format!(", {} discarded", report.discarded));
            }
            bot.send_message(msg.chat.id, summary).await?;
        }
        Err(conflict) => {
            bot.send_message(msg.chat.id, format!("⚠️ {conflict}")).await?;
        }
    }
    Ok(())
}

/// Handle /cancelsequence - discard the batch.
pub async fn cancelsequence_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    match state.router.sequences().cancel(user_id) {
        Ok(dropped) => {
            bot.send_message(
                msg.chat.id,
                format!("🗑 Sequence cancelled, {dropped} file(s) discarded."),
            )
            .await?;
        }
        Err(ModeConflict::NoSession) => {
            bot.send_message(msg.chat.id, "No active sequence to cancel.")
                .await?;
        }
        Err(conflict) => {
            bot.send_message(msg.chat.id, format!("⚠️ {conflict}")).await?;
        }
    }
    Ok(())
}

/// Handle /queue - show the owner's pending work.
pub async fn queue_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = if let Some(collected) = state.router.sequences().collected(user_id) {
        if state.router.sequences().is_collecting(user_id) {
            format!("🔢 Sequence active with {collected} file(s) collected.")
        } else {
            "📤 Your sequence is being finalized.".to_string()
        }
    } else if state.router.queue().is_busy(user_id) {
        format!(
            "⏳ Processing, {} file(s) waiting behind the current one.",
            state.router.queue().pending(user_id)
        )
    } else {
        "Your queue is empty.".to_string()
    };

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
