//! Start and help command handlers.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

const HELP_TEXT: &str = "\
<b>Rename format</b>
/autorename &lt;template&gt; - set the template. Tokens: <code>[SE.NUM]</code> season, <code>[EP.NUM]</code> episode, <code>[QUALITY]</code> quality
/viewformat - show the current template
/setmedia &lt;document|video&gt; - choose the upload method
/mode &lt;filename|caption&gt; - which text to scan for markers

<b>Sequence mode</b>
/startsequence - collect a batch, then
/endsequence - sort by episode and send in order
/cancelsequence - discard the batch
/queue - pending files in your lane

<b>Extras</b>
/fileinfo - inspect the next file you send
/setcaption, /seecaption, /delcaption - fixed output caption
Send a photo to store it as thumbnail; /viewthumb, /delthumb
/metadata on|off, /settitle, /setauthor - embedded metadata

Send any document, video, or audio and it is renamed with your template.";

/// Handle /start.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    _state: AppState,
) -> anyhow::Result<()> {
    let name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| "there".to_string());

    info!("User {:?} started the bot", msg.from.as_ref().map(|u| u.id));

    bot.send_message(
        msg.chat.id,
        format!(
            "Hi <b>{}</b>! I rename your media files with a template you choose.\n\n\
             Set one with /autorename, then just send me files.\n\
             Use /help for everything I can do.",
            html_escape(&name)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// Handle /help.
pub async fn help_command(
    bot: ThrottledBot,
    msg: Message,
    _state: AppState,
) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, HELP_TEXT)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
