//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod admin;
pub mod caption;
pub mod fileinfo;
pub mod format;
pub mod metadata;
pub mod sequence;
pub mod start;
pub mod thumbnail;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Show help")]
    Help,

    // Rename format
    #[command(description = "Set the rename template")]
    Autorename(String),

    #[command(description = "Show the current rename template")]
    Viewformat,

    #[command(description = "Upload as document or video")]
    Setmedia(String),

    #[command(description = "Scan filename or caption for markers")]
    Mode(String),

    // Sequence mode
    #[command(description = "Start collecting an ordered batch")]
    Startsequence,

    #[command(description = "Sort and emit the collected batch")]
    Endsequence,

    #[command(description = "Discard the collected batch")]
    Cancelsequence,

    #[command(description = "Show your pending queue")]
    Queue,

    // Info lookup
    #[command(description = "Inspect the next file you send")]
    Fileinfo,

    // Caption
    #[command(description = "Set a fixed output caption")]
    Setcaption(String),

    #[command(description = "Show your caption")]
    Seecaption,

    #[command(description = "Delete your caption")]
    Delcaption,

    // Thumbnail
    #[command(description = "Show your saved thumbnail")]
    Viewthumb,

    #[command(description = "Delete your saved thumbnail")]
    Delthumb,

    // Metadata
    #[command(description = "Toggle metadata embedding (on/off)")]
    Metadata(String),

    #[command(description = "Set the metadata title")]
    Settitle(String),

    #[command(description = "Set the metadata author")]
    Setauthor(String),

    // Admin
    #[command(description = "Ban a user (owner only)")]
    Ban(String),

    #[command(description = "Unban a user (owner only)")]
    Unban(String),

    #[command(description = "Bot statistics (owner only)")]
    Stats,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(start::help_command))
        // Rename format
        .branch(case![Command::Autorename(args)].endpoint(format::autorename_command))
        .branch(case![Command::Viewformat].endpoint(format::viewformat_command))
        .branch(case![Command::Setmedia(args)].endpoint(format::setmedia_command))
        .branch(case![Command::Mode(args)].endpoint(format::mode_command))
        // Sequence mode
        .branch(case![Command::Startsequence].endpoint(sequence::startsequence_command))
        .branch(case![Command::Endsequence].endpoint(sequence::endsequence_command))
        .branch(case![Command::Cancelsequence].endpoint(sequence::cancelsequence_command))
        .branch(case![Command::Queue].endpoint(sequence::queue_command))
        // Info lookup
        .branch(case![Command::Fileinfo].endpoint(fileinfo::fileinfo_command))
        // Caption
        .branch(case![Command::Setcaption(args)].endpoint(caption::setcaption_command))
        .branch(case![Command::Seecaption].endpoint(caption::seecaption_command))
        .branch(case![Command::Delcaption].endpoint(caption::delcaption_command))
        // Thumbnail
        .branch(case![Command::Viewthumb].endpoint(thumbnail::viewthumb_command))
        .branch(case![Command::Delthumb].endpoint(thumbnail::delthumb_command))
        // Metadata
        .branch(case![Command::Metadata(args)].endpoint(metadata::metadata_command))
        .branch(case![Command::Settitle(args)].endpoint(metadata::settitle_command))
        .branch(case![Command::Setauthor(args)].endpoint(metadata::setauthor_command))
        // Admin
        .branch(case![Command::Ban(args)].endpoint(admin::ban_command))
        .branch(case![Command::Unban(args)].endpoint(admin::unban_command))
        .branch(case![Command::Stats].endpoint(admin::stats_command))
}
