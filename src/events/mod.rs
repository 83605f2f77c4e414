//! Event handlers for non-command messages.

pub mod incoming;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

/// Build the message event handler (media, photos, pending-input text).
pub fn message_event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            dptree::filter(incoming::is_renameable_media)
                .endpoint(incoming::handle_incoming_media),
        )
        .branch(dptree::filter(incoming::is_thumbnail_photo).endpoint(incoming::handle_photo))
        .branch(dptree::filter(incoming::is_plain_text).endpoint(incoming::handle_text))
}
