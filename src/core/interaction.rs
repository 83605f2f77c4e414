//! Short-lived interaction states.
//!
//! Some commands arm the bot for the user's *next* message (send a file
//! to inspect, send new caption text, ...). That pending state lives
//! here, in a TTL-expiring cache, never as sentinel values inside the
//! durable settings record. Unanswered prompts simply age out.

use std::time::Duration;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::core::source::OwnerId;

/// What the owner's next message is expected to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    /// Next file is inspected and reported, not renamed.
    FileInfo,
    /// Next text message becomes the fixed caption.
    Caption,
    /// Next text message becomes the metadata title.
    MetadataTitle,
    /// Next text message becomes the metadata author.
    MetadataAuthor,
}

/// Per-owner pending-input registry with automatic expiry.
#[derive(Clone)]
pub struct InteractionTracker {
    pending: TypedCache<OwnerId, PendingInput>,
}

impl InteractionTracker {
    /// Prompts expire after five minutes without an answer.
    const EXPIRY: Duration = Duration::from_secs(300);

    pub fn new(cache: &CacheRegistry) -> Self {
        let pending = cache.get_or_create(
            "pending_interactions",
            CacheConfig::with_capacity(10_000).ttl(Self::EXPIRY),
        );
        Self { pending }
    }

    /// Arm a prompt, replacing any previous one for the owner.
    pub fn set(&self, owner: OwnerId, input: PendingInput) {
        self.pending.insert(owner, input);
    }

    /// Consume whatever prompt is pending for the owner.
    pub fn take(&self, owner: OwnerId) -> Option<PendingInput> {
        let pending = self.pending.get(&owner)?;
        self.pending.invalidate(&owner);
        Some(pending)
    }

    /// Consume a pending file-info prompt, leaving other prompts armed.
    pub fn take_file_info(&self, owner: OwnerId) -> bool {
        if self.pending.get(&owner) == Some(PendingInput::FileInfo) {
            self.pending.invalidate(&owner);
            return true;
        }
        false
    }

    pub fn clear(&self, owner: OwnerId) {
        self.pending.invalidate(&owner);
    }
}
