//! Renameable source descriptor.
//!
//! Every producer of work for the rename pipeline (chat uploads today,
//! any future fetcher) builds the same narrow struct instead of faking a
//! message shape at the call site.

use std::sync::atomic::{AtomicU64, Ordering};

/// Telegram user id of the person whose files we are tracking.
pub type OwnerId = u64;

/// Monotonic arrival counter shared by all producers.
static ARRIVAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// What kind of media the source is (decides the upload method).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
    Video,
    Audio,
}

/// Opaque handle the chat layer can redeem for the actual bytes.
#[derive(Debug, Clone)]
pub struct SourceRef {
    /// Telegram file id (valid for download through the bot API).
    pub file_id: String,
    /// Stable id, used for naming the local scratch file.
    pub file_unique_id: String,
    /// Size in bytes as reported by Telegram.
    pub file_size: u64,
}

/// One file waiting for (or undergoing) a rename.
#[derive(Debug, Clone)]
pub struct RenameableSource {
    pub owner: OwnerId,
    pub source: SourceRef,
    /// Original filename, when the media carried one.
    pub file_name: Option<String>,
    /// Caption attached to the upload, if any.
    pub caption: Option<String>,
    pub kind: MediaKind,
    /// Monotonic order key; assigned at construction.
    pub received_at: u64,
}

impl RenameableSource {
    pub fn new(
        owner: OwnerId,
        source: SourceRef,
        file_name: Option<String>,
        caption: Option<String>,
        kind: MediaKind,
    ) -> Self {
        Self {
            owner,
            source,
            file_name,
            caption,
            kind,
            received_at: ARRIVAL_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Best human-readable name for notices and logs.
    pub fn display_name(&self) -> &str {
        self.file_name
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or("unnamed file")
    }

    /// Extension of the original filename, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name.as_deref()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || ext.contains(char::is_whitespace) {
            return None;
        }
        Some(ext)
    }
}
