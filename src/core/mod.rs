//! Rename core: queueing, sequencing, routing, and format resolution.
//!
//! This is the part of the bot that coordinates concurrent per-user
//! work and must not corrupt state when files arrive mid-rename or a
//! user switches modes mid-batch.
//!
//! - `format` - pure template resolver (season/episode/quality)
//! - `queue` - per-owner FIFO with one in-flight job per owner
//! - `sequence` - collect/sort/finalize batch sessions
//! - `router` - per-owner-locked mode classification
//! - `interaction` - short-lived pending-input states with expiry
//! - `pipeline` - the resolver -> processor -> chat delivery chain
//! - `source` - the one struct every work producer builds

pub mod error;
pub mod format;
pub mod interaction;
pub mod pipeline;
pub mod queue;
pub mod router;
pub mod sequence;
pub mod source;

pub use error::ModeConflict;
pub use interaction::{InteractionTracker, PendingInput};
pub use pipeline::{BotPipeline, RenamePipeline};
pub use queue::RenameQueue;
pub use router::{AccessGate, FileRouter, RouteOutcome};
pub use sequence::{SequenceStats, SequenceTracker};
pub use source::{MediaKind, OwnerId, RenameableSource, SourceRef};
