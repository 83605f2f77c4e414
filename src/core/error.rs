//! Typed errors for the rename core.

use thiserror::Error;

/// Rejected mode transitions.
///
/// Surfaced synchronously to the command handler; no state is mutated
/// when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeConflict {
    /// A sequence session already exists for this owner.
    #[error("a sequence is already collecting; finish or cancel it first")]
    SessionActive,

    /// The default queue still has pending or in-flight work for this owner.
    #[error("a rename is still in progress; wait for the queue to empty")]
    QueueBusy,

    /// The operation needs an active session but there is none.
    #[error("no active sequence; start one with /startsequence")]
    NoSession,

    /// The session is already being finalized.
    #[error("the sequence is already being finalized")]
    Finalizing,
}
