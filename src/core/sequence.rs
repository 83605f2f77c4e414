//! Sequence batch tracker.
//!
//! An explicit mode a user enters to collect an ordered batch of files
//! (episodes of a series, usually), then emit them as one finalized,
//! sorted set. Collection defers all renaming: items are only run
//! through the pipeline during finish, sequentially, so results arrive
//! in the established order instead of scrambled by concurrency.
//!
//! Session lifecycle: inactive -> collecting -> finalizing -> inactive,
//! with cancel allowed from collecting and finalizing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{info, warn};

use super::error::ModeConflict;
use super::format;
use super::pipeline::RenamePipeline;
use super::source::{OwnerId, RenameableSource};

/// Sink for completed-sequence bookkeeping (count + timestamp).
#[async_trait]
pub trait SequenceStats: Send + Sync + 'static {
    async fn sequence_completed(&self, owner: OwnerId, delivered: usize) -> Result<()>;
}

/// One collected file with its sort key.
#[derive(Debug, Clone)]
struct CollectedItem {
    /// Episode number detected in the name/caption, if any.
    episode: Option<u32>,
    /// Position within the session, the tie-breaker and fallback key.
    arrival: usize,
    source: RenameableSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Collecting,
    Finalizing,
}

/// A user's active ordered-collection session.
struct SequenceSession {
    state: SessionState,
    items: Vec<CollectedItem>,
    cancelled: Arc<AtomicBool>,
    started_at: Instant,
}

impl SequenceSession {
    fn new() -> Self {
        Self {
            state: SessionState::Collecting,
            items: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            started_at: Instant::now(),
        }
    }
}

/// Outcome of a finalized sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinishReport {
    pub delivered: usize,
    pub failed: usize,
    pub discarded: usize,
}

/// Tracks sequence sessions for all owners.
pub struct SequenceTracker {
    sessions: DashMap<OwnerId, SequenceSession>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Open a session for the owner. Rejects if one already exists.
    ///
    /// The caller is responsible for also checking the default queue
    /// before starting (sequence mode is exclusive with in-flight work).
    pub fn start(&self, owner: OwnerId) -> Result<(), ModeConflict> {
        match self.sessions.entry(owner) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ModeConflict::SessionActive),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(SequenceSession::new());
                info!(owner, "sequence session started");
                Ok(())
            }
        }
    }

    /// Whether the owner has a session accepting new files.
    pub fn is_collecting(&self, owner: OwnerId) -> bool {
        self.sessions
            .get(&owner)
            .map(|s| s.state == SessionState::Collecting)
            .unwrap_or(false)
    }

    /// Number of items collected so far, if a session exists.
    pub fn collected(&self, owner: OwnerId) -> Option<usize> {
        self.sessions.get(&owner).map(|s| s.items.len())
    }

    /// Append a file to the owner's session.
    ///
    /// The sort key is the episode number detected in the filename (or
    /// caption, when there is no filename); items without one keep their
    /// arrival position.
    pub fn collect(&self, source: &RenameableSource) -> Result<usize, ModeConflict> {
        let Some(mut session) = self.sessions.get_mut(&source.owner) else {
            return Err(ModeConflict::NoSession);
        };
        if session.state != SessionState::Collecting {
            return Err(ModeConflict::Finalizing);
        }

        let episode = format::detect_episode(source.display_name());
        let arrival = session.items.len();
        session.items.push(CollectedItem {
            episode,
            arrival,
            source: source.clone(),
        });
        Ok(session.items.len())
    }

    /// Sort and emit the collected batch through the pipeline.
    ///
    /// Items are processed one at a time so delivery order matches the
    /// sorted order. A failing item is skipped with a notice; the rest of
    /// the batch continues. On completion the owner's sequence counters
    /// are recorded through `stats`.
    pub async fn finish<P, S>(
        &self,
        owner: OwnerId,
        pipeline: &P,
        stats: &S,
    ) -> Result<FinishReport, ModeConflict>
    where
        P: RenamePipeline,
        S: SequenceStats,
    {
        let (mut items, cancelled, started_at) = {
            let Some(mut session) = self.sessions.get_mut(&owner) else {
                return Err(ModeConflict::NoSession);
            };
            if session.state != SessionState::Collecting {
                return Err(ModeConflict::Finalizing);
            }
            session.state = SessionState::Finalizing;
            (
                std::mem::take(&mut session.items),
                Arc::clone(&session.cancelled),
                session.started_at,
            )
        };

        // Stable by construction: arrival breaks episode ties, and items
        // without an episode number sort after numbered ones in arrival
        // order (a batch with no numbers at all keeps arrival order).
        items.sort_by_key(|item| (item.episode.unwrap_or(u32::MAX), item.arrival));

        let mut report = FinishReport::default();
        for (index, item) in items.iter().enumerate() {
            if cancelled.load(Ordering::SeqCst) {
                report.discarded = items.len() - index;
                break;
            }
            match pipeline.process(&item.source).await {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(owner, name = item.source.display_name(), %error, "sequence item failed");
                    pipeline.notify_failure(&item.source, &error).await;
                    report.failed += 1;
                }
            }
        }

        self.sessions.remove(&owner);

        if !cancelled.load(Ordering::SeqCst) {
            if let Err(error) = stats.sequence_completed(owner, report.delivered).await {
                warn!(owner, %error, "failed to record sequence completion");
            }
        }

        info!(
            owner,
            delivered = report.delivered,
            failed = report.failed,
            discarded = report.discarded,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "sequence finished"
        );
        Ok(report)
    }

    /// Discard all buffered items and close the session.
    ///
    /// During finalize this stops before the next item; the one already
    /// mid-flight cannot be interrupted. Returns how many buffered items
    /// were dropped at cancel time.
    pub fn cancel(&self, owner: OwnerId) -> Result<usize, ModeConflict> {
        let Some((_, session)) = self.sessions.remove(&owner) else {
            return Err(ModeConflict::NoSession);
        };
        session.cancelled.store(true, Ordering::SeqCst);
        info!(owner, dropped = session.items.len(), "sequence cancelled");
        Ok(session.items.len())
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::queue::tests::{source, wait_until, RecordingPipeline};

    #[derive(Default)]
    struct RecordingStats {
        completed: Mutex<Vec<(OwnerId, usize)>>,
    }

    #[async_trait]
    impl SequenceStats for RecordingStats {
        async fn sequence_completed(&self, owner: OwnerId, delivered: usize) -> Result<()> {
            self.completed.lock().unwrap().push((owner, delivered));
            Ok(())
        }
    }

    #[tokio::test]
    async fn sorts_by_detected_episode() {
        let tracker = SequenceTracker::new();
        let pipeline = RecordingPipeline::new();
        let stats = RecordingStats::default();

        tracker.start(5).unwrap();
        tracker.collect(&source(5, "show.E03.mkv")).unwrap();
        tracker.collect(&source(5, "show.E01.mkv")).unwrap();
        tracker.collect(&source(5, "show.E02.mkv")).unwrap();

        let report = tracker.finish(5, &pipeline, &stats).await.unwrap();
        assert_eq!(report.delivered, 3);
        assert_eq!(
            pipeline.processed(),
            vec!["show.E01.mkv", "show.E02.mkv", "show.E03.mkv"]
        );
        assert_eq!(stats.completed.lock().unwrap().as_slice(), &[(5, 3)]);
        assert!(!tracker.is_collecting(5));
    }

    #[tokio::test]
    async fn arrival_order_when_no_episode_numbers() {
        let tracker = SequenceTracker::new();
        let pipeline = RecordingPipeline::new();
        let stats = RecordingStats::default();

        tracker.start(6).unwrap();
        tracker.collect(&source(6, "clip_one.mp4")).unwrap();
        tracker.collect(&source(6, "clip_two.mp4")).unwrap();
        tracker.collect(&source(6, "clip_three.mp4")).unwrap();

        tracker.finish(6, &pipeline, &stats).await.unwrap();
        assert_eq!(
            pipeline.processed(),
            vec!["clip_one.mp4", "clip_two.mp4", "clip_three.mp4"]
        );
    }

    #[tokio::test]
    async fn failed_item_is_skipped_not_fatal() {
        let tracker = SequenceTracker::new();
        let mut pipeline = RecordingPipeline::new();
        pipeline.failing_names.insert("show.E02.mkv".to_string());
        let stats = RecordingStats::default();

        tracker.start(7).unwrap();
        tracker.collect(&source(7, "show.E01.mkv")).unwrap();
        tracker.collect(&source(7, "show.E02.mkv")).unwrap();
        tracker.collect(&source(7, "show.E03.mkv")).unwrap();

        let report = tracker.finish(7, &pipeline, &stats).await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(pipeline.processed(), vec!["show.E01.mkv", "show.E03.mkv"]);
        assert_eq!(pipeline.failures(), vec!["show.E02.mkv"]);
    }

    #[tokio::test]
    async fn double_start_is_rejected_without_state_change() {
        let tracker = SequenceTracker::new();
        tracker.start(8).unwrap();
        tracker.collect(&source(8, "a.mkv")).unwrap();

        assert_eq!(tracker.start(8), Err(ModeConflict::SessionActive));
        assert_eq!(tracker.collected(8), Some(1));
    }

    #[tokio::test]
    async fn collect_without_session_is_rejected() {
        let tracker = SequenceTracker::new();
        assert_eq!(
            tracker.collect(&source(9, "a.mkv")),
            Err(ModeConflict::NoSession)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_during_finalize_discards_the_remainder() {
        let tracker = Arc::new(SequenceTracker::new());
        let mut pipeline = RecordingPipeline::new();
        pipeline.slow_owners.insert(11);
        let pipeline = Arc::new(pipeline);
        let stats = Arc::new(RecordingStats::default());

        tracker.start(11).unwrap();
        tracker.collect(&source(11, "show.E01.mkv")).unwrap();
        tracker.collect(&source(11, "show.E02.mkv")).unwrap();
        tracker.collect(&source(11, "show.E03.mkv")).unwrap();

        let finishing = {
            let (tracker, pipeline, stats) = (tracker.clone(), pipeline.clone(), stats.clone());
            tokio::spawn(async move { tracker.finish(11, pipeline.as_ref(), stats.as_ref()).await })
        };

        // Cancel as soon as the emit loop has taken over the session.
        wait_until(|| tracker.collected(11).is_some() && !tracker.is_collecting(11)).await;
        // Buffered items were already handed to the emit loop, so none
        // are counted as dropped here; the loop reports them instead.
        assert_eq!(tracker.cancel(11), Ok(0));

        let report = finishing.await.unwrap().unwrap();
        // The item mid-flight (if any) completes; everything behind it
        // is discarded unprocessed.
        assert_eq!(report.failed, 0);
        assert_eq!(report.delivered + report.discarded, 3);
        assert!(report.discarded >= 2);
        assert_eq!(pipeline.processed().len(), report.delivered);

        // A cancelled batch records no completion stats and leaves no
        // session behind.
        assert!(stats.completed.lock().unwrap().is_empty());
        assert_eq!(tracker.collected(11), None);
    }

    #[tokio::test]
    async fn cancel_discards_without_processing() {
        let tracker = SequenceTracker::new();
        tracker.start(10).unwrap();
        tracker.collect(&source(10, "a.mkv")).unwrap();
        tracker.collect(&source(10, "b.mkv")).unwrap();

        assert_eq!(tracker.cancel(10), Ok(2));
        assert!(!tracker.is_collecting(10));
        assert_eq!(tracker.cancel(10), Err(ModeConflict::NoSession));
    }
}
