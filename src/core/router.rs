//! Dispatch router for incoming files.
//!
//! Classifies each file event into exactly one active mode under a
//! per-owner lock, so two near-simultaneous uploads from the same user
//! cannot race a mode switch into conflicting classifications. The lock
//! guards classification only — actual processing happens after it is
//! released, so one owner's long-running work never serializes another's.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::ModeConflict;
use super::interaction::InteractionTracker;
use super::pipeline::RenamePipeline;
use super::queue::RenameQueue;
use super::sequence::SequenceTracker;
use super::source::{OwnerId, RenameableSource};

/// Usage gate checked before anything is enqueued.
#[async_trait]
pub trait AccessGate: Send + Sync + 'static {
    async fn is_allowed(&self, owner: OwnerId) -> bool;
}

/// Where an incoming file ended up.
#[derive(Debug)]
pub enum RouteOutcome {
    /// A pending info-lookup consumed the file; render its details.
    Info(RenameableSource),
    /// Appended to the owner's sequence session.
    Collected { count: usize },
    /// The owner's sequence is being finalized; nothing may join the
    /// batch or the queue until it closes.
    SequenceBusy,
    /// The owner is not allowed to use the bot.
    Rejected,
    /// Buffered in the default queue at the given 1-based position.
    Enqueued { position: usize },
}

/// Routes file events to the info handler, sequence tracker, or queue.
pub struct FileRouter<P: RenamePipeline, G: AccessGate> {
    locks: DashMap<OwnerId, Arc<Mutex<()>>>,
    queue: RenameQueue<P>,
    sequences: Arc<SequenceTracker>,
    interactions: InteractionTracker,
    gate: Arc<G>,
}

impl<P: RenamePipeline, G: AccessGate> FileRouter<P, G> {
    pub fn new(
        queue: RenameQueue<P>,
        sequences: Arc<SequenceTracker>,
        interactions: InteractionTracker,
        gate: Arc<G>,
    ) -> Self {
        Self {
            locks: DashMap::new(),
            queue,
            sequences,
            interactions,
            gate,
        }
    }

    fn owner_lock(&self, owner: OwnerId) -> Arc<Mutex<()>> {
        self.locks
            .entry(owner)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Classify and dispatch one incoming file event.
    ///
    /// First match wins: pending info-lookup, then an active sequence
    /// session, then the ban gate, then the default queue.
    pub async fn route(&self, source: RenameableSource) -> RouteOutcome {
        let owner = source.owner;
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        if self.interactions.take_file_info(owner) {
            debug!(owner, "routed to info lookup");
            return RouteOutcome::Info(source);
        }

        // Any live session owns the owner's files: collecting sessions
        // absorb them, finalizing ones turn them away. Letting a file
        // slip into the default queue here would run it concurrently
        // with the finalize loop and interleave into the sorted batch.
        match self.sequences.collect(&source) {
            Ok(count) => {
                debug!(owner, count, "routed to sequence session");
                return RouteOutcome::Collected { count };
            }
            Err(ModeConflict::NoSession) => {}
            Err(_) => {
                debug!(owner, "file arrived mid-finalize, turned away");
                return RouteOutcome::SequenceBusy;
            }
        }

        if !self.gate.is_allowed(owner).await {
            debug!(owner, "rejected by access gate");
            return RouteOutcome::Rejected;
        }

        let position = self.queue.enqueue(source);
        debug!(owner, position, "routed to default queue");
        RouteOutcome::Enqueued { position }
    }

    /// Open a sequence session, honoring mode exclusivity: rejected when
    /// a session already exists or default-queue work is in flight.
    pub async fn begin_sequence(&self, owner: OwnerId) -> Result<(), ModeConflict> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        if self.queue.is_busy(owner) {
            return Err(ModeConflict::QueueBusy);
        }
        self.sequences.start(owner)
    }

    /// Finalize the owner's sequence session through the queue's pipeline.
    pub async fn finish_sequence<S: crate::core::sequence::SequenceStats>(
        &self,
        owner: OwnerId,
        stats: &S,
    ) -> Result<crate::core::sequence::FinishReport, ModeConflict> {
        self.sequences
            .finish(owner, self.queue.pipeline(), stats)
            .await
    }

    pub fn queue(&self) -> &RenameQueue<P> {
        &self.queue
    }

    pub fn sequences(&self) -> &SequenceTracker {
        &self.sequences
    }

    pub fn interactions(&self) -> &InteractionTracker {
        &self.interactions
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::cache::CacheRegistry;
    use crate::core::queue::tests::{source, wait_until, RecordingPipeline};
    use crate::core::sequence::SequenceStats;

    struct FlagGate(AtomicBool);

    struct NullStats;

    #[async_trait]
    impl SequenceStats for NullStats {
        async fn sequence_completed(&self, _owner: OwnerId, _delivered: usize) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl AccessGate for FlagGate {
        async fn is_allowed(&self, _owner: OwnerId) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn router(allowed: bool) -> (FileRouter<RecordingPipeline, FlagGate>, Arc<RecordingPipeline>) {
        let pipeline = Arc::new(RecordingPipeline::new());
        let registry = CacheRegistry::new();
        let router = FileRouter::new(
            RenameQueue::new(pipeline.clone()),
            Arc::new(SequenceTracker::new()),
            InteractionTracker::new(&registry),
            Arc::new(FlagGate(AtomicBool::new(allowed))),
        );
        (router, pipeline)
    }

    #[tokio::test]
    async fn collecting_session_captures_files_before_the_queue() {
        let (router, pipeline) = router(true);
        router.begin_sequence(1).await.unwrap();

        let outcome = router.route(source(1, "show.E01.mkv")).await;
        assert!(matches!(outcome, RouteOutcome::Collected { count: 1 }));

        // Nothing must reach the default pipeline while collecting.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pipeline.processed().is_empty());
        assert!(!router.queue().is_busy(1));
    }

    #[tokio::test]
    async fn banned_owner_is_never_enqueued() {
        let (router, pipeline) = router(false);
        let outcome = router.route(source(2, "a.mkv")).await;
        assert!(matches!(outcome, RouteOutcome::Rejected));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pipeline.processed().is_empty());
    }

    #[tokio::test]
    async fn default_mode_enqueues() {
        let (router, pipeline) = router(true);
        let outcome = router.route(source(3, "a.mkv")).await;
        assert!(matches!(outcome, RouteOutcome::Enqueued { position: 1 }));

        for _ in 0..100 {
            if pipeline.processed().len() == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("queued entry never processed");
    }

    #[tokio::test]
    async fn info_lookup_consumes_exactly_one_file() {
        let (router, _pipeline) = router(true);
        router
            .interactions()
            .set(4, crate::core::interaction::PendingInput::FileInfo);

        let first = router.route(source(4, "a.mkv")).await;
        assert!(matches!(first, RouteOutcome::Info(_)));

        let second = router.route(source(4, "b.mkv")).await;
        assert!(matches!(second, RouteOutcome::Enqueued { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn upload_during_finalize_never_reaches_the_queue() {
        let mut pipeline = RecordingPipeline::new();
        pipeline.slow_owners.insert(6);
        let pipeline = Arc::new(pipeline);
        let router = Arc::new(FileRouter::new(
            RenameQueue::new(pipeline.clone()),
            Arc::new(SequenceTracker::new()),
            InteractionTracker::new(&CacheRegistry::new()),
            Arc::new(FlagGate(AtomicBool::new(true))),
        ));

        router.begin_sequence(6).await.unwrap();
        router.route(source(6, "show.E02.mkv")).await;
        router.route(source(6, "show.E01.mkv")).await;

        let finishing = {
            let router = router.clone();
            tokio::spawn(async move { router.finish_sequence(6, &NullStats).await })
        };

        // The session stays registered through finalize but stops
        // reporting as collecting once the emit loop starts.
        wait_until(|| {
            router.sequences().collected(6).is_some() && !router.sequences().is_collecting(6)
        })
        .await;

        let outcome = router.route(source(6, "intruder.mkv")).await;
        assert!(matches!(outcome, RouteOutcome::SequenceBusy));

        let report = finishing.await.unwrap().unwrap();
        assert_eq!(report.delivered, 2);
        // Only the sorted batch went through; the stray upload was never
        // handed to the pipeline or buffered in the owner's lane.
        assert_eq!(pipeline.processed(), vec!["show.E01.mkv", "show.E02.mkv"]);
        assert!(!router.queue().is_busy(6));
    }

    #[tokio::test]
    async fn begin_sequence_rejects_while_queue_is_busy() {
        let (router, _pipeline) = router(true);
        router.route(source(5, "slow.mkv")).await;

        // The entry is either buffered or in flight; both block the mode.
        assert_eq!(
            router.begin_sequence(5).await,
            Err(ModeConflict::QueueBusy)
        );
    }
}
