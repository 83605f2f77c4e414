//! Per-user rename queue.
//!
//! Files a user uploads while an earlier file of theirs is still
//! processing are buffered and drained strictly in arrival order. At most
//! one job per owner is in flight at any instant; different owners drain
//! fully concurrently.
//!
//! `enqueue` never blocks the caller: the drain loop runs on a spawned
//! task and keeps going until the owner's buffer is empty. A failure in
//! one entry is reported to the owner and the loop moves on.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::pipeline::RenamePipeline;
use super::source::{OwnerId, RenameableSource};

/// Buffered work for one owner.
#[derive(Default)]
struct OwnerQueueState {
    buffer: VecDeque<RenameableSource>,
    /// Set from dequeue until the result is delivered or fails terminally.
    busy: bool,
}

/// FIFO queue of rename jobs, one lane per owner.
pub struct RenameQueue<P: RenamePipeline> {
    pipeline: Arc<P>,
    states: Arc<DashMap<OwnerId, OwnerQueueState>>,
}

impl<P: RenamePipeline> Clone for RenameQueue<P> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            states: Arc::clone(&self.states),
        }
    }
}

impl<P: RenamePipeline> RenameQueue<P> {
    pub fn new(pipeline: Arc<P>) -> Self {
        Self {
            pipeline,
            states: Arc::new(DashMap::new()),
        }
    }

    /// Append a job for its owner and kick off a drain if the lane is idle.
    ///
    /// Returns the 1-based queue position of the new entry (1 means it
    /// starts processing immediately).
    pub fn enqueue(&self, source: RenameableSource) -> usize {
        let owner = source.owner;

        let (position, start_drain) = {
            let mut state = self.states.entry(owner).or_default();
            state.buffer.push_back(source);
            let start = !state.busy;
            if start {
                state.busy = true;
            }
            (state.buffer.len(), start)
        };

        if start_drain {
            let queue = self.clone();
            tokio::spawn(async move {
                queue.drain(owner).await;
            });
        } else {
            debug!(owner, position, "owner busy, entry buffered");
        }

        position
    }

    /// The pipeline this queue drives.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Whether the owner has buffered or in-flight work.
    pub fn is_busy(&self, owner: OwnerId) -> bool {
        self.states
            .get(&owner)
            .map(|s| s.busy || !s.buffer.is_empty())
            .unwrap_or(false)
    }

    /// Number of buffered (not yet started) entries for an owner.
    pub fn pending(&self, owner: OwnerId) -> usize {
        self.states.get(&owner).map(|s| s.buffer.len()).unwrap_or(0)
    }

    /// Pop-process loop for one owner. Runs until the buffer empties.
    async fn drain(&self, owner: OwnerId) {
        loop {
            let next = {
                let Some(mut state) = self.states.get_mut(&owner) else {
                    break;
                };
                match state.buffer.pop_front() {
                    Some(entry) => entry,
                    None => {
                        state.busy = false;
                        break;
                    }
                }
            };

            debug!(owner, name = next.display_name(), "processing queue entry");
            if let Err(error) = self.pipeline.process(&next).await {
                warn!(owner, name = next.display_name(), %error, "queue entry failed");
                self.pipeline.notify_failure(&next, &error).await;
            }
        }

        // Drop the lane when it drained empty; it is recreated lazily.
        self.states
            .remove_if(&owner, |_, s| !s.busy && s.buffer.is_empty());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use super::*;
    use crate::core::source::{MediaKind, SourceRef};

    /// Pipeline fake that records processing order and can inject
    /// per-owner delays and per-name failures.
    pub(crate) struct RecordingPipeline {
        pub processed: Mutex<Vec<String>>,
        pub failures: Mutex<Vec<String>>,
        pub delay_per_item: Duration,
        pub slow_owners: HashSet<OwnerId>,
        pub failing_names: HashSet<String>,
    }

    impl RecordingPipeline {
        pub fn new() -> Self {
            Self {
                processed: Mutex::new(Vec::new()),
                failures: Mutex::new(Vec::new()),
                delay_per_item: Duration::from_millis(10),
                slow_owners: HashSet::new(),
                failing_names: HashSet::new(),
            }
        }

        pub fn processed(&self) -> Vec<String> {
            self.processed.lock().unwrap().clone()
        }

        pub fn failures(&self) -> Vec<String> {
            self.failures.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RenamePipeline for RecordingPipeline {
        async fn process(&self, source: &RenameableSource) -> Result<()> {
            let delay = if self.slow_owners.contains(&source.owner) {
                self.delay_per_item * 20
            } else {
                self.delay_per_item
            };
            tokio::time::sleep(delay).await;

            let name = source.display_name().to_string();
            if self.failing_names.contains(&name) {
                bail!("injected failure for {name}");
            }
            self.processed.lock().unwrap().push(name);
            Ok(())
        }

        async fn notify_failure(&self, source: &RenameableSource, _error: &anyhow::Error) {
            self.failures
                .lock()
                .unwrap()
                .push(source.display_name().to_string());
        }
    }

    pub(crate) fn source(owner: OwnerId, name: &str) -> RenameableSource {
        RenameableSource::new(
            owner,
            SourceRef {
                file_id: format!("file-{name}"),
                file_unique_id: format!("uniq-{name}"),
                file_size: 42,
            },
            Some(name.to_string()),
            None,
            MediaKind::Document,
        )
    }

    pub(crate) async fn wait_until<F: Fn() -> bool>(cond: F) {
        for _ in 0..3000 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn delivers_in_arrival_order_per_owner() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let queue = RenameQueue::new(pipeline.clone());

        queue.enqueue(source(1, "a.mkv"));
        queue.enqueue(source(1, "b.mkv"));
        queue.enqueue(source(1, "c.mkv"));

        wait_until(|| pipeline.processed().len() == 3).await;
        assert_eq!(pipeline.processed(), vec!["a.mkv", "b.mkv", "c.mkv"]);
        assert!(!queue.is_busy(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn owners_do_not_delay_each_other() {
        let mut pipeline = RecordingPipeline::new();
        pipeline.slow_owners.insert(1);
        let pipeline = Arc::new(pipeline);
        let queue = RenameQueue::new(pipeline.clone());

        queue.enqueue(source(1, "slow1.mkv"));
        queue.enqueue(source(1, "slow2.mkv"));
        queue.enqueue(source(2, "fast.mkv"));

        // The fast owner's file must land while the slow owner is still
        // working through their first entry.
        wait_until(|| pipeline.processed().contains(&"fast.mkv".to_string())).await;
        assert!(!pipeline.processed().contains(&"slow2.mkv".to_string()));

        wait_until(|| pipeline.processed().len() == 3).await;
    }

    #[tokio::test]
    async fn failure_does_not_halt_the_drain() {
        let mut pipeline = RecordingPipeline::new();
        pipeline.failing_names.insert("bad.mkv".to_string());
        let pipeline = Arc::new(pipeline);
        let queue = RenameQueue::new(pipeline.clone());

        queue.enqueue(source(7, "ok1.mkv"));
        queue.enqueue(source(7, "bad.mkv"));
        queue.enqueue(source(7, "ok2.mkv"));

        wait_until(|| pipeline.processed().len() == 2).await;
        assert_eq!(pipeline.processed(), vec!["ok1.mkv", "ok2.mkv"]);
        assert_eq!(pipeline.failures(), vec!["bad.mkv"]);
    }

    #[tokio::test]
    async fn empty_lane_is_removed() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let queue = RenameQueue::new(pipeline.clone());

        queue.enqueue(source(3, "only.mkv"));
        wait_until(|| pipeline.processed().len() == 1).await;
        wait_until(|| queue.states.get(&3).is_none()).await;
    }

    #[tokio::test]
    async fn reports_queue_position() {
        let mut pipeline = RecordingPipeline::new();
        pipeline.slow_owners.insert(9);
        let pipeline = Arc::new(pipeline);
        let queue = RenameQueue::new(pipeline.clone());

        assert_eq!(queue.enqueue(source(9, "first.mkv")), 1);
        let second = queue.enqueue(source(9, "second.mkv"));
        // The first entry may or may not have been popped yet, but the
        // second can never claim the front of the lane.
        assert!(second >= 1);
        assert!(queue.is_busy(9));
        wait_until(|| pipeline.processed().len() == 2).await;
    }
}
