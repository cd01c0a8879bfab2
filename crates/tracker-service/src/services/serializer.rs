//! Per-community event serializer
//!
//! Every mutation for a community runs through one FIFO queue so two joins
//! can never diff against the same stale snapshot. Different communities
//! never wait on each other.
//!
//! One `tokio::sync::Mutex` per community sits in a `DashMap`. The mutex is
//! fair, so waiters are served in the order they asked for the lock. Each
//! task runs on its own tokio task while holding the owned guard: a caller
//! that stops waiting does not cut a mutation short, and a panicking task
//! drops the guard and frees the queue.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use tracker_core::Snowflake;

/// Why a queued task produced no output
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    #[error("task for community {0} panicked")]
    TaskPanicked(Snowflake),

    #[error("task for community {0} was cancelled")]
    TaskCancelled(Snowflake),
}

/// FIFO task queues keyed by community
#[derive(Debug, Default)]
pub struct CommunitySerializer {
    queues: DashMap<Snowflake, Arc<Mutex<()>>>,
}

/// A held place at the head of a community queue
pub struct QueueSlot {
    community_id: Snowflake,
    guard: OwnedMutexGuard<()>,
}

impl QueueSlot {
    /// Run `task` on the tokio runtime while keeping the queue locked
    pub fn spawn<F, T>(self, task: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let Self { community_id, guard } = self;
        tokio::spawn(async move {
            let _guard = guard;
            debug!(community_id = %community_id, "Serialized task started");
            task.await
        })
    }
}

impl CommunitySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, community_id: Snowflake) -> Arc<Mutex<()>> {
        self.queues
            .entry(community_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Wait for the head of the community queue
    pub async fn reserve(&self, community_id: Snowflake) -> QueueSlot {
        let guard = self.queue(community_id).lock_owned().await;
        QueueSlot { community_id, guard }
    }

    /// Run `task` after every earlier task for the same community finished,
    /// and resolve with its output.
    pub async fn enqueue<F, T>(&self, community_id: Snowflake, task: F) -> Result<T, SerializerError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.reserve(community_id).await.spawn(task);
        let result = handle.await;
        self.collect_idle(community_id);

        result.map_err(|e| {
            if e.is_panic() {
                error!(community_id = %community_id, "Serialized task panicked");
                SerializerError::TaskPanicked(community_id)
            } else {
                SerializerError::TaskCancelled(community_id)
            }
        })
    }

    /// Drop the queue for a community if nobody holds or waits on it.
    ///
    /// Holders and waiters keep a clone of the `Arc`, and clones are only
    /// handed out under the map's shard lock, so a count of one is final.
    pub fn collect_idle(&self, community_id: Snowflake) {
        self.queues
            .remove_if(&community_id, |_, queue| Arc::strong_count(queue) == 1);
    }

    /// Communities that currently have a queue
    pub fn active_communities(&self) -> usize {
        self.queues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_enqueue_returns_output() {
        let serializer = CommunitySerializer::new();
        let out = serializer.enqueue(Snowflake::new(1), async { 41 + 1 }).await.unwrap();
        assert_eq!(out, 42);
        assert_eq!(serializer.active_communities(), 0);
    }

    #[tokio::test]
    async fn test_same_community_never_interleaves() {
        let serializer = Arc::new(CommunitySerializer::new());
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let community = Snowflake::new(7);

        let mut handles = Vec::new();
        for i in 0..8u64 {
            let serializer = serializer.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                serializer
                    .enqueue(community, async move {
                        log.lock().push(format!("start{i}"));
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        log.lock().push(format!("end{i}"));
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let log = log.lock();
        assert_eq!(log.len(), 16);
        for pair in log.chunks(2) {
            let start = pair[0].strip_prefix("start").unwrap();
            let end = pair[1].strip_prefix("end").unwrap();
            assert_eq!(start, end);
        }
    }

    #[tokio::test]
    async fn test_fifo_order_for_reservations() {
        let serializer = Arc::new(CommunitySerializer::new());
        let community = Snowflake::new(3);
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let first = serializer.reserve(community).await;
        let blocked = first.spawn(tokio::time::sleep(Duration::from_millis(20)));

        let mut handles = Vec::new();
        for i in 0..5 {
            let serializer = serializer.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                serializer
                    .enqueue(community, async move { order.lock().push(i) })
                    .await
                    .unwrap();
            }));
            // Let each caller join the wait queue before the next one
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        blocked.await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_communities_run_in_parallel() {
        let serializer = Arc::new(CommunitySerializer::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for community in 1..=4 {
            let serializer = serializer.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                serializer
                    .enqueue(Snowflake::new(community), async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_blocked_community_does_not_block_others() {
        let serializer = Arc::new(CommunitySerializer::new());
        let slow = serializer.reserve(Snowflake::new(1)).await;
        let slow = slow.spawn(tokio::time::sleep(Duration::from_millis(200)));

        let fast = tokio::time::timeout(
            Duration::from_millis(100),
            serializer.enqueue(Snowflake::new(2), async { "done" }),
        )
        .await
        .expect("other community waited on a busy queue")
        .unwrap();
        assert_eq!(fast, "done");

        slow.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_task_releases_queue() {
        let serializer = CommunitySerializer::new();
        let community = Snowflake::new(9);

        let err = serializer
            .enqueue::<_, ()>(community, async { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, SerializerError::TaskPanicked(id) if id == community));

        let ok = serializer.enqueue(community, async { 1 }).await.unwrap();
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_failing_task_releases_queue() {
        let serializer = CommunitySerializer::new();
        let community = Snowflake::new(9);

        let first: Result<(), &str> = serializer.enqueue(community, async { Err("fetch") }).await.unwrap();
        assert!(first.is_err());
        let second: Result<u8, &str> = serializer.enqueue(community, async { Ok(2) }).await.unwrap();
        assert_eq!(second, Ok(2));
    }

    #[tokio::test]
    async fn test_idle_queue_collected_only_when_unused() {
        let serializer = CommunitySerializer::new();
        let community = Snowflake::new(4);

        let slot = serializer.reserve(community).await;
        serializer.collect_idle(community);
        assert_eq!(serializer.active_communities(), 1);

        drop(slot);
        serializer.collect_idle(community);
        assert_eq!(serializer.active_communities(), 0);
    }
}
