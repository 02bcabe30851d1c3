// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Debounce for search-as-you-type requests.
//!
//! Every request for a key (one user typing into one field) takes the next
//! sequence number. A request waits out the debounce delay and only runs if
//! nothing newer arrived meanwhile; a result that completes after a newer
//! request started is discarded.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

/// Latest sequence number per key.
pub type SequenceMap = Arc<DashMap<String, u64>>;

#[derive(Clone)]
pub struct SearchGate {
    delay: Duration,
    /// Sequence numbers are unique across keys, so an evicted key can
    /// never hand out a number an in-flight request still holds.
    next_sequence: Arc<AtomicU64>,
    sequences: SequenceMap,
}

impl SearchGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_sequence: Arc::new(AtomicU64::new(0)),
            sequences: Arc::new(DashMap::new()),
        }
    }

    /// Register a new request for `key` and return its sequence number.
    pub fn begin(&self, key: &str) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.sequences.insert(key.to_string(), sequence);
        sequence
    }

    /// Whether `sequence` is still the newest request for `key`.
    pub fn is_current(&self, key: &str, sequence: u64) -> bool {
        self.sequences
            .get(key)
            .is_some_and(|latest| *latest == sequence)
    }

    /// Run `work` for `key` unless a newer request supersedes it.
    ///
    /// Returns `None` when superseded, either during the debounce delay or
    /// while `work` was running.
    pub async fn run<T, F>(&self, key: &str, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let sequence = self.begin(key);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !self.is_current(key, sequence) {
            tracing::debug!(key, sequence, "Search superseded before running");
            return None;
        }

        let result = work.await;

        if !self.is_current(key, sequence) {
            tracing::debug!(key, sequence, "Discarding stale search result");
            return None;
        }
        self.finish(key, sequence);
        Some(result)
    }

    /// Forget `key` once its newest request is done.
    fn finish(&self, key: &str, sequence: u64) {
        self.sequences.remove_if(key, |_, latest| *latest == sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_per_key() {
        let gate = SearchGate::new(Duration::ZERO);
        let a1 = gate.begin("u1:term");
        let b1 = gate.begin("u1:location");
        let a2 = gate.begin("u1:term");

        assert!(!gate.is_current("u1:term", a1));
        assert!(gate.is_current("u1:term", a2));
        assert!(gate.is_current("u1:location", b1));
        assert!(!gate.is_current("u2:term", 1));
    }

    #[tokio::test]
    async fn test_single_request_runs() {
        let gate = SearchGate::new(Duration::from_millis(5));
        assert_eq!(gate.run("k", async { 42 }).await, Some(42));
    }

    #[tokio::test]
    async fn test_finished_keys_are_evicted() {
        let gate = SearchGate::new(Duration::ZERO);
        for user in 0..100 {
            let key = format!("u{}:term", user);
            assert_eq!(gate.run(&key, async { user }).await, Some(user));
        }
        assert!(gate.sequences.is_empty());
    }

    #[tokio::test]
    async fn test_request_after_eviction_does_not_revive_stale_one() {
        let gate = SearchGate::new(Duration::ZERO);

        let slow = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run("k", async {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    "slow"
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Supersedes the slow request, finishes and evicts the key
        assert_eq!(gate.run("k", async { "fast" }).await, Some("fast"));
        assert!(gate.sequences.is_empty());

        // A new request on the same key while the slow one is still running
        let later = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run("k", async {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    "later"
                })
                .await
            })
        };

        assert_eq!(slow.await.unwrap(), None);
        assert_eq!(later.await.unwrap(), Some("later"));
    }

    #[tokio::test]
    async fn test_newer_request_supersedes_pending_one() {
        let gate = SearchGate::new(Duration::from_millis(100));

        let first = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.run("k", async { "first" }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = gate.run("k", async { "second" }).await;

        assert_eq!(first.await.unwrap(), None);
        assert_eq!(second, Some("second"));
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let gate = SearchGate::new(Duration::ZERO);

        let slow = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run("k", async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    "slow"
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = gate.run("k", async { "fast" }).await;

        assert_eq!(fast, Some("fast"));
        assert_eq!(slow.await.unwrap(), None);
    }
}
