// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Home feed aggregation.
//!
//! The store's membership filter caps the id list at
//! [`MAX_IN_FILTER_VALUES`], so a feed over many authors is split into
//! chunks. Each chunk is watched independently and every chunk update is
//! merged into one [`FeedView`] keyed by post id, which re-derives the
//! sorted, truncated output.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::db::{FirestoreDb, MAX_IN_FILTER_VALUES};
use crate::error::AppError;
use crate::models::Post;

/// Default number of posts in a feed.
pub const DEFAULT_FEED_LIMIT: usize = 50;

/// Source of per-chunk post snapshots.
pub trait PostSource: Clone + Send + Sync + 'static {
    /// Most recent posts by any of `authors` (at most `MAX_IN_FILTER_VALUES`).
    fn posts_by_authors(
        &self,
        authors: Vec<String>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Post>, AppError>> + Send;
}

impl PostSource for FirestoreDb {
    async fn posts_by_authors(
        &self,
        authors: Vec<String>,
        limit: u32,
    ) -> Result<Vec<Post>, AppError> {
        self.get_posts_by_authors(&authors, limit).await
    }
}

/// Split an interest list into membership-filter sized chunks.
///
/// Duplicates are dropped and first-seen order is kept, so appending an id
/// only changes the last chunk.
pub fn chunk_ids(ids: &[String]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = ids
        .iter()
        .filter(|id| !id.is_empty() && seen.insert(id.as_str()))
        .cloned()
        .collect();

    unique
        .chunks(MAX_IN_FILTER_VALUES)
        .map(|chunk| chunk.to_vec())
        .collect()
}

// ─── Merge ───────────────────────────────────────────────────────────────────

struct FeedEntry {
    chunk: u64,
    post: Post,
}

/// Materialized feed merged from any number of chunk snapshots.
pub struct FeedView {
    limit: usize,
    entries: HashMap<String, FeedEntry>,
}

impl FeedView {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: HashMap::new(),
        }
    }

    /// Apply a full snapshot from one chunk and return the new feed.
    ///
    /// Posts the chunk no longer reports are dropped; every reported post
    /// overwrites any earlier copy with the same id.
    pub fn apply_snapshot(&mut self, chunk: u64, posts: Vec<Post>) -> Vec<Post> {
        let reported: HashSet<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        self.entries
            .retain(|id, entry| entry.chunk != chunk || reported.contains(id.as_str()));

        for post in posts {
            if post.is_deleted() {
                continue;
            }
            self.entries
                .insert(post.id.clone(), FeedEntry { chunk, post });
        }

        self.posts()
    }

    /// Forget everything a released chunk contributed.
    pub fn release_chunk(&mut self, chunk: u64) -> Vec<Post> {
        self.entries.retain(|_, entry| entry.chunk != chunk);
        self.posts()
    }

    /// Current feed: newest first, truncated to the limit.
    pub fn posts(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.entries.values().map(|e| e.post.clone()).collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        posts.truncate(self.limit);
        posts
    }
}

// ─── Subscription ────────────────────────────────────────────────────────────

enum ChunkMessage {
    Snapshot { chunk: u64, posts: Vec<Post> },
    Released { chunk: u64 },
}

struct ChunkTask {
    id: u64,
    handle: JoinHandle<()>,
}

/// Creates feed subscriptions against a post source.
#[derive(Clone)]
pub struct FeedService<S: PostSource> {
    source: S,
    poll_interval: Duration,
}

impl<S: PostSource> FeedService<S> {
    pub fn new(source: S, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
        }
    }

    /// Start a live feed over `ids`.
    ///
    /// An empty id list yields an empty feed without watching anything.
    pub fn subscribe(&self, ids: &[String], limit: usize) -> FeedSubscription<S> {
        let (output, receiver) = watch::channel(Vec::new());
        let (updates, inbox) = mpsc::unbounded_channel();

        let mut subscription = FeedSubscription {
            source: self.source.clone(),
            poll_interval: self.poll_interval,
            limit,
            chunks: HashMap::new(),
            next_chunk_id: 0,
            updates,
            inbox: Some(inbox),
            output: Some(output),
            merger: None,
            receiver,
        };
        subscription.retarget(ids);
        subscription
    }

    /// Query every chunk once and merge the results.
    pub async fn snapshot(&self, ids: &[String], limit: usize) -> Result<Vec<Post>, AppError> {
        let chunks = chunk_ids(ids);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(
            chunks
                .into_iter()
                .map(|chunk| self.source.posts_by_authors(chunk, limit as u32)),
        )
        .await;

        let mut view = FeedView::new(limit);
        for (index, result) in results.into_iter().enumerate() {
            view.apply_snapshot(index as u64, result?);
        }
        Ok(view.posts())
    }
}

/// A live feed made of one watcher per chunk.
///
/// All chunk watchers belong to this handle: dropping it stops every one
/// of them.
pub struct FeedSubscription<S: PostSource> {
    source: S,
    poll_interval: Duration,
    limit: usize,
    chunks: HashMap<Vec<String>, ChunkTask>,
    next_chunk_id: u64,
    updates: mpsc::UnboundedSender<ChunkMessage>,
    inbox: Option<mpsc::UnboundedReceiver<ChunkMessage>>,
    output: Option<watch::Sender<Vec<Post>>>,
    merger: Option<JoinHandle<()>>,
    receiver: watch::Receiver<Vec<Post>>,
}

impl<S: PostSource> FeedSubscription<S> {
    /// Receiver of the merged feed; a new value is published on every update.
    pub fn receiver(&self) -> watch::Receiver<Vec<Post>> {
        self.receiver.clone()
    }

    /// Number of chunk watchers currently running.
    pub fn active_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Change the interest list.
    ///
    /// Chunks whose membership is unchanged keep running; only obsolete
    /// chunks are released and only new ones started.
    pub fn retarget(&mut self, ids: &[String]) {
        let wanted = chunk_ids(ids);

        let obsolete: Vec<Vec<String>> = self
            .chunks
            .keys()
            .filter(|key| !wanted.contains(key))
            .cloned()
            .collect();

        for key in obsolete {
            if let Some(task) = self.chunks.remove(&key) {
                task.handle.abort();
                let _ = self
                    .updates
                    .send(ChunkMessage::Released { chunk: task.id });
                tracing::debug!(chunk = task.id, "Released feed chunk");
            }
        }

        for authors in wanted {
            if !self.chunks.contains_key(&authors) {
                self.start_chunk(authors);
            }
        }
    }

    fn start_chunk(&mut self, authors: Vec<String>) {
        self.ensure_merger();

        let id = self.next_chunk_id;
        self.next_chunk_id += 1;

        tracing::debug!(chunk = id, authors = authors.len(), "Starting feed chunk");

        let handle = tokio::spawn(watch_chunk(
            self.source.clone(),
            id,
            authors.clone(),
            self.limit as u32,
            self.poll_interval,
            self.updates.clone(),
        ));

        self.chunks.insert(authors, ChunkTask { id, handle });
    }

    fn ensure_merger(&mut self) {
        if self.merger.is_some() {
            return;
        }
        if let (Some(inbox), Some(output)) = (self.inbox.take(), self.output.take()) {
            self.merger = Some(tokio::spawn(merge_chunks(inbox, self.limit, output)));
        }
    }
}

impl<S: PostSource> Drop for FeedSubscription<S> {
    fn drop(&mut self) {
        for task in self.chunks.values() {
            task.handle.abort();
        }
        if let Some(merger) = &self.merger {
            merger.abort();
        }
        tracing::debug!(chunks = self.chunks.len(), "Feed subscription released");
    }
}

/// Refresh one chunk on an interval and forward each snapshot.
async fn watch_chunk<S: PostSource>(
    source: S,
    chunk: u64,
    authors: Vec<String>,
    limit: u32,
    interval: Duration,
    updates: mpsc::UnboundedSender<ChunkMessage>,
) {
    loop {
        match source.posts_by_authors(authors.clone(), limit).await {
            Ok(posts) => {
                if updates
                    .send(ChunkMessage::Snapshot { chunk, posts })
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(chunk, error = %e, "Feed chunk refresh failed");
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Fold chunk messages into a [`FeedView`] and publish the result.
async fn merge_chunks(
    mut inbox: mpsc::UnboundedReceiver<ChunkMessage>,
    limit: usize,
    output: watch::Sender<Vec<Post>>,
) {
    let mut view = FeedView::new(limit);
    // A watcher aborted mid-poll can still deliver one last snapshot
    let mut released = HashSet::new();

    while let Some(message) = inbox.recv().await {
        let posts = match message {
            ChunkMessage::Snapshot { chunk, .. } if released.contains(&chunk) => continue,
            ChunkMessage::Snapshot { chunk, posts } => view.apply_snapshot(chunk, posts),
            ChunkMessage::Released { chunk } => {
                released.insert(chunk);
                view.release_chunk(chunk)
            }
        };
        output.send_replace(posts);
    }
}
