// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Likes, comments and shares.

use std::collections::HashSet;
use std::future::Future;

use futures_util::{stream, StreamExt};
use serde::Serialize;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::post::toggle_like;
use crate::models::{Comment, Optimistic, Post, SyncState};
use crate::services::messaging::MessagingService;
use crate::time_utils::now_rfc3339;

/// Longest accepted comment.
pub const MAX_COMMENT_CHARS: usize = 500;
/// Recipients messaged concurrently when sharing.
const SHARE_CONCURRENCY: usize = 8;

/// Result of a like or unlike.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub post: Post,
    pub changed: bool,
    pub state: SyncState,
}

/// Per-recipient result of a share.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
    pub shares: u32,
}

/// Post reads and like writes, as needed to reconcile a like.
pub trait LikeStore: Send + Sync {
    fn fetch_post(&self, post_id: &str)
        -> impl Future<Output = Result<Option<Post>, AppError>> + Send;

    fn write_like(
        &self,
        post_id: &str,
        uid: &str,
        liked: bool,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

impl LikeStore for FirestoreDb {
    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        self.get_post(post_id).await
    }

    async fn write_like(&self, post_id: &str, uid: &str, liked: bool) -> Result<(), AppError> {
        self.set_post_like(post_id, uid, liked).await
    }
}

/// Set (`liked = true`) or clear `uid`'s like on a post.
///
/// The like-set is a set: repeating a like or unliking an unliked post
/// writes nothing. After a write the post is read back and the stored copy
/// returned as `Confirmed`; a failed write yields the pre-toggle post as
/// `RolledBack`.
pub async fn reconcile_like<S: LikeStore>(
    store: &S,
    uid: &str,
    post_id: &str,
    liked: bool,
) -> Result<LikeOutcome, AppError> {
    let loaded = store
        .fetch_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {}", post_id)))?;
    let mut post = Optimistic::confirmed(loaded);

    let changed = post.apply(|p| toggle_like(&mut p.likes, uid, liked));
    if !changed {
        let current = post.value().clone();
        post.confirm(current);
        return Ok(LikeOutcome {
            state: post.state(),
            post: post.into_value(),
            changed: false,
        });
    }

    if let Err(e) = store.write_like(post_id, uid, liked).await {
        post.rollback();
        tracing::warn!(post_id, uid, liked, error = %e, "Like write failed, rolled back");
        return Ok(LikeOutcome {
            state: post.state(),
            post: post.into_value(),
            changed: false,
        });
    }

    match store.fetch_post(post_id).await {
        Ok(Some(stored)) => post.confirm(stored),
        Ok(None) => return Err(AppError::NotFound(format!("Post {}", post_id))),
        Err(e) => {
            // The write went through; keep the local copy as the answer
            tracing::warn!(post_id, error = %e, "Could not re-read post after like");
            let local = post.value().clone();
            post.confirm(local);
        }
    }

    Ok(LikeOutcome {
        state: post.state(),
        post: post.into_value(),
        changed: true,
    })
}

#[derive(Clone)]
pub struct EngagementService {
    db: FirestoreDb,
    messaging: MessagingService,
}

impl EngagementService {
    pub fn new(db: FirestoreDb, messaging: MessagingService) -> Self {
        Self { db, messaging }
    }

    async fn load_post(&self, post_id: &str) -> Result<Post, AppError> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {}", post_id)))
    }

    pub async fn set_like(&self, uid: &str, post_id: &str, liked: bool) -> Result<LikeOutcome, AppError> {
        reconcile_like(&self.db, uid, post_id, liked).await
    }

    /// Append a comment by `uid`.
    ///
    /// The comment is appended server-side, so comments posted at the same
    /// moment are all kept.
    pub async fn add_comment(&self, uid: &str, post_id: &str, text: &str) -> Result<Post, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "Comment longer than {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        let author = self
            .db
            .get_user(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", uid)))?;
        self.load_post(post_id).await?;

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: uid.to_string(),
            display_name: author.display_name,
            text: text.to_string(),
            created_at: now_rfc3339(),
        };
        self.db.append_comment(post_id, &comment).await?;

        self.load_post(post_id).await
    }

    /// Send the post to each recipient as a message, then count one share.
    ///
    /// Recipients are messaged concurrently and independently: a failed
    /// delivery does not undo the others. The counter is bumped once if at
    /// least one recipient received the post.
    pub async fn share_post(
        &self,
        uid: &str,
        post_id: &str,
        recipients: &[String],
    ) -> Result<ShareOutcome, AppError> {
        let post = self.load_post(post_id).await?;

        let mut seen = HashSet::new();
        let targets: Vec<String> = recipients
            .iter()
            .filter(|r| r.as_str() != uid && !r.is_empty() && seen.insert(r.as_str()))
            .cloned()
            .collect();
        if targets.is_empty() {
            return Err(AppError::BadRequest("No recipients to share with".to_string()));
        }

        let results: Vec<(String, Result<(), AppError>)> = stream::iter(targets)
            .map(|recipient| async move {
                let sent = self
                    .messaging
                    .send_message(uid, &recipient, "", Some(post_id.to_string()))
                    .await
                    .map(|_| ());
                (recipient, sent)
            })
            .buffer_unordered(SHARE_CONCURRENCY)
            .collect()
            .await;

        let mut outcome = ShareOutcome {
            shares: post.shares,
            ..Default::default()
        };
        for (recipient, result) in results {
            match result {
                Ok(()) => outcome.delivered.push(recipient),
                Err(e) => {
                    tracing::warn!(post_id, recipient = %recipient, error = %e, "Share delivery failed");
                    outcome.failed.push(recipient);
                }
            }
        }

        if !outcome.delivered.is_empty() {
            self.db.increment_post_shares(post_id).await?;
            outcome.shares = self.load_post(post_id).await?.shares;
        }

        tracing::info!(
            post_id,
            delivered = outcome.delivered.len(),
            failed = outcome.failed.len(),
            "Post shared"
        );
        Ok(outcome)
    }
}
