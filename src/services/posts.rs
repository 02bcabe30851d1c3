// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Post lifecycle: create, edit, delete.
//!
//! Every created post is a logged hike: the author's totals and XP are
//! updated with it.

use serde::Serialize;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::rank::rank_for_xp;
use crate::models::{Coordinate, HikeStats, Post, Rank, UserProfile, XpProgress, DELETED_POST_ID};
use crate::time_utils::now_rfc3339;

/// Default number of posts on a profile page.
pub const DEFAULT_PROFILE_POSTS: u32 = 30;

/// Input for a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub trail_id: Option<String>,
    pub description: String,
    pub image_urls: Vec<String>,
    pub stats: HikeStats,
    pub path: Vec<Coordinate>,
}

/// A created post with the author's gamification state after logging it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedHike {
    pub post: Post,
    pub xp_gained: u64,
    pub rank: Rank,
    pub rank_changed: bool,
    pub progress: XpProgress,
}

#[derive(Clone)]
pub struct PostService {
    db: FirestoreDb,
}

impl PostService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Post, AppError> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {}", post_id)))
    }

    /// Create a post for `uid` and log it as a hike.
    ///
    /// Totals, XP and the trail's post count are bumped server-side, so
    /// concurrent logs by the same author all count.
    pub async fn create_post(&self, uid: &str, new: NewPost) -> Result<LoggedHike, AppError> {
        let mut author = self.load_author(uid).await?;

        if let Some(trail_id) = &new.trail_id {
            if self.db.get_trail(trail_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Trail {}", trail_id)));
            }
        }

        let post = Post {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: uid.to_string(),
            trail_id: new.trail_id,
            description: new.description,
            image_urls: new.image_urls,
            stats: new.stats,
            path: new.path,
            likes: Vec::new(),
            comments: Vec::new(),
            shares: 0,
            created_at: now_rfc3339(),
        };
        self.db.create_post(&post).await?;

        let xp_gained = author.record_hike(&post.stats);
        self.db
            .record_hike(uid, &post.stats, xp_gained, post.trail_id.as_deref())
            .await?;

        let mut author = self.load_author(uid).await?;
        if author.normalize_rank() {
            self.db.update_user_fields(&author, &["rank"]).await?;
        }
        let rank_before = rank_for_xp(author.xp.saturating_sub(xp_gained));

        tracing::info!(
            post_id = %post.id,
            uid,
            xp_gained,
            rank = %author.rank,
            "Hike logged"
        );

        Ok(LoggedHike {
            post,
            xp_gained,
            rank: author.rank,
            rank_changed: author.rank != rank_before,
            progress: author.progress(),
        })
    }

    /// Change a post's description and/or images. Owner only.
    pub async fn edit_post(
        &self,
        uid: &str,
        post_id: &str,
        description: Option<String>,
        image_urls: Option<Vec<String>>,
    ) -> Result<Post, AppError> {
        let mut post = self.owned_post(uid, post_id).await?;

        let mut fields = Vec::new();
        if let Some(description) = description {
            post.description = description;
            fields.push("description");
        }
        if let Some(image_urls) = image_urls {
            post.image_urls = image_urls;
            fields.push("imageUrls");
        }
        if fields.is_empty() {
            return Ok(post);
        }

        self.db.update_post_fields(&post, &fields).await?;
        self.get_post(post_id).await
    }

    /// Append an uploaded image URL. Owner only.
    pub async fn add_image_url(&self, uid: &str, post_id: &str, url: String) -> Result<Post, AppError> {
        self.owned_post(uid, post_id).await?;
        self.db.append_post_image(post_id, &url).await?;
        self.get_post(post_id).await
    }

    /// Delete a post. Owner only.
    ///
    /// Returns the deletion marker that replaces the post in views still
    /// holding a copy.
    pub async fn delete_post(&self, uid: &str, post_id: &str) -> Result<Post, AppError> {
        let post = self.owned_post(uid, post_id).await?;
        self.db
            .delete_post_and_uncount(&post.id, post.trail_id.as_deref())
            .await?;

        tracing::info!(post_id, uid, "Post deleted");
        Ok(Post {
            id: DELETED_POST_ID.to_string(),
            ..post
        })
    }

    /// A user's posts, newest first, without deletion markers.
    pub async fn posts_for_user(&self, uid: &str, limit: u32) -> Result<Vec<Post>, AppError> {
        let mut posts = self.db.get_posts_for_user(uid, limit).await?;
        posts.retain(|p| !p.is_deleted());
        Ok(posts)
    }

    async fn load_author(&self, uid: &str) -> Result<UserProfile, AppError> {
        self.db
            .get_user(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", uid)))
    }

    async fn owned_post(&self, uid: &str, post_id: &str) -> Result<Post, AppError> {
        let post = self.get_post(post_id).await?;
        if post.user_id != uid {
            return Err(AppError::Forbidden(
                "Only the author can change this post".to_string(),
            ));
        }
        Ok(post)
    }
}
