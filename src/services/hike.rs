// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Live hike tracking.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{ActiveTrail, TrackSample};
use crate::services::posts::{LoggedHike, NewPost, PostService};
use crate::time_utils::now_rfc3339;

#[derive(Clone)]
pub struct HikeService {
    db: FirestoreDb,
    posts: PostService,
}

impl HikeService {
    pub fn new(db: FirestoreDb, posts: PostService) -> Self {
        Self { db, posts }
    }

    /// The caller's hike in progress, if any.
    pub async fn current(&self, uid: &str) -> Result<Option<ActiveTrail>, AppError> {
        self.db.get_active_trail(uid).await
    }

    /// Begin tracking a hike, optionally on a known trail.
    ///
    /// Only one hike per user may be in progress.
    pub async fn start(&self, uid: &str, trail_id: Option<String>) -> Result<ActiveTrail, AppError> {
        if self.db.get_active_trail(uid).await?.is_some() {
            return Err(AppError::Conflict(
                "A hike is already in progress".to_string(),
            ));
        }

        if let Some(trail_id) = &trail_id {
            if self.db.get_trail(trail_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Trail {}", trail_id)));
            }
        }

        let active = ActiveTrail::start(uid, trail_id, &now_rfc3339());
        self.db.set_active_trail(&active).await?;
        tracing::info!(uid, trail_id = ?active.trail_id, "Hike started");
        Ok(active)
    }

    /// Append GPS samples to the hike in progress.
    pub async fn add_samples(
        &self,
        uid: &str,
        samples: Vec<TrackSample>,
    ) -> Result<ActiveTrail, AppError> {
        let mut active = self.require_active(uid).await?;

        let submitted = samples.len();
        let accepted = samples
            .into_iter()
            .filter(|sample| active.add_sample(*sample))
            .count();
        if accepted < submitted {
            tracing::debug!(uid, dropped = submitted - accepted, "Dropped out-of-order samples");
        }

        self.db.set_active_trail(&active).await?;
        Ok(active)
    }

    /// Abandon the hike without logging it.
    pub async fn cancel(&self, uid: &str) -> Result<(), AppError> {
        self.require_active(uid).await?;
        self.db.delete_active_trail(uid).await?;
        tracing::info!(uid, "Hike cancelled");
        Ok(())
    }

    /// Stop tracking and log the hike as a post with the tracked stats and
    /// route.
    pub async fn finish(
        &self,
        uid: &str,
        description: String,
        image_urls: Vec<String>,
    ) -> Result<LoggedHike, AppError> {
        let active = self.require_active(uid).await?;

        let logged = self
            .posts
            .create_post(
                uid,
                NewPost {
                    trail_id: active.trail_id.clone(),
                    description,
                    image_urls,
                    stats: active.stats(),
                    path: active.route(),
                },
            )
            .await?;

        self.db.delete_active_trail(uid).await?;
        Ok(logged)
    }

    async fn require_active(&self, uid: &str) -> Result<ActiveTrail, AppError> {
        self.db
            .get_active_trail(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("No hike in progress".to_string()))
    }
}
