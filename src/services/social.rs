// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Social graph edges and per-user trail lists.

use futures_util::future::join_all;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Trail, TrailList, UserProfile};

#[derive(Clone)]
pub struct SocialService {
    db: FirestoreDb,
}

impl SocialService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, uid: &str) -> Result<UserProfile, AppError> {
        self.db
            .get_user(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", uid)))
    }

    /// Follow (`follow = true`) or unfollow `target_uid`.
    ///
    /// Both edges are written together. Returns the caller's updated profile.
    pub async fn set_following(
        &self,
        uid: &str,
        target_uid: &str,
        follow: bool,
    ) -> Result<UserProfile, AppError> {
        if uid == target_uid {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        self.db.set_following_atomic(uid, target_uid, follow).await?;
        self.get_profile(uid).await
    }

    /// Add or remove a trail from one of the caller's lists.
    ///
    /// Lists are sets: adding a present trail or removing an absent one
    /// leaves the list as it was.
    pub async fn update_list(
        &self,
        uid: &str,
        list: TrailList,
        trail_id: &str,
        add: bool,
    ) -> Result<UserProfile, AppError> {
        self.get_profile(uid).await?;
        self.db.set_list_membership(uid, list, trail_id, add).await?;
        tracing::debug!(uid, ?list, trail_id, add, "Trail list updated");
        self.get_profile(uid).await
    }

    /// Resolve a list to trail records.
    ///
    /// Each trail is fetched on its own; missing trails and failed fetches
    /// are skipped so one bad entry never empties the list.
    pub async fn load_list_trails(
        &self,
        uid: &str,
        list: TrailList,
    ) -> Result<Vec<Trail>, AppError> {
        let profile = self.get_profile(uid).await?;
        let ids = profile.list(list);

        let results = join_all(ids.iter().map(|id| self.db.get_trail(id))).await;

        let trails = results
            .into_iter()
            .zip(ids)
            .filter_map(|(result, id)| match result {
                Ok(trail) => trail,
                Err(e) => {
                    tracing::warn!(trail_id = %id, error = %e, "Skipping trail in list reload");
                    None
                }
            })
            .collect();
        Ok(trails)
    }
}
