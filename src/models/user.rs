// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::rank::{hike_xp, rank_for_xp, xp_progress, Rank, XpProgress};
use crate::models::HikeStats;

/// User profile stored in Firestore at `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Auth provider user ID (also used as document ID)
    pub uid: String,
    pub email: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    pub avatar_url: Option<String>,

    // ─── Stats ───────────────────────────────────────────────────
    /// Total distance hiked (meters)
    #[serde(default)]
    pub total_distance: f64,
    #[serde(default)]
    pub total_hikes: u32,
    /// Total time on trail (seconds)
    #[serde(default)]
    pub total_time: u64,

    // ─── Gamification ────────────────────────────────────────────
    #[serde(default)]
    pub xp: u64,
    /// Cached tier for `xp`; only written through [`UserProfile::set_xp`].
    #[serde(default)]
    pub rank: Rank,

    // ─── Social ──────────────────────────────────────────────────
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,

    // ─── Trail lists ─────────────────────────────────────────────
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub wishlist: Vec<String>,

    pub created_at: String,
}

/// The three per-user trail reference lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailList {
    Favorites,
    Completed,
    Wishlist,
}

impl TrailList {
    /// Stored field holding this list.
    pub fn field_name(self) -> &'static str {
        match self {
            TrailList::Favorites => "favorites",
            TrailList::Completed => "completed",
            TrailList::Wishlist => "wishlist",
        }
    }
}

impl UserProfile {
    /// Fresh profile created at signup.
    pub fn new(uid: &str, display_name: &str, email: Option<String>, now: &str) -> Self {
        Self {
            uid: uid.to_string(),
            email,
            display_name: display_name.to_string(),
            bio: String::new(),
            avatar_url: None,
            total_distance: 0.0,
            total_hikes: 0,
            total_time: 0,
            xp: 0,
            rank: Rank::Copper,
            following: Vec::new(),
            followers: Vec::new(),
            favorites: Vec::new(),
            completed: Vec::new(),
            wishlist: Vec::new(),
            created_at: now.to_string(),
        }
    }

    /// Set XP and re-derive the cached rank.
    pub fn set_xp(&mut self, xp: u64) {
        self.xp = xp;
        self.rank = rank_for_xp(xp);
    }

    /// Add XP, returning `true` when the rank changed.
    pub fn award_xp(&mut self, amount: u64) -> bool {
        let before = self.rank;
        self.set_xp(self.xp.saturating_add(amount));
        self.rank != before
    }

    /// Fold a completed hike into the running totals and award its XP.
    ///
    /// Returns the XP gained.
    pub fn record_hike(&mut self, stats: &HikeStats) -> u64 {
        self.total_hikes += 1;
        if let Some(distance) = stats.distance.filter(|d| *d > 0.0) {
            self.total_distance += distance;
        }
        if let Some(time) = stats.time {
            self.total_time += time;
        }

        let gained = hike_xp(stats.distance, stats.time, stats.elevation_gain);
        self.award_xp(gained);
        gained
    }

    pub fn progress(&self) -> XpProgress {
        xp_progress(self.xp, self.rank)
    }

    /// Repair a stored rank that no longer matches XP. Returns `true` if it drifted.
    pub fn normalize_rank(&mut self) -> bool {
        let derived = rank_for_xp(self.xp);
        let drifted = derived != self.rank;
        self.rank = derived;
        drifted
    }

    pub fn list(&self, list: TrailList) -> &[String] {
        match list {
            TrailList::Favorites => &self.favorites,
            TrailList::Completed => &self.completed,
            TrailList::Wishlist => &self.wishlist,
        }
    }

    /// Ids the home feed subscribes to: everyone followed plus the viewer.
    pub fn feed_authors(&self) -> Vec<String> {
        let mut ids = self.following.clone();
        if !ids.contains(&self.uid) {
            ids.push(self.uid.clone());
        }
        ids
    }
}

/// Insert into a set-like list. Returns `true` if the list changed.
pub fn set_insert(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

/// Remove from a set-like list. Returns `true` if the list changed.
pub fn set_remove(list: &mut Vec<String>, value: &str) -> bool {
    let before = list.len();
    list.retain(|v| v != value);
    list.len() != before
}
