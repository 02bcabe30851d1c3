// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Hike posts and comments.

use serde::{Deserialize, Serialize};

use crate::models::user::{set_insert, set_remove};
use crate::models::Coordinate;

/// Post id used to mark a post as deleted in views that still hold a copy.
pub const DELETED_POST_ID: &str = "__deleted__";

/// Stats recorded for a hike. Each field is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HikeStats {
    /// Distance in meters
    pub distance: Option<f64>,
    /// Time in seconds
    pub time: Option<u64>,
    /// Elevation gain in meters
    pub elevation_gain: Option<f64>,
}

/// A comment on a post. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub text: String,
    pub created_at: String,
}

/// Post stored in Firestore at `posts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub trail_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub stats: HikeStats,
    /// Route recorded by live tracking, thinned
    #[serde(default)]
    pub path: Vec<Coordinate>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub shares: u32,
    pub created_at: String,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.id == DELETED_POST_ID
    }
}

/// Set or clear `uid`'s like. Returns `true` if the like-set changed.
///
/// Liking twice or unliking a post that was never liked is a no-op.
pub fn toggle_like(likes: &mut Vec<String>, uid: &str, liked: bool) -> bool {
    if liked {
        set_insert(likes, uid)
    } else {
        set_remove(likes, uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_is_idempotent() {
        let mut likes = vec![];
        assert!(toggle_like(&mut likes, "u1", true));
        assert!(!toggle_like(&mut likes, "u1", true));
        assert_eq!(likes, vec!["u1".to_string()]);
    }

    #[test]
    fn test_unlike_of_unliked_is_noop() {
        let mut likes = vec!["u2".to_string()];
        assert!(!toggle_like(&mut likes, "u1", false));
        assert_eq!(likes, vec!["u2".to_string()]);

        assert!(toggle_like(&mut likes, "u2", false));
        assert!(likes.is_empty());
    }

    #[test]
    fn test_stats_fields_are_optional_in_storage() {
        let stats: HikeStats = serde_json::from_str(r#"{"distance": 1200.5}"#).unwrap();
        assert_eq!(stats.distance, Some(1200.5));
        assert_eq!(stats.time, None);
        assert_eq!(stats.elevation_gain, None);
    }
}
