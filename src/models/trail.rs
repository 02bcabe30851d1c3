// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Trail model and ratings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// Trail difficulty.
///
/// Stored values from older clients vary in case, so deserialization
/// accepts any casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "moderate", alias = "MODERATE")]
    Moderate,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
    #[serde(alias = "expert", alias = "EXPERT")]
    Expert,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Moderate => "Moderate",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "moderate" => Ok(Difficulty::Moderate),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// Where a trail record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailSource {
    /// Submitted by a user
    #[default]
    User,
    /// Imported from OpenStreetMap during a search
    Osm,
}

/// Trail stored in Firestore at `trails/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-text location, e.g. "Mount Hood, Oregon"
    #[serde(default)]
    pub location: String,
    /// Representative point (trailhead)
    pub coordinate: Coordinate,
    /// Ordered polyline of the route, when known
    #[serde(default)]
    pub path: Vec<Coordinate>,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub elevation_gain: f64,
    #[serde(default)]
    pub elevation_loss: f64,
    pub difficulty: Difficulty,
    /// Running average of all ratings
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub post_count: u32,
    #[serde(default)]
    pub source: TrailSource,
    pub created_by: Option<String>,
    pub created_at: String,
}

/// One user's rating of a trail, stored at `trailRatings/{trailId}_{userId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailRating {
    pub trail_id: String,
    pub user_id: String,
    /// 1..=5
    pub rating: u8,
    pub created_at: String,
}

impl TrailRating {
    pub fn document_id(trail_id: &str, user_id: &str) -> String {
        format!(
            "{}_{}",
            urlencoding::encode(trail_id),
            urlencoding::encode(user_id)
        )
    }
}

/// Average of all individual ratings, with the count.
pub fn average_rating(ratings: &[TrailRating]) -> (f64, u32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: u32 = ratings.iter().map(|r| r.rating as u32).sum();
    (sum as f64 / ratings.len() as f64, ratings.len() as u32)
}
