// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! In-progress hike tracking.

use geo::{Distance as _, Haversine};
use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, HikeStats};

/// One GPS sample reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters, when the device reports one
    pub elevation: Option<f64>,
    /// Unix time in milliseconds
    pub timestamp: i64,
}

impl TrackSample {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Kept path points are at least this far apart (meters).
const MIN_PATH_SPACING_METERS: f64 = 10.0;
/// Largest stored path; longer paths are thinned by half.
pub const MAX_PATH_POINTS: usize = 2_000;

/// Tracking state for a hike in progress, stored at `activeTrails/{uid}`.
///
/// There is at most one per user. Raw samples are not kept: the document
/// holds the running totals, the last sample and a thinned path, so its
/// size stays bounded however long the hike runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTrail {
    pub user_id: String,
    pub trail_id: Option<String>,
    #[serde(default)]
    pub path: Vec<Coordinate>,
    pub last_sample: Option<TrackSample>,
    pub first_timestamp: Option<i64>,
    /// Running distance (meters)
    #[serde(default)]
    pub distance: f64,
    /// Seconds between the first and last sample
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub elevation_gain: f64,
    pub started_at: String,
}

impl ActiveTrail {
    pub fn start(user_id: &str, trail_id: Option<String>, now: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            trail_id,
            path: Vec::new(),
            last_sample: None,
            first_timestamp: None,
            distance: 0.0,
            elapsed_seconds: 0,
            elevation_gain: 0.0,
            started_at: now.to_string(),
        }
    }

    /// Fold a sample into the running totals.
    ///
    /// Samples older than the last accepted one are ignored; returns whether
    /// the sample was accepted.
    pub fn add_sample(&mut self, sample: TrackSample) -> bool {
        if let Some(last) = self.last_sample {
            if sample.timestamp < last.timestamp {
                return false;
            }

            let step = Haversine.distance(
                last.coordinate().to_point(),
                sample.coordinate().to_point(),
            );
            self.distance += step;

            if let (Some(prev), Some(next)) = (last.elevation, sample.elevation) {
                if next > prev {
                    self.elevation_gain += next - prev;
                }
            }
        }

        let first = *self.first_timestamp.get_or_insert(sample.timestamp);
        let elapsed_ms = sample.timestamp.saturating_sub(first).max(0);
        self.elapsed_seconds = (elapsed_ms / 1000) as u64;

        self.last_sample = Some(sample);
        self.keep_path_point(sample.coordinate());
        true
    }

    fn keep_path_point(&mut self, point: Coordinate) {
        let far_enough = self.path.last().is_none_or(|kept| {
            Haversine.distance(kept.to_point(), point.to_point()) >= MIN_PATH_SPACING_METERS
        });
        if !far_enough {
            return;
        }

        self.path.push(point);
        if self.path.len() > MAX_PATH_POINTS {
            // Every other point, keeping the start
            let mut index = 0;
            self.path.retain(|_| {
                index += 1;
                index % 2 == 1
            });
        }
    }

    /// Stats for the post logged when the hike finishes.
    pub fn stats(&self) -> HikeStats {
        HikeStats {
            distance: Some(self.distance),
            time: Some(self.elapsed_seconds),
            elevation_gain: Some(self.elevation_gain),
        }
    }

    /// The thinned route, ending at the last accepted sample.
    pub fn route(&self) -> Vec<Coordinate> {
        let mut route = self.path.clone();
        if let Some(last) = self.last_sample {
            let end = last.coordinate();
            if route.last() != Some(&end) {
                route.push(end);
            }
        }
        route
    }
}
