// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Experience points and rank tiers.
//!
//! A user's rank is a cached value derived from their XP. Tiers are
//! contiguous and non-overlapping, so every XP value maps to exactly one rank.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Base XP awarded for every logged hike.
pub const HIKE_BASE_XP: u64 = 10;
/// One XP per this many meters hiked.
const METERS_PER_XP: f64 = 100.0;
/// One XP per this many seconds on trail.
const SECONDS_PER_XP: u64 = 600;
/// One XP per this many meters of elevation gain.
const ELEVATION_METERS_PER_XP: f64 = 10.0;

/// Rank tiers in ascending order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub enum Rank {
    #[default]
    Copper,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Rank {
    pub const ALL: [Rank; 6] = [
        Rank::Copper,
        Rank::Bronze,
        Rank::Silver,
        Rank::Gold,
        Rank::Platinum,
        Rank::Diamond,
    ];

    /// Lowest XP value in this tier.
    pub fn min_xp(self) -> u64 {
        match self {
            Rank::Copper => 0,
            Rank::Bronze => 1_000,
            Rank::Silver => 5_000,
            Rank::Gold => 15_000,
            Rank::Platinum => 50_000,
            Rank::Diamond => 150_000,
        }
    }

    /// Highest XP value in this tier (None for the open-ended top tier).
    pub fn max_xp(self) -> Option<u64> {
        self.next().map(|next| next.min_xp() - 1)
    }

    /// The tier above this one.
    pub fn next(self) -> Option<Rank> {
        match self {
            Rank::Copper => Some(Rank::Bronze),
            Rank::Bronze => Some(Rank::Silver),
            Rank::Silver => Some(Rank::Gold),
            Rank::Gold => Some(Rank::Platinum),
            Rank::Platinum => Some(Rank::Diamond),
            Rank::Diamond => None,
        }
    }

    pub fn contains(self, xp: u64) -> bool {
        xp >= self.min_xp() && self.max_xp().is_none_or(|max| xp <= max)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Rank::Copper => "Copper",
            Rank::Bronze => "Bronze",
            Rank::Silver => "Silver",
            Rank::Gold => "Gold",
            Rank::Platinum => "Platinum",
            Rank::Diamond => "Diamond",
        };
        f.write_str(name)
    }
}

/// Map an XP total to its rank tier.
pub fn rank_for_xp(xp: u64) -> Rank {
    Rank::ALL
        .into_iter()
        .rev()
        .find(|rank| xp >= rank.min_xp())
        .unwrap_or(Rank::Copper)
}

/// Progress of a user through their current tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct XpProgress {
    /// XP earned since entering the current tier
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub current: u64,
    /// Width of the current tier (0 for Diamond)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub span: u64,
    /// Progress bar fill, 0..=100
    pub percentage: f64,
    pub next_rank: Option<Rank>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub xp_needed_for_next_rank: Option<u64>,
}

/// Compute progress through `rank` for a user holding `xp`.
///
/// The rank is taken as given (it is normally the cached value on the
/// profile); XP below the tier floor counts as zero progress.
pub fn xp_progress(xp: u64, rank: Rank) -> XpProgress {
    let current = xp.saturating_sub(rank.min_xp());

    match rank.next() {
        Some(next) => {
            let span = next.min_xp() - rank.min_xp();
            let percentage = (current as f64 / span as f64 * 100.0).clamp(0.0, 100.0);
            XpProgress {
                current,
                span,
                percentage,
                next_rank: Some(next),
                xp_needed_for_next_rank: Some(next.min_xp().saturating_sub(xp)),
            }
        }
        None => XpProgress {
            current,
            span: 0,
            percentage: 100.0,
            next_rank: None,
            xp_needed_for_next_rank: None,
        },
    }
}

/// XP awarded for completing a hike.
///
/// Each stat contributes only when it is present and positive.
pub fn hike_xp(
    distance_meters: Option<f64>,
    time_seconds: Option<u64>,
    elevation_gain_meters: Option<f64>,
) -> u64 {
    let mut xp = HIKE_BASE_XP;

    if let Some(distance) = distance_meters.filter(|d| *d > 0.0) {
        xp += (distance / METERS_PER_XP).floor() as u64;
    }
    if let Some(time) = time_seconds.filter(|t| *t > 0) {
        xp += time / SECONDS_PER_XP;
    }
    if let Some(gain) = elevation_gain_meters.filter(|e| *e > 0.0) {
        xp += (gain / ELEVATION_METERS_PER_XP).floor() as u64;
    }

    xp
}
