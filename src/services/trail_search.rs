// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Trail search over the persisted store, with optional OpenStreetMap
//! augmentation.
//!
//! The store has no full-text index, so term and location filters run
//! client-side over an over-fetched window of recent trails.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Coordinate, Difficulty, Trail, TrailRating, TrailSource};
use crate::services::overpass::{resolve_region, OverpassClient};
use crate::time_utils::now_rfc3339;

/// Default page size for searches.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
/// Largest page size; bigger requests are clamped.
pub const MAX_SEARCH_LIMIT: u32 = 100;
/// Window multiplier for free-text term searches.
const TERM_OVERFETCH: u32 = 50;
/// Window multiplier for location-only searches.
const LOCATION_OVERFETCH: u32 = 20;
/// Coordinates closer than this on both axes are the same place (~100 m).
pub const DUPLICATE_TOLERANCE_DEGREES: f64 = 0.001;

/// Search filters; every field is optional.
#[derive(Debug, Clone, Default)]
pub struct TrailQuery {
    pub term: Option<String>,
    pub location: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: u32,
}

impl TrailQuery {
    fn term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    fn limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_SEARCH_LIMIT
        } else {
            self.limit.min(MAX_SEARCH_LIMIT)
        }
    }
}

/// How many trails to read and which filter to push into the store query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPlan {
    pub window: u32,
    pub difficulty_pushdown: Option<Difficulty>,
}

/// Pick the fetch window for a query.
///
/// A term is the least selective filter, so it takes the largest window.
/// Difficulty is only pushed down when it is the sole filter.
pub fn fetch_plan(query: &TrailQuery) -> FetchPlan {
    let limit = query.limit();
    let multiplier = if query.term().is_some() {
        TERM_OVERFETCH
    } else if query.location().is_some() {
        LOCATION_OVERFETCH
    } else {
        1
    };

    let only_difficulty = query.term().is_none() && query.location().is_none();

    FetchPlan {
        window: limit * multiplier,
        difficulty_pushdown: if only_difficulty {
            query.difficulty
        } else {
            None
        },
    }
}

/// Free-text location match.
///
/// Matches when the strings are equal, when either contains the other, or
/// when the non-empty parts before the first comma are equal (so "Oregon"
/// and "Oregon, USA" match). Comparison is case-insensitive; an empty trail
/// location never matches.
pub fn location_matches(trail_location: &str, wanted: &str) -> bool {
    let have = trail_location.trim().to_lowercase();
    let want = wanted.trim().to_lowercase();
    if have.is_empty() || want.is_empty() {
        return false;
    }

    if have == want || have.contains(&want) || want.contains(&have) {
        return true;
    }

    let prefix = |s: &str| s.split(',').next().unwrap_or_default().trim().to_string();
    let have_prefix = prefix(&have);
    !have_prefix.is_empty() && have_prefix == prefix(&want)
}

/// Case-insensitive substring match on name, description and location.
pub fn term_matches(trail: &Trail, term: &str) -> bool {
    let term = term.to_lowercase();
    [&trail.name, &trail.description, &trail.location]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Apply every client-side filter and cut to the limit.
pub fn apply_filters(trails: Vec<Trail>, query: &TrailQuery) -> Vec<Trail> {
    trails
        .into_iter()
        .filter(|t| query.term().is_none_or(|term| term_matches(t, term)))
        .filter(|t| {
            query
                .location()
                .is_none_or(|loc| location_matches(&t.location, loc))
        })
        .filter(|t| {
            query.difficulty.is_none_or(|d| {
                t.difficulty.as_str().eq_ignore_ascii_case(d.as_str())
            })
        })
        .take(query.limit() as usize)
        .collect()
}

/// Two trails are the same if the names match and the coordinates are
/// within [`DUPLICATE_TOLERANCE_DEGREES`] on both axes.
pub fn is_duplicate(a: &Trail, b: &Trail) -> bool {
    a.name.trim().eq_ignore_ascii_case(b.name.trim())
        && (a.coordinate.latitude - b.coordinate.latitude).abs() < DUPLICATE_TOLERANCE_DEGREES
        && (a.coordinate.longitude - b.coordinate.longitude).abs() < DUPLICATE_TOLERANCE_DEGREES
}

/// Drop candidates that duplicate an existing trail or an earlier candidate.
pub fn dedupe_candidates(candidates: Vec<Trail>, existing: &[Trail]) -> Vec<Trail> {
    let mut accepted: Vec<Trail> = Vec::new();
    for candidate in candidates {
        let seen = existing
            .iter()
            .chain(accepted.iter())
            .any(|t| t.id == candidate.id || is_duplicate(t, &candidate));
        if !seen {
            accepted.push(candidate);
        }
    }
    accepted
}

/// A user-submitted trail before it is stored.
#[derive(Debug, Clone)]
pub struct NewTrail {
    pub name: String,
    pub description: String,
    pub location: String,
    pub coordinate: Coordinate,
    pub path: Vec<Coordinate>,
    pub distance: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub difficulty: Difficulty,
}

/// Trail search and trail record operations.
#[derive(Clone)]
pub struct TrailSearchService {
    db: FirestoreDb,
    overpass: OverpassClient,
    augmentation_enabled: bool,
}

impl TrailSearchService {
    pub fn new(db: FirestoreDb, overpass: OverpassClient, augmentation_enabled: bool) -> Self {
        Self {
            db,
            overpass,
            augmentation_enabled,
        }
    }

    /// Search persisted trails.
    pub async fn search(&self, query: &TrailQuery) -> Result<Vec<Trail>, AppError> {
        let plan = fetch_plan(query);
        let window = self
            .db
            .get_recent_trails(plan.window, plan.difficulty_pushdown)
            .await?;

        let results = apply_filters(window, query);
        tracing::debug!(
            window = plan.window,
            results = results.len(),
            "Trail search complete"
        );
        Ok(results)
    }

    /// Search persisted trails, first importing matching OSM trails when a
    /// term or location is given.
    ///
    /// Import failures are logged and the persisted results returned.
    pub async fn search_all(&self, query: &TrailQuery) -> Result<Vec<Trail>, AppError> {
        if self.augmentation_enabled && (query.term().is_some() || query.location().is_some()) {
            match self.augment(query).await {
                Ok(imported) if imported > 0 => {
                    tracing::info!(imported, "Imported trails from OpenStreetMap");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Trail augmentation failed, using stored trails only");
                }
            }
        }

        self.search(query).await
    }

    /// Fetch, convert, dedupe and store OSM trails. Returns how many were new.
    async fn augment(&self, query: &TrailQuery) -> Result<usize, AppError> {
        let Some(region) = query
            .location()
            .or(query.term())
            .and_then(resolve_region)
        else {
            tracing::debug!("No region for trail augmentation");
            return Ok(0);
        };

        // A term that only names the region is not also a name filter
        let name_filter = query
            .term()
            .filter(|term| resolve_region(term).is_none());

        let elements = self
            .overpass
            .fetch_trails(region.bounds, name_filter)
            .await
            .map_err(|e| AppError::TrailApi(e.to_string()))?;

        let now = now_rfc3339();
        let label = region.label();
        let candidates: Vec<Trail> = elements
            .into_iter()
            .filter_map(|element| element.into_trail(&label, &now))
            .collect();
        if candidates.is_empty() {
            return Ok(0);
        }

        let existing = self
            .db
            .get_trails_in_latitude_band(region.bounds.south, region.bounds.north)
            .await?;
        let existing: Vec<Trail> = existing
            .into_iter()
            .filter(|t| region.bounds.contains(&t.coordinate))
            .collect();

        let fresh = dedupe_candidates(candidates, &existing);
        self.db.batch_upsert_trails(&fresh).await?;
        Ok(fresh.len())
    }

    pub async fn get_trail(&self, trail_id: &str) -> Result<Trail, AppError> {
        self.db
            .get_trail(trail_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trail {}", trail_id)))
    }

    /// Store a user-submitted trail.
    pub async fn create_trail(&self, uid: &str, new: NewTrail) -> Result<Trail, AppError> {
        let now = now_rfc3339();
        let trail = Trail {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            location: new.location.trim().to_string(),
            coordinate: new.coordinate,
            path: new.path,
            distance: new.distance,
            elevation_gain: new.elevation_gain,
            elevation_loss: new.elevation_loss,
            difficulty: new.difficulty,
            rating: 0.0,
            rating_count: 0,
            post_count: 0,
            source: TrailSource::User,
            created_by: Some(uid.to_string()),
            created_at: now,
        };

        self.db.upsert_trail(&trail).await?;
        tracing::info!(trail_id = %trail.id, uid, "Trail created");
        Ok(trail)
    }

    /// Record `uid`'s rating (1-5) and recompute the trail's average from
    /// every stored rating.
    pub async fn rate_trail(&self, uid: &str, trail_id: &str, rating: u8) -> Result<Trail, AppError> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::BadRequest(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let mut trail = self.get_trail(trail_id).await?;

        self.db
            .set_trail_rating(&TrailRating {
                trail_id: trail_id.to_string(),
                user_id: uid.to_string(),
                rating,
                created_at: now_rfc3339(),
            })
            .await?;

        let ratings = self.db.get_ratings_for_trail(trail_id).await?;
        let (average, count) = crate::models::trail::average_rating(&ratings);
        trail.rating = average;
        trail.rating_count = count;

        self.db.update_trail_rating(trail_id, average, count).await?;
        Ok(trail)
    }
}
