// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Trail search and trail record routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Coordinate, Difficulty, Trail};
use crate::services::trail_search::{NewTrail, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use crate::services::TrailQuery;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trails", post(create_trail))
        .route("/api/trails/search", get(search_trails))
        .route("/api/trails/{trail_id}", get(get_trail))
        .route("/api/trails/{trail_id}/rating", put(rate_trail))
}

#[derive(Deserialize)]
struct SearchParams {
    term: Option<String>,
    location: Option<String>,
    difficulty: Option<String>,
    limit: Option<u32>,
    /// Search-as-you-type field the request came from; each field is
    /// debounced on its own.
    field: Option<String>,
    /// Also import matching OpenStreetMap trails (default on)
    augment: Option<bool>,
}

/// Search results. `superseded` is set when a newer search from the same
/// field replaced this one; `trails` is then empty.
#[derive(Serialize)]
pub struct SearchResponse {
    pub trails: Vec<Trail>,
    pub superseded: bool,
}

async fn search_trails(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let difficulty = params
        .difficulty
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(str::parse::<Difficulty>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let query = TrailQuery {
        term: params.term,
        location: params.location,
        difficulty,
        limit: params
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT),
    };
    let augment = params.augment.unwrap_or(true);

    let key = format!(
        "{}:{}",
        user.uid,
        params.field.as_deref().unwrap_or("search")
    );
    let outcome = state
        .search_gate
        .run(&key, async {
            if augment {
                state.trail_search.search_all(&query).await
            } else {
                state.trail_search.search(&query).await
            }
        })
        .await;

    match outcome {
        Some(trails) => Ok(Json(SearchResponse {
            trails: trails?,
            superseded: false,
        })),
        None => Ok(Json(SearchResponse {
            trails: Vec::new(),
            superseded: true,
        })),
    }
}

async fn get_trail(
    State(state): State<Arc<AppState>>,
    Path(trail_id): Path<String>,
) -> Result<Json<Trail>> {
    Ok(Json(state.trail_search.get_trail(&trail_id).await?))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTrailRequest {
    #[validate(length(min = 1, max = 120))]
    name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    description: String,
    #[validate(length(min = 1, max = 120))]
    location: String,
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
    #[serde(default)]
    path: Vec<Coordinate>,
    #[validate(range(min = 0.0))]
    distance: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    elevation_gain: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    elevation_loss: f64,
    difficulty: Difficulty,
}

async fn create_trail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTrailRequest>,
) -> Result<Json<Trail>> {
    body.validate()?;

    let trail = state
        .trail_search
        .create_trail(
            &user.uid,
            NewTrail {
                name: body.name,
                description: body.description,
                location: body.location,
                coordinate: Coordinate::new(body.latitude, body.longitude),
                path: body.path,
                distance: body.distance,
                elevation_gain: body.elevation_gain,
                elevation_loss: body.elevation_loss,
                difficulty: body.difficulty,
            },
        )
        .await?;
    Ok(Json(trail))
}

#[derive(Deserialize, Validate)]
struct RatingRequest {
    #[validate(range(min = 1, max = 5))]
    rating: u8,
}

async fn rate_trail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trail_id): Path<String>,
    Json(body): Json<RatingRequest>,
) -> Result<Json<Trail>> {
    body.validate()?;
    let trail = state
        .trail_search
        .rate_trail(&user.uid, &trail_id, body.rating)
        .await?;
    Ok(Json(trail))
}
