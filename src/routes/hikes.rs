// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Live hike tracking routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActiveTrail, TrackSample};
use crate::services::posts::LoggedHike;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Most samples accepted in one upload.
const MAX_SAMPLES_PER_BATCH: usize = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/hikes/active",
            get(get_active).post(start_hike).delete(cancel_hike),
        )
        .route("/api/hikes/active/samples", post(add_samples))
        .route("/api/hikes/active/finish", post(finish_hike))
}

async fn get_active(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActiveTrail>> {
    state
        .hikes
        .current(&user.uid)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No hike in progress".to_string()))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StartHikeRequest {
    trail_id: Option<String>,
}

async fn start_hike(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<StartHikeRequest>>,
) -> Result<(StatusCode, Json<ActiveTrail>)> {
    let Json(body) = body.unwrap_or_default();
    let active = state
        .hikes
        .start(&user.uid, body.trail_id.filter(|id| !id.is_empty()))
        .await?;
    Ok((StatusCode::CREATED, Json(active)))
}

#[derive(Deserialize)]
struct SamplesRequest {
    samples: Vec<TrackSample>,
}

async fn add_samples(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SamplesRequest>,
) -> Result<Json<ActiveTrail>> {
    if body.samples.is_empty() || body.samples.len() > MAX_SAMPLES_PER_BATCH {
        return Err(AppError::BadRequest(format!(
            "Send between 1 and {} samples",
            MAX_SAMPLES_PER_BATCH
        )));
    }
    let invalid = body.samples.iter().any(|s| {
        !(-90.0..=90.0).contains(&s.latitude) || !(-180.0..=180.0).contains(&s.longitude)
    });
    if invalid {
        return Err(AppError::BadRequest(
            "Sample coordinates out of range".to_string(),
        ));
    }

    Ok(Json(state.hikes.add_samples(&user.uid, body.samples).await?))
}

async fn cancel_hike(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.hikes.cancel(&user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct FinishHikeRequest {
    #[serde(default)]
    #[validate(length(max = 2000))]
    description: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    image_urls: Vec<String>,
}

async fn finish_hike(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<FinishHikeRequest>,
) -> Result<Json<LoggedHike>> {
    body.validate()?;
    let logged = state
        .hikes
        .finish(&user.uid, body.description, body.image_urls)
        .await?;
    Ok(Json(logged))
}
