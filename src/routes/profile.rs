// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Profile, social graph and trail list routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Post, Trail, TrailList, UserProfile, XpProgress};
use crate::services::posts::DEFAULT_PROFILE_POSTS;
use crate::services::storage::{extension_for_content_type, profile_picture_path, MAX_UPLOAD_BYTES};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(create_me).patch(update_me))
        .route(
            "/api/me/avatar",
            put(upload_avatar).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/me/lists/{list}", get(get_list))
        .route(
            "/api/me/lists/{list}/{trail_id}",
            put(add_to_list).delete(remove_from_list),
        )
        .route("/api/users/{uid}", get(get_user))
        .route("/api/users/{uid}/posts", get(get_user_posts))
        .route("/api/users/{uid}/follow", put(follow).delete(unfollow))
}

/// A profile with its progress toward the next rank.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub progress: XpProgress,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            progress: profile.progress(),
            profile,
        }
    }
}

/// Load a profile with its rank re-derived from XP.
///
/// Only the owner's own reads persist a repaired rank; other users'
/// documents are never written on a read.
async fn load_profile(state: &AppState, uid: &str, is_owner: bool) -> Result<UserProfile> {
    let mut profile = state.social.get_profile(uid).await?;
    if profile.normalize_rank() {
        tracing::warn!(uid, xp = profile.xp, rank = %profile.rank, "Stale rank on read");
        if is_owner {
            state.db.update_user_fields(&profile, &["rank"]).await?;
        }
    }
    Ok(profile)
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    Ok(Json(load_profile(&state, &user.uid, true).await?.into()))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    display_name: String,
    #[validate(email)]
    email: Option<String>,
}

/// Create the caller's profile on first sign-in. Existing profiles are
/// returned unchanged.
async fn create_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    body.validate()?;

    let profile = UserProfile::new(&user.uid, body.display_name.trim(), body.email, &now_rfc3339());
    match state.db.create_user(&profile).await {
        Ok(()) => {
            tracing::info!(uid = %user.uid, "Profile created");
            Ok(Json(profile.into()))
        }
        Err(AppError::Conflict(_)) => Ok(Json(load_profile(&state, &user.uid, true).await?.into())),
        Err(e) => Err(e),
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    display_name: Option<String>,
    #[validate(length(max = 300))]
    bio: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    body.validate()?;

    let mut profile = load_profile(&state, &user.uid, true).await?;
    let mut fields = Vec::new();
    if let Some(display_name) = body.display_name {
        profile.display_name = display_name.trim().to_string();
        fields.push("displayName");
    }
    if let Some(bio) = body.bio {
        profile.bio = bio;
        fields.push("bio");
    }
    if !fields.is_empty() {
        state.db.update_user_fields(&profile, &fields).await?;
    }

    Ok(Json(profile.into()))
}

/// Upload a new profile picture, then point the profile at it.
///
/// The two steps are not atomic: if the profile write fails the uploaded
/// object is left in place and the next upload overwrites it.
async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProfileResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let extension = extension_for_content_type(content_type)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported image type: {}", content_type)))?;

    let mut profile = load_profile(&state, &user.uid, true).await?;

    let path = profile_picture_path(&user.uid, extension);
    let url = state.storage.upload(&path, content_type, body.to_vec()).await?;

    profile.avatar_url = Some(url);
    state.db.update_user_fields(&profile, &["avatarUrl"]).await?;

    Ok(Json(profile.into()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let is_owner = uid == user.uid;
    Ok(Json(load_profile(&state, &uid, is_owner).await?.into()))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

async fn get_user_posts(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Post>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PROFILE_POSTS).clamp(1, 100);
    Ok(Json(state.posts.posts_for_user(&uid, limit).await?))
}

async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(target): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let me = state.social.set_following(&user.uid, &target, true).await?;
    Ok(Json(me.into()))
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(target): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let me = state.social.set_following(&user.uid, &target, false).await?;
    Ok(Json(me.into()))
}

async fn get_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(list): Path<TrailList>,
) -> Result<Json<Vec<Trail>>> {
    Ok(Json(state.social.load_list_trails(&user.uid, list).await?))
}

async fn add_to_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((list, trail_id)): Path<(TrailList, String)>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .social
        .update_list(&user.uid, list, &trail_id, true)
        .await?;
    Ok(Json(profile.into()))
}

async fn remove_from_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((list, trail_id)): Path<(TrailList, String)>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .social
        .update_list(&user.uid, list, &trail_id, false)
        .await?;
    Ok(Json(profile.into()))
}
