// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Post and engagement routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{HikeStats, Post, SyncState};
use crate::services::engagement::{LikeOutcome, ShareOutcome};
use crate::services::posts::{LoggedHike, NewPost};
use crate::services::storage::{extension_for_content_type, post_image_path, MAX_UPLOAD_BYTES};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const MAX_IMAGES_PER_POST: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", post(create_post))
        .route(
            "/api/posts/{post_id}",
            get(get_post).patch(edit_post).delete(delete_post),
        )
        .route("/api/posts/{post_id}/like", put(like_post).delete(unlike_post))
        .route("/api/posts/{post_id}/comments", post(add_comment))
        .route("/api/posts/{post_id}/share", post(share_post))
        .route(
            "/api/posts/{post_id}/images",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    trail_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    description: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    image_urls: Vec<String>,
    #[serde(default)]
    stats: HikeStats,
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<LoggedHike>)> {
    body.validate()?;

    let logged = state
        .posts
        .create_post(
            &user.uid,
            NewPost {
                trail_id: body.trail_id.filter(|id| !id.is_empty()),
                description: body.description,
                image_urls: body.image_urls,
                stats: body.stats,
                path: Vec::new(),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(logged)))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>> {
    Ok(Json(state.posts.get_post(&post_id).await?))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct EditPostRequest {
    #[validate(length(max = 2000))]
    description: Option<String>,
    #[validate(length(max = 10))]
    image_urls: Option<Vec<String>>,
}

async fn edit_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
    Json(body): Json<EditPostRequest>,
) -> Result<Json<Post>> {
    body.validate()?;
    let post = state
        .posts
        .edit_post(&user.uid, &post_id, body.description, body.image_urls)
        .await?;
    Ok(Json(post))
}

/// Delete a post; the body is the deletion marker clients swap in for
/// their cached copy.
async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>> {
    Ok(Json(state.posts.delete_post(&user.uid, &post_id).await?))
}

async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<LikeOutcome>> {
    like_response(state.engagement.set_like(&user.uid, &post_id, true).await?)
}

async fn unlike_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<LikeOutcome>> {
    like_response(state.engagement.set_like(&user.uid, &post_id, false).await?)
}

/// A rolled-back like is reported as a failed write.
fn like_response(outcome: LikeOutcome) -> Result<Json<LikeOutcome>> {
    if outcome.state == SyncState::RolledBack {
        return Err(AppError::Database(format!(
            "Like on post {} was not saved",
            outcome.post.id
        )));
    }
    Ok(Json(outcome))
}

#[derive(Deserialize, Validate)]
struct CommentRequest {
    #[validate(length(min = 1, max = 500))]
    text: String,
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<Post>> {
    body.validate()?;
    let post = state
        .engagement
        .add_comment(&user.uid, &post_id, &body.text)
        .await?;
    Ok(Json(post))
}

#[derive(Deserialize, Validate)]
struct ShareRequest {
    #[validate(length(min = 1, max = 50))]
    recipients: Vec<String>,
}

async fn share_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
    Json(body): Json<ShareRequest>,
) -> Result<Json<ShareOutcome>> {
    body.validate()?;
    let outcome = state
        .engagement
        .share_post(&user.uid, &post_id, &body.recipients)
        .await?;
    Ok(Json(outcome))
}

/// Upload one image and attach it to the caller's post.
async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Post>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let extension = extension_for_content_type(content_type)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported image type: {}", content_type)))?;

    let post = state.posts.get_post(&post_id).await?;
    if post.user_id != user.uid {
        return Err(AppError::Forbidden(
            "Only the author can add images".to_string(),
        ));
    }
    if post.image_urls.len() >= MAX_IMAGES_PER_POST {
        return Err(AppError::BadRequest(format!(
            "A post holds at most {} images",
            MAX_IMAGES_PER_POST
        )));
    }

    let path = post_image_path(
        &user.uid,
        &post_id,
        chrono::Utc::now().timestamp_millis(),
        post.image_urls.len(),
        extension,
    );
    let url = state.storage.upload(&path, content_type, body.to_vec()).await?;

    Ok(Json(state.posts.add_image_url(&user.uid, &post_id, url).await?))
}
