// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Direct message routes. Conversations are addressed by the other
//! participant's uid.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Message;
use crate::services::messaging::DEFAULT_MESSAGE_LIMIT;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/conversations/{other_uid}/messages",
        get(list_messages).post(send_message),
    )
}

#[derive(Deserialize)]
struct MessagesQuery {
    limit: Option<u32>,
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(other_uid): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>> {
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT).clamp(1, 200);
    let messages = state
        .messaging
        .list_messages(&user.uid, &other_uid, limit)
        .await?;
    Ok(Json(messages))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    text: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(other_uid): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    body.validate()?;
    let message = state
        .messaging
        .send_message(&user.uid, &other_uid, &body.text, None)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
