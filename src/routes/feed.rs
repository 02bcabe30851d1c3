// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Home feed routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Post;
use crate::services::feed::DEFAULT_FEED_LIMIT;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use futures_util::{stream, Stream};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

const MAX_FEED_LIMIT: usize = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/feed/stream", get(stream_feed))
}

#[derive(Deserialize)]
struct FeedQuery {
    limit: Option<usize>,
}

impl FeedQuery {
    fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT)
    }
}

/// Posts by the caller and everyone they follow, newest first.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<Post>>> {
    let profile = state.social.get_profile(&user.uid).await?;
    let posts = state
        .feed
        .snapshot(&profile.feed_authors(), query.limit())
        .await?;
    Ok(Json(posts))
}

/// Live feed as server-sent events; one `feed` event per merged update.
///
/// The stream owns the feed subscription, so every chunk watcher stops when
/// the client disconnects.
async fn stream_feed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FeedQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let profile = state.social.get_profile(&user.uid).await?;
    let subscription = state.feed.subscribe(&profile.feed_authors(), query.limit());
    let receiver = subscription.receiver();

    tracing::info!(
        uid = %user.uid,
        chunks = subscription.active_chunks(),
        "Feed stream opened"
    );

    let events = stream::unfold(
        (subscription, receiver),
        |(subscription, mut receiver)| async move {
            receiver.changed().await.ok()?;
            let posts = receiver.borrow_and_update().clone();
            let event = Event::default()
                .event("feed")
                .json_data(&posts)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
            Some((Ok(event), (subscription, receiver)))
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
