// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Hika: social hiking with trail discovery and gamified progress.
//!
//! This crate provides the backend API: trail search with OpenStreetMap
//! import, a merged home feed over followed users, engagement and
//! messaging, live hike tracking, and XP ranks.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    EngagementService, FeedService, HikeService, MessagingService, OverpassClient, PostService,
    SearchGate, SocialService, StorageClient, TrailSearchService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub feed: FeedService<FirestoreDb>,
    pub trail_search: TrailSearchService,
    pub search_gate: SearchGate,
    pub storage: StorageClient,
    pub social: SocialService,
    pub posts: PostService,
    pub engagement: EngagementService,
    pub messaging: MessagingService,
    pub hikes: HikeService,
}

impl AppState {
    /// Wire every service to one database handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let messaging = MessagingService::new(db.clone());
        let posts = PostService::new(db.clone());

        Self {
            feed: FeedService::new(db.clone(), config.feed_poll_interval),
            trail_search: TrailSearchService::new(
                db.clone(),
                OverpassClient::new(config.overpass_url.clone()),
                config.trail_augmentation,
            ),
            search_gate: SearchGate::new(config.search_debounce),
            storage: StorageClient::new(
                config.storage_bucket.clone(),
                config.storage_access_token.clone(),
            ),
            social: SocialService::new(db.clone()),
            engagement: EngagementService::new(db.clone(), messaging.clone()),
            hikes: HikeService::new(db.clone(), posts.clone()),
            posts,
            messaging,
            db,
            config,
        }
    }
}
