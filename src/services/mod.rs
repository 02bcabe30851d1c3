// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Services module - business logic layer.

pub mod engagement;
pub mod feed;
pub mod hike;
pub mod messaging;
pub mod overpass;
pub mod posts;
pub mod search_gate;
pub mod social;
pub mod storage;
pub mod trail_search;

pub use engagement::EngagementService;
pub use feed::{FeedService, FeedSubscription, PostSource};
pub use hike::HikeService;
pub use messaging::MessagingService;
pub use overpass::OverpassClient;
pub use posts::PostService;
pub use search_gate::SearchGate;
pub use social::SocialService;
pub use storage::StorageClient;
pub use trail_search::{TrailQuery, TrailSearchService};
