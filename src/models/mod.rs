// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Data models for the application.

pub mod active_trail;
pub mod message;
pub mod optimistic;
pub mod post;
pub mod rank;
pub mod trail;
pub mod user;

pub use active_trail::{ActiveTrail, TrackSample};
pub use message::{conversation_id, Conversation, Message};
pub use optimistic::{Optimistic, SyncState};
pub use post::{Comment, HikeStats, Post, DELETED_POST_ID};
pub use rank::{Rank, XpProgress};
pub use trail::{Coordinate, Difficulty, Trail, TrailRating, TrailSource};
pub use user::{TrailList, UserProfile};
