//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TRAILS: &str = "trails";
    /// Individual ratings (keyed by `{trailId}_{userId}`)
    pub const TRAIL_RATINGS: &str = "trailRatings";
    pub const POSTS: &str = "posts";
    pub const CONVERSATIONS: &str = "conversations";
    /// Sub-collection of a conversation
    pub const MESSAGES: &str = "messages";
    /// In-progress hike per user (keyed by uid)
    pub const ACTIVE_TRAILS: &str = "activeTrails";
}

/// The membership filter ("field in list") accepts at most this many values.
pub const MAX_IN_FILTER_VALUES: usize = 10;
