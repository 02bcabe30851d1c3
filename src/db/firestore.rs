// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, social edges, trail lists)
//! - Trails and per-user trail ratings
//! - Posts
//! - Conversations and their messages
//! - Active (in-progress) hikes

use crate::db::{collections, MAX_IN_FILTER_VALUES};
use crate::error::AppError;
use crate::models::{
    ActiveTrail, Comment, Conversation, Difficulty, HikeStats, Message, Post, Trail, TrailList,
    TrailRating, UserProfile,
};
use firestore::{
    FirestoreFieldTransform, FirestoreFieldTransformType, FirestoreValue,
    FirestoreWritePrecondition,
};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// A server-side edit of one field, applied without reading the document.
#[derive(Debug, Clone)]
enum FieldEdit {
    /// Add to a set-like array unless already present
    AddToSet(&'static str, FirestoreValue),
    /// Remove every occurrence from an array
    RemoveFromSet(&'static str, FirestoreValue),
    /// Append to an array (values here are unique, so this never dedupes)
    Append(&'static str, FirestoreValue),
    IncrementInt(&'static str, i64),
    IncrementFloat(&'static str, f64),
}

impl FieldEdit {
    fn set_membership(field: &'static str, value: &str, present: bool) -> Self {
        if present {
            FieldEdit::AddToSet(field, <FirestoreValue as From<_>>::from(value))
        } else {
            FieldEdit::RemoveFromSet(field, <FirestoreValue as From<_>>::from(value))
        }
    }

    fn into_transform(self) -> FirestoreFieldTransform {
        let (field, transform_type) = match self {
            FieldEdit::AddToSet(field, value) | FieldEdit::Append(field, value) => (
                field,
                FirestoreFieldTransformType::AppendMissingElements(vec![value]),
            ),
            FieldEdit::RemoveFromSet(field, value) => (
                field,
                FirestoreFieldTransformType::RemoveAllFromArray(vec![value]),
            ),
            FieldEdit::IncrementInt(field, by) => {
                (field, FirestoreFieldTransformType::Increment(by.into()))
            }
            FieldEdit::IncrementFloat(field, by) => {
                (field, FirestoreFieldTransformType::Increment(by.into()))
            }
        };
        FirestoreFieldTransform::new(field.to_string(), transform_type)
    }
}

/// Field edits for one document.
struct DocumentEdit {
    collection: &'static str,
    document_id: String,
    fields: Vec<FieldEdit>,
}

impl DocumentEdit {
    fn new(collection: &'static str, document_id: &str, fields: Vec<FieldEdit>) -> Self {
        Self {
            collection,
            document_id: document_id.to_string(),
            fields,
        }
    }
}

/// Masked write of a trail's rating summary.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingSummary {
    rating: f64,
    rating_count: u32,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user profile. Fails with `Conflict` if one already exists.
    pub async fn create_user(&self, user: &UserProfile) -> Result<(), AppError> {
        let created: Result<UserProfile, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await;

        match created {
            Ok(_) => Ok(()),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Err(
                AppError::Conflict(format!("Profile {} already exists", user.uid)),
            ),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Write only the named fields of a user profile.
    ///
    /// Every other field, in particular the social edges, lists and
    /// counters, is left as stored.
    pub async fn update_user_fields(
        &self,
        user: &UserProfile,
        fields: &[&str],
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Follow or unfollow `target_uid` on behalf of `uid`.
    ///
    /// Both edges are server-side set edits committed in one transaction,
    /// so they cannot end up half-applied and concurrent follows of the
    /// same user do not overwrite each other.
    pub async fn set_following_atomic(
        &self,
        uid: &str,
        target_uid: &str,
        follow: bool,
    ) -> Result<(), AppError> {
        let (follower, target) =
            futures_util::try_join!(self.get_user(uid), self.get_user(target_uid))?;
        if follower.is_none() || target.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} or {} not found",
                uid, target_uid
            )));
        }

        self.commit_edits(vec![
            DocumentEdit::new(
                collections::USERS,
                uid,
                vec![FieldEdit::set_membership("following", target_uid, follow)],
            ),
            DocumentEdit::new(
                collections::USERS,
                target_uid,
                vec![FieldEdit::set_membership("followers", uid, follow)],
            ),
        ])
        .await?;

        tracing::info!(uid, target_uid, follow, "Follow edge updated atomically");
        Ok(())
    }

    /// Add or remove a trail id from one of a user's lists.
    pub async fn set_list_membership(
        &self,
        uid: &str,
        list: TrailList,
        trail_id: &str,
        present: bool,
    ) -> Result<(), AppError> {
        self.commit_edits(vec![DocumentEdit::new(
            collections::USERS,
            uid,
            vec![FieldEdit::set_membership(list.field_name(), trail_id, present)],
        )])
        .await
    }

    /// Fold a logged hike into the author's totals and XP, and count the
    /// post on its trail, in one transaction.
    ///
    /// The cached rank is not touched; callers re-derive it from the
    /// committed XP.
    pub async fn record_hike(
        &self,
        uid: &str,
        stats: &HikeStats,
        xp_gained: u64,
        trail_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut user_edits = vec![
            FieldEdit::IncrementInt("totalHikes", 1),
            FieldEdit::IncrementInt("xp", xp_gained as i64),
        ];
        if let Some(distance) = stats.distance.filter(|d| *d > 0.0) {
            user_edits.push(FieldEdit::IncrementFloat("totalDistance", distance));
        }
        if let Some(time) = stats.time.filter(|t| *t > 0) {
            user_edits.push(FieldEdit::IncrementInt("totalTime", time as i64));
        }

        let mut edits = vec![DocumentEdit::new(collections::USERS, uid, user_edits)];
        if let Some(trail_id) = trail_id {
            edits.push(DocumentEdit::new(
                collections::TRAILS,
                trail_id,
                vec![FieldEdit::IncrementInt("postCount", 1)],
            ));
        }
        self.commit_edits(edits).await
    }

    /// Apply server-side field edits to existing documents in one
    /// transaction. No document is read, so edits from concurrent callers
    /// compose instead of overwriting each other.
    async fn commit_edits(&self, edits: Vec<DocumentEdit>) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for edit in edits {
            let transforms: Vec<FirestoreFieldTransform> =
                edit.fields.into_iter().map(FieldEdit::into_transform).collect();

            client
                .fluent()
                .update()
                .in_col(edit.collection)
                .precondition(FirestoreWritePrecondition::Exists(true))
                .document_id(&edit.document_id)
                .transforms(|_| transforms.clone())
                .only_transform()
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add edit to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    // ─── Trail Operations ────────────────────────────────────────

    /// Get a trail by ID.
    pub async fn get_trail(&self, trail_id: &str) -> Result<Option<Trail>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRAILS)
            .obj()
            .one(trail_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a trail.
    pub async fn upsert_trail(&self, trail: &Trail) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TRAILS)
            .document_id(&trail.id)
            .object(trail)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only the rating summary of a trail.
    pub async fn update_trail_rating(
        &self,
        trail_id: &str,
        rating: f64,
        rating_count: u32,
    ) -> Result<(), AppError> {
        let summary = RatingSummary {
            rating,
            rating_count,
        };
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["rating", "ratingCount"])
            .in_col(collections::TRAILS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(trail_id)
            .object(&summary)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store several trails with bounded concurrency.
    pub async fn batch_upsert_trails(&self, trails: &[Trail]) -> Result<(), AppError> {
        stream::iter(trails.to_vec())
            .map(|trail| async move { self.upsert_trail(&trail).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Most recent trails, optionally restricted to one difficulty.
    pub async fn get_recent_trails(
        &self,
        limit: u32,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Trail>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRAILS);

        let query = if let Some(difficulty) = difficulty {
            query.filter(move |q| q.field("difficulty").eq(difficulty.as_str()))
        } else {
            query
        };

        query
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Trails whose representative latitude lies in `[south, north]`.
    ///
    /// Firestore only allows range filters on a single field, so callers
    /// filter longitude themselves.
    pub async fn get_trails_in_latitude_band(
        &self,
        south: f64,
        north: f64,
    ) -> Result<Vec<Trail>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRAILS)
            .filter(move |q| {
                q.for_all([
                    q.field("coordinate.latitude").greater_than_or_equal(south),
                    q.field("coordinate.latitude").less_than_or_equal(north),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a user's rating of a trail (one per user per trail).
    pub async fn set_trail_rating(&self, rating: &TrailRating) -> Result<(), AppError> {
        let doc_id = TrailRating::document_id(&rating.trail_id, &rating.user_id);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TRAIL_RATINGS)
            .document_id(&doc_id)
            .object(rating)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All individual ratings of a trail.
    pub async fn get_ratings_for_trail(
        &self,
        trail_id: &str,
    ) -> Result<Vec<TrailRating>, AppError> {
        let trail_id = trail_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRAIL_RATINGS)
            .filter(move |q| q.field("trailId").eq(trail_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Post Operations ─────────────────────────────────────────

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POSTS)
            .obj()
            .one(post_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a post. Fails if the id is already taken.
    pub async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        let _: Post = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::POSTS)
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only the named fields of a post.
    pub async fn update_post_fields(&self, post: &Post, fields: &[&str]) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::POSTS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add or remove `uid` from a post's like-set.
    pub async fn set_post_like(&self, post_id: &str, uid: &str, liked: bool) -> Result<(), AppError> {
        self.commit_edits(vec![DocumentEdit::new(
            collections::POSTS,
            post_id,
            vec![FieldEdit::set_membership("likes", uid, liked)],
        )])
        .await
    }

    /// Append a comment to a post.
    pub async fn append_comment(&self, post_id: &str, comment: &Comment) -> Result<(), AppError> {
        self.commit_edits(vec![DocumentEdit::new(
            collections::POSTS,
            post_id,
            vec![FieldEdit::Append("comments", <FirestoreValue as From<_>>::from(comment))],
        )])
        .await
    }

    /// Append an image URL to a post.
    pub async fn append_post_image(&self, post_id: &str, url: &str) -> Result<(), AppError> {
        self.commit_edits(vec![DocumentEdit::new(
            collections::POSTS,
            post_id,
            vec![FieldEdit::Append("imageUrls", <FirestoreValue as From<_>>::from(url))],
        )])
        .await
    }

    /// Count one share of a post.
    pub async fn increment_post_shares(&self, post_id: &str) -> Result<(), AppError> {
        self.commit_edits(vec![DocumentEdit::new(
            collections::POSTS,
            post_id,
            vec![FieldEdit::IncrementInt("shares", 1)],
        )])
        .await
    }

    /// Delete a post and uncount it on its trail in one transaction.
    pub async fn delete_post_and_uncount(
        &self,
        post_id: &str,
        trail_id: Option<&str>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        // A post may outlive its trail
        let trail_id = match trail_id {
            Some(trail_id) if self.get_trail(trail_id).await?.is_some() => Some(trail_id),
            _ => None,
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .delete()
            .from(collections::POSTS)
            .document_id(post_id)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add delete to transaction: {}", e)))?;

        if let Some(trail_id) = trail_id {
            let transforms = vec![FieldEdit::IncrementInt("postCount", -1).into_transform()];
            client
                .fluent()
                .update()
                .in_col(collections::TRAILS)
                .precondition(FirestoreWritePrecondition::Exists(true))
                .document_id(trail_id)
                .transforms(|_| transforms.clone())
                .only_transform()
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add edit to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    /// Most recent posts by any of `authors`.
    ///
    /// `authors` must fit in one membership filter; larger sets are chunked
    /// by the feed service.
    pub async fn get_posts_by_authors(
        &self,
        authors: &[String],
        limit: u32,
    ) -> Result<Vec<Post>, AppError> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }
        if authors.len() > MAX_IN_FILTER_VALUES {
            return Err(AppError::BadRequest(format!(
                "At most {} authors per query, got {}",
                MAX_IN_FILTER_VALUES,
                authors.len()
            )));
        }

        let authors = authors.to_vec();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .filter(move |q| q.field("userId").is_in(authors.clone()))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts by one user, newest first.
    pub async fn get_posts_for_user(&self, uid: &str, limit: u32) -> Result<Vec<Post>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .filter(move |q| q.field("userId").eq(uid.clone()))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Conversation Operations ─────────────────────────────────

    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CONVERSATIONS)
            .obj()
            .one(conversation_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONVERSATIONS)
            .document_id(&conversation.id)
            .object(conversation)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Append a message to a conversation's `messages` sub-collection.
    pub async fn add_message(
        &self,
        conversation_id: &str,
        message: &Message,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::CONVERSATIONS, conversation_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.id)
            .parent(&parent_path)
            .object(message)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent messages of a conversation, newest first.
    pub async fn get_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<Message>, AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::CONVERSATIONS, conversation_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .parent(&parent_path)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Active Hike Operations ──────────────────────────────────

    pub async fn get_active_trail(&self, uid: &str) -> Result<Option<ActiveTrail>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVE_TRAILS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_active_trail(&self, active: &ActiveTrail) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVE_TRAILS)
            .document_id(&active.user_id)
            .object(active)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_active_trail(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACTIVE_TRAILS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
