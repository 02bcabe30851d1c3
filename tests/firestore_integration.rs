// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST`); they skip otherwise.

use hika::config::Config;
use hika::error::AppError;
use hika::models::{
    Coordinate, Difficulty, HikeStats, Rank, TrackSample, Trail, TrailList, TrailSource,
    UserProfile,
};
use hika::models::DELETED_POST_ID;
use hika::services::overpass::OverpassClient;
use hika::services::posts::NewPost;
use hika::services::trail_search::{TrailQuery, TrailSearchService};
use hika::AppState;

mod common;
use common::{test_db, unique_id};

fn profile(uid: &str) -> UserProfile {
    UserProfile::new(
        uid,
        "Test Hiker",
        Some("test@example.com".to_string()),
        "2024-01-15T10:00:00.000Z",
    )
}

fn trail(id: &str, name: &str) -> Trail {
    Trail {
        id: id.to_string(),
        name: name.to_string(),
        description: "Waterfalls".to_string(),
        location: "Oregon, USA".to_string(),
        coordinate: Coordinate::new(45.6, -121.9),
        path: vec![],
        distance: 9_000.0,
        elevation_gain: 400.0,
        elevation_loss: 400.0,
        difficulty: Difficulty::Moderate,
        rating: 0.0,
        rating_count: 0,
        post_count: 0,
        source: TrailSource::User,
        created_by: None,
        created_at: hika::time_utils::now_rfc3339(),
    }
}

async fn test_state() -> AppState {
    AppState::new(Config::test_default(), test_db().await)
}

// ═══════════════════════════════════════════════════════════════════════════
// USERS & SOCIAL
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");

    assert!(db.get_user(&uid).await.unwrap().is_none());

    db.create_user(&profile(&uid)).await.unwrap();

    let fetched = db.get_user(&uid).await.unwrap().expect("user exists");
    assert_eq!(fetched.display_name, "Test Hiker");
    assert_eq!(fetched.rank, Rank::Copper);
    assert_eq!(fetched.xp, 0);
}

#[tokio::test]
async fn test_follow_writes_both_edges_and_is_idempotent() {
    require_emulator!();

    let state = test_state().await;
    let alice = unique_id("alice");
    let bob = unique_id("bob");
    state.db.create_user(&profile(&alice)).await.unwrap();
    state.db.create_user(&profile(&bob)).await.unwrap();

    state.social.set_following(&alice, &bob, true).await.unwrap();
    state.social.set_following(&alice, &bob, true).await.unwrap();

    let a = state.db.get_user(&alice).await.unwrap().unwrap();
    let b = state.db.get_user(&bob).await.unwrap().unwrap();
    assert_eq!(a.following, vec![bob.clone()]);
    assert_eq!(b.followers, vec![alice.clone()]);

    state.social.set_following(&alice, &bob, false).await.unwrap();
    let a = state.db.get_user(&alice).await.unwrap().unwrap();
    let b = state.db.get_user(&bob).await.unwrap().unwrap();
    assert!(a.following.is_empty());
    assert!(b.followers.is_empty());
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() {
    require_emulator!();

    let state = test_state().await;
    let alice = unique_id("alice");
    state.db.create_user(&profile(&alice)).await.unwrap();

    let err = state
        .social
        .set_following(&alice, &unique_id("ghost"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_follows_of_one_user_keep_both_edges() {
    require_emulator!();

    let state = test_state().await;
    let target = unique_id("target");
    let bob = unique_id("bob");
    let carol = unique_id("carol");
    for uid in [&target, &bob, &carol] {
        state.db.create_user(&profile(uid)).await.unwrap();
    }

    let (by_bob, by_carol) = tokio::join!(
        state.social.set_following(&bob, &target, true),
        state.social.set_following(&carol, &target, true),
    );
    by_bob.unwrap();
    by_carol.unwrap();

    let t = state.db.get_user(&target).await.unwrap().unwrap();
    assert_eq!(t.followers.len(), 2);
    assert!(t.followers.contains(&bob));
    assert!(t.followers.contains(&carol));

    let b = state.db.get_user(&bob).await.unwrap().unwrap();
    let c = state.db.get_user(&carol).await.unwrap().unwrap();
    assert_eq!(b.following, vec![target.clone()]);
    assert_eq!(c.following, vec![target.clone()]);
}

#[tokio::test]
async fn test_create_user_twice_is_conflict() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_id("user");
    db.create_user(&profile(&uid)).await.unwrap();

    let err = db.create_user(&profile(&uid)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_profile_edit_keeps_concurrent_follow() {
    require_emulator!();

    let state = test_state().await;
    let alice = unique_id("alice");
    let bob = unique_id("bob");
    state.db.create_user(&profile(&alice)).await.unwrap();
    state.db.create_user(&profile(&bob)).await.unwrap();

    // Stale copy read before the follow lands
    let mut stale = state.db.get_user(&alice).await.unwrap().unwrap();
    state.social.set_following(&alice, &bob, true).await.unwrap();

    stale.bio = "Peak bagger".to_string();
    state
        .db
        .update_user_fields(&stale, &["bio"])
        .await
        .unwrap();

    let a = state.db.get_user(&alice).await.unwrap().unwrap();
    assert_eq!(a.bio, "Peak bagger");
    assert_eq!(a.following, vec![bob.clone()]);
}

#[tokio::test]
async fn test_list_reload_skips_missing_trails() {
    require_emulator!();

    let state = test_state().await;
    let uid = unique_id("user");
    let trail_id = unique_id("trail");
    state.db.create_user(&profile(&uid)).await.unwrap();
    state.db.upsert_trail(&trail(&trail_id, "Eagle Creek")).await.unwrap();

    state
        .social
        .update_list(&uid, TrailList::Favorites, &trail_id, true)
        .await
        .unwrap();
    state
        .social
        .update_list(&uid, TrailList::Favorites, "missing-trail", true)
        .await
        .unwrap();

    let trails = state
        .social
        .load_list_trails(&uid, TrailList::Favorites)
        .await
        .unwrap();
    assert_eq!(trails.len(), 1);
    assert_eq!(trails[0].id, trail_id);
}

// ═══════════════════════════════════════════════════════════════════════════
// POSTS & ENGAGEMENT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_logging_a_hike_awards_xp_and_counts_trail_posts() {
    require_emulator!();

    let state = test_state().await;
    let uid = unique_id("user");
    let trail_id = unique_id("trail");
    state.db.create_user(&profile(&uid)).await.unwrap();
    state.db.upsert_trail(&trail(&trail_id, "Eagle Creek")).await.unwrap();

    let logged = state
        .posts
        .create_post(
            &uid,
            NewPost {
                trail_id: Some(trail_id.clone()),
                description: "Great day".to_string(),
                image_urls: vec![],
                stats: HikeStats {
                    distance: Some(1000.0),
                    time: None,
                    elevation_gain: None,
                },
                path: vec![],
            },
        )
        .await
        .unwrap();
    assert_eq!(logged.xp_gained, 20);

    let user = state.db.get_user(&uid).await.unwrap().unwrap();
    assert_eq!(user.xp, 20);
    assert_eq!(user.total_hikes, 1);

    let stored_trail = state.db.get_trail(&trail_id).await.unwrap().unwrap();
    assert_eq!(stored_trail.post_count, 1);
}

#[tokio::test]
async fn test_like_toggle_is_idempotent() {
    require_emulator!();

    let state = test_state().await;
    let author = unique_id("author");
    let fan = unique_id("fan");
    state.db.create_user(&profile(&author)).await.unwrap();

    let post_id = state
        .posts
        .create_post(&author, NewPost::default())
        .await
        .unwrap()
        .post
        .id;

    let first = state.engagement.set_like(&fan, &post_id, true).await.unwrap();
    assert!(first.changed);
    let again = state.engagement.set_like(&fan, &post_id, true).await.unwrap();
    assert!(!again.changed);
    assert_eq!(again.post.likes, vec![fan.clone()]);

    let unliked = state.engagement.set_like(&fan, &post_id, false).await.unwrap();
    assert!(unliked.post.likes.is_empty());
    let noop = state.engagement.set_like(&fan, &post_id, false).await.unwrap();
    assert!(!noop.changed);
}

#[tokio::test]
async fn test_concurrent_likes_and_comments_are_all_kept() {
    require_emulator!();

    let state = test_state().await;
    let author = unique_id("author");
    state.db.create_user(&profile(&author)).await.unwrap();

    let post_id = state
        .posts
        .create_post(&author, NewPost::default())
        .await
        .unwrap()
        .post
        .id;

    let fans: Vec<String> = (0..4).map(|i| unique_id(&format!("fan{}", i))).collect();
    let likes = futures_util::future::join_all(
        fans.iter()
            .map(|fan| state.engagement.set_like(fan, &post_id, true)),
    );
    let comments = futures_util::future::join_all(
        fans.iter()
            .map(|fan| state.engagement.add_comment(fan, &post_id, "Nice one")),
    );
    let (likes, comments) = tokio::join!(likes, comments);
    for outcome in likes {
        outcome.unwrap();
    }
    for outcome in comments {
        outcome.unwrap();
    }

    let post = state.posts.get_post(&post_id).await.unwrap();
    assert_eq!(post.likes.len(), fans.len());
    assert!(fans.iter().all(|fan| post.likes.contains(fan)));
    assert_eq!(post.comments.len(), fans.len());
}

#[tokio::test]
async fn test_delete_returns_marker_and_uncounts_trail() {
    require_emulator!();

    let state = test_state().await;
    let uid = unique_id("user");
    let trail_id = unique_id("trail");
    state.db.create_user(&profile(&uid)).await.unwrap();
    state.db.upsert_trail(&trail(&trail_id, "Eagle Creek")).await.unwrap();

    let post_id = state
        .posts
        .create_post(
            &uid,
            NewPost {
                trail_id: Some(trail_id.clone()),
                ..NewPost::default()
            },
        )
        .await
        .unwrap()
        .post
        .id;
    assert_eq!(state.db.get_trail(&trail_id).await.unwrap().unwrap().post_count, 1);

    let marker = state.posts.delete_post(&uid, &post_id).await.unwrap();
    assert_eq!(marker.id, DELETED_POST_ID);
    assert!(marker.is_deleted());

    assert!(state.db.get_post(&post_id).await.unwrap().is_none());
    assert_eq!(state.db.get_trail(&trail_id).await.unwrap().unwrap().post_count, 0);
    assert!(state.posts.posts_for_user(&uid, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_share_fans_out_and_counts_once() {
    require_emulator!();

    let state = test_state().await;
    let author = unique_id("author");
    let r1 = unique_id("r1");
    let r2 = unique_id("r2");
    state.db.create_user(&profile(&author)).await.unwrap();

    let post_id = state
        .posts
        .create_post(&author, NewPost::default())
        .await
        .unwrap()
        .post
        .id;

    let outcome = state
        .engagement
        .share_post(&author, &post_id, &[r1.clone(), r2.clone(), r1.clone()])
        .await
        .unwrap();
    assert_eq!(outcome.delivered.len(), 2);
    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.shares, 1);

    let messages = state.messaging.list_messages(&r1, &author, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].shared_post_id.as_deref(), Some(post_id.as_str()));
}

#[tokio::test]
async fn test_feed_snapshot_spans_chunks() {
    require_emulator!();

    let state = test_state().await;
    let authors: Vec<String> = (0..12).map(|i| unique_id(&format!("a{}", i))).collect();
    for author in [&authors[0], &authors[11]] {
        state.db.create_user(&profile(author)).await.unwrap();
        state
            .posts
            .create_post(author, NewPost::default())
            .await
            .unwrap();
    }

    let feed = state.feed.snapshot(&authors, 50).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert!(feed[0].created_at >= feed[1].created_at);
}

// ═══════════════════════════════════════════════════════════════════════════
// TRAIL SEARCH
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_search_all_falls_back_to_stored_trails_when_import_fails() {
    require_emulator!();

    let db = test_db().await;
    let trail_id = unique_id("trail");
    let name = unique_id("Eagle Creek");
    db.upsert_trail(&trail(&trail_id, &name)).await.unwrap();

    // Nothing listens on port 1, so every import attempt fails
    let service = TrailSearchService::new(db, OverpassClient::new("http://127.0.0.1:1"), true);
    let query = TrailQuery {
        term: Some(name.clone()),
        location: Some("Oregon".to_string()),
        difficulty: None,
        limit: 20,
    };

    let results = service.search_all(&query).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, trail_id);
}

// ═══════════════════════════════════════════════════════════════════════════
// HIKES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_tracked_hike_becomes_post() {
    require_emulator!();

    let state = test_state().await;
    let uid = unique_id("user");
    state.db.create_user(&profile(&uid)).await.unwrap();

    state.hikes.start(&uid, None).await.unwrap();
    let err = state.hikes.start(&uid, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    state
        .hikes
        .add_samples(
            &uid,
            vec![
                TrackSample {
                    latitude: 45.00,
                    longitude: -121.0,
                    elevation: Some(1000.0),
                    timestamp: 0,
                },
                TrackSample {
                    latitude: 45.01,
                    longitude: -121.0,
                    elevation: Some(1050.0),
                    timestamp: 1_200_000,
                },
            ],
        )
        .await
        .unwrap();

    let logged = state
        .hikes
        .finish(&uid, "Morning loop".to_string(), vec![])
        .await
        .unwrap();
    assert_eq!(logged.post.stats.time, Some(1_200));
    assert!(logged.xp_gained > 0);

    let stored = state.db.get_post(&logged.post.id).await.unwrap().unwrap();
    assert_eq!(stored.path.len(), 2);
    assert_eq!(stored.path[1], Coordinate::new(45.01, -121.0));
    assert!(state.hikes.current(&uid).await.unwrap().is_none());
}
