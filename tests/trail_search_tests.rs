// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Trail search behavior across query parsing, import conversion and
//! dedup, without a database.

use hika::models::{Coordinate, Difficulty, Trail, TrailSource};
use hika::services::overpass::{build_query, infer_difficulty, resolve_region, OverpassElement};
use hika::services::trail_search::{
    apply_filters, dedupe_candidates, fetch_plan, location_matches, TrailQuery,
};

fn stored(name: &str, location: &str, lat: f64, lon: f64, difficulty: Difficulty) -> Trail {
    Trail {
        id: format!("user-{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        description: String::new(),
        location: location.to_string(),
        coordinate: Coordinate::new(lat, lon),
        path: vec![],
        distance: 8_000.0,
        elevation_gain: 300.0,
        elevation_loss: 300.0,
        difficulty,
        rating: 4.5,
        rating_count: 2,
        post_count: 0,
        source: TrailSource::User,
        created_by: Some("hiker-1".to_string()),
        created_at: "2024-03-01T00:00:00.000Z".to_string(),
    }
}

#[test]
fn test_oregon_location_variants_match_both_ways() {
    assert!(location_matches("Oregon, USA", "Oregon"));
    assert!(location_matches("Oregon", "Oregon, USA"));
    assert!(!location_matches("Oregon, USA", "Washington"));
}

#[test]
fn test_imported_trail_is_deduplicated_against_user_trail() {
    let existing = vec![stored(
        "Wahkeena Falls",
        "Oregon, USA",
        45.5750,
        -122.1280,
        Difficulty::Moderate,
    )];

    let near: OverpassElement = serde_json::from_value(serde_json::json!({
        "type": "way",
        "id": 101,
        "tags": { "name": "Wahkeena Falls", "highway": "path" },
        "geometry": [
            { "lat": 45.5755, "lon": -122.1285 },
            { "lat": 45.5800, "lon": -122.1300 }
        ]
    }))
    .unwrap();
    let far: OverpassElement = serde_json::from_value(serde_json::json!({
        "type": "way",
        "id": 102,
        "tags": { "name": "Wahkeena Falls", "highway": "path" },
        "geometry": [
            { "lat": 45.5850, "lon": -122.1280 },
            { "lat": 45.5900, "lon": -122.1300 }
        ]
    }))
    .unwrap();

    let oregon = resolve_region("Oregon").unwrap();
    let now = "2024-06-01T00:00:00.000Z";
    let candidates: Vec<Trail> = [near, far]
        .into_iter()
        .filter_map(|e| e.into_trail(&oregon.label(), now))
        .collect();
    assert_eq!(candidates.len(), 2);

    let fresh = dedupe_candidates(candidates, &existing);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].id, "osm-way-102");
    assert_eq!(fresh[0].source, TrailSource::Osm);
    assert_eq!(fresh[0].location, "Oregon, USA");
}

#[test]
fn test_imported_trails_are_found_by_location_search() {
    let oregon = resolve_region("oregon").unwrap();
    let imported = stored("Eagle Creek", &oregon.label(), 45.64, -121.92, Difficulty::Hard);
    let elsewhere = stored("Mount Si", "Washington, USA", 47.49, -121.72, Difficulty::Hard);

    let query = TrailQuery {
        location: Some("Oregon".to_string()),
        limit: 10,
        ..Default::default()
    };
    let results = apply_filters(vec![imported, elsewhere], &query);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Eagle Creek");
}

#[test]
fn test_difficulty_inference_examples() {
    assert_eq!(infer_difficulty(12_000.0, 0.0), Difficulty::Hard);
    assert_eq!(infer_difficulty(3_000.0, 250.0), Difficulty::Moderate);
    assert_eq!(infer_difficulty(1_000.0, 10.0), Difficulty::Easy);
}

#[test]
fn test_term_takes_the_largest_window() {
    let with_term = TrailQuery {
        term: Some("lake".to_string()),
        location: Some("Oregon".to_string()),
        difficulty: Some(Difficulty::Easy),
        limit: 20,
    };
    let plan = fetch_plan(&with_term);
    assert_eq!(plan.window, 1000);
    assert_eq!(plan.difficulty_pushdown, None);
}

#[test]
fn test_region_query_targets_bounding_box() {
    let washington = resolve_region("Washington, USA").unwrap();
    let query = build_query(washington.bounds, Some("Mount Si"));
    assert!(query.contains("45.5,-124.8,49,-116.9"));
    assert!(query.contains(r#"relation["route"="hiking"]"#));
}
