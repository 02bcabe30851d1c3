// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! OpenStreetMap Overpass API client for importing trails.
//!
//! Handles:
//! - Building Overpass QL queries over a region's bounding box
//! - Converting tagged way/relation geometry into [`Trail`] records
//! - Inferring distance and difficulty when OSM does not tag them

use std::collections::HashMap;

use geo::{Distance as _, Haversine};
use serde::Deserialize;

use crate::models::{Coordinate, Difficulty, Trail, TrailSource};

/// Maximum number of elements requested per query.
const MAX_ELEMENTS: u32 = 50;
/// Server-side query timeout (seconds).
const QUERY_TIMEOUT_SECS: u32 = 25;

#[derive(Debug, thiserror::Error)]
pub enum OverpassError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Rate limited, try again later")]
    RateLimited,
    #[error("Overpass returned HTTP {0}")]
    Status(u16),
}

/// A latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south..=self.north).contains(&coordinate.latitude)
            && (self.west..=self.east).contains(&coordinate.longitude)
    }
}

/// A searchable region with its bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub name: &'static str,
    pub abbreviation: &'static str,
    pub bounds: BoundingBox,
}

impl Region {
    /// Location label written onto imported trails.
    pub fn label(&self) -> String {
        format!("{}, USA", self.name)
    }
}

const fn region(
    name: &'static str,
    abbreviation: &'static str,
    south: f64,
    west: f64,
    north: f64,
    east: f64,
) -> Region {
    Region {
        name,
        abbreviation,
        bounds: BoundingBox {
            south,
            west,
            north,
            east,
        },
    }
}

/// Approximate state bounding boxes used to scope imports.
pub const REGIONS: &[Region] = &[
    region("Alaska", "AK", 51.2, -179.2, 71.4, -129.9),
    region("Arizona", "AZ", 31.3, -114.8, 37.0, -109.0),
    region("California", "CA", 32.5, -124.4, 42.0, -114.1),
    region("Colorado", "CO", 37.0, -109.1, 41.0, -102.0),
    region("Hawaii", "HI", 18.9, -160.3, 22.2, -154.8),
    region("Idaho", "ID", 42.0, -117.2, 49.0, -111.0),
    region("Maine", "ME", 43.0, -71.1, 47.5, -66.9),
    region("Montana", "MT", 44.4, -116.1, 49.0, -104.0),
    region("Nevada", "NV", 35.0, -120.0, 42.0, -114.0),
    region("New Hampshire", "NH", 42.7, -72.6, 45.3, -70.6),
    region("New Mexico", "NM", 31.3, -109.1, 37.0, -103.0),
    region("New York", "NY", 40.5, -79.8, 45.0, -71.8),
    region("North Carolina", "NC", 33.8, -84.3, 36.6, -75.4),
    region("Oregon", "OR", 41.99, -124.6, 46.3, -116.5),
    region("Tennessee", "TN", 35.0, -90.3, 36.7, -81.6),
    region("Utah", "UT", 37.0, -114.1, 42.0, -109.0),
    region("Vermont", "VT", 42.7, -73.4, 45.0, -71.5),
    region("Virginia", "VA", 36.5, -83.7, 39.5, -75.2),
    region("Washington", "WA", 45.5, -124.8, 49.0, -116.9),
    region("Wyoming", "WY", 41.0, -111.1, 45.0, -104.1),
];

/// Find the region a free-text location refers to.
///
/// Accepts the state name in any of the forms the location filter accepts
/// ("Oregon", "Oregon, USA", "Bend, Oregon") or its two-letter code.
pub fn resolve_region(text: &str) -> Option<&'static Region> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    REGIONS.iter().find(|r| {
        let name = r.name.to_lowercase();
        needle == r.abbreviation.to_lowercase()
            || needle == name
            || needle.split(',').any(|part| part.trim() == name)
    })
}

// ─── Difficulty ──────────────────────────────────────────────────────────────

/// Difficulty from length and climb when nothing better is known.
pub fn infer_difficulty(distance_meters: f64, elevation_gain_meters: f64) -> Difficulty {
    let km = distance_meters / 1000.0;
    if km > 15.0 || elevation_gain_meters > 1000.0 {
        Difficulty::Expert
    } else if km > 10.0 || elevation_gain_meters > 500.0 {
        Difficulty::Hard
    } else if km > 5.0 || elevation_gain_meters > 200.0 {
        Difficulty::Moderate
    } else {
        Difficulty::Easy
    }
}

/// Difficulty from OSM tags (`difficulty`, then `sac_scale`).
fn tagged_difficulty(tags: &HashMap<String, String>) -> Option<Difficulty> {
    if let Some(d) = tags.get("difficulty").and_then(|v| v.parse().ok()) {
        return Some(d);
    }

    match tags.get("sac_scale").map(String::as_str) {
        Some("hiking") => Some(Difficulty::Easy),
        Some("mountain_hiking") => Some(Difficulty::Moderate),
        Some("demanding_mountain_hiking") => Some(Difficulty::Hard),
        Some("alpine_hiking" | "demanding_alpine_hiking" | "difficult_alpine_hiking") => {
            Some(Difficulty::Expert)
        }
        _ => None,
    }
}

/// Parse an OSM length tag ("12.5", "12.5 km", "800 m") into meters.
fn parse_distance_tag(raw: &str) -> Option<f64> {
    let raw = raw.trim().to_lowercase();
    let (number, meters_per_unit) = if let Some(n) = raw.strip_suffix("km") {
        (n, 1000.0)
    } else if let Some(n) = raw.strip_suffix("mi") {
        (n, 1609.344)
    } else if let Some(n) = raw.strip_suffix('m') {
        (n, 1.0)
    } else {
        // OSM `distance` defaults to kilometers
        (raw.as_str(), 1000.0)
    };

    number
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0)
        .map(|v| v * meters_per_unit)
}

/// Great-circle length of a path in meters.
pub fn path_length_meters(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|pair| Haversine.distance(pair[0].to_point(), pair[1].to_point()))
        .sum()
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OverpassMember {
    #[serde(default)]
    geometry: Vec<LatLon>,
}

/// A way or relation returned with `out geom`.
#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<LatLon>,
    #[serde(default)]
    members: Vec<OverpassMember>,
}

impl OverpassElement {
    /// Convert to a trail record. Unnamed elements and elements with fewer
    /// than two points are skipped.
    pub fn into_trail(self, location: &str, now: &str) -> Option<Trail> {
        let name = self.tags.get("name")?.trim().to_string();
        if name.is_empty() {
            return None;
        }

        let points: Vec<LatLon> = if self.geometry.is_empty() {
            self.members
                .into_iter()
                .flat_map(|m| m.geometry)
                .collect()
        } else {
            self.geometry
        };
        let path: Vec<Coordinate> = points
            .iter()
            .map(|p| Coordinate::new(p.lat, p.lon))
            .collect();
        if path.len() < 2 {
            return None;
        }

        let distance = self
            .tags
            .get("distance")
            .and_then(|d| parse_distance_tag(d))
            .unwrap_or_else(|| path_length_meters(&path));
        let elevation_gain = self
            .tags
            .get("ascent")
            .and_then(|a| a.trim().trim_end_matches('m').trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        let elevation_loss = self
            .tags
            .get("descent")
            .and_then(|a| a.trim().trim_end_matches('m').trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        let difficulty = tagged_difficulty(&self.tags)
            .unwrap_or_else(|| infer_difficulty(distance, elevation_gain));

        Some(Trail {
            id: format!("osm-{}-{}", self.kind, self.id),
            description: self.tags.get("description").cloned().unwrap_or_default(),
            name,
            location: location.to_string(),
            coordinate: path[0],
            path,
            distance,
            elevation_gain,
            elevation_loss,
            difficulty,
            rating: 0.0,
            rating_count: 0,
            post_count: 0,
            source: TrailSource::Osm,
            created_by: None,
            created_at: now.to_string(),
        })
    }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Keep only characters that are safe inside an Overpass regex literal.
fn sanitize_term(term: &str) -> String {
    term.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Build the Overpass QL query for named hiking ways and routes in a box.
pub fn build_query(bounds: BoundingBox, term: Option<&str>) -> String {
    let name_filter = match term.map(sanitize_term).filter(|t| !t.is_empty()) {
        Some(term) => format!(r#"["name"~"{}",i]"#, term),
        None => r#"["name"]"#.to_string(),
    };
    let bbox = format!(
        "{},{},{},{}",
        bounds.south, bounds.west, bounds.north, bounds.east
    );

    format!(
        r#"[out:json][timeout:{timeout}];
(
  way["highway"~"^(path|footway|track)$"]{name}({bbox});
  relation["route"="hiking"]{name}({bbox});
);
out geom {max};"#,
        timeout = QUERY_TIMEOUT_SECS,
        name = name_filter,
        bbox = bbox,
        max = MAX_ELEMENTS,
    )
}

/// Overpass API client.
#[derive(Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Fetch named trail elements within `bounds`, optionally matching `term`.
    pub async fn fetch_trails(
        &self,
        bounds: BoundingBox,
        term: Option<&str>,
    ) -> Result<Vec<OverpassElement>, OverpassError> {
        let query = build_query(bounds, term);
        tracing::debug!(endpoint = %self.endpoint, "Querying Overpass");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Overpass rate limit hit (429)");
            return Err(OverpassError::RateLimited);
        }
        if !status.is_success() {
            return Err(OverpassError::Status(status.as_u16()));
        }

        let parsed: OverpassResponse = response.json().await?;
        Ok(parsed.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2024-06-01T00:00:00.000Z";

    fn element(json: serde_json::Value) -> OverpassElement {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_infer_difficulty_thresholds() {
        assert_eq!(infer_difficulty(12_000.0, 0.0), Difficulty::Hard);
        assert_eq!(infer_difficulty(3_000.0, 250.0), Difficulty::Moderate);
        assert_eq!(infer_difficulty(1_000.0, 10.0), Difficulty::Easy);
        assert_eq!(infer_difficulty(16_000.0, 0.0), Difficulty::Expert);
        assert_eq!(infer_difficulty(2_000.0, 1_200.0), Difficulty::Expert);
    }

    #[test]
    fn test_resolve_region_variants() {
        assert_eq!(resolve_region("Oregon").map(|r| r.name), Some("Oregon"));
        assert_eq!(resolve_region("oregon, usa").map(|r| r.name), Some("Oregon"));
        assert_eq!(resolve_region("Bend, Oregon").map(|r| r.name), Some("Oregon"));
        assert_eq!(resolve_region("WA").map(|r| r.name), Some("Washington"));
        assert!(resolve_region("Atlantis").is_none());
        assert!(resolve_region("  ").is_none());
    }

    #[test]
    fn test_way_without_distance_tag_uses_path_length() {
        let trail = element(serde_json::json!({
            "type": "way",
            "id": 42,
            "tags": { "name": "Ridge Path", "highway": "path" },
            "geometry": [
                { "lat": 45.00, "lon": -121.7 },
                { "lat": 45.01, "lon": -121.7 }
            ]
        }))
        .into_trail("Oregon, USA", NOW)
        .unwrap();

        assert_eq!(trail.id, "osm-way-42");
        assert_eq!(trail.source, TrailSource::Osm);
        assert_eq!(trail.location, "Oregon, USA");
        assert!((trail.distance - 1_112.0).abs() < 5.0, "got {}", trail.distance);
        assert_eq!(trail.difficulty, Difficulty::Easy);
        assert_eq!(trail.coordinate, Coordinate::new(45.00, -121.7));
    }

    #[test]
    fn test_relation_uses_tags_and_member_geometry() {
        let trail = element(serde_json::json!({
            "type": "relation",
            "id": 7,
            "tags": { "name": "Timberline Trail", "distance": "12 km", "sac_scale": "alpine_hiking" },
            "members": [
                { "geometry": [ { "lat": 45.3, "lon": -121.7 }, { "lat": 45.31, "lon": -121.7 } ] },
                { "geometry": [ { "lat": 45.32, "lon": -121.7 } ] }
            ]
        }))
        .into_trail("Oregon, USA", NOW)
        .unwrap();

        assert_eq!(trail.distance, 12_000.0);
        assert_eq!(trail.difficulty, Difficulty::Expert);
        assert_eq!(trail.path.len(), 3);
    }

    #[test]
    fn test_unnamed_or_degenerate_elements_are_skipped() {
        let unnamed = element(serde_json::json!({
            "type": "way", "id": 1,
            "geometry": [ { "lat": 1.0, "lon": 1.0 }, { "lat": 1.1, "lon": 1.0 } ]
        }));
        assert!(unnamed.into_trail("X", NOW).is_none());

        let single_point = element(serde_json::json!({
            "type": "way", "id": 2, "tags": { "name": "Stub" },
            "geometry": [ { "lat": 1.0, "lon": 1.0 } ]
        }));
        assert!(single_point.into_trail("X", NOW).is_none());
    }

    #[test]
    fn test_parse_distance_tag_units() {
        assert_eq!(parse_distance_tag("12.5"), Some(12_500.0));
        assert_eq!(parse_distance_tag("800 m"), Some(800.0));
        assert_eq!(parse_distance_tag("3,5 km"), Some(3_500.0));
        assert!(parse_distance_tag("far").is_none());
    }

    #[test]
    fn test_query_sanitizes_term() {
        let oregon = resolve_region("Oregon").unwrap();
        let query = build_query(oregon.bounds, Some(r#"Eagle "Creek"\"#));
        assert!(query.contains(r#"["name"~"Eagle Creek",i]"#));
        assert!(query.contains("41.99,-124.6,46.3,-116.5"));

        let query = build_query(oregon.bounds, None);
        assert!(query.contains(r#"["name"]"#));
    }
}
