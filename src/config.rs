// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Firebase Storage bucket for profile pictures and post images
    pub storage_bucket: String,
    /// Overpass API endpoint used to augment trail searches
    pub overpass_url: String,
    /// Whether trail searches may import trails from OpenStreetMap
    pub trail_augmentation: bool,
    /// How often each feed chunk is refreshed
    pub feed_poll_interval: Duration,
    /// Debounce delay for search-as-you-type requests
    pub search_debounce: Duration,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Bearer token for Firebase Storage uploads
    pub storage_access_token: Option<String>,
}

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_FEED_POLL_SECS: u64 = 5;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

impl Config {
    /// Config for tests: no debounce, fast feed refresh, augmentation off.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:8081".to_string(),
            port: 8080,
            storage_bucket: "test-bucket".to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            trail_augmentation: false,
            feed_poll_interval: Duration::from_millis(50),
            search_debounce: Duration::ZERO,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            storage_access_token: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());

        Ok(Self {
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", gcp_project_id)),
            gcp_project_id,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            port: parse_or("PORT", 8080)?,
            overpass_url: env::var("OVERPASS_URL")
                .unwrap_or_else(|_| DEFAULT_OVERPASS_URL.to_string()),
            trail_augmentation: parse_or("TRAIL_AUGMENTATION", true)?,
            feed_poll_interval: Duration::from_secs(parse_or(
                "FEED_POLL_SECS",
                DEFAULT_FEED_POLL_SECS,
            )?),
            search_debounce: Duration::from_millis(parse_or(
                "SEARCH_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )?),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            storage_access_token: env::var("STORAGE_ACCESS_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

/// Parse an optional environment variable, falling back to a default when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
