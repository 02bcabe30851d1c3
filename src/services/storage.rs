// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Firebase Storage client for profile pictures and post images.
//!
//! Handles:
//! - Object paths per upload kind
//! - Media uploads through the Storage REST API
//! - Mapping rule rejections (HTTP 403) to an actionable error

use serde::Deserialize;

use crate::error::AppError;

const STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";
/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// File extension for an accepted image content type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// `profile-pictures/{uid}.{ext}`
pub fn profile_picture_path(uid: &str, extension: &str) -> String {
    format!("profile-pictures/{}.{}", uid, extension)
}

/// `post-images/{uid}/{postId}/{timestamp}_{index}.{ext}`
pub fn post_image_path(
    uid: &str,
    post_id: &str,
    timestamp_ms: i64,
    index: usize,
    extension: &str,
) -> String {
    format!(
        "post-images/{}/{}/{}_{}.{}",
        uid, post_id, timestamp_ms, index, extension
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Firebase Storage REST client for one bucket.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
}

impl StorageClient {
    pub fn new(bucket: String, access_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: STORAGE_BASE_URL.to_string(),
            bucket,
            access_token,
        }
    }

    /// Upload `bytes` to `path` and return the object's download URL.
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Upload is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(format!(
                "Upload exceeds {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        let url = format!(
            "{}/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        );

        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::StoragePermissionDenied(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("JSON parse error: {}", e)))?;

        tracing::info!(path = %uploaded.name, "Uploaded object");
        Ok(self.download_url(&uploaded.name, uploaded.download_tokens.as_deref()))
    }

    /// Public download URL for an object.
    pub fn download_url(&self, path: &str, token: Option<&str>) -> String {
        // Several tokens may be comma separated; any one works
        let token = token.and_then(|t| t.split(',').next()).filter(|t| !t.is_empty());
        let mut url = format!(
            "{}/{}/o/{}?alt=media",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        );
        if let Some(token) = token {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(profile_picture_path("u1", "jpg"), "profile-pictures/u1.jpg");
        assert_eq!(
            post_image_path("u1", "p9", 1_717_200_000_000, 2, "png"),
            "post-images/u1/p9/1717200000000_2.png"
        );
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(extension_for_content_type("application/pdf"), None);
    }

    #[test]
    fn test_download_url_encodes_path() {
        let client = StorageClient::new("hika.appspot.com".to_string(), None);
        assert_eq!(
            client.download_url("profile-pictures/u1.jpg", Some("abc,def")),
            "https://firebasestorage.googleapis.com/v0/b/hika.appspot.com/o/profile-pictures%2Fu1.jpg?alt=media&token=abc"
        );
        assert!(!client
            .download_url("profile-pictures/u1.jpg", None)
            .contains("token"));
    }
}
