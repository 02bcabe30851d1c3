// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Shared helpers for date/time formatting.
//!
//! Timestamps are stored as RFC3339 strings with millisecond precision and a
//! `Z` suffix so that lexicographic order in Firestore equals time order.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored timestamp format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}
