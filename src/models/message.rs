// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Direct-message conversations.

use serde::{Deserialize, Serialize};

/// Conversation between two users at `conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    /// Both participants, sorted
    pub participants: Vec<String>,
    #[serde(default)]
    pub last_message: String,
    pub updated_at: String,
}

impl Conversation {
    pub fn includes(&self, uid: &str) -> bool {
        self.participants.iter().any(|p| p == uid)
    }
}

/// Message stored at `conversations/{id}/messages/{messageId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    #[serde(default)]
    pub text: String,
    /// Set when the message shares a post
    pub shared_post_id: Option<String>,
    pub created_at: String,
}

/// Conversation id for an unordered pair of users.
///
/// The same id results regardless of who starts the conversation.
pub fn conversation_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}{}", a, b)
    } else {
        format!("{}{}", b, a)
    }
}
