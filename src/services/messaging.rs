// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! One-to-one conversations.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{conversation_id, Conversation, Message};
use crate::time_utils::now_rfc3339;

/// Longest message preview kept on the conversation document.
const PREVIEW_CHARS: usize = 100;
/// Default number of messages returned.
pub const DEFAULT_MESSAGE_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct MessagingService {
    db: FirestoreDb,
}

impl MessagingService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Send a message from `sender` to `recipient`, creating the
    /// conversation on first contact.
    pub async fn send_message(
        &self,
        sender: &str,
        recipient: &str,
        text: &str,
        shared_post_id: Option<String>,
    ) -> Result<Message, AppError> {
        if sender == recipient {
            return Err(AppError::BadRequest(
                "Cannot message yourself".to_string(),
            ));
        }

        let now = now_rfc3339();
        let conversation_id = conversation_id(sender, recipient);
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender.to_string(),
            text: text.to_string(),
            shared_post_id,
            created_at: now.clone(),
        };

        let mut participants = vec![sender.to_string(), recipient.to_string()];
        participants.sort();

        let preview = if message.text.is_empty() && message.shared_post_id.is_some() {
            "Shared a post".to_string()
        } else {
            message.text.chars().take(PREVIEW_CHARS).collect()
        };

        self.db
            .upsert_conversation(&Conversation {
                id: conversation_id.clone(),
                participants,
                last_message: preview,
                updated_at: now,
            })
            .await?;
        self.db.add_message(&conversation_id, &message).await?;

        tracing::debug!(conversation = %conversation_id, "Message sent");
        Ok(message)
    }

    /// Messages between `uid` and `other`, newest first.
    ///
    /// Only a participant may read a conversation; a conversation that does
    /// not exist yet is empty.
    pub async fn list_messages(
        &self,
        uid: &str,
        other: &str,
        limit: u32,
    ) -> Result<Vec<Message>, AppError> {
        let id = conversation_id(uid, other);
        let Some(conversation) = self.db.get_conversation(&id).await? else {
            return Ok(Vec::new());
        };
        if !conversation.includes(uid) {
            return Err(AppError::Forbidden(
                "Not a participant in this conversation".to_string(),
            ));
        }

        self.db.get_messages(&id, limit).await
    }
}
