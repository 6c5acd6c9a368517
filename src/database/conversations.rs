// ABOUTME: Database operations for chatbot conversation transcripts
// ABOUTME: Create, read, append, rate and end conversations; paginated admin listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{decode_datetime, encode_datetime};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ConversationOutcome, ConversationRecord, NewConversation, Paginated, PaginationParams,
};
use crate::services::Clock;

/// Lowest accepted feedback rating
pub const MIN_RATING: i32 = 1;
/// Highest accepted feedback rating
pub const MAX_RATING: i32 = 5;

const SELECT_COLUMNS: &str =
    "SELECT id, created_at, user_id, chat_history, rating, feedback, outcome FROM conversations";

/// Conversation database operations manager
#[derive(Clone)]
pub struct ConversationManager {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ConversationManager {
    /// Create a new conversation manager
    #[must_use]
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Store a conversation supplied by the client
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be encoded or the insert fails
    pub async fn create_conversation(
        &self,
        user_id: i64,
        conversation: &NewConversation,
    ) -> AppResult<ConversationRecord> {
        let created_at = self.clock.now();
        let history = serde_json::to_string(&conversation.chat_history)
            .map_err(|e| AppError::internal(format!("Failed to encode chat history: {e}")))?;

        let result = sqlx::query(
            r"
            INSERT INTO conversations (created_at, user_id, chat_history, rating, feedback, outcome)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(encode_datetime(created_at))
        .bind(user_id)
        .bind(&history)
        .bind(conversation.rating)
        .bind(&conversation.feedback)
        .bind(conversation.outcome.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(ConversationRecord {
            id: result.last_insert_rowid(),
            created_at,
            user_id,
            chat_history: conversation.chat_history.clone(),
            rating: conversation.rating,
            feedback: conversation.feedback.clone(),
            outcome: conversation.outcome,
        })
    }

    /// Open an empty conversation for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn start_conversation(&self, user_id: i64) -> AppResult<ConversationRecord> {
        self.create_conversation(
            user_id,
            &NewConversation {
                chat_history: Vec::new(),
                rating: 0,
                feedback: String::new(),
                outcome: ConversationOutcome::RequestedInformation,
            },
        )
        .await
    }

    /// Get a conversation by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is malformed
    pub async fn get_conversation(
        &self,
        conversation_id: i64,
    ) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.as_ref().map(row_to_conversation).transpose()
    }

    /// All conversations of a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed
    pub async fn get_user_conversations(&self, user_id: i64) -> AppResult<Vec<ConversationRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list user conversations: {e}")))?;

        rows.iter().map(row_to_conversation).collect()
    }

    /// Mark a conversation as ended without completing a request
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown id, or a database error
    pub async fn end_conversation(&self, conversation_id: i64) -> AppResult<()> {
        if self
            .set_outcome(conversation_id, ConversationOutcome::Cancelled)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::not_found(format!(
                "Conversation {conversation_id} not found"
            )))
        }
    }

    /// Set the outcome; returns whether the conversation exists
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn set_outcome(
        &self,
        conversation_id: i64,
        outcome: ConversationOutcome,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE conversations SET outcome = $1
            WHERE id = $2
            ",
        )
        .bind(outcome.as_str())
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to set conversation outcome: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Append transcript lines; returns whether the conversation exists
    ///
    /// # Errors
    ///
    /// Returns an error if the stored history is malformed or the update fails
    pub async fn append_messages(&self, conversation_id: i64, lines: &[String]) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let Some(row) = sqlx::query("SELECT chat_history FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to read chat history: {e}")))?
        else {
            return Ok(false);
        };

        let mut history = decode_history(&row.get::<String, _>("chat_history"))?;
        history.extend_from_slice(lines);
        let encoded = serde_json::to_string(&history)
            .map_err(|e| AppError::internal(format!("Failed to encode chat history: {e}")))?;

        sqlx::query("UPDATE conversations SET chat_history = $1 WHERE id = $2")
            .bind(&encoded)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to append chat history: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit chat history: {e}")))?;
        Ok(true)
    }

    /// Record the user's rating and feedback; returns whether the conversation exists
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a rating outside `1..=5`, or a database error
    pub async fn submit_feedback(
        &self,
        conversation_id: i64,
        rating: i32,
        feedback: &str,
    ) -> AppResult<bool> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::invalid_input(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let result = sqlx::query(
            r"
            UPDATE conversations SET rating = $1, feedback = $2
            WHERE id = $3
            ",
        )
        .bind(rating)
        .bind(feedback.trim())
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to submit feedback: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Page through every conversation
    ///
    /// `filter` matches transcript, feedback and outcome text case-insensitively.
    /// `order_by` is `rating` or `created_at` (default); both sort newest/highest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a stored row is malformed
    pub async fn list_conversations(
        &self,
        params: &PaginationParams,
    ) -> AppResult<Paginated<ConversationRecord>> {
        let filter = params.filter.trim().to_lowercase();
        let pattern = format!("%{filter}%");
        let where_clause = r"
            WHERE $1 = ''
               OR lower(chat_history) LIKE $2
               OR lower(feedback) LIKE $2
               OR lower(outcome) LIKE $2
        ";
        let order_clause = match params.order_by.trim() {
            "rating" => "ORDER BY rating DESC, id DESC",
            _ => "ORDER BY created_at DESC, id DESC",
        };

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM conversations {where_clause}"
        ))
        .bind(&filter)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count conversations: {e}")))?;

        let limit = i64::from(params.limit());
        let offset = i64::try_from(params.offset())
            .map_err(|_| AppError::invalid_input("Page is out of range"))?;

        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} {where_clause} {order_clause} LIMIT $3 OFFSET $4"
        ))
        .bind(&filter)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        let items = rows
            .iter()
            .map(row_to_conversation)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Paginated {
            items,
            length: u64::try_from(total).unwrap_or_default(),
            params: PaginationParams {
                page_size: params.limit(),
                ..params.clone()
            },
        })
    }
}

fn decode_history(raw: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::database(format!("Stored chat history is malformed: {e}")))
}

fn row_to_conversation(r: &SqliteRow) -> AppResult<ConversationRecord> {
    let created_at =
        decode_datetime(&r.get::<String, _>("created_at")).map_err(AppError::database)?;
    let outcome = r
        .get::<String, _>("outcome")
        .parse::<ConversationOutcome>()?;

    Ok(ConversationRecord {
        id: r.get("id"),
        created_at,
        user_id: r.get("user_id"),
        chat_history: decode_history(&r.get::<String, _>("chat_history"))?,
        rating: r.get("rating"),
        feedback: r.get("feedback"),
        outcome,
    })
}
