// ABOUTME: Chatbot turn route: one user message in, one assistant reply out
// ABOUTME: Optionally appends the exchange to a stored conversation and records its outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Chat routes
//!
//! The turn itself is handled by the [`ChatOrchestrator`](crate::chat::ChatOrchestrator).
//! When the request names a conversation the caller owns, the user line and the
//! reply line are appended to its transcript after the turn completes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::authenticate;
use crate::chat::{ChatReply, HistoryMessage};
use crate::constants::chat::{BOT_PREFIX, MAX_MESSAGE_CHARS, USER_PREFIX};
use crate::errors::AppError;
use crate::resources::ServerResources;

use super::conversations::load_accessible_conversation;

/// Request body for a chat turn
#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    /// New user message
    pub message: String,
    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    /// Stored conversation to append this exchange to
    #[serde(default)]
    pub conversation_id: Option<i64>,
}

/// Response body for a chat turn
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    /// Assistant reply text
    pub response: String,
}

/// Chat routes
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::send_message))
            .with_state(resources)
    }

    fn validate_message(message: &str) -> Result<&str, AppError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("Message cannot be empty"));
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::invalid_input(format!(
                "Message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }
        Ok(trimmed)
    }

    /// Handle one chatbot turn
    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatTurnRequest>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        let message = Self::validate_message(&request.message)?;

        if let Some(conversation_id) = request.conversation_id {
            load_accessible_conversation(&resources, &user, conversation_id).await?;
        }

        let reply = resources
            .orchestrator
            .handle_turn(message, &request.history, &user.to_ref())
            .await?;

        info!(
            user_id = user.id,
            intent = reply.intent.map(|kind| kind.name()),
            succeeded = reply.succeeded,
            "Chat turn completed"
        );

        if let Some(conversation_id) = request.conversation_id {
            Self::record_exchange(&resources, conversation_id, message, &reply).await;
        }

        Ok(Json(ChatTurnResponse {
            response: reply.response,
        })
        .into_response())
    }

    /// Append the exchange and outcome; failures are logged, never surfaced
    async fn record_exchange(
        resources: &ServerResources,
        conversation_id: i64,
        message: &str,
        reply: &ChatReply,
    ) {
        let lines = [
            format!("{USER_PREFIX}{message}"),
            format!("{BOT_PREFIX}{}", reply.response),
        ];
        if let Err(e) = resources
            .conversations
            .append_messages(conversation_id, &lines)
            .await
        {
            warn!(conversation_id, error = %e, "Failed to append chat exchange");
            return;
        }

        if let Some(outcome) = reply.outcome() {
            if let Err(e) = resources
                .conversations
                .set_outcome(conversation_id, outcome)
                .await
            {
                warn!(conversation_id, error = %e, "Failed to record conversation outcome");
            }
        }
    }
}
