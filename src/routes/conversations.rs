// ABOUTME: Conversation store routes: create, start, read, end and rate chatbot transcripts
// ABOUTME: Callers see their own conversations; administrators may read anyone's
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::authenticate;
use crate::errors::AppError;
use crate::models::{ConversationRecord, NewConversation, User};
use crate::resources::ServerResources;

/// Feedback submitted at the end of a conversation
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// Rating from 1 to 5
    pub rating: i32,
    /// Free-form comment
    #[serde(default)]
    pub feedback: String,
}

/// Load a conversation the caller may access
///
/// # Errors
///
/// Returns not-found for an unknown id and permission-denied when the caller
/// neither owns the conversation nor is an administrator.
pub(crate) async fn load_accessible_conversation(
    resources: &ServerResources,
    user: &User,
    conversation_id: i64,
) -> Result<ConversationRecord, AppError> {
    let conversation = resources
        .conversations
        .get_conversation(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Conversation {conversation_id} not found")))?;

    if conversation.user_id != user.id && !user.is_admin {
        return Err(AppError::permission_denied(
            "Conversation belongs to another user",
        ));
    }
    Ok(conversation)
}

/// Conversation routes
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Create all conversation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/conversations", post(Self::create_conversation))
            .route("/api/conversations/start", post(Self::start_conversation))
            .route("/api/conversations/me", get(Self::get_my_conversations))
            .route(
                "/api/conversations/user/:user_id",
                get(Self::get_user_conversations),
            )
            .route("/api/conversations/:id", get(Self::get_conversation))
            .route("/api/conversations/:id/end", put(Self::end_conversation))
            .route(
                "/api/conversations/:id/feedback",
                put(Self::submit_feedback),
            )
            .with_state(resources)
    }

    /// Store a client-supplied conversation for the caller
    async fn create_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<NewConversation>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        let conversation = resources
            .conversations
            .create_conversation(user.id, &request)
            .await?;

        info!(conversation_id = conversation.id, user_id = user.id, "Created conversation");
        Ok((StatusCode::CREATED, Json(conversation)).into_response())
    }

    /// Open an empty conversation for the caller
    async fn start_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        let conversation = resources.conversations.start_conversation(user.id).await?;

        info!(conversation_id = conversation.id, user_id = user.id, "Started conversation");
        Ok((StatusCode::CREATED, Json(conversation)).into_response())
    }

    async fn get_my_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        let conversations = resources
            .conversations
            .get_user_conversations(user.id)
            .await?;
        Ok(Json(conversations).into_response())
    }

    /// List another user's conversations (self or administrator)
    async fn get_user_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        if user.id != user_id && !user.is_admin {
            return Err(AppError::permission_denied(
                "Cannot list another user's conversations",
            ));
        }

        let conversations = resources
            .conversations
            .get_user_conversations(user_id)
            .await?;
        Ok(Json(conversations).into_response())
    }

    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<i64>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        let conversation = load_accessible_conversation(&resources, &user, id).await?;
        Ok(Json(conversation).into_response())
    }

    /// Mark a conversation as cancelled
    async fn end_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<i64>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        load_accessible_conversation(&resources, &user, id).await?;
        resources.conversations.end_conversation(id).await?;

        info!(conversation_id = id, user_id = user.id, "Ended conversation");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    async fn submit_feedback(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<i64>,
        Json(request): Json<FeedbackRequest>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        load_accessible_conversation(&resources, &user, id).await?;

        let updated = resources
            .conversations
            .submit_feedback(id, request.rating, &request.feedback)
            .await?;
        if !updated {
            return Err(AppError::not_found(format!("Conversation {id} not found")));
        }

        let conversation = load_accessible_conversation(&resources, &user, id).await?;
        Ok(Json(conversation).into_response())
    }
}
