// ABOUTME: Administrator data routes for reviewing chatbot conversations
// ABOUTME: Paginated, filterable listing of every stored transcript
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::debug;

use crate::auth::{authenticate, require_admin};
use crate::errors::AppError;
use crate::models::PaginationParams;
use crate::resources::ServerResources;

/// Admin routes
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/chatbot-data", get(Self::chatbot_data))
            .with_state(resources)
    }

    /// Page of conversations as `{items, length, params}`
    async fn chatbot_data(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<PaginationParams>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        require_admin(&user)?;

        let page = resources.conversations.list_conversations(&params).await?;
        debug!(
            admin_id = user.id,
            page = params.page,
            returned = page.items.len(),
            total = page.length,
            "Listed chatbot conversations"
        );
        Ok(Json(page).into_response())
    }
}
