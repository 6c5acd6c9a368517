// ABOUTME: Room routes: list every room and let administrators toggle availability
// ABOUTME: Unavailable rooms are ignored by availability searches and cannot be reserved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{authenticate, require_admin};
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Result of an availability toggle
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomAvailabilityResponse {
    /// Room id
    pub id: String,
    /// Availability after the toggle
    pub is_available: bool,
}

/// Room routes
pub struct RoomRoutes;

impl RoomRoutes {
    /// Create all room routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/room", get(Self::list_rooms))
            .route(
                "/api/rooms/:id/toggle-availability",
                patch(Self::toggle_availability),
            )
            .with_state(resources)
    }

    async fn list_rooms(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources.database).await?;
        let rooms = resources.database.list_rooms().await?;
        Ok(Json(rooms).into_response())
    }

    async fn toggle_availability(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = authenticate(&headers, &resources.database).await?;
        require_admin(&user)?;

        let room = resources
            .database
            .toggle_room_availability(&id.trim().to_uppercase())
            .await?;

        info!(
            room_id = %room.id,
            is_available = room.is_available,
            admin_id = user.id,
            "Toggled room availability"
        );
        Ok(Json(RoomAvailabilityResponse {
            id: room.id,
            is_available: room.is_available,
        })
        .into_response())
    }
}
