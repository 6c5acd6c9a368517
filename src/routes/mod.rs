// ABOUTME: Route module organization for the coworking chat server HTTP endpoints
// ABOUTME: Merges the domain routers and applies tracing, CORS, timeout and body-limit layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Route module for the coworking chat server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the orchestrator or a database manager.

/// Admin data routes
pub mod admin;
/// Chatbot turn route
pub mod chat;
/// Conversation store routes
pub mod conversations;
/// Health check route
pub mod health;
/// Room listing and availability toggle routes
pub mod rooms;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

pub use admin::AdminRoutes;
pub use chat::ChatRoutes;
pub use conversations::ConversationRoutes;
pub use health::HealthRoutes;
pub use rooms::RoomRoutes;

use crate::resources::ServerResources;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Build the complete application router with middleware
pub fn create_router(resources: &Arc<ServerResources>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(
            DefaultMakeSpan::new()
                .level(Level::INFO)
                .include_headers(false),
        )
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(ChatRoutes::routes(resources.clone()))
        .merge(ConversationRoutes::routes(resources.clone()))
        .merge(RoomRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(resources.config.request_timeout))
        .layer(trace_layer)
        .layer(cors)
}
