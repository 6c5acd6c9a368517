// ABOUTME: Main library entry point for the coworking room reservation chatbot server
// ABOUTME: Wires LLM function calling to the reservation and office-hours collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Coworking Chat Server
//!
//! An HTTP service that lets students reserve study rooms and reach office
//! hours through a chatbot. User messages are forwarded to an LLM together
//! with a catalog of callable functions; when the model picks a function, the
//! call is decoded into a typed [`tools::Intent`], executed against the
//! reservation or office-hours collaborator, and rendered back to text.
//!
//! ## Architecture
//!
//! - **`availability`**: turns per-slot occupancy flags into free time ranges
//! - **`tools`**: function catalog, intent decoding and the dispatcher
//! - **`chat`**: prompt assembly and routing of the model's decision
//! - **`llm`**: provider trait and an OpenAI-compatible HTTP client
//! - **`services`**: collaborator traits and the injected clock
//! - **`database`**: `SQLite` storage for conversations and the bundled collaborators
//! - **`routes`**: axum HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use coworking_chat_server::config::environment::ServerConfig;
//! use coworking_chat_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Coworking chat server configured with port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Unified error handling (re-exported from `coworking-core`)
pub use coworking_core::errors;

/// Domain models (re-exported from `coworking-core`)
pub use coworking_core::models;

/// Caller identity resolution
pub mod auth;

/// Free time range computation over slot arrays
pub mod availability;

/// Chat orchestration: prompt assembly and LLM decision routing
pub mod chat;

/// Environment-based configuration
pub mod config;

/// Application constants and booking policy values
pub mod constants;

/// `SQLite` persistence and bundled collaborator implementations
pub mod database;

/// Health checks
pub mod health;

/// LLM provider abstraction
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Shared server resources handed to every router
pub mod resources;

/// HTTP routes
pub mod routes;

/// Collaborator traits and time source
pub mod services;

/// Function catalog, intent decoding and dispatch
pub mod tools;
