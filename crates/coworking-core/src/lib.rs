// ABOUTME: Core types shared between the coworking chat server and its collaborators
// ABOUTME: Exposes the unified error type and the reservation, office-hours and conversation models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

#![deny(unsafe_code)]

//! # Coworking Core
//!
//! Plain data types with no I/O. The server crate depends on these for its
//! HTTP payloads, its `SQLite` managers and its collaborator traits.

/// Unified error type and error codes
pub mod errors;

/// Domain models
pub mod models;
