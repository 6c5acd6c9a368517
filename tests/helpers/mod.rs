// ABOUTME: Shared helper modules for integration tests
// ABOUTME: Re-exports the axum request builder used by route tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

pub mod axum_test;
