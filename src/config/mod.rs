// ABOUTME: Configuration module root for the coworking chat server
// ABOUTME: Environment-driven server, logging and model provider settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

/// Environment variable parsing
pub mod environment;

pub use environment::{LogFormat, LoggingConfig, ServerConfig};
