// ABOUTME: Application constants for booking policy, chat defaults and service identity
// ABOUTME: Values shared by the prompt builder, the dispatcher and the bundled collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

/// Service identity
pub mod service {
    /// Service name reported by health checks
    pub const SERVICE_NAME: &str = "coworking-chat-server";
    /// Crate version
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Booking policy enforced by the bundled reservation collaborator
pub mod booking {
    pub use coworking_core::models::SLOT_MINUTES;

    /// Longest reservation a user may hold, in minutes
    pub const MAX_RESERVATION_MINUTES: i64 = 120;
}

/// Chat defaults
pub mod chat {
    /// Reply used when the model returns no content
    pub const FALLBACK_REPLY: &str = "I'm not sure how to help with that.";

    /// Prior messages forwarded to the model when not configured
    pub const DEFAULT_HISTORY_LIMIT: usize = 20;

    /// Longest user message accepted by `POST /api/chat`
    pub const MAX_MESSAGE_CHARS: usize = 4000;

    /// Transcript prefix for user lines
    pub const USER_PREFIX: &str = "User: ";

    /// Transcript prefix for assistant lines
    pub const BOT_PREFIX: &str = "Bot: ";
}

/// Date and time formats
pub mod formats {
    /// Storage format for instants
    pub const DATETIME_STORAGE: &str = "%Y-%m-%dT%H:%M:%S";

    /// Storage format for dates
    pub const DATE_STORAGE: &str = "%Y-%m-%d";

    /// Clock time shown to users ("02:30PM")
    pub const TIME_DISPLAY: &str = "%I:%M%p";

    /// Date shown to users ("Monday, April 21, 2025")
    pub const DATE_DISPLAY: &str = "%A, %B %-d, %Y";
}
