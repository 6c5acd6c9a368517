// ABOUTME: Chatbot conversation transcript DTOs and the terminal outcome enum
// ABOUTME: Canonical definitions shared by the conversation store and its REST routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// How a chatbot conversation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationOutcome {
    /// The user reserved (or re-booked) a room
    #[serde(rename = "Reserved Room")]
    ReservedRoom,
    /// The user only asked for information
    #[serde(rename = "Requested Information")]
    RequestedInformation,
    /// The user submitted an office hours ticket
    #[serde(rename = "Submitted OH Ticket")]
    SubmittedTicket,
    /// The conversation was ended without completing a request
    #[serde(rename = "Cancelled Request")]
    Cancelled,
}

impl ConversationOutcome {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReservedRoom => "RESERVED_ROOM",
            Self::RequestedInformation => "REQUESTED_INFORMATION",
            Self::SubmittedTicket => "SUBMITTED_OH_TICKET",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ConversationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationOutcome {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED_ROOM" => Ok(Self::ReservedRoom),
            "REQUESTED_INFORMATION" => Ok(Self::RequestedInformation),
            "SUBMITTED_OH_TICKET" => Ok(Self::SubmittedTicket),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(AppError::internal(format!(
                "Unknown conversation outcome: {other}"
            ))),
        }
    }
}

/// Persisted conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Conversation id
    pub id: i64,
    /// When the conversation was created
    pub created_at: NaiveDateTime,
    /// Owning user
    pub user_id: i64,
    /// Ordered transcript lines ("User: ...", "Bot: ...")
    pub chat_history: Vec<String>,
    /// Star rating, 0 when not rated
    pub rating: i32,
    /// Free-text feedback
    pub feedback: String,
    /// Terminal outcome
    pub outcome: ConversationOutcome,
}

/// Fields supplied when creating a conversation record directly
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewConversation {
    /// Initial transcript
    #[serde(default)]
    pub chat_history: Vec<String>,
    /// Initial rating
    #[serde(default)]
    pub rating: i32,
    /// Initial feedback
    #[serde(default)]
    pub feedback: String,
    /// Initial outcome
    #[serde(default = "default_outcome")]
    pub outcome: ConversationOutcome,
}

const fn default_outcome() -> ConversationOutcome {
    ConversationOutcome::RequestedInformation
}
