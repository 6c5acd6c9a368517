// ABOUTME: Closed set of chatbot operations decoded once from an LLM function call
// ABOUTME: Each variant carries a typed argument struct; undecodable calls become IntentError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::llm::FunctionCall;
use crate::models::{ConversationOutcome, TicketType};

/// Name of an operation the model may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    /// `get_available_rooms`
    GetAvailableRooms,
    /// `get_room_availability`
    GetRoomAvailability,
    /// `reserve_room`
    ReserveRoom,
    /// `get_user_reservations`
    GetUserReservations,
    /// `get_reservation`
    GetReservation,
    /// `cancel_reservation`
    CancelReservation,
    /// `update_reservation`
    UpdateReservation,
    /// `change_reservation`
    ChangeReservation,
    /// `get_student_office_hours`
    GetStudentOfficeHours,
    /// `submit_ticket`
    SubmitTicket,
}

impl IntentKind {
    /// Every kind, in catalog order
    pub const ALL: [Self; 10] = [
        Self::GetAvailableRooms,
        Self::GetRoomAvailability,
        Self::ReserveRoom,
        Self::GetUserReservations,
        Self::GetReservation,
        Self::CancelReservation,
        Self::UpdateReservation,
        Self::ChangeReservation,
        Self::GetStudentOfficeHours,
        Self::SubmitTicket,
    ];

    /// Function name as offered to the model
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetAvailableRooms => "get_available_rooms",
            Self::GetRoomAvailability => "get_room_availability",
            Self::ReserveRoom => "reserve_room",
            Self::GetUserReservations => "get_user_reservations",
            Self::GetReservation => "get_reservation",
            Self::CancelReservation => "cancel_reservation",
            Self::UpdateReservation => "update_reservation",
            Self::ChangeReservation => "change_reservation",
            Self::GetStudentOfficeHours => "get_student_office_hours",
            Self::SubmitTicket => "submit_ticket",
        }
    }

    /// Look up a kind by function name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Conversation outcome recorded when this operation succeeds
    #[must_use]
    pub const fn outcome_on_success(self) -> Option<ConversationOutcome> {
        match self {
            Self::ReserveRoom | Self::ChangeReservation => Some(ConversationOutcome::ReservedRoom),
            Self::SubmitTicket => Some(ConversationOutcome::SubmittedTicket),
            _ => None,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure to turn a function call into an [`Intent`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    /// The model named a function that is not in the catalog
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// Arguments were not valid JSON or did not match the function's schema
    #[error("malformed arguments for {function}: {reason}")]
    MalformedArguments {
        /// Function whose arguments failed to decode
        function: IntentKind,
        /// Decoder message (describes the argument payload only)
        reason: String,
    },
}

impl IntentError {
    /// Text shown to the user in place of an answer
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownFunction(_) => {
                "Sorry, I tried to use an action I don't support. Could you rephrase your request?"
                    .to_owned()
            }
            Self::MalformedArguments { function, reason } => {
                format!("Sorry, I couldn't understand the details for {function}: {reason}.")
            }
        }
    }
}

/// Arguments carrying only a date
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateArgs {
    /// ISO-8601 date (or date-time, whose date part is used)
    pub date: String,
}

/// Arguments of `get_room_availability`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomAvailabilityArgs {
    /// Room code in any case
    pub room_id: String,
    /// ISO-8601 date
    pub date: String,
}

/// Arguments of `reserve_room`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReserveRoomArgs {
    /// Room code in any case
    pub room_id: String,
    /// ISO-8601 start
    pub start: String,
    /// ISO-8601 end
    pub end: String,
}

/// Arguments naming a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReservationIdArgs {
    /// Reservation id
    #[serde(deserialize_with = "lenient_id")]
    pub reservation_id: i64,
}

/// Arguments of `update_reservation` and `change_reservation`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeReservationArgs {
    /// Reservation id
    #[serde(deserialize_with = "lenient_id")]
    pub reservation_id: i64,
    /// ISO-8601 new start
    pub start: String,
    /// ISO-8601 new end
    pub end: String,
}

/// Arguments of `get_student_office_hours`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfficeHoursArgs {
    /// Course code as the user typed it ("COMP 423", "comp423")
    pub course_code: String,
}

/// Arguments of `submit_ticket`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitTicketArgs {
    /// Office hours event id
    #[serde(deserialize_with = "lenient_id")]
    pub office_hours_id: i64,
    /// What the student needs help with
    pub description: String,
    /// `0` conceptual, `1` assignment; anything else fails to decode
    pub ticket_type: TicketType,
}

/// Arguments of functions that take none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NoArgs {}

/// A decoded operation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// List rooms with at least one free slot on a date
    GetAvailableRooms(DateArgs),
    /// Free ranges of one room on a date
    GetRoomAvailability(RoomAvailabilityArgs),
    /// Draft a reservation for the actor
    ReserveRoom(ReserveRoomArgs),
    /// Current and upcoming reservations of the actor
    GetUserReservations(NoArgs),
    /// One reservation of the actor
    GetReservation(ReservationIdArgs),
    /// Cancel a reservation
    CancelReservation(ReservationIdArgs),
    /// Move a reservation in place
    UpdateReservation(ChangeReservationArgs),
    /// Cancel a reservation and draft a new one in the same room
    ChangeReservation(ChangeReservationArgs),
    /// Open office hours for a course
    GetStudentOfficeHours(OfficeHoursArgs),
    /// Queue an office hours ticket
    SubmitTicket(SubmitTicketArgs),
}

impl Intent {
    /// Decode a model function call
    ///
    /// An empty argument string is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::UnknownFunction`] for names outside the catalog and
    /// [`IntentError::MalformedArguments`] when the arguments are not a JSON
    /// object matching the function's argument struct.
    pub fn from_function_call(call: &FunctionCall) -> Result<Self, IntentError> {
        let name = call.name.trim();
        let kind = IntentKind::from_name(name)
            .ok_or_else(|| IntentError::UnknownFunction(name.to_owned()))?;

        let raw = call.arguments.trim();
        let arguments: Value = if raw.is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| IntentError::MalformedArguments {
                function: kind,
                reason: format!("arguments are not valid JSON ({e})"),
            })?
        };

        Ok(match kind {
            IntentKind::GetAvailableRooms => Self::GetAvailableRooms(decode(kind, arguments)?),
            IntentKind::GetRoomAvailability => {
                Self::GetRoomAvailability(decode(kind, arguments)?)
            }
            IntentKind::ReserveRoom => Self::ReserveRoom(decode(kind, arguments)?),
            IntentKind::GetUserReservations => {
                Self::GetUserReservations(decode(kind, arguments)?)
            }
            IntentKind::GetReservation => Self::GetReservation(decode(kind, arguments)?),
            IntentKind::CancelReservation => Self::CancelReservation(decode(kind, arguments)?),
            IntentKind::UpdateReservation => Self::UpdateReservation(decode(kind, arguments)?),
            IntentKind::ChangeReservation => Self::ChangeReservation(decode(kind, arguments)?),
            IntentKind::GetStudentOfficeHours => {
                Self::GetStudentOfficeHours(decode(kind, arguments)?)
            }
            IntentKind::SubmitTicket => Self::SubmitTicket(decode(kind, arguments)?),
        })
    }

    /// Which operation this is
    #[must_use]
    pub const fn kind(&self) -> IntentKind {
        match self {
            Self::GetAvailableRooms(_) => IntentKind::GetAvailableRooms,
            Self::GetRoomAvailability(_) => IntentKind::GetRoomAvailability,
            Self::ReserveRoom(_) => IntentKind::ReserveRoom,
            Self::GetUserReservations(_) => IntentKind::GetUserReservations,
            Self::GetReservation(_) => IntentKind::GetReservation,
            Self::CancelReservation(_) => IntentKind::CancelReservation,
            Self::UpdateReservation(_) => IntentKind::UpdateReservation,
            Self::ChangeReservation(_) => IntentKind::ChangeReservation,
            Self::GetStudentOfficeHours(_) => IntentKind::GetStudentOfficeHours,
            Self::SubmitTicket(_) => IntentKind::SubmitTicket,
        }
    }
}

fn decode<T: DeserializeOwned>(kind: IntentKind, arguments: Value) -> Result<T, IntentError> {
    if !arguments.is_object() {
        return Err(IntentError::MalformedArguments {
            function: kind,
            reason: "arguments must be a JSON object".to_owned(),
        });
    }
    serde_json::from_value(arguments).map_err(|e| IntentError::MalformedArguments {
        function: kind,
        reason: e.to_string(),
    })
}

/// Accept ids as JSON numbers or numeric strings; models emit both
fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("`{text}` is not a numeric id"))),
    }
}

/// Parse an ISO-8601 date; a date-time is accepted and truncated to its date
///
/// # Errors
///
/// Returns a message naming the field when the value is not a recognizable date
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_datetime(field, trimmed)
        .map(|instant| instant.date())
        .map_err(|_| format!("{field} `{trimmed}` is not a date in YYYY-MM-DD form"))
}

/// Parse an ISO-8601 local date-time
///
/// Offsets are accepted and dropped; the wall-clock reading is kept.
///
/// # Errors
///
/// Returns a message naming the field when the value is not a recognizable date-time
pub fn parse_datetime(field: &str, raw: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.naive_local());
    }
    // Fractional seconds ("...T14:00:00.000") are common in model output
    let without_fraction = trimmed.split('.').next().unwrap_or(trimmed);
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(without_fraction, format).ok())
        .ok_or_else(|| {
            format!("{field} `{trimmed}` is not a date-time in YYYY-MM-DDTHH:MM:SS form")
        })
}
