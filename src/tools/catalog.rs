// ABOUTME: JSON-schema declarations of the functions the chatbot model may call
// ABOUTME: Static catalog sent with every completion request, one entry per IntentKind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use serde_json::{json, Value};

use super::intent::IntentKind;
use crate::llm::FunctionDeclaration;

/// Catalog of every callable function, in [`IntentKind::ALL`] order
#[must_use]
pub fn function_catalog() -> Vec<FunctionDeclaration> {
    IntentKind::ALL.into_iter().map(declaration).collect()
}

fn declaration(kind: IntentKind) -> FunctionDeclaration {
    let (description, parameters) = match kind {
        IntentKind::GetAvailableRooms => (
            "List the rooms that have at least one free time slot on a date.",
            object(&[("date", date_schema())], &["date"]),
        ),
        IntentKind::GetRoomAvailability => (
            "Get the free time ranges of one room on a date.",
            object(
                &[("room_id", room_schema()), ("date", date_schema())],
                &["room_id", "date"],
            ),
        ),
        IntentKind::ReserveRoom => (
            "Reserve a room for the current user. Times must be on 30-minute boundaries and \
             the reservation may be at most 2 hours long.",
            object(
                &[
                    ("room_id", room_schema()),
                    ("start", datetime_schema("Start of the reservation")),
                    ("end", datetime_schema("End of the reservation")),
                ],
                &["room_id", "start", "end"],
            ),
        ),
        IntentKind::GetUserReservations => (
            "List the current user's current and upcoming reservations, soonest first.",
            object(&[], &[]),
        ),
        IntentKind::GetReservation => (
            "Get the details of one of the current user's reservations.",
            object(&[("reservation_id", reservation_id_schema())], &["reservation_id"]),
        ),
        IntentKind::CancelReservation => (
            "Cancel one of the current user's reservations.",
            object(&[("reservation_id", reservation_id_schema())], &["reservation_id"]),
        ),
        IntentKind::UpdateReservation => (
            "Move an existing reservation to a new start and end time in the same room.",
            object(
                &[
                    ("reservation_id", reservation_id_schema()),
                    ("start", datetime_schema("New start")),
                    ("end", datetime_schema("New end")),
                ],
                &["reservation_id", "start", "end"],
            ),
        ),
        IntentKind::ChangeReservation => (
            "Cancel an existing reservation and book the same room again at a new time.",
            object(
                &[
                    ("reservation_id", reservation_id_schema()),
                    ("start", datetime_schema("New start")),
                    ("end", datetime_schema("New end")),
                ],
                &["reservation_id", "start", "end"],
            ),
        ),
        IntentKind::GetStudentOfficeHours => (
            "Find the office hours that are open right now for a course the user is enrolled in.",
            object(
                &[(
                    "course_code",
                    json!({
                        "type": "string",
                        "description": "Course code such as COMP 423",
                    }),
                )],
                &["course_code"],
            ),
        ),
        IntentKind::SubmitTicket => (
            "Submit a help ticket to an open office hours session.",
            object(
                &[
                    (
                        "office_hours_id",
                        json!({
                            "type": "integer",
                            "description": "Id of the office hours session",
                        }),
                    ),
                    (
                        "description",
                        json!({
                            "type": "string",
                            "description": "What the student needs help with",
                        }),
                    ),
                    (
                        "ticket_type",
                        json!({
                            "type": "integer",
                            "enum": [0, 1],
                            "description": "0 for conceptual help, 1 for assignment help",
                        }),
                    ),
                ],
                &["office_hours_id", "description", "ticket_type"],
            ),
        ),
    };

    FunctionDeclaration {
        name: kind.name().to_owned(),
        description: description.to_owned(),
        parameters,
    }
}

fn object(properties: &[(&str, Value)], required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, schema)| ((*name).to_owned(), schema.clone()))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn date_schema() -> Value {
    json!({
        "type": "string",
        "description": "Date in YYYY-MM-DD format",
    })
}

fn datetime_schema(what: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("{what}, ISO-8601 local date-time (YYYY-MM-DDTHH:MM:SS)"),
    })
}

fn room_schema() -> Value {
    json!({
        "type": "string",
        "description": "Room code, for example SN135",
    })
}

fn reservation_id_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Reservation id",
    })
}
