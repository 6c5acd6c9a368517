// ABOUTME: Chatbot tool surface: the function catalog offered to the model and decoded intents
// ABOUTME: Re-exports the Intent sum type, its argument structs and the dispatcher
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! # Chatbot Tools
//!
//! The model never calls code directly. It picks one entry from
//! [`function_catalog`] and returns its name plus a JSON-encoded argument
//! string. [`Intent::from_function_call`] decodes that pair once into a closed
//! sum type, and the [`Dispatcher`] executes it against the collaborators.

/// JSON schemas of every callable function
pub mod catalog;
/// Intent execution against the collaborators
pub mod dispatcher;
/// Typed intents and argument decoding
pub mod intent;

pub use catalog::function_catalog;
pub use dispatcher::{DispatchError, DispatchOutcome, Dispatcher, ReservationAction};
pub use intent::{
    parse_date, parse_datetime, ChangeReservationArgs, DateArgs, Intent, IntentError, IntentKind,
    NoArgs, OfficeHoursArgs, ReservationIdArgs, ReserveRoomArgs, RoomAvailabilityArgs,
    SubmitTicketArgs,
};
