// ABOUTME: Collaborator contracts consumed by the function-call dispatcher
// ABOUTME: Reservation and office-hours service traits plus the injected clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Collaborator services
//!
//! The dispatcher never touches storage directly. It talks to these traits,
//! which the server satisfies with the `SQLite` implementations in
//! [`crate::database`] and which tests satisfy with scripted doubles.

/// Injected time source
pub mod clock;
/// Office hours collaborator contract
pub mod office_hours;
/// Reservation collaborator contract
pub mod reservations;

pub use clock::{Clock, FixedClock, SystemClock};
pub use office_hours::{OfficeHoursError, OfficeHoursService};
pub use reservations::{ReservationError, ReservationService};
