// ABOUTME: Room, reservation and availability-map DTOs consumed by the reservation collaborator
// ABOUTME: Defines slot flag values, reservation states and the wall-clock TimeRange type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::UserRef;

/// Width of one availability slot in minutes
pub const SLOT_MINUTES: i64 = 30;

/// Slot is free
pub const SLOT_AVAILABLE: u8 = 0;
/// Slot is held by someone else's reservation
pub const SLOT_RESERVED: u8 = 1;
/// Slot cannot be booked (in the past, or room disabled)
pub const SLOT_UNAVAILABLE: u8 = 3;
/// Slot is held by the requesting user's own reservation
pub const SLOT_SUBJECT_RESERVED: u8 = 4;

/// Reservation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationState {
    /// Created but not yet confirmed
    Draft,
    /// Confirmed by the user
    Confirmed,
    /// User has arrived
    CheckedIn,
    /// User has left
    CheckedOut,
    /// Cancelled
    Cancelled,
}

impl ReservationState {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::CheckedOut => "CHECKED_OUT",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether a reservation in this state holds its room
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Draft | Self::Confirmed | Self::CheckedIn)
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CHECKED_IN" => Ok(Self::CheckedIn),
            "CHECKED_OUT" => Ok(Self::CheckedOut),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(AppError::internal(format!(
                "Unknown reservation state: {other}"
            ))),
        }
    }
}

/// Bookable room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room code, uppercase (e.g. "SN135")
    pub id: String,
    /// Building name
    pub building: String,
    /// Room number within the building
    pub room: String,
    /// Display nickname
    pub nickname: String,
    /// Seat capacity
    pub capacity: i64,
    /// Whether the room is part of the reservable pool
    pub reservable: bool,
    /// Admin toggle; disabled rooms report every slot as unavailable
    pub is_available: bool,
}

/// Reference to a room by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    /// Room code
    pub id: String,
}

/// A reservation as returned by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation id
    pub id: i64,
    /// Start instant
    pub start: NaiveDateTime,
    /// End instant
    pub end: NaiveDateTime,
    /// Current state
    pub state: ReservationState,
    /// Room held, if any
    pub room: Option<RoomRef>,
    /// Users on the reservation
    pub users: Vec<UserRef>,
}

/// Request to draft a new reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    /// Users on the reservation
    pub users: Vec<UserRef>,
    /// Room to hold
    pub room: RoomRef,
    /// Start instant
    pub start: NaiveDateTime,
    /// End instant
    pub end: NaiveDateTime,
    /// Initial state
    pub state: ReservationState,
}

/// Partial update applied to an existing reservation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPartial {
    /// Reservation id
    pub id: i64,
    /// New state
    pub state: Option<ReservationState>,
    /// New start instant
    pub start: Option<NaiveDateTime>,
    /// New end instant
    pub end: Option<NaiveDateTime>,
}

impl ReservationPartial {
    /// Partial that cancels the reservation
    #[must_use]
    pub fn cancel(id: i64) -> Self {
        Self {
            id,
            state: Some(ReservationState::Cancelled),
            ..Self::default()
        }
    }

    /// Partial that moves the reservation to a new time
    #[must_use]
    pub fn reschedule(id: i64, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id,
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }
}

/// Per-room slot arrays for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationMapDetails {
    /// Room id to slot flags; index i covers `operating_hours_start + i * 30min`
    pub reserved_date_map: BTreeMap<String, Vec<u8>>,
    /// Instant of slot 0
    pub operating_hours_start: NaiveDateTime,
    /// Instant the last slot ends
    pub operating_hours_end: NaiveDateTime,
    /// Slots per room
    pub number_of_time_slots: usize,
}

/// Half-open wall-clock range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start
    pub start: NaiveDateTime,
    /// Exclusive end
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Length of the range
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whether two ranges share any instant
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside this range
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%I:%M%p"),
            self.end.format("%I:%M%p")
        )
    }
}
