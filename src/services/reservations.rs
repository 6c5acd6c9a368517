// ABOUTME: Reservation collaborator contract: availability maps, drafting and partial updates
// ABOUTME: ReservationError carries policy violations whose messages are safe to show users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    Reservation, ReservationMapDetails, ReservationPartial, ReservationRequest, ReservationState,
    UserRef,
};

/// Domain errors raised by the reservation collaborator
///
/// Every variant except [`ReservationError::Storage`] describes a policy
/// violation in words a student can act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    /// No reservation with this id is visible to the actor
    #[error("reservation {0} was not found")]
    NotFound(i64),
    /// Start is not before end
    #[error("the reservation must end after it starts")]
    InvalidTimeRange,
    /// Start or end is not on a 30-minute boundary
    #[error("reservations must start and end on the hour or half hour")]
    NotAligned,
    /// Longer than the maximum booking length
    #[error("reservations may be at most {max_minutes} minutes long")]
    TooLong {
        /// Maximum allowed length
        max_minutes: i64,
    },
    /// Falls outside that day's operating hours
    #[error("the coworking space is not open for the whole requested time")]
    OutsideOperatingHours,
    /// Starts before now
    #[error("reservations cannot start in the past")]
    InPast,
    /// Unknown room code
    #[error("room {0} does not exist")]
    RoomNotFound(String),
    /// Room exists but is not bookable right now
    #[error("room {0} is not available for reservations")]
    RoomUnavailable(String),
    /// Room already held for an overlapping time
    #[error("room {0} is already reserved during that time")]
    Conflict(String),
    /// Actor already holds an overlapping reservation
    #[error("you already have a reservation that overlaps that time")]
    UserConflict,
    /// State change not permitted
    #[error("a {from} reservation cannot be changed to {to}")]
    InvalidTransition {
        /// Current state
        from: ReservationState,
        /// Requested state
        to: ReservationState,
    },
    /// Times of a reservation that is no longer upcoming cannot change
    #[error("a {0} reservation can no longer be rescheduled")]
    NotModifiable(ReservationState),
    /// Underlying storage failure (internal detail, never shown to users)
    #[error("reservation storage error: {0}")]
    Storage(String),
}

impl ReservationError {
    /// Whether the message contains internal detail
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Reservation collaborator
#[async_trait]
pub trait ReservationService: Send + Sync {
    /// Slot arrays for every reservable room on `date`, from `actor`'s perspective
    async fn get_map_reserved_times_by_date(
        &self,
        date: NaiveDate,
        actor: &UserRef,
    ) -> Result<ReservationMapDetails, ReservationError>;

    /// Create a reservation (normally in `DRAFT` state)
    async fn draft_reservation(
        &self,
        actor: &UserRef,
        request: &ReservationRequest,
    ) -> Result<Reservation, ReservationError>;

    /// Apply a partial update (state and/or times)
    async fn change_reservation(
        &self,
        actor: &UserRef,
        partial: &ReservationPartial,
    ) -> Result<Reservation, ReservationError>;

    /// Look up a reservation owned by `actor`
    async fn get_reservation(
        &self,
        actor: &UserRef,
        reservation_id: i64,
    ) -> Result<Reservation, ReservationError>;

    /// Active reservations of `actor` that have not ended yet, soonest first
    async fn get_current_reservations_for_user(
        &self,
        actor: &UserRef,
    ) -> Result<Vec<Reservation>, ReservationError>;
}
