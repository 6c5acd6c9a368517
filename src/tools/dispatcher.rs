// ABOUTME: Executes decoded chatbot intents against the reservation and office hours collaborators
// ABOUTME: Every branch returns text; DispatchError::user_message is the one error-to-text mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! # Function-Call Dispatcher
//!
//! [`Dispatcher::dispatch`] never fails. Collaborator errors, argument parse
//! errors and lookups that find nothing all become a sentence for the user.
//! Internal failures (storage errors) are logged and replaced with a generic
//! message so no internal detail reaches the chat window.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::intent::{
    parse_date, parse_datetime, ChangeReservationArgs, DateArgs, Intent, IntentKind,
    OfficeHoursArgs, ReserveRoomArgs, RoomAvailabilityArgs, SubmitTicketArgs,
};
use crate::availability::{compute_free_ranges, format_ranges, has_free_slot};
use crate::constants::formats::{DATE_DISPLAY, TIME_DISPLAY};
use crate::models::{
    normalize_course_code, NewTicket, Reservation, ReservationPartial, ReservationRequest,
    ReservationState, RoomRef, UserRef,
};
use crate::services::{
    Clock, OfficeHoursError, OfficeHoursService, ReservationError, ReservationService,
};

/// Reservation operation that failed, used to phrase the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationAction {
    /// Reading the availability map
    CheckAvailability,
    /// Drafting a reservation
    Reserve,
    /// Listing the actor's reservations
    List,
    /// Reading one reservation
    Lookup,
    /// Cancelling
    Cancel,
    /// Moving in place
    Update,
    /// Cancel then rebook
    Change,
}

impl ReservationAction {
    const fn failure_lead(self) -> &'static str {
        match self {
            Self::CheckAvailability => "❌ Could not check room availability",
            Self::Reserve => "❌ Reservation failed",
            Self::List => "❌ Could not retrieve your reservations",
            Self::Lookup => "❌ Could not retrieve that reservation",
            Self::Cancel => "❌ Could not cancel reservation",
            Self::Update => "❌ Could not update reservation",
            Self::Change => "❌ Could not change reservation",
        }
    }
}

/// Why a dispatched operation did not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The reservation collaborator refused or failed
    #[error("{action:?} failed: {source}")]
    Reservation {
        /// Operation that failed
        action: ReservationAction,
        /// Collaborator error
        source: ReservationError,
    },
    /// The office hours collaborator refused or failed
    #[error("office hours operation failed: {0}")]
    OfficeHours(#[from] OfficeHoursError),
    /// An argument could not be parsed or is out of range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Unexpected state that should not happen under normal operation
    #[error("internal dispatch error: {0}")]
    Internal(String),
}

impl DispatchError {
    const fn reservation(action: ReservationAction, source: ReservationError) -> Self {
        Self::Reservation { action, source }
    }

    /// Whether the underlying detail must stay out of user-facing text
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Reservation { source, .. } => source.is_internal(),
            Self::OfficeHours(source) => source.is_internal(),
            Self::InvalidArgument(_) => false,
            Self::Internal(_) => true,
        }
    }

    /// Safe text describing the failure
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Reservation { action, source } if source.is_internal() => format!(
                "{}. Something went wrong on our side, please try again later.",
                action.failure_lead()
            ),
            Self::Reservation { action, source } => {
                format!("{}: {source}.", action.failure_lead())
            }
            Self::OfficeHours(source) if source.is_internal() => {
                "❌ Office hours are unavailable right now, please try again later.".to_owned()
            }
            Self::OfficeHours(source) => format!("❌ Office hours request failed: {source}."),
            Self::InvalidArgument(message) => format!("❌ {message}."),
            Self::Internal(_) => {
                "❌ Something went wrong on our side, please try again later.".to_owned()
            }
        }
    }
}

/// Text produced for one intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Operation that ran
    pub kind: IntentKind,
    /// Reply for the user
    pub response: String,
    /// Whether the operation did what was asked
    pub succeeded: bool,
}

/// Intent executor bound to its collaborators
#[derive(Clone)]
pub struct Dispatcher {
    reservations: Arc<dyn ReservationService>,
    office_hours: Arc<dyn OfficeHoursService>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        reservations: Arc<dyn ReservationService>,
        office_hours: Arc<dyn OfficeHoursService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reservations,
            office_hours,
            clock,
        }
    }

    /// Execute `intent` on behalf of `actor`
    pub async fn dispatch(&self, intent: Intent, actor: &UserRef) -> DispatchOutcome {
        let kind = intent.kind();
        info!(intent = %kind, user_id = actor.id, "Dispatching chatbot intent");

        let result = match intent {
            Intent::GetAvailableRooms(args) => self.get_available_rooms(&args, actor).await,
            Intent::GetRoomAvailability(args) => self.get_room_availability(&args, actor).await,
            Intent::ReserveRoom(args) => self.reserve_room(&args, actor).await,
            Intent::GetUserReservations(_) => self.get_user_reservations(actor).await,
            Intent::GetReservation(args) => self.get_reservation(args.reservation_id, actor).await,
            Intent::CancelReservation(args) => {
                self.cancel_reservation(args.reservation_id, actor).await
            }
            Intent::UpdateReservation(args) => self.update_reservation(&args, actor).await,
            Intent::ChangeReservation(args) => self.change_reservation(&args, actor).await,
            Intent::GetStudentOfficeHours(args) => {
                self.get_student_office_hours(&args, actor).await
            }
            Intent::SubmitTicket(args) => self.submit_ticket(args, actor).await,
        };

        match result {
            Ok(response) => DispatchOutcome {
                kind,
                response,
                succeeded: true,
            },
            Err(e) => {
                if e.is_internal() {
                    error!(intent = %kind, user_id = actor.id, error = %e, "Chatbot intent failed");
                } else {
                    warn!(
                        intent = %kind,
                        user_id = actor.id,
                        error = %e,
                        "Chatbot intent rejected"
                    );
                }
                DispatchOutcome {
                    kind,
                    response: e.user_message(),
                    succeeded: false,
                }
            }
        }
    }

    async fn get_available_rooms(
        &self,
        args: &DateArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let date = parse_date("date", &args.date).map_err(DispatchError::InvalidArgument)?;
        let details = self
            .reservations
            .get_map_reserved_times_by_date(date, actor)
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::CheckAvailability, e))?;

        let available: Vec<&str> = details
            .reserved_date_map
            .iter()
            .filter(|(_, slots)| has_free_slot(slots))
            .map(|(room, _)| room.as_str())
            .collect();

        if available.is_empty() {
            return Ok(format!(
                "Sorry, no rooms are available on {}.",
                display_date(date)
            ));
        }
        Ok(format!(
            "Available rooms on {}: {}",
            display_date(date),
            available.join(", ")
        ))
    }

    async fn get_room_availability(
        &self,
        args: &RoomAvailabilityArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let room = normalize_room(&args.room_id);
        let date = parse_date("date", &args.date).map_err(DispatchError::InvalidArgument)?;
        let details = self
            .reservations
            .get_map_reserved_times_by_date(date, actor)
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::CheckAvailability, e))?;

        let Some(slots) = details.reserved_date_map.get(&room) else {
            return Ok(format!(
                "Room {room} was not found for {}.",
                display_date(date)
            ));
        };

        let ranges = compute_free_ranges(slots, details.operating_hours_start);
        if ranges.is_empty() {
            return Ok(format!(
                "Room {room} is fully booked on {}.",
                display_date(date)
            ));
        }
        Ok(format!(
            "Room {room} is available on {} at: {}",
            display_date(date),
            format_ranges(&ranges)
        ))
    }

    async fn reserve_room(
        &self,
        args: &ReserveRoomArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let room = normalize_room(&args.room_id);
        let start = parse_datetime("start", &args.start).map_err(DispatchError::InvalidArgument)?;
        let end = parse_datetime("end", &args.end).map_err(DispatchError::InvalidArgument)?;

        let request = ReservationRequest {
            users: vec![actor.clone()],
            room: RoomRef { id: room },
            start,
            end,
            state: ReservationState::Draft,
        };
        let reservation = self
            .reservations
            .draft_reservation(actor, &request)
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::Reserve, e))?;

        Ok(format!(
            "✅ Room {} reserved from {} to {} on {} (reservation #{}).",
            room_label(&reservation),
            reservation.start.format(TIME_DISPLAY),
            reservation.end.format(TIME_DISPLAY),
            display_date(reservation.start.date()),
            reservation.id
        ))
    }

    async fn get_user_reservations(&self, actor: &UserRef) -> Result<String, DispatchError> {
        let reservations = self
            .reservations
            .get_current_reservations_for_user(actor)
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::List, e))?;

        if reservations.is_empty() {
            return Ok("You don't have any current or upcoming reservations.".to_owned());
        }

        let mut text = String::from("Your reservations:");
        for reservation in &reservations {
            // Writing to a String cannot fail
            let _ = write!(text, "\n• {}", describe_reservation(reservation));
        }
        Ok(text)
    }

    async fn get_reservation(
        &self,
        reservation_id: i64,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let reservation = self
            .reservations
            .get_reservation(actor, reservation_id)
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::Lookup, e))?;
        Ok(describe_reservation(&reservation))
    }

    async fn cancel_reservation(
        &self,
        reservation_id: i64,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        self.reservations
            .change_reservation(actor, &ReservationPartial::cancel(reservation_id))
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::Cancel, e))?;
        Ok(format!("✅ Reservation #{reservation_id} has been cancelled."))
    }

    async fn update_reservation(
        &self,
        args: &ChangeReservationArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let start = parse_datetime("start", &args.start).map_err(DispatchError::InvalidArgument)?;
        let end = parse_datetime("end", &args.end).map_err(DispatchError::InvalidArgument)?;

        let updated = self
            .reservations
            .change_reservation(
                actor,
                &ReservationPartial::reschedule(args.reservation_id, start, end),
            )
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::Update, e))?;

        Ok(format!(
            "✅ Reservation #{} in room {} now runs from {} to {} on {}.",
            updated.id,
            room_label(&updated),
            updated.start.format(TIME_DISPLAY),
            updated.end.format(TIME_DISPLAY),
            display_date(updated.start.date())
        ))
    }

    /// Cancel the original, then draft a replacement in the same room
    ///
    /// Not atomic. If drafting the replacement fails the original stays
    /// cancelled and nothing restores it.
    async fn change_reservation(
        &self,
        args: &ChangeReservationArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let start = parse_datetime("start", &args.start).map_err(DispatchError::InvalidArgument)?;
        let end = parse_datetime("end", &args.end).map_err(DispatchError::InvalidArgument)?;

        let original = self
            .reservations
            .get_reservation(actor, args.reservation_id)
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::Change, e))?;
        let Some(room) = original.room.clone() else {
            return Err(DispatchError::Internal(format!(
                "reservation {} has no room",
                original.id
            )));
        };

        self.reservations
            .change_reservation(actor, &ReservationPartial::cancel(original.id))
            .await
            .map_err(|e| DispatchError::reservation(ReservationAction::Change, e))?;

        let request = ReservationRequest {
            users: vec![actor.clone()],
            room,
            start,
            end,
            state: ReservationState::Draft,
        };
        let replacement = match self.reservations.draft_reservation(actor, &request).await {
            Ok(reservation) => reservation,
            Err(e) => {
                warn!(
                    reservation_id = original.id,
                    user_id = actor.id,
                    error = %e,
                    "Replacement booking failed; the cancelled original is not restored"
                );
                return Err(DispatchError::reservation(ReservationAction::Change, e));
            }
        };

        Ok(format!(
            "✅ Reservation #{} was cancelled and room {} is now reserved \
             from {} to {} on {} (reservation #{}).",
            original.id,
            room_label(&replacement),
            replacement.start.format(TIME_DISPLAY),
            replacement.end.format(TIME_DISPLAY),
            display_date(replacement.start.date()),
            replacement.id
        ))
    }

    async fn get_student_office_hours(
        &self,
        args: &OfficeHoursArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let wanted = normalize_course_code(&args.course_code);
        if wanted.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "A course code such as COMP 423 is required".to_owned(),
            ));
        }

        let now = self.clock.now();
        let sites = self.office_hours.get_user_course_sites(actor).await?;
        let Some(site) = sites.iter().find(|site| {
            site.term.is_active_at(now)
                && site
                    .courses
                    .iter()
                    .any(|course| course.normalized_code() == wanted)
        }) else {
            return Ok(format!(
                "I couldn't find a current course matching \"{}\" that you're enrolled in.",
                args.course_code.trim()
            ));
        };

        let events = self
            .office_hours
            .get_current_office_hours(actor, site.id)
            .await?;
        if events.is_empty() {
            return Ok(format!(
                "There are no office hours open right now for {}.",
                site.title
            ));
        }

        let mut text = format!("Open office hours for {}:", site.title);
        for event in &events {
            let _ = write!(
                text,
                "\n• #{} {} in {} until {} ({} in queue): {}",
                event.id,
                event.event_type,
                event.location,
                event.end.format(TIME_DISPLAY),
                event.queued_tickets,
                event.description
            );
        }
        Ok(text)
    }

    async fn submit_ticket(
        &self,
        args: SubmitTicketArgs,
        actor: &UserRef,
    ) -> Result<String, DispatchError> {
        let description = args.description.trim();
        if description.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "A ticket needs a description of what you need help with".to_owned(),
            ));
        }

        let ticket = NewTicket {
            office_hours_id: args.office_hours_id,
            description: description.to_owned(),
            ticket_type: args.ticket_type,
        };
        let created = self.office_hours.create_ticket(actor, &ticket).await?;
        Ok(format!(
            "✅ Ticket #{} submitted to office hours #{}. A TA will call you soon.",
            created.id, created.office_hours_id
        ))
    }
}

fn normalize_room(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn display_date(date: NaiveDate) -> String {
    date.format(DATE_DISPLAY).to_string()
}

fn room_label(reservation: &Reservation) -> &str {
    reservation
        .room
        .as_ref()
        .map_or("(unassigned)", |room| room.id.as_str())
}

fn describe_reservation(reservation: &Reservation) -> String {
    format!(
        "Reservation #{}: room {} on {} from {} to {} ({})",
        reservation.id,
        room_label(reservation),
        display_date(reservation.start.date()),
        reservation.start.format(TIME_DISPLAY),
        reservation.end.format(TIME_DISPLAY),
        reservation.state
    )
}
