// ABOUTME: Tests for executing decoded intents against the SQLite reservation and office hours
// ABOUTME: Covers availability, booking policy failures, changing reservations and tickets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{at, create_test_world, monday, tuesday, TestWorld};
use coworking_chat_server::llm::FunctionCall;
use coworking_chat_server::models::{
    Reservation, ReservationMapDetails, ReservationPartial, ReservationRequest, ReservationState,
    RoomRef, UserRef,
};
use coworking_chat_server::services::{ReservationError, ReservationService};
use coworking_chat_server::tools::{DispatchOutcome, Dispatcher, Intent, IntentKind};
use serde_json::json;

fn intent(name: &str, arguments: &serde_json::Value) -> Intent {
    Intent::from_function_call(&FunctionCall {
        name: name.to_owned(),
        arguments: arguments.to_string(),
    })
    .unwrap()
}

async fn run(
    world: &TestWorld,
    actor: &UserRef,
    name: &str,
    arguments: &serde_json::Value,
) -> DispatchOutcome {
    world.dispatcher().dispatch(intent(name, arguments), actor).await
}

async fn reserve(
    world: &TestWorld,
    actor: &UserRef,
    room: &str,
    start: &str,
    end: &str,
) -> DispatchOutcome {
    run(
        world,
        actor,
        "reserve_room",
        &json!({"room_id": room, "start": start, "end": end}),
    )
    .await
}

// ============================================================================
// Availability
// ============================================================================

#[tokio::test]
async fn test_available_rooms_lists_reservable_rooms_only() {
    let world = create_test_world().await;
    let outcome = run(
        &world,
        &world.student_ref(),
        "get_available_rooms",
        &json!({"date": "2025-03-03"}),
    )
    .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.kind, IntentKind::GetAvailableRooms);
    assert_eq!(
        outcome.response,
        "Available rooms on Monday, March 3, 2025: SN135, SN156"
    );
}

#[tokio::test]
async fn test_available_rooms_on_closed_day() {
    let world = create_test_world().await;
    let outcome = run(
        &world,
        &world.student_ref(),
        "get_available_rooms",
        &json!({"date": "2025-03-05"}),
    )
    .await;

    assert!(outcome.succeeded);
    assert_eq!(
        outcome.response,
        "Sorry, no rooms are available on Wednesday, March 5, 2025."
    );
}

#[tokio::test]
async fn test_available_rooms_with_unparseable_date() {
    let world = create_test_world().await;
    let outcome = run(
        &world,
        &world.student_ref(),
        "get_available_rooms",
        &json!({"date": "tomorrow"}),
    )
    .await;

    assert!(!outcome.succeeded);
    assert!(outcome.response.starts_with("❌ date `tomorrow`"), "{}", outcome.response);
}

#[tokio::test]
async fn test_room_availability_is_case_insensitive() {
    let world = create_test_world().await;
    let student = world.student_ref();

    let lower = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "sn156", "date": "2025-03-03"}),
    )
    .await;
    let upper = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "SN156", "date": "2025-03-03"}),
    )
    .await;

    assert!(lower.succeeded);
    assert_eq!(lower, upper);
    assert_eq!(
        lower.response,
        "Room SN156 is available on Monday, March 3, 2025 at: 09:00AM - 05:00PM"
    );
}

#[tokio::test]
async fn test_room_availability_for_unknown_room() {
    let world = create_test_world().await;
    let outcome = run(
        &world,
        &world.student_ref(),
        "get_room_availability",
        &json!({"room_id": "SN999", "date": "2025-03-03"}),
    )
    .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.response, "Room SN999 was not found for Monday, March 3, 2025.");
}

#[tokio::test]
async fn test_reserved_slots_are_no_longer_reported_free() {
    let world = create_test_world().await;
    let student = world.student_ref();

    let booked = reserve(
        &world,
        &student,
        "SN156",
        "2025-03-03T10:00:00",
        "2025-03-03T11:30:00",
    )
    .await;
    assert!(booked.succeeded, "{}", booked.response);

    let outcome = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "sn156", "date": "2025-03-03"}),
    )
    .await;
    assert_eq!(
        outcome.response,
        "Room SN156 is available on Monday, March 3, 2025 at: 09:00AM - 10:00AM, 11:30AM - 05:00PM"
    );

    // The other room is untouched
    let other = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "SN135", "date": "2025-03-03"}),
    )
    .await;
    assert!(other.response.ends_with("09:00AM - 05:00PM"));
}

#[tokio::test]
async fn test_past_slots_are_not_free() {
    let world = create_test_world().await;
    world.clock.set(at(monday(), 13, 15));

    let outcome = run(
        &world,
        &world.student_ref(),
        "get_room_availability",
        &json!({"room_id": "SN135", "date": "2025-03-03"}),
    )
    .await;

    assert_eq!(
        outcome.response,
        "Room SN135 is available on Monday, March 3, 2025 at: 01:30PM - 05:00PM"
    );
}

#[tokio::test]
async fn test_fully_booked_room() {
    let world = create_test_world().await;
    world.clock.set(at(monday(), 17, 0));

    let outcome = run(
        &world,
        &world.student_ref(),
        "get_room_availability",
        &json!({"room_id": "SN135", "date": "2025-03-03"}),
    )
    .await;

    assert_eq!(outcome.response, "Room SN135 is fully booked on Monday, March 3, 2025.");
}

// ============================================================================
// Reserving
// ============================================================================

#[tokio::test]
async fn test_reserve_room_success_message() {
    let world = create_test_world().await;
    let outcome = reserve(
        &world,
        &world.student_ref(),
        "sn135",
        "2025-03-03T14:00:00",
        "2025-03-03T15:00:00",
    )
    .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.kind, IntentKind::ReserveRoom);
    assert_eq!(
        outcome.response,
        "✅ Room SN135 reserved from 02:00PM to 03:00PM on Monday, March 3, 2025 (reservation #1)."
    );

    let stored = world
        .reservations
        .get_reservation(&world.student_ref(), 1)
        .await
        .unwrap();
    assert_eq!(stored.state, ReservationState::Draft);
    assert_eq!(stored.start, at(monday(), 14, 0));
    assert_eq!(stored.users, vec![world.student_ref()]);
}

#[tokio::test]
async fn test_reserve_room_rejects_end_before_start() {
    let world = create_test_world().await;
    let student = world.student_ref();

    for (start, end) in [
        ("2025-03-03T11:00:00", "2025-03-03T10:00:00"),
        ("2025-03-03T11:00:00", "2025-03-03T11:00:00"),
    ] {
        let outcome = reserve(&world, &student, "SN156", start, end).await;
        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.response,
            "❌ Reservation failed: the reservation must end after it starts."
        );
    }

    let list = run(&world, &student, "get_user_reservations", &json!({})).await;
    assert_eq!(list.response, "You don't have any current or upcoming reservations.");
}

#[tokio::test]
async fn test_reserve_room_policy_failures() {
    let world = create_test_world().await;
    let student = world.student_ref();

    let cases = [
        ("SN156", "10:15", "11:00", "reservations must start and end on the hour or half hour"),
        ("SN156", "10:00", "12:30", "reservations may be at most 120 minutes long"),
        ("SN156", "16:30", "17:30", "the coworking space is not open for the whole requested time"),
        ("SN156", "07:00", "07:30", "reservations cannot start in the past"),
        ("SN999", "10:00", "11:00", "room SN999 does not exist"),
        ("SN139", "10:00", "11:00", "room SN139 is not available for reservations"),
    ];

    for (room, start, end, reason) in cases {
        let (start, end) = (format!("2025-03-03T{start}:00"), format!("2025-03-03T{end}:00"));
        let outcome = reserve(&world, &student, room, &start, &end).await;
        assert!(!outcome.succeeded, "{room} {start}-{end} should fail");
        assert_eq!(outcome.response, format!("❌ Reservation failed: {reason}."));
    }
}

#[tokio::test]
async fn test_reserve_room_conflicts() {
    let world = create_test_world().await;
    let student = world.student_ref();
    let classmate = world.classmate_ref();

    let first =
        reserve(&world, &classmate, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;
    assert!(first.succeeded, "{}", first.response);

    let room_taken = reserve(
        &world,
        &student,
        "SN156",
        "2025-03-03T10:30:00",
        "2025-03-03T11:30:00",
    )
    .await;
    assert_eq!(
        room_taken.response,
        "❌ Reservation failed: room SN156 is already reserved during that time."
    );

    let other_room =
        reserve(&world, &student, "SN135", "2025-03-03T10:30:00", "2025-03-03T11:30:00").await;
    assert!(other_room.succeeded, "{}", other_room.response);
    let double_booked = reserve(
        &world,
        &student,
        "SN156",
        "2025-03-03T11:00:00",
        "2025-03-03T12:00:00",
    )
    .await;
    assert_eq!(
        double_booked.response,
        "❌ Reservation failed: you already have a reservation that overlaps that time."
    );

    // Back-to-back bookings do not overlap
    let back_to_back =
        reserve(&world, &student, "SN156", "2025-03-03T11:30:00", "2025-03-03T12:00:00").await;
    assert!(back_to_back.succeeded, "{}", back_to_back.response);
}

#[tokio::test]
async fn test_disabled_room_cannot_be_reserved() {
    let world = create_test_world().await;
    world.database.toggle_room_availability("SN135").await.unwrap();

    let outcome = reserve(
        &world,
        &world.student_ref(),
        "SN135",
        "2025-03-03T10:00:00",
        "2025-03-03T11:00:00",
    )
    .await;
    assert_eq!(
        outcome.response,
        "❌ Reservation failed: room SN135 is not available for reservations."
    );

    let rooms = run(
        &world,
        &world.student_ref(),
        "get_available_rooms",
        &json!({"date": "2025-03-03"}),
    )
    .await;
    assert_eq!(rooms.response, "Available rooms on Monday, March 3, 2025: SN156");
}

#[tokio::test]
async fn test_lunch_break_is_neither_advertised_nor_bookable() {
    let world = create_test_world().await;
    let wednesday = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    for (open, close) in [((9, 0), (12, 0)), ((13, 0), (17, 0))] {
        world
            .reservations
            .add_operating_hours(at(wednesday, open.0, open.1), at(wednesday, close.0, close.1))
            .await
            .unwrap();
    }
    let student = world.student_ref();

    let availability = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "SN135", "date": "2025-03-05"}),
    )
    .await;
    assert_eq!(
        availability.response,
        "Room SN135 is available on Wednesday, March 5, 2025 at: 09:00AM - 12:00PM, 01:00PM - \
         05:00PM"
    );

    let lunch = reserve(
        &world,
        &student,
        "SN135",
        "2025-03-05T12:00:00",
        "2025-03-05T12:30:00",
    )
    .await;
    assert!(!lunch.succeeded);
    assert_eq!(
        lunch.response,
        "❌ Reservation failed: the coworking space is not open for the whole requested time."
    );

    let before_lunch =
        reserve(&world, &student, "SN135", "2025-03-05T11:30:00", "2025-03-05T12:00:00").await;
    assert!(before_lunch.succeeded, "{}", before_lunch.response);
}

#[tokio::test]
async fn test_touching_windows_book_as_one() {
    let world = create_test_world().await;
    let thursday = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    for (open, close) in [(9, 12), (12, 17)] {
        world
            .reservations
            .add_operating_hours(at(thursday, open, 0), at(thursday, close, 0))
            .await
            .unwrap();
    }
    let student = world.student_ref();

    let availability = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "SN135", "date": "2025-03-06"}),
    )
    .await;
    assert!(availability.response.ends_with("at: 09:00AM - 05:00PM"));

    let across = reserve(
        &world,
        &student,
        "SN135",
        "2025-03-06T11:30:00",
        "2025-03-06T12:30:00",
    )
    .await;
    assert!(across.succeeded, "{}", across.response);
}

// ============================================================================
// Listing, cancelling and updating
// ============================================================================

#[tokio::test]
async fn test_user_reservations_are_listed_soonest_first() {
    let world = create_test_world().await;
    let student = world.student_ref();

    reserve(&world, &student, "SN135", "2025-03-04T09:00:00", "2025-03-04T10:00:00").await;
    reserve(&world, &student, "SN156", "2025-03-03T15:00:00", "2025-03-03T16:00:00").await;

    let outcome = run(&world, &student, "get_user_reservations", &json!({})).await;
    assert!(outcome.succeeded);
    assert_eq!(
        outcome.response,
        "Your reservations:\n\
         • Reservation #2: room SN156 on Monday, March 3, 2025 from 03:00PM to 04:00PM (DRAFT)\n\
         • Reservation #1: room SN135 on Tuesday, March 4, 2025 from 09:00AM to 10:00AM (DRAFT)"
    );

    // Another user sees nothing
    let other = run(&world, &world.classmate_ref(), "get_user_reservations", &json!({})).await;
    assert_eq!(other.response, "You don't have any current or upcoming reservations.");
}

#[tokio::test]
async fn test_get_reservation_of_another_user_is_not_found() {
    let world = create_test_world().await;
    reserve(
        &world,
        &world.student_ref(),
        "SN135",
        "2025-03-03T10:00:00",
        "2025-03-03T11:00:00",
    )
    .await;

    let own = run(
        &world,
        &world.student_ref(),
        "get_reservation",
        &json!({"reservation_id": 1}),
    )
    .await;
    assert_eq!(
        own.response,
        "Reservation #1: room SN135 on Monday, March 3, 2025 from 10:00AM to 11:00AM (DRAFT)"
    );

    let foreign = run(
        &world,
        &world.classmate_ref(),
        "get_reservation",
        &json!({"reservation_id": 1}),
    )
    .await;
    assert!(!foreign.succeeded);
    assert_eq!(
        foreign.response,
        "❌ Could not retrieve that reservation: reservation 1 was not found."
    );
}

#[tokio::test]
async fn test_cancel_reservation_frees_the_room() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;

    let outcome = run(
        &world,
        &student,
        "cancel_reservation",
        &json!({"reservation_id": "1"}),
    )
    .await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.response, "✅ Reservation #1 has been cancelled.");

    let list = run(&world, &student, "get_user_reservations", &json!({})).await;
    assert_eq!(list.response, "You don't have any current or upcoming reservations.");

    let availability = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "SN156", "date": "2025-03-03"}),
    )
    .await;
    assert!(availability.response.ends_with("09:00AM - 05:00PM"));
}

#[tokio::test]
async fn test_cancelling_twice_is_refused() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;
    let cancel = json!({"reservation_id": 1});

    assert!(run(&world, &student, "cancel_reservation", &cancel).await.succeeded);
    let again = run(&world, &student, "cancel_reservation", &cancel).await;

    assert!(!again.succeeded);
    assert_eq!(
        again.response,
        "❌ Could not cancel reservation: a CANCELLED reservation cannot be changed to CANCELLED."
    );
}

#[tokio::test]
async fn test_cancel_unknown_reservation() {
    let world = create_test_world().await;
    let outcome = run(
        &world,
        &world.student_ref(),
        "cancel_reservation",
        &json!({"reservation_id": 77}),
    )
    .await;

    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.response,
        "❌ Could not cancel reservation: reservation 77 was not found."
    );
}

#[tokio::test]
async fn test_update_reservation_moves_in_place() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;

    let outcome = run(
        &world,
        &student,
        "update_reservation",
        &json!({"reservation_id": 1, "start": "2025-03-03T10:30:00", "end": "2025-03-03T12:00:00"}),
    )
    .await;

    assert!(outcome.succeeded, "{}", outcome.response);
    assert_eq!(
        outcome.response,
        "✅ Reservation #1 in room SN156 now runs from 10:30AM to 12:00PM on Monday, March 3, 2025."
    );
    let stored = world.reservations.get_reservation(&student, 1).await.unwrap();
    assert_eq!(stored.start, at(monday(), 10, 30));
    assert_eq!(stored.end, at(monday(), 12, 0));
}

#[tokio::test]
async fn test_update_cancelled_reservation_is_refused() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;
    run(&world, &student, "cancel_reservation", &json!({"reservation_id": 1})).await;

    let outcome = run(
        &world,
        &student,
        "update_reservation",
        &json!({"reservation_id": 1, "start": "2025-03-03T13:00:00", "end": "2025-03-03T14:00:00"}),
    )
    .await;

    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.response,
        "❌ Could not update reservation: a CANCELLED reservation can no longer be rescheduled."
    );
}

// ============================================================================
// change_reservation (cancel, then rebook)
// ============================================================================

#[tokio::test]
async fn test_change_reservation_rebooks_same_room() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN135", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;

    let outcome = run(
        &world,
        &student,
        "change_reservation",
        &json!({"reservation_id": 1, "start": "2025-03-04T13:00:00", "end": "2025-03-04T14:00:00"}),
    )
    .await;

    assert!(outcome.succeeded, "{}", outcome.response);
    assert_eq!(
        outcome.response,
        "✅ Reservation #1 was cancelled and room SN135 is now reserved from 01:00PM to 02:00PM on \
         Tuesday, March 4, 2025 (reservation #2)."
    );

    let original = world.reservations.get_reservation(&student, 1).await.unwrap();
    assert_eq!(original.state, ReservationState::Cancelled);
    let current = world
        .reservations
        .get_current_reservations_for_user(&student)
        .await
        .unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, 2);
    assert_eq!(current[0].start.date(), tuesday());
}

/// The original is cancelled before the replacement is attempted; when the
/// replacement fails nothing restores the original.
#[tokio::test]
async fn test_change_reservation_failure_leaves_original_cancelled() {
    let world = create_test_world().await;
    let student = world.student_ref();
    let classmate = world.classmate_ref();

    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;
    reserve(&world, &classmate, "SN156", "2025-03-03T13:00:00", "2025-03-03T14:00:00").await;

    let outcome = run(
        &world,
        &student,
        "change_reservation",
        &json!({"reservation_id": 1, "start": "2025-03-03T13:00:00", "end": "2025-03-03T14:00:00"}),
    )
    .await;

    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.response,
        "❌ Could not change reservation: room SN156 is already reserved during that time."
    );

    let original = world.reservations.get_reservation(&student, 1).await.unwrap();
    assert_eq!(original.state, ReservationState::Cancelled);
    assert!(world
        .reservations
        .get_current_reservations_for_user(&student)
        .await
        .unwrap()
        .is_empty());

    // The originally booked hour is free again
    let availability = run(
        &world,
        &student,
        "get_room_availability",
        &json!({"room_id": "SN156", "date": "2025-03-03"}),
    )
    .await;
    assert_eq!(
        availability.response,
        "Room SN156 is available on Monday, March 3, 2025 at: 09:00AM - 01:00PM, 02:00PM - 05:00PM"
    );
}

#[tokio::test]
async fn test_change_reservation_with_bad_time_does_not_cancel() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;

    let outcome = run(
        &world,
        &student,
        "change_reservation",
        &json!({"reservation_id": 1, "start": "later", "end": "2025-03-03T14:00:00"}),
    )
    .await;

    assert!(!outcome.succeeded);
    let original = world.reservations.get_reservation(&student, 1).await.unwrap();
    assert_eq!(original.state, ReservationState::Draft);
}

/// Reservation double whose cancel step always fails and which counts drafts
#[derive(Default)]
struct CancelRefusingReservations {
    drafts: AtomicUsize,
}

#[async_trait]
impl ReservationService for CancelRefusingReservations {
    async fn get_map_reserved_times_by_date(
        &self,
        _date: NaiveDate,
        _actor: &UserRef,
    ) -> Result<ReservationMapDetails, ReservationError> {
        Err(ReservationError::Storage("not used".to_owned()))
    }

    async fn draft_reservation(
        &self,
        _actor: &UserRef,
        _request: &ReservationRequest,
    ) -> Result<Reservation, ReservationError> {
        self.drafts.fetch_add(1, Ordering::SeqCst);
        Err(ReservationError::Storage("not used".to_owned()))
    }

    async fn change_reservation(
        &self,
        _actor: &UserRef,
        _partial: &ReservationPartial,
    ) -> Result<Reservation, ReservationError> {
        Err(ReservationError::InvalidTransition {
            from: ReservationState::CheckedOut,
            to: ReservationState::Cancelled,
        })
    }

    async fn get_reservation(
        &self,
        actor: &UserRef,
        reservation_id: i64,
    ) -> Result<Reservation, ReservationError> {
        Ok(Reservation {
            id: reservation_id,
            start: at(monday(), 10, 0),
            end: at(monday(), 11, 0),
            state: ReservationState::CheckedOut,
            room: Some(RoomRef {
                id: "SN156".to_owned(),
            }),
            users: vec![actor.clone()],
        })
    }

    async fn get_current_reservations_for_user(
        &self,
        _actor: &UserRef,
    ) -> Result<Vec<Reservation>, ReservationError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_change_reservation_stops_when_cancel_fails() {
    let world = create_test_world().await;
    let reservations = Arc::new(CancelRefusingReservations::default());
    let dispatcher = Dispatcher::new(
        reservations.clone(),
        world.office_hours.clone(),
        world.clock.clone(),
    );

    let outcome = dispatcher
        .dispatch(
            intent(
                "change_reservation",
                &json!({
                    "reservation_id": 5,
                    "start": "2025-03-04T13:00:00",
                    "end": "2025-03-04T14:00:00"
                }),
            ),
            &world.student_ref(),
        )
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.response,
        "❌ Could not change reservation: a CHECKED_OUT reservation cannot be changed to CANCELLED."
    );
    assert_eq!(reservations.drafts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_change_of_cancelled_reservation_books_nothing() {
    let world = create_test_world().await;
    let student = world.student_ref();
    reserve(&world, &student, "SN156", "2025-03-03T10:00:00", "2025-03-03T11:00:00").await;
    run(&world, &student, "cancel_reservation", &json!({"reservation_id": 1})).await;

    let outcome = run(
        &world,
        &student,
        "change_reservation",
        &json!({
            "reservation_id": 1,
            "start": "2025-03-04T13:00:00",
            "end": "2025-03-04T14:00:00"
        }),
    )
    .await;

    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.response,
        "❌ Could not change reservation: a CANCELLED reservation cannot be changed to CANCELLED."
    );
    assert!(world
        .reservations
        .get_current_reservations_for_user(&student)
        .await
        .unwrap()
        .is_empty());
}

// ============================================================================
// Office hours
// ============================================================================

#[tokio::test]
async fn test_office_hours_closed_before_start() {
    let world = create_test_world().await;
    let outcome = run(
        &world,
        &world.student_ref(),
        "get_student_office_hours",
        &json!({"course_code": "COMP 423"}),
    )
    .await;

    assert!(outcome.succeeded);
    assert_eq!(
        outcome.response,
        "There are no office hours open right now for COMP 423: Foundations of Software \
         Engineering."
    );
}

#[tokio::test]
async fn test_office_hours_open_with_normalized_course_code() {
    let world = create_test_world().await;
    world.clock.set(at(monday(), 10, 30));

    let outcome = run(
        &world,
        &world.student_ref(),
        "get_student_office_hours",
        &json!({"course_code": " comp423 "}),
    )
    .await;

    assert!(outcome.succeeded);
    assert_eq!(
        outcome.response,
        format!(
            "Open office hours for COMP 423: Foundations of Software Engineering:\n\
             • #{} Office Hours in SN 011 until 12:00PM (0 in queue): Weekly help session",
            world.office_hours_id
        )
    );
}

#[tokio::test]
async fn test_office_hours_for_unenrolled_course() {
    let world = create_test_world().await;
    world.clock.set(at(monday(), 10, 30));

    let unknown = run(
        &world,
        &world.student_ref(),
        "get_student_office_hours",
        &json!({"course_code": "COMP 999"}),
    )
    .await;
    assert_eq!(
        unknown.response,
        "I couldn't find a current course matching \"COMP 999\" that you're enrolled in."
    );

    let not_member = run(
        &world,
        &world.classmate_ref(),
        "get_student_office_hours",
        &json!({"course_code": "COMP 423"}),
    )
    .await;
    assert!(not_member.response.starts_with("I couldn't find a current course"));

    let blank = run(
        &world,
        &world.student_ref(),
        "get_student_office_hours",
        &json!({"course_code": "  "}),
    )
    .await;
    assert!(!blank.succeeded);
    assert_eq!(blank.response, "❌ A course code such as COMP 423 is required.");
}

#[tokio::test]
async fn test_office_hours_outside_term_are_not_matched() {
    let world = create_test_world().await;
    world
        .clock
        .set(at(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), 10, 30));

    let outcome = run(
        &world,
        &world.student_ref(),
        "get_student_office_hours",
        &json!({"course_code": "COMP 423"}),
    )
    .await;
    assert!(outcome.response.starts_with("I couldn't find a current course"));
}

#[tokio::test]
async fn test_submit_ticket_while_open() {
    let world = create_test_world().await;
    world.clock.set(at(monday(), 10, 30));

    let outcome = run(
        &world,
        &world.student_ref(),
        "submit_ticket",
        &json!({
            "office_hours_id": world.office_hours_id,
            "description": "  Stuck on recursion  ",
            "ticket_type": 1
        }),
    )
    .await;

    assert!(outcome.succeeded, "{}", outcome.response);
    assert_eq!(outcome.kind, IntentKind::SubmitTicket);
    assert_eq!(
        outcome.response,
        format!(
            "✅ Ticket #1 submitted to office hours #{}. A TA will call you soon.",
            world.office_hours_id
        )
    );

    let queue = run(
        &world,
        &world.student_ref(),
        "get_student_office_hours",
        &json!({"course_code": "COMP 423"}),
    )
    .await;
    assert!(queue.response.contains("(1 in queue)"), "{}", queue.response);
}

#[tokio::test]
async fn test_submit_ticket_rejections() {
    let world = create_test_world().await;
    let oh = world.office_hours_id;

    let closed = run(
        &world,
        &world.student_ref(),
        "submit_ticket",
        &json!({"office_hours_id": oh, "description": "Help", "ticket_type": 0}),
    )
    .await;
    assert!(!closed.succeeded);
    assert_eq!(
        closed.response,
        "❌ Office hours request failed: these office hours are not currently open."
    );

    world.clock.set(at(monday(), 10, 30));
    let not_member = run(
        &world,
        &world.classmate_ref(),
        "submit_ticket",
        &json!({"office_hours_id": oh, "description": "Help", "ticket_type": 0}),
    )
    .await;
    assert_eq!(
        not_member.response,
        "❌ Office hours request failed: you are not enrolled in the course for these office hours."
    );

    let unknown = run(
        &world,
        &world.student_ref(),
        "submit_ticket",
        &json!({"office_hours_id": 999, "description": "Help", "ticket_type": 0}),
    )
    .await;
    assert_eq!(
        unknown.response,
        "❌ Office hours request failed: office hours 999 were not found."
    );

    let blank = run(
        &world,
        &world.student_ref(),
        "submit_ticket",
        &json!({"office_hours_id": oh, "description": " ", "ticket_type": 0}),
    )
    .await;
    assert_eq!(
        blank.response,
        "❌ A ticket needs a description of what you need help with."
    );
}

// ============================================================================
// Internal failures stay internal
// ============================================================================

struct BrokenReservations;

#[async_trait]
impl ReservationService for BrokenReservations {
    async fn get_map_reserved_times_by_date(
        &self,
        _date: NaiveDate,
        _actor: &UserRef,
    ) -> Result<ReservationMapDetails, ReservationError> {
        Err(ReservationError::Storage(
            "database is locked: /var/lib/coworking.db".to_owned(),
        ))
    }

    async fn draft_reservation(
        &self,
        _actor: &UserRef,
        _request: &ReservationRequest,
    ) -> Result<Reservation, ReservationError> {
        Err(ReservationError::Storage("disk I/O error".to_owned()))
    }

    async fn change_reservation(
        &self,
        _actor: &UserRef,
        _partial: &ReservationPartial,
    ) -> Result<Reservation, ReservationError> {
        Err(ReservationError::Storage("disk I/O error".to_owned()))
    }

    async fn get_reservation(
        &self,
        _actor: &UserRef,
        reservation_id: i64,
    ) -> Result<Reservation, ReservationError> {
        Err(ReservationError::NotFound(reservation_id))
    }

    async fn get_current_reservations_for_user(
        &self,
        _actor: &UserRef,
    ) -> Result<Vec<Reservation>, ReservationError> {
        Err(ReservationError::Storage("disk I/O error".to_owned()))
    }
}

#[tokio::test]
async fn test_storage_errors_are_not_shown_to_users() {
    let world = create_test_world().await;
    let dispatcher = Dispatcher::new(
        Arc::new(BrokenReservations),
        world.office_hours.clone(),
        world.clock.clone(),
    );
    let student = world.student_ref();

    let rooms = dispatcher
        .dispatch(intent("get_available_rooms", &json!({"date": "2025-03-03"})), &student)
        .await;
    assert!(!rooms.succeeded);
    assert_eq!(
        rooms.response,
        "❌ Could not check room availability. Something went wrong on our side, please try again \
         later."
    );

    let booking = dispatcher
        .dispatch(
            intent(
                "reserve_room",
                &json!({
                    "room_id": "SN156",
                    "start": "2025-03-03T10:00:00",
                    "end": "2025-03-03T11:00:00"
                }),
            ),
            &student,
        )
        .await;
    assert!(!booking.response.contains("disk"));
    assert!(booking.response.starts_with("❌ Reservation failed."));

    let list = dispatcher
        .dispatch(intent("get_user_reservations", &json!({})), &student)
        .await;
    assert!(!list.response.contains("I/O"));
}
