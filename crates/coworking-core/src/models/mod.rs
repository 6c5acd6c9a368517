// ABOUTME: Domain model module organization for the coworking chat server
// ABOUTME: Re-exports conversation, reservation, office-hours and user DTOs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

/// Chatbot conversation transcripts and outcomes
pub mod conversation;
/// Office hours, course sites and tickets
pub mod office_hours;
/// Pagination parameters and envelopes
pub mod pagination;
/// Rooms, reservations and availability maps
pub mod reservation;
/// Registered users
pub mod user;

pub use conversation::{ConversationOutcome, ConversationRecord, NewConversation};
pub use office_hours::{
    normalize_course_code, CourseRef, CourseSite, NewTicket, OfficeHoursEvent, Term, Ticket,
    TicketState, TicketType,
};
pub use pagination::{Paginated, PaginationParams, MAX_PAGE_SIZE};
pub use reservation::{
    Reservation, ReservationMapDetails, ReservationPartial, ReservationRequest, ReservationState,
    Room, RoomRef, TimeRange, SLOT_AVAILABLE, SLOT_MINUTES, SLOT_RESERVED, SLOT_SUBJECT_RESERVED,
    SLOT_UNAVAILABLE,
};
pub use user::{User, UserRef};
