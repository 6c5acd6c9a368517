// ABOUTME: Office hours collaborator contract: course sites, open events and ticket creation
// ABOUTME: OfficeHoursError separates user-facing policy failures from storage failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use async_trait::async_trait;

use crate::models::{CourseSite, NewTicket, OfficeHoursEvent, Ticket, UserRef};

/// Domain errors raised by the office hours collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfficeHoursError {
    /// Unknown office hours event or site
    #[error("office hours {0} were not found")]
    NotFound(i64),
    /// Actor is not a member of the site that owns the event
    #[error("you are not enrolled in the course for these office hours")]
    NotEnrolled,
    /// Event is not running right now
    #[error("these office hours are not currently open")]
    Closed,
    /// Underlying storage failure (internal detail, never shown to users)
    #[error("office hours storage error: {0}")]
    Storage(String),
}

impl OfficeHoursError {
    /// Whether the message contains internal detail
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Office hours collaborator
#[async_trait]
pub trait OfficeHoursService: Send + Sync {
    /// Course sites the actor belongs to, with their term and course codes
    async fn get_user_course_sites(
        &self,
        actor: &UserRef,
    ) -> Result<Vec<CourseSite>, OfficeHoursError>;

    /// Office hours events of `site_id` that are open now
    async fn get_current_office_hours(
        &self,
        actor: &UserRef,
        site_id: i64,
    ) -> Result<Vec<OfficeHoursEvent>, OfficeHoursError>;

    /// Queue a new ticket
    async fn create_ticket(
        &self,
        actor: &UserRef,
        ticket: &NewTicket,
    ) -> Result<Ticket, OfficeHoursError>;
}
