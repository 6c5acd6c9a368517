// ABOUTME: Office hours DTOs: academic terms, course sites, office-hour events and help tickets
// ABOUTME: TicketType is a closed two-valued enum decoded from the integers 0 and 1
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Academic term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Term id (e.g. "S25")
    pub id: String,
    /// Display name
    pub name: String,
    /// First instant of the term
    pub start: NaiveDateTime,
    /// Last instant of the term
    pub end: NaiveDateTime,
}

impl Term {
    /// A term is active iff `start <= now <= end`
    #[must_use]
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }
}

/// Course code attached to a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    /// Subject (e.g. "COMP")
    pub subject_code: String,
    /// Number (e.g. "423")
    pub number: String,
}

impl CourseRef {
    /// Code in the normalised form used for matching ("comp423")
    #[must_use]
    pub fn normalized_code(&self) -> String {
        normalize_course_code(&format!("{}{}", self.subject_code, self.number))
    }
}

impl fmt::Display for CourseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject_code, self.number)
    }
}

/// Trim, drop inner whitespace and case-fold a course code
#[must_use]
pub fn normalize_course_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Office hours site a user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSite {
    /// Site id
    pub id: i64,
    /// Display title
    pub title: String,
    /// Term the site runs in
    pub term: Term,
    /// Courses attached to the site
    pub courses: Vec<CourseRef>,
}

/// A scheduled office hours event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeHoursEvent {
    /// Event id
    pub id: i64,
    /// Owning site
    pub course_site_id: i64,
    /// Kind of event ("Office Hours", "Tutoring", ...)
    pub event_type: String,
    /// Description shown to students
    pub description: String,
    /// Where it takes place
    pub location: String,
    /// Start instant
    pub start: NaiveDateTime,
    /// End instant
    pub end: NaiveDateTime,
    /// Tickets currently waiting
    pub queued_tickets: i64,
}

/// Ticket category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TicketType {
    /// Conceptual question
    Conceptual,
    /// Assignment help
    Assignment,
}

impl TicketType {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conceptual => "CONCEPTUAL_HELP",
            Self::Assignment => "ASSIGNMENT_HELP",
        }
    }
}

impl TryFrom<i64> for TicketType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Conceptual),
            1 => Ok(Self::Assignment),
            other => Err(format!(
                "ticket_type must be 0 (conceptual) or 1 (assignment), got {other}"
            )),
        }
    }
}

impl From<TicketType> for i64 {
    fn from(value: TicketType) -> Self {
        match value {
            TicketType::Conceptual => 0,
            TicketType::Assignment => 1,
        }
    }
}

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    /// Waiting in queue
    Queued,
    /// A TA has picked it up
    Called,
    /// Resolved
    Closed,
    /// Withdrawn
    Canceled,
}

impl TicketState {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Called => "CALLED",
            Self::Closed => "CLOSED",
            Self::Canceled => "CANCELED",
        }
    }
}

/// Ticket submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Office hours event to queue on
    pub office_hours_id: i64,
    /// What the student needs help with
    pub description: String,
    /// Category
    pub ticket_type: TicketType,
}

/// Submitted ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id
    pub id: i64,
    /// Office hours event
    pub office_hours_id: i64,
    /// Description
    pub description: String,
    /// Category
    pub ticket_type: TicketType,
    /// State
    pub state: TicketState,
    /// Submission instant
    pub created_at: NaiveDateTime,
}
