// ABOUTME: SQLite-backed office hours collaborator: course sites, open events and ticket queueing
// ABOUTME: Also provides the term, site, membership and event setup used to seed a deployment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{decode_datetime, encode_datetime};
use crate::models::{
    CourseRef, CourseSite, NewTicket, OfficeHoursEvent, Term, Ticket, TicketState, UserRef,
};
use crate::services::{Clock, OfficeHoursError, OfficeHoursService};

fn storage(e: impl std::fmt::Display) -> OfficeHoursError {
    OfficeHoursError::Storage(e.to_string())
}

/// Office hours collaborator backed by `SQLite`
pub struct SqliteOfficeHoursService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteOfficeHoursService {
    /// Create a service over `pool`
    #[must_use]
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Insert a term
    ///
    /// # Errors
    ///
    /// Returns a storage error if the insert fails
    pub async fn create_term(&self, term: &Term) -> Result<Term, OfficeHoursError> {
        sqlx::query("INSERT INTO terms (id, name, start_at, end_at) VALUES ($1, $2, $3, $4)")
            .bind(&term.id)
            .bind(&term.name)
            .bind(encode_datetime(term.start))
            .bind(encode_datetime(term.end))
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(term.clone())
    }

    /// Insert a course site with its course codes
    ///
    /// # Errors
    ///
    /// Returns a storage error if the term does not exist or an insert fails
    pub async fn create_course_site(
        &self,
        title: &str,
        term: &Term,
        courses: &[CourseRef],
    ) -> Result<CourseSite, OfficeHoursError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let id = sqlx::query("INSERT INTO course_sites (title, term_id) VALUES ($1, $2)")
            .bind(title)
            .bind(&term.id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?
            .last_insert_rowid();

        for course in courses {
            sqlx::query("INSERT INTO courses (site_id, subject_code, number) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&course.subject_code)
                .bind(&course.number)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }
        tx.commit().await.map_err(storage)?;

        Ok(CourseSite {
            id,
            title: title.to_owned(),
            term: term.clone(),
            courses: courses.to_vec(),
        })
    }

    /// Enroll a user in a course site
    ///
    /// # Errors
    ///
    /// Returns a storage error if the insert fails
    pub async fn add_member(
        &self,
        site_id: i64,
        user_id: i64,
        member_role: &str,
    ) -> Result<(), OfficeHoursError> {
        sqlx::query(
            r"
            INSERT OR REPLACE INTO site_members (site_id, user_id, member_role)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(site_id)
        .bind(user_id)
        .bind(member_role)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    /// Schedule an office hours event
    ///
    /// # Errors
    ///
    /// Returns a storage error if the site does not exist or the insert fails
    pub async fn create_office_hours(
        &self,
        site_id: i64,
        event_type: &str,
        description: &str,
        location: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<OfficeHoursEvent, OfficeHoursError> {
        let id = sqlx::query(
            r"
            INSERT INTO office_hours (site_id, event_type, description, location, start_at, end_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(site_id)
        .bind(event_type)
        .bind(description)
        .bind(location)
        .bind(encode_datetime(start))
        .bind(encode_datetime(end))
        .execute(&self.pool)
        .await
        .map_err(storage)?
        .last_insert_rowid();

        Ok(OfficeHoursEvent {
            id,
            course_site_id: site_id,
            event_type: event_type.to_owned(),
            description: description.to_owned(),
            location: location.to_owned(),
            start,
            end,
            queued_tickets: 0,
        })
    }

    async fn is_member(&self, site_id: i64, user_id: i64) -> Result<bool, OfficeHoursError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM site_members WHERE site_id = $1 AND user_id = $2",
        )
        .bind(site_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        Ok(count > 0)
    }

    async fn load_courses(&self, site_id: i64) -> Result<Vec<CourseRef>, OfficeHoursError> {
        let rows = sqlx::query(
            "SELECT subject_code, number FROM courses WHERE site_id = $1 ORDER BY id",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|r| CourseRef {
                subject_code: r.get("subject_code"),
                number: r.get("number"),
            })
            .collect())
    }
}

const EVENT_COLUMNS: &str = r"
    SELECT oh.id, oh.site_id, oh.event_type, oh.description, oh.location, oh.start_at, oh.end_at,
           (SELECT COUNT(*) FROM tickets t
            WHERE t.office_hours_id = oh.id AND t.state = 'QUEUED') AS queued_tickets
    FROM office_hours oh
";

fn row_to_event(r: &SqliteRow) -> Result<OfficeHoursEvent, OfficeHoursError> {
    Ok(OfficeHoursEvent {
        id: r.get("id"),
        course_site_id: r.get("site_id"),
        event_type: r.get("event_type"),
        description: r.get("description"),
        location: r.get("location"),
        start: decode_datetime(&r.get::<String, _>("start_at")).map_err(storage)?,
        end: decode_datetime(&r.get::<String, _>("end_at")).map_err(storage)?,
        queued_tickets: r.get("queued_tickets"),
    })
}

#[async_trait]
impl OfficeHoursService for SqliteOfficeHoursService {
    async fn get_user_course_sites(
        &self,
        actor: &UserRef,
    ) -> Result<Vec<CourseSite>, OfficeHoursError> {
        let rows = sqlx::query(
            r"
            SELECT cs.id, cs.title, t.id AS term_id, t.name AS term_name,
                   t.start_at AS term_start, t.end_at AS term_end
            FROM site_members sm
            JOIN course_sites cs ON cs.id = sm.site_id
            JOIN terms t ON t.id = cs.term_id
            WHERE sm.user_id = $1
            ORDER BY cs.id
            ",
        )
        .bind(actor.id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut sites = Vec::with_capacity(rows.len());
        for r in &rows {
            let id: i64 = r.get("id");
            sites.push(CourseSite {
                id,
                title: r.get("title"),
                term: Term {
                    id: r.get("term_id"),
                    name: r.get("term_name"),
                    start: decode_datetime(&r.get::<String, _>("term_start")).map_err(storage)?,
                    end: decode_datetime(&r.get::<String, _>("term_end")).map_err(storage)?,
                },
                courses: self.load_courses(id).await?,
            });
        }
        Ok(sites)
    }

    async fn get_current_office_hours(
        &self,
        actor: &UserRef,
        site_id: i64,
    ) -> Result<Vec<OfficeHoursEvent>, OfficeHoursError> {
        if !self.is_member(site_id, actor.id).await? {
            return Err(OfficeHoursError::NotEnrolled);
        }

        let now = encode_datetime(self.clock.now());
        let rows = sqlx::query(&format!(
            r"
            {EVENT_COLUMNS}
            WHERE oh.site_id = $1 AND oh.start_at <= $2 AND oh.end_at > $2
            ORDER BY oh.start_at, oh.id
            "
        ))
        .bind(site_id)
        .bind(&now)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_event).collect()
    }

    async fn create_ticket(
        &self,
        actor: &UserRef,
        ticket: &NewTicket,
    ) -> Result<Ticket, OfficeHoursError> {
        let row = sqlx::query(&format!("{EVENT_COLUMNS} WHERE oh.id = $1"))
            .bind(ticket.office_hours_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        let Some(row) = row else {
            return Err(OfficeHoursError::NotFound(ticket.office_hours_id));
        };
        let event = row_to_event(&row)?;

        if !self.is_member(event.course_site_id, actor.id).await? {
            return Err(OfficeHoursError::NotEnrolled);
        }
        let now = self.clock.now();
        if now < event.start || now >= event.end {
            return Err(OfficeHoursError::Closed);
        }

        let id = sqlx::query(
            r"
            INSERT INTO tickets
                (office_hours_id, creator_id, description, ticket_type, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(event.id)
        .bind(actor.id)
        .bind(&ticket.description)
        .bind(i64::from(ticket.ticket_type))
        .bind(TicketState::Queued.as_str())
        .bind(encode_datetime(now))
        .execute(&self.pool)
        .await
        .map_err(storage)?
        .last_insert_rowid();

        info!(
            ticket_id = id,
            office_hours_id = event.id,
            user_id = actor.id,
            ticket_type = ticket.ticket_type.as_str(),
            "Queued office hours ticket"
        );
        Ok(Ticket {
            id,
            office_hours_id: event.id,
            description: ticket.description.clone(),
            ticket_type: ticket.ticket_type,
            state: TicketState::Queued,
            created_at: now,
        })
    }
}
