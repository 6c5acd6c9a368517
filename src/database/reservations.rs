// ABOUTME: SQLite-backed reservation collaborator enforcing the booking policy
// ABOUTME: Builds per-room slot maps, drafts reservations and applies partial updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! # Reservation Collaborator
//!
//! Policy enforced on every new or moved booking:
//! - start before end, both on a 30-minute boundary
//! - at most [`MAX_RESERVATION_MINUTES`] long
//! - inside one operating hours window
//! - not starting in the past
//! - room exists, is reservable and currently available
//! - no overlap with another active booking of the room or of any booked user
//!
//! Writes are serialized through a process-wide lock so the overlap checks and
//! the insert cannot interleave.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{decode_datetime, encode_datetime, start_of_day};
use crate::constants::booking::{MAX_RESERVATION_MINUTES, SLOT_MINUTES};
use crate::models::{
    Reservation, ReservationMapDetails, ReservationPartial, ReservationRequest, ReservationState,
    RoomRef, TimeRange, UserRef, SLOT_AVAILABLE, SLOT_RESERVED, SLOT_SUBJECT_RESERVED,
    SLOT_UNAVAILABLE,
};
use crate::services::{Clock, ReservationError, ReservationService};

const ACTIVE_STATES: &str = "('DRAFT', 'CONFIRMED', 'CHECKED_IN')";

fn storage(e: impl std::fmt::Display) -> ReservationError {
    ReservationError::Storage(e.to_string())
}

/// Reservation collaborator backed by `SQLite`
pub struct SqliteReservationService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl SqliteReservationService {
    /// Create a service over `pool`
    #[must_use]
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the space for `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::InvalidTimeRange`] if `start >= end`, or a storage error
    pub async fn add_operating_hours(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TimeRange, ReservationError> {
        if start >= end {
            return Err(ReservationError::InvalidTimeRange);
        }
        sqlx::query("INSERT INTO operating_hours (start_at, end_at) VALUES ($1, $2)")
            .bind(encode_datetime(start))
            .bind(encode_datetime(end))
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(TimeRange { start, end })
    }

    /// Operating hours rows overlapping `[from, to)`, merged where they touch
    async fn operating_windows(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<TimeRange>, ReservationError> {
        let rows = sqlx::query(
            r"
            SELECT start_at, end_at FROM operating_hours
            WHERE start_at < $1 AND end_at > $2
            ORDER BY start_at
            ",
        )
        .bind(encode_datetime(to))
        .bind(encode_datetime(from))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let windows = rows
            .iter()
            .map(|r| {
                Ok(TimeRange {
                    start: decode_datetime(&r.get::<String, _>("start_at")).map_err(storage)?,
                    end: decode_datetime(&r.get::<String, _>("end_at")).map_err(storage)?,
                })
            })
            .collect::<Result<Vec<_>, ReservationError>>()?;
        Ok(merge_windows(windows))
    }

    /// Windows that open on `date`
    async fn windows_for_date(&self, date: NaiveDate) -> Result<Vec<TimeRange>, ReservationError> {
        let day_start = start_of_day(date);
        let day_end = day_start + TimeDelta::days(1);
        let windows = self.operating_windows(day_start, day_end).await?;
        Ok(windows
            .into_iter()
            .filter(|w| w.start >= day_start && w.start < day_end)
            .collect())
    }

    async fn within_operating_hours(&self, range: TimeRange) -> Result<bool, ReservationError> {
        let windows = self.operating_windows(range.start, range.end).await?;
        Ok(windows.iter().any(|w| w.contains(&range)))
    }

    /// Policy checks shared by drafting and rescheduling
    async fn validate_times(&self, range: TimeRange) -> Result<(), ReservationError> {
        if range.start >= range.end {
            return Err(ReservationError::InvalidTimeRange);
        }
        if !is_slot_aligned(range.start) || !is_slot_aligned(range.end) {
            return Err(ReservationError::NotAligned);
        }
        if range.duration() > TimeDelta::minutes(MAX_RESERVATION_MINUTES) {
            return Err(ReservationError::TooLong {
                max_minutes: MAX_RESERVATION_MINUTES,
            });
        }
        if range.start < self.clock.now() {
            return Err(ReservationError::InPast);
        }
        if !self.within_operating_hours(range).await? {
            return Err(ReservationError::OutsideOperatingHours);
        }
        Ok(())
    }

    async fn validate_room(&self, room_id: &str) -> Result<(), ReservationError> {
        let row = sqlx::query("SELECT reservable, is_available FROM rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        let Some(row) = row else {
            return Err(ReservationError::RoomNotFound(room_id.to_owned()));
        };
        let reservable: bool = row.get("reservable");
        let is_available: bool = row.get("is_available");
        if !reservable || !is_available {
            return Err(ReservationError::RoomUnavailable(room_id.to_owned()));
        }
        Ok(())
    }

    /// Overlap checks against other active bookings, ignoring `exclude_id`
    async fn validate_no_conflicts(
        &self,
        room_id: &str,
        user_ids: &[i64],
        range: TimeRange,
        exclude_id: Option<i64>,
    ) -> Result<(), ReservationError> {
        let exclude = exclude_id.unwrap_or(-1);

        let room_conflicts: i64 = sqlx::query_scalar(&format!(
            r"
            SELECT COUNT(*) FROM reservations
            WHERE room_id = $1 AND state IN {ACTIVE_STATES}
              AND start_at < $2 AND end_at > $3 AND id != $4
            "
        ))
        .bind(room_id)
        .bind(encode_datetime(range.end))
        .bind(encode_datetime(range.start))
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        if room_conflicts > 0 {
            return Err(ReservationError::Conflict(room_id.to_owned()));
        }

        for user_id in user_ids {
            let user_conflicts: i64 = sqlx::query_scalar(&format!(
                r"
                SELECT COUNT(*) FROM reservations r
                JOIN reservation_users ru ON ru.reservation_id = r.id
                WHERE ru.user_id = $1 AND r.state IN {ACTIVE_STATES}
                  AND r.start_at < $2 AND r.end_at > $3 AND r.id != $4
                "
            ))
            .bind(user_id)
            .bind(encode_datetime(range.end))
            .bind(encode_datetime(range.start))
            .bind(exclude)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
            if user_conflicts > 0 {
                return Err(ReservationError::UserConflict);
            }
        }
        Ok(())
    }

    async fn load_users(&self, reservation_id: i64) -> Result<Vec<UserRef>, ReservationError> {
        let rows = sqlx::query(
            r"
            SELECT u.id, u.first_name, u.last_name
            FROM reservation_users ru
            JOIN users u ON u.id = ru.user_id
            WHERE ru.reservation_id = $1
            ORDER BY u.id
            ",
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|r| UserRef {
                id: r.get("id"),
                first_name: r.get("first_name"),
                last_name: r.get("last_name"),
            })
            .collect())
    }

    /// Load a reservation the actor belongs to
    async fn load_owned(
        &self,
        actor: &UserRef,
        reservation_id: i64,
    ) -> Result<Reservation, ReservationError> {
        let row = sqlx::query(
            r"
            SELECT r.id, r.room_id, r.start_at, r.end_at, r.state
            FROM reservations r
            JOIN reservation_users ru ON ru.reservation_id = r.id
            WHERE r.id = $1 AND ru.user_id = $2
            ",
        )
        .bind(reservation_id)
        .bind(actor.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        let Some(row) = row else {
            return Err(ReservationError::NotFound(reservation_id));
        };
        self.row_to_reservation(&row).await
    }

    async fn row_to_reservation(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<Reservation, ReservationError> {
        let id: i64 = row.get("id");
        let room_id: Option<String> = row.get("room_id");
        let state: String = row.get("state");
        Ok(Reservation {
            id,
            start: decode_datetime(&row.get::<String, _>("start_at")).map_err(storage)?,
            end: decode_datetime(&row.get::<String, _>("end_at")).map_err(storage)?,
            state: state.parse().map_err(storage)?,
            room: room_id.map(|id| RoomRef { id }),
            users: self.load_users(id).await?,
        })
    }
}

/// Sort and merge windows that overlap or touch
fn merge_windows(mut windows: Vec<TimeRange>) -> Vec<TimeRange> {
    windows.sort();
    let mut merged: Vec<TimeRange> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => last.end = last.end.max(window.end),
            _ => merged.push(window),
        }
    }
    merged
}

fn is_slot_aligned(instant: NaiveDateTime) -> bool {
    instant.second() == 0
        && instant.nanosecond() == 0
        && i64::from(instant.minute()) % SLOT_MINUTES == 0
}

/// Whether a state change is permitted
const fn transition_allowed(from: ReservationState, to: ReservationState) -> bool {
    use ReservationState::{Cancelled, CheckedIn, CheckedOut, Confirmed, Draft};
    matches!(
        (from, to),
        (Draft, Confirmed | Cancelled)
            | (Confirmed, CheckedIn | Cancelled)
            | (CheckedIn, CheckedOut)
    )
}

struct BookedRange {
    room_id: String,
    range: TimeRange,
    mine: bool,
}

#[async_trait]
impl ReservationService for SqliteReservationService {
    async fn get_map_reserved_times_by_date(
        &self,
        date: NaiveDate,
        actor: &UserRef,
    ) -> Result<ReservationMapDetails, ReservationError> {
        let windows = self.windows_for_date(date).await?;
        let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
            let midnight = start_of_day(date);
            return Ok(ReservationMapDetails {
                reserved_date_map: BTreeMap::new(),
                operating_hours_start: midnight,
                operating_hours_end: midnight,
                number_of_time_slots: 0,
            });
        };

        let window = TimeRange {
            start: first.start,
            end: last.end,
        };
        let slot_total = window.duration().num_minutes() / SLOT_MINUTES;
        let slot_count = usize::try_from(slot_total).map_err(storage)?;

        let rooms =
            sqlx::query("SELECT id, is_available FROM rooms WHERE reservable = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;

        let booked_rows = sqlx::query(&format!(
            r"
            SELECT r.room_id, r.start_at, r.end_at,
                   EXISTS (
                       SELECT 1 FROM reservation_users ru
                       WHERE ru.reservation_id = r.id AND ru.user_id = $1
                   ) AS mine
            FROM reservations r
            WHERE r.room_id IS NOT NULL AND r.state IN {ACTIVE_STATES}
              AND r.start_at < $2 AND r.end_at > $3
            "
        ))
        .bind(actor.id)
        .bind(encode_datetime(window.end))
        .bind(encode_datetime(window.start))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let booked = booked_rows
            .iter()
            .map(|r| {
                Ok(BookedRange {
                    room_id: r.get("room_id"),
                    range: TimeRange {
                        start: decode_datetime(&r.get::<String, _>("start_at")).map_err(storage)?,
                        end: decode_datetime(&r.get::<String, _>("end_at")).map_err(storage)?,
                    },
                    mine: r.get("mine"),
                })
            })
            .collect::<Result<Vec<_>, ReservationError>>()?;

        let now = self.clock.now();
        let mut reserved_date_map = BTreeMap::new();
        for room in &rooms {
            let room_id: String = room.get("id");
            let is_available: bool = room.get("is_available");

            let slots = (0..slot_total)
                .map(|index| {
                    let slot_start = window.start + TimeDelta::minutes(SLOT_MINUTES * index);
                    let slot = TimeRange {
                        start: slot_start,
                        end: slot_start + TimeDelta::minutes(SLOT_MINUTES),
                    };
                    let open = windows.iter().any(|w| w.contains(&slot));
                    let holder = booked
                        .iter()
                        .filter(|b| b.room_id == room_id && b.range.overlaps(&slot))
                        .map(|b| b.mine)
                        .max();
                    match holder {
                        Some(true) => SLOT_SUBJECT_RESERVED,
                        Some(false) => SLOT_RESERVED,
                        None if !open || !is_available || slot_start < now => SLOT_UNAVAILABLE,
                        None => SLOT_AVAILABLE,
                    }
                })
                .collect::<Vec<u8>>();
            reserved_date_map.insert(room_id, slots);
        }

        debug!(%date, rooms = reserved_date_map.len(), slots = slot_count, "Built reservation map");
        Ok(ReservationMapDetails {
            reserved_date_map,
            operating_hours_start: window.start,
            operating_hours_end: window.end,
            number_of_time_slots: slot_count,
        })
    }

    async fn draft_reservation(
        &self,
        actor: &UserRef,
        request: &ReservationRequest,
    ) -> Result<Reservation, ReservationError> {
        let range = TimeRange {
            start: request.start,
            end: request.end,
        };
        let room_id = request.room.id.trim().to_uppercase();

        let mut users = request.users.clone();
        if !users.iter().any(|u| u.id == actor.id) {
            users.push(actor.clone());
        }
        let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();

        let _guard = self.write_lock.lock().await;
        self.validate_times(range).await?;
        self.validate_room(&room_id).await?;
        self.validate_no_conflicts(&room_id, &user_ids, range, None)
            .await?;

        let now = encode_datetime(self.clock.now());
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let result = sqlx::query(
            r"
            INSERT INTO reservations (room_id, start_at, end_at, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ",
        )
        .bind(&room_id)
        .bind(encode_datetime(range.start))
        .bind(encode_datetime(range.end))
        .bind(request.state.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        let id = result.last_insert_rowid();

        for user_id in &user_ids {
            sqlx::query("INSERT INTO reservation_users (reservation_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }
        tx.commit().await.map_err(storage)?;

        info!(reservation_id = id, room = %room_id, user_id = actor.id, "Drafted reservation");
        Ok(Reservation {
            id,
            start: range.start,
            end: range.end,
            state: request.state,
            room: Some(RoomRef { id: room_id }),
            users: self.load_users(id).await?,
        })
    }

    async fn change_reservation(
        &self,
        actor: &UserRef,
        partial: &ReservationPartial,
    ) -> Result<Reservation, ReservationError> {
        let _guard = self.write_lock.lock().await;
        let current = self.load_owned(actor, partial.id).await?;

        let state = match partial.state {
            Some(to) if to != current.state || to == ReservationState::Cancelled => {
                if !transition_allowed(current.state, to) {
                    return Err(ReservationError::InvalidTransition {
                        from: current.state,
                        to,
                    });
                }
                to
            }
            _ => current.state,
        };

        let range = TimeRange {
            start: partial.start.unwrap_or(current.start),
            end: partial.end.unwrap_or(current.end),
        };
        let times_changed = range.start != current.start || range.end != current.end;
        if times_changed {
            if !matches!(
                current.state,
                ReservationState::Draft | ReservationState::Confirmed
            ) || state == ReservationState::Cancelled
            {
                return Err(ReservationError::NotModifiable(current.state));
            }
            self.validate_times(range).await?;
            if let Some(room) = &current.room {
                let user_ids: Vec<i64> = current.users.iter().map(|u| u.id).collect();
                self.validate_no_conflicts(&room.id, &user_ids, range, Some(current.id))
                    .await?;
            }
        }

        sqlx::query(
            r"
            UPDATE reservations SET state = $1, start_at = $2, end_at = $3, updated_at = $4
            WHERE id = $5
            ",
        )
        .bind(state.as_str())
        .bind(encode_datetime(range.start))
        .bind(encode_datetime(range.end))
        .bind(encode_datetime(self.clock.now()))
        .bind(current.id)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        info!(
            reservation_id = current.id,
            user_id = actor.id,
            state = %state,
            rescheduled = times_changed,
            "Changed reservation"
        );
        Ok(Reservation {
            state,
            start: range.start,
            end: range.end,
            ..current
        })
    }

    async fn get_reservation(
        &self,
        actor: &UserRef,
        reservation_id: i64,
    ) -> Result<Reservation, ReservationError> {
        self.load_owned(actor, reservation_id).await
    }

    async fn get_current_reservations_for_user(
        &self,
        actor: &UserRef,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT r.id, r.room_id, r.start_at, r.end_at, r.state
            FROM reservations r
            JOIN reservation_users ru ON ru.reservation_id = r.id
            WHERE ru.user_id = $1 AND r.state IN {ACTIVE_STATES} AND r.end_at > $2
            ORDER BY r.start_at ASC, r.id ASC
            "
        ))
        .bind(actor.id)
        .bind(encode_datetime(self.clock.now()))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            reservations.push(self.row_to_reservation(row).await?);
        }
        Ok(reservations)
    }
}
