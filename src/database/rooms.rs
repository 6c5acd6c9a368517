// ABOUTME: Room catalog database operations
// ABOUTME: Lists rooms, creates them, and toggles whether a room accepts reservations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::Room;

impl Database {
    /// Insert a room
    ///
    /// # Errors
    ///
    /// Returns an error if a room with the same id exists or the insert fails
    pub async fn create_room(&self, room: &Room) -> AppResult<Room> {
        sqlx::query(
            r"
            INSERT INTO rooms (id, building, room, nickname, capacity, reservable, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&room.id)
        .bind(&room.building)
        .bind(&room.room)
        .bind(&room.nickname)
        .bind(room.capacity)
        .bind(room.reservable)
        .bind(room.is_available)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create room: {e}")))?;

        Ok(room.clone())
    }

    /// All rooms ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_rooms(&self) -> AppResult<Vec<Room>> {
        let rows = sqlx::query(
            r"
            SELECT id, building, room, nickname, capacity, reservable, is_available
            FROM rooms
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list rooms: {e}")))?;

        Ok(rows.iter().map(row_to_room).collect())
    }

    /// Get a room by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_room(&self, room_id: &str) -> AppResult<Option<Room>> {
        let row = sqlx::query(
            r"
            SELECT id, building, room, nickname, capacity, reservable, is_available
            FROM rooms
            WHERE id = $1
            ",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get room: {e}")))?;

        Ok(row.as_ref().map(row_to_room))
    }

    /// Flip `is_available` and return the updated room
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown room, or a database error
    pub async fn toggle_room_availability(&self, room_id: &str) -> AppResult<Room> {
        let result = sqlx::query(
            r"
            UPDATE rooms SET is_available = NOT is_available
            WHERE id = $1
            ",
        )
        .bind(room_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to toggle room availability: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Room {room_id} not found")));
        }

        self.get_room(room_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))
    }
}

pub(crate) fn row_to_room(r: &SqliteRow) -> Room {
    Room {
        id: r.get("id"),
        building: r.get("building"),
        room: r.get("room"),
        nickname: r.get("nickname"),
        capacity: r.get("capacity"),
        reservable: r.get("reservable"),
        is_available: r.get("is_available"),
    }
}
