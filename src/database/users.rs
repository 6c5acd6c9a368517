// ABOUTME: User lookup and creation database operations
// ABOUTME: Resolves the asserted caller id into a full User with its admin flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;

impl Database {
    /// Insert a user and return it with its assigned id
    ///
    /// # Errors
    ///
    /// Returns an error if the pid or onyen is already taken or the insert fails
    pub async fn create_user(&self, user: &User) -> AppResult<User> {
        let result = sqlx::query(
            r"
            INSERT INTO users (pid, onyen, first_name, last_name, email, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user.pid)
        .bind(&user.onyen)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.is_admin)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        Ok(User {
            id: result.last_insert_rowid(),
            ..user.clone()
        })
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, pid, onyen, first_name, last_name, email, is_admin
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        Ok(row.as_ref().map(row_to_user))
    }
}

fn row_to_user(r: &SqliteRow) -> User {
    User {
        id: r.get("id"),
        pid: r.get("pid"),
        onyen: r.get("onyen"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        email: r.get("email"),
        is_admin: r.get("is_admin"),
    }
}
