// ABOUTME: Caller identity resolution from the gateway-asserted x-user-id header
// ABOUTME: Unknown or missing identities are rejected; admin-only routes check the admin flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Authentication is performed upstream. The gateway forwards the
//! authenticated user's numeric id in [`USER_ID_HEADER`]; this module only
//! resolves that id to a [`User`].

use axum::http::HeaderMap;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Header carrying the authenticated user's id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolve the caller
///
/// # Errors
///
/// Returns an auth error if the header is missing, not numeric, or names an
/// unknown user, and a database error if the lookup fails.
pub async fn authenticate(headers: &HeaderMap, database: &Database) -> AppResult<User> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::auth_invalid("Missing x-user-id header"))?;

    let user_id: i64 = raw
        .parse()
        .map_err(|_| AppError::auth_invalid("Malformed x-user-id header"))?;

    database
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::auth_invalid("Unknown user"))
}

/// Reject non-admin callers
///
/// # Errors
///
/// Returns a permission error when `user` is not an administrator
pub fn require_admin(user: &User) -> AppResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::permission_denied("Administrator access required"))
    }
}
