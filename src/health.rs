// ABOUTME: Service health reporting for load balancers and operators
// ABOUTME: Reports service identity, uptime, database connectivity and bookable room count
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Health check support
//!
//! The database probe is critical. Having no bookable rooms only degrades the
//! service: the chatbot still answers, but every reservation attempt fails.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::service::{SERVICE_NAME, SERVICE_VERSION};
use crate::database::Database;

/// Component or overall status
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Working normally
    Healthy,
    /// Serving, but bookings cannot succeed
    Degraded,
    /// Storage unreachable
    Unhealthy,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Worst status across `checks`
    pub status: HealthStatus,
    /// Identity of this process
    pub service: ServiceInfo,
    /// One entry per probe
    pub checks: Vec<ComponentHealth>,
    /// Unix seconds when the report was built
    pub timestamp: u64,
    /// Time spent running the probes
    pub response_time_ms: u64,
}

/// Identity of this process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Crate name
    pub name: String,
    /// Crate version
    pub version: String,
    /// Seconds since the checker was created
    pub uptime_seconds: u64,
    /// Model provider answering chat turns
    pub llm_provider: String,
}

/// Result of one probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// `database` or `rooms`
    pub name: String,
    /// Probe status
    pub status: HealthStatus,
    /// Human readable detail
    pub message: String,
    /// Probe duration
    pub duration_ms: u64,
}

impl ComponentHealth {
    fn new(name: &str, status: HealthStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_owned(),
            status,
            message: message.into(),
            duration_ms: elapsed_ms(start),
        }
    }
}

/// Runs the probes behind `GET /health`
pub struct HealthChecker {
    start_time: Instant,
    database: Database,
    llm_provider: &'static str,
}

impl HealthChecker {
    #[must_use]
    pub fn new(database: Database, llm_provider: &'static str) -> Self {
        Self {
            start_time: Instant::now(),
            database,
            llm_provider,
        }
    }

    fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            name: SERVICE_NAME.to_owned(),
            version: SERVICE_VERSION.to_owned(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            llm_provider: self.llm_provider.to_owned(),
        }
    }

    /// Run every component check
    pub async fn check(&self) -> HealthResponse {
        let start = Instant::now();
        let checks = vec![self.check_database().await, self.check_rooms().await];
        let status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        HealthResponse {
            status,
            service: self.service_info(),
            checks,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            response_time_ms: elapsed_ms(start),
        }
    }

    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();
        match self.database.ping().await {
            Ok(()) => ComponentHealth::new("database", HealthStatus::Healthy, "reachable", start),
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                ComponentHealth::new("database", HealthStatus::Unhealthy, "unreachable", start)
            }
        }
    }

    /// Rooms that are both reservable and currently enabled
    async fn check_rooms(&self) -> ComponentHealth {
        let start = Instant::now();
        match self.database.list_rooms().await {
            Ok(rooms) => {
                let bookable = rooms.iter().filter(|r| r.reservable && r.is_available).count();
                let status = if bookable == 0 {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };
                ComponentHealth::new("rooms", status, format!("{bookable} bookable"), start)
            }
            Err(e) => {
                warn!(error = %e, "Room health check failed");
                ComponentHealth::new("rooms", HealthStatus::Unhealthy, "room lookup failed", start)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
