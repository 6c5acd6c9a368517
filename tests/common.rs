// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides an in-memory database, seeded users, rooms and courses, and a scripted model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]
//! Shared test utilities for `coworking_chat_server`
//!
//! Every world is anchored on Monday 2025-03-03 at 08:00. The space is open
//! 09:00-17:00 on the 3rd and 4th, and the student is enrolled in COMP 423,
//! whose office hours run 10:00-12:00 on the 3rd.

use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use coworking_chat_server::chat::ChatOrchestrator;
use coworking_chat_server::config::ServerConfig;
use coworking_chat_server::database::{Database, SqliteOfficeHoursService, SqliteReservationService};
use coworking_chat_server::errors::{AppError, AppResult};
use coworking_chat_server::llm::{ChatRequest, ChatResponse, FunctionDeclaration, LlmProvider};
use coworking_chat_server::models::{CourseRef, Room, Term, User, UserRef};
use coworking_chat_server::resources::ServerResources;
use coworking_chat_server::services::{Clock, FixedClock};
use coworking_chat_server::tools::Dispatcher;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet test logging (set `TEST_LOG=DEBUG` for more)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Monday 2025-03-03
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

/// Tuesday 2025-03-04
pub fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

/// Fresh, migrated in-memory database
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:")
        .await
        .expect("open in-memory database")
}

pub fn test_user(pid: i64, onyen: &str, first_name: &str, is_admin: bool) -> User {
    User {
        id: 0,
        pid,
        onyen: onyen.to_owned(),
        first_name: first_name.to_owned(),
        last_name: "Tester".to_owned(),
        email: format!("{onyen}@example.edu"),
        is_admin,
    }
}

pub fn test_room(id: &str, reservable: bool) -> Room {
    Room {
        id: id.to_owned(),
        building: "Sitterson".to_owned(),
        room: id.trim_start_matches("SN").to_owned(),
        nickname: format!("Room {id}"),
        capacity: 4,
        reservable,
        is_available: true,
    }
}

/// Model double that replays scripted responses and records every request
#[derive(Default)]
pub struct ScriptedLlmProvider {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
    offered_functions: Mutex<Vec<usize>>,
}

impl ScriptedLlmProvider {
    pub fn new(responses: impl IntoIterator<Item = ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn push(&self, response: ChatResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ChatRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("the model was called")
    }

    pub fn offered_function_counts(&self) -> Vec<usize> {
        self.offered_functions.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete_with_functions(
        &self,
        request: &ChatRequest,
        functions: &[FunctionDeclaration],
    ) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.offered_functions.lock().unwrap().push(functions.len());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::external_service("scripted", "no scripted response left"))
    }
}

/// Seeded database plus collaborators sharing one fixed clock
pub struct TestWorld {
    pub database: Database,
    pub clock: Arc<FixedClock>,
    pub reservations: Arc<SqliteReservationService>,
    pub office_hours: Arc<SqliteOfficeHoursService>,
    pub student: User,
    pub classmate: User,
    pub admin: User,
    pub site_id: i64,
    pub office_hours_id: i64,
}

impl TestWorld {
    pub fn student_ref(&self) -> UserRef {
        self.student.to_ref()
    }

    pub fn classmate_ref(&self) -> UserRef {
        self.classmate.to_ref()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.reservations.clone(),
            self.office_hours.clone(),
            self.clock.clone(),
        )
    }

    pub fn orchestrator(&self, provider: Arc<ScriptedLlmProvider>) -> ChatOrchestrator {
        ChatOrchestrator::new(provider, self.dispatcher(), self.clock.clone())
    }

    /// Server resources wired to this world's collaborators
    pub fn resources(&self, provider: Arc<ScriptedLlmProvider>) -> Arc<ServerResources> {
        let clock: Arc<dyn Clock> = self.clock.clone();
        Arc::new(ServerResources::with_collaborators(
            self.database.clone(),
            provider,
            self.reservations.clone(),
            self.office_hours.clone(),
            clock,
            ServerConfig::default(),
        ))
    }
}

/// Build the standard seeded world
pub async fn create_test_world() -> TestWorld {
    let database = create_test_database().await;
    let clock = Arc::new(FixedClock::new(at(monday(), 8, 0)));

    let student = database
        .create_user(&test_user(730_000_001, "student", "Sam", false))
        .await
        .unwrap();
    let classmate = database
        .create_user(&test_user(730_000_002, "classmate", "Casey", false))
        .await
        .unwrap();
    let admin = database
        .create_user(&test_user(730_000_099, "ambassador", "Alex", true))
        .await
        .unwrap();

    for room in [
        test_room("SN135", true),
        test_room("SN156", true),
        test_room("SN139", false),
    ] {
        database.create_room(&room).await.unwrap();
    }

    let reservations = Arc::new(SqliteReservationService::new(
        database.pool().clone(),
        clock.clone(),
    ));
    for day in [monday(), tuesday()] {
        reservations
            .add_operating_hours(at(day, 9, 0), at(day, 17, 0))
            .await
            .unwrap();
    }

    let office_hours = Arc::new(SqliteOfficeHoursService::new(
        database.pool().clone(),
        clock.clone(),
    ));
    let term = office_hours
        .create_term(&Term {
            id: "S25".to_owned(),
            name: "Spring 2025".to_owned(),
            start: at(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(), 0, 0),
            end: at(NaiveDate::from_ymd_opt(2025, 5, 9).unwrap(), 23, 59),
        })
        .await
        .unwrap();
    let site = office_hours
        .create_course_site(
            "COMP 423: Foundations of Software Engineering",
            &term,
            &[CourseRef {
                subject_code: "COMP".to_owned(),
                number: "423".to_owned(),
            }],
        )
        .await
        .unwrap();
    office_hours
        .add_member(site.id, student.id, "STUDENT")
        .await
        .unwrap();
    let event = office_hours
        .create_office_hours(
            site.id,
            "Office Hours",
            "Weekly help session",
            "SN 011",
            at(monday(), 10, 0),
            at(monday(), 12, 0),
        )
        .await
        .unwrap();

    TestWorld {
        database,
        clock,
        reservations,
        office_hours,
        student,
        classmate,
        admin,
        site_id: site.id,
        office_hours_id: event.id,
    }
}
