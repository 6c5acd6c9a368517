// ABOUTME: Shared server resources handed to every router
// ABOUTME: Builds the collaborators, dispatcher and orchestrator once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::sync::Arc;

use crate::chat::ChatOrchestrator;
use crate::config::ServerConfig;
use crate::database::{
    ConversationManager, Database, SqliteOfficeHoursService, SqliteReservationService,
};
use crate::health::HealthChecker;
use crate::llm::LlmProvider;
use crate::services::{Clock, OfficeHoursService, ReservationService};
use crate::tools::Dispatcher;

/// Dependency bundle shared by all handlers
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Conversation store
    pub conversations: ConversationManager,
    /// Chat turn handler
    pub orchestrator: ChatOrchestrator,
    /// Health checker
    pub health: HealthChecker,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire the bundled `SQLite` collaborators
    #[must_use]
    pub fn new(
        database: Database,
        provider: Arc<dyn LlmProvider>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
    ) -> Self {
        let reservations: Arc<dyn ReservationService> = Arc::new(SqliteReservationService::new(
            database.pool().clone(),
            clock.clone(),
        ));
        let office_hours: Arc<dyn OfficeHoursService> = Arc::new(SqliteOfficeHoursService::new(
            database.pool().clone(),
            clock.clone(),
        ));
        Self::with_collaborators(database, provider, reservations, office_hours, clock, config)
    }

    /// Wire caller-supplied collaborators
    #[must_use]
    pub fn with_collaborators(
        database: Database,
        provider: Arc<dyn LlmProvider>,
        reservations: Arc<dyn ReservationService>,
        office_hours: Arc<dyn OfficeHoursService>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(reservations, office_hours, clock.clone());
        let health = HealthChecker::new(database.clone(), provider.name());
        let orchestrator = ChatOrchestrator::new(provider, dispatcher, clock.clone())
            .with_history_limit(config.chat_history_limit);
        let conversations = ConversationManager::new(database.pool().clone(), clock.clone());

        Self {
            database,
            conversations,
            orchestrator,
            health,
            clock,
            config: Arc::new(config),
        }
    }
}
