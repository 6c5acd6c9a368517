// ABOUTME: Chat orchestrator: builds the prompt, calls the model once and routes its answer
// ABOUTME: Function calls are decoded into intents and dispatched; plain text is cleaned up
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! # Chat Orchestrator
//!
//! One turn is one model call. The message list is the system instruction
//! (policy text plus the clock's current time), the most recent prior turns up
//! to the configured cap, then the new user message. The reply is either a
//! function call, which is decoded and handed to the [`Dispatcher`], or text.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::chat::{DEFAULT_HISTORY_LIMIT, FALLBACK_REPLY};
use crate::errors::AppResult;
use crate::llm::{
    build_system_prompt, ChatMessage, ChatRequest, FunctionDeclaration, LlmProvider,
    DEFAULT_BOOKING_POLICY,
};
use crate::models::{ConversationOutcome, UserRef};
use crate::services::Clock;
use crate::tools::{function_catalog, Dispatcher, Intent, IntentKind};

/// A prior turn supplied by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// `user` or `assistant` (`bot` is accepted as an alias)
    pub role: String,
    /// Text of the turn
    pub content: String,
}

impl HistoryMessage {
    /// Convert to a prompt message; system and unknown roles are dropped
    fn to_chat_message(&self) -> Option<ChatMessage> {
        match self.role.trim().to_ascii_lowercase().as_str() {
            "user" => Some(ChatMessage::user(self.content.clone())),
            "assistant" | "bot" => Some(ChatMessage::assistant(self.content.clone())),
            _ => None,
        }
    }
}

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Text for the user
    pub response: String,
    /// Operation the model asked for, if any
    pub intent: Option<IntentKind>,
    /// Whether that operation succeeded
    pub succeeded: bool,
}

impl ChatReply {
    fn text(response: String) -> Self {
        Self {
            response,
            intent: None,
            succeeded: true,
        }
    }

    /// Conversation outcome implied by this turn
    #[must_use]
    pub fn outcome(&self) -> Option<ConversationOutcome> {
        if !self.succeeded {
            return None;
        }
        self.intent.and_then(IntentKind::outcome_on_success)
    }
}

/// Chat turn handler
#[derive(Clone)]
pub struct ChatOrchestrator {
    provider: Arc<dyn LlmProvider>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    policy: String,
    history_limit: usize,
    functions: Arc<[FunctionDeclaration]>,
}

impl ChatOrchestrator {
    /// Create an orchestrator with the default booking policy and history cap
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            clock,
            policy: DEFAULT_BOOKING_POLICY.to_owned(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            functions: function_catalog().into(),
        }
    }

    /// Replace the booking policy text
    #[must_use]
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Forward at most `limit` prior messages
    #[must_use]
    pub const fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Name of the model provider
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Assemble the prompt for one turn
    #[must_use]
    pub fn build_messages(
        &self,
        user_message: &str,
        history: &[HistoryMessage],
    ) -> Vec<ChatMessage> {
        let recent = &history[history.len().saturating_sub(self.history_limit)..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::system(build_system_prompt(
            self.clock.now(),
            &self.policy,
        )));
        messages.extend(recent.iter().filter_map(HistoryMessage::to_chat_message));
        messages.push(ChatMessage::user(user_message));
        messages
    }

    /// Handle one user message
    ///
    /// # Errors
    ///
    /// Returns an error only when the model provider fails; every tool-level
    /// failure is reported inside the reply text.
    pub async fn handle_turn(
        &self,
        user_message: &str,
        history: &[HistoryMessage],
        actor: &UserRef,
    ) -> AppResult<ChatReply> {
        let messages = self.build_messages(user_message, history);
        debug!(
            messages = messages.len(),
            history = history.len(),
            provider = self.provider.name(),
            "Sending chat turn to model"
        );

        let response = self
            .provider
            .complete_with_functions(&ChatRequest::new(messages), &self.functions)
            .await?;

        if let Some(call) = response.function_call {
            let intent = match Intent::from_function_call(&call) {
                Ok(intent) => intent,
                Err(e) => {
                    warn!(
                        user_id = actor.id,
                        error = %e,
                        "Model function call could not be decoded"
                    );
                    return Ok(ChatReply {
                        response: e.user_message(),
                        intent: None,
                        succeeded: false,
                    });
                }
            };

            let outcome = self.dispatcher.dispatch(intent, actor).await;
            info!(
                user_id = actor.id,
                intent = %outcome.kind,
                succeeded = outcome.succeeded,
                "Chat turn handled by function call"
            );
            return Ok(ChatReply {
                response: outcome.response,
                intent: Some(outcome.kind),
                succeeded: outcome.succeeded,
            });
        }

        let content = response.content.unwrap_or_default();
        let cleaned = strip_synthetic_function_calls(&content);
        if cleaned.trim().is_empty() {
            return Ok(ChatReply::text(FALLBACK_REPLY.to_owned()));
        }
        Ok(ChatReply::text(cleaned.into_owned()))
    }
}

/// Remove `<function(name)>...</function>` and `<function/name>...</function>`
/// markup that some models echo into text content
#[must_use]
pub fn strip_synthetic_function_calls(content: &str) -> Cow<'_, str> {
    fn function_pattern() -> Option<&'static Regex> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        PATTERN
            .get_or_init(|| Regex::new(r"<function[/\(][^>]+>[\s\S]*?</function>").ok())
            .as_ref()
    }

    let Some(pattern) = function_pattern() else {
        return Cow::Borrowed(content);
    };

    let cleaned = pattern.replace_all(content, "");
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        Cow::Borrowed("")
    } else if trimmed.len() == content.len() {
        Cow::Borrowed(content)
    } else {
        Cow::Owned(trimmed.to_owned())
    }
}
