// ABOUTME: LLM provider abstraction for chatbot function calling
// ABOUTME: Message, request and response types plus the LlmProvider trait implemented per backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! # LLM Provider Abstraction
//!
//! The chat orchestrator only needs one capability from a model: given a
//! message list and a catalog of callable functions, answer with either text
//! or a single function call whose arguments are a JSON-encoded string.
//! [`LlmProvider`] captures exactly that, so tests can script replies and the
//! server can talk to any OpenAI-compatible endpoint.

/// OpenAI-compatible chat completions client
pub mod openai;
/// System prompt assembly
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppResult;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use prompts::{build_system_prompt, DEFAULT_BOOKING_POLICY};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,
    /// End user
    User,
    /// Model
    Assistant,
}

impl MessageRole {
    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote it
    pub role: MessageRole,
    /// Text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Schema of a function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// What it does, for the model
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// Function call chosen by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments object
    pub arguments: String,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// Completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Messages in order
    pub messages: Vec<ChatMessage>,
    /// Model override; the provider default is used when absent
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Request with provider defaults
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
        }
    }

    /// Use a specific model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Use a specific temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Completion response: text, a function call, or neither
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Freeform text
    pub content: Option<String>,
    /// Function the model wants called
    pub function_call: Option<FunctionCall>,
    /// Token usage
    pub usage: Option<TokenUsage>,
    /// Provider finish reason
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Text-only response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Function-call response
    pub fn call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
            ..Self::default()
        }
    }
}

/// A model backend capable of function calling
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;

    /// Complete `request`, offering `functions` to the model
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, times out, or replies
    /// with something that is not a chat completion.
    async fn complete_with_functions(
        &self,
        request: &ChatRequest,
        functions: &[FunctionDeclaration],
    ) -> AppResult<ChatResponse>;
}
