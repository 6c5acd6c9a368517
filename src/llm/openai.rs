// ABOUTME: OpenAI-compatible chat completions client with tool (function) calling
// ABOUTME: Sends the prompt and function catalog, returns text or the first tool call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! `OpenAI` chat completions provider
//!
//! Works with any endpoint that speaks the `/chat/completions` dialect with
//! `tools`. Only the first tool call of a reply is used; parallel tool calls
//! are disabled in the request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ChatRequest, ChatResponse, FunctionCall, FunctionDeclaration, LlmProvider, TokenUsage};
use crate::errors::{AppError, AppResult};

const SERVICE: &str = "LLM API";

/// Provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token
    pub api_key: String,
    /// Base URL, without trailing `/chat/completions`
    pub base_url: String,
    /// Default model
    pub model: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `OpenAI`-compatible provider
pub struct OpenAiProvider {
    config: OpenAiConfig,
    http_client: Client,
}

impl OpenAiProvider {
    /// Create a provider
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> AppResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::config(
                "LLM_API_KEY (or OPENAI_API_KEY) must be set to use the OpenAI provider",
            ));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build LLM HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, request: &ChatRequest, functions: &[FunctionDeclaration]) -> Value {
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        if !functions.is_empty() {
            let tools: Vec<Value> = functions
                .iter()
                .map(|f| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": f.name,
                            "description": f.description,
                            "parameters": f.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!("auto");
            body["parallel_tool_calls"] = json!(false);
        }

        body
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageResponse>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
    /// Legacy single-function field still emitted by some compatible servers
    function_call: Option<FunctionCallResponse>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCallResponse,
}

#[derive(Debug, Deserialize)]
struct FunctionCallResponse {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn into_chat_response(completion: CompletionResponse) -> AppResult<ChatResponse> {
    let usage = completion.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(AppError::external_service(SERVICE, "Completion contained no choices"));
    };

    let mut tool_calls = choice.message.tool_calls.into_iter();
    let function_call = tool_calls
        .next()
        .map(|call| call.function)
        .or(choice.message.function_call)
        .map(|f| FunctionCall {
            name: f.name,
            arguments: f.arguments,
        });

    if tool_calls.next().is_some() {
        warn!("Model returned more than one tool call; only the first is executed");
    }

    Ok(ChatResponse {
        content: choice.message.content,
        function_call,
        usage,
        finish_reason: choice.finish_reason,
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn complete_with_functions(
        &self,
        request: &ChatRequest,
        functions: &[FunctionDeclaration],
    ) -> AppResult<ChatResponse> {
        let body = self.build_body(request, functions);
        debug!(
            messages = request.messages.len(),
            functions = functions.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::external_service(SERVICE, "Request timed out")
                } else {
                    AppError::external_service(SERVICE, e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::external_service(
                SERVICE,
                format!("Chat completion request failed with HTTP {status}"),
            ));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("JSON parse error: {e}"))
        })?;

        into_chat_response(completion)
    }
}
