// ABOUTME: Environment-based configuration for the coworking chat server
// ABOUTME: Reads ports, database URL, model provider and logging settings with defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::chat::DEFAULT_HISTORY_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::llm::OpenAiConfig;

/// Default listen port
pub const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default SQLite URL
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/coworking.db?mode=rwc";
/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Default model call timeout in seconds
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line human readable
    Pretty,
    /// Single-line human readable
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(AppError::config(format!(
                "LOG_FORMAT must be json, pretty or compact, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info,tower_http=info,sqlx=warn".to_owned(),
            format: LogFormat::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port
    pub http_port: u16,
    /// SQLite connection URL
    pub database_url: String,
    /// Model provider settings
    pub llm: OpenAiConfig,
    /// Prior messages forwarded to the model
    pub chat_history_limit: usize,
    /// Whole-request timeout applied by the HTTP layer
    pub request_timeout: Duration,
    /// Logging
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            llm: OpenAiConfig::default(),
            chat_history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if a numeric variable does not parse or
    /// `LOG_FORMAT` is not a known format. A missing API key is not an error
    /// here; the provider reports it when constructed.
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let api_key = env_string("LLM_API_KEY")
            .or_else(|| env_string("OPENAI_API_KEY"))
            .unwrap_or_default();

        let llm = OpenAiConfig {
            api_key,
            base_url: env_string("LLM_BASE_URL").unwrap_or(defaults.llm.base_url),
            model: env_string("LLM_MODEL").unwrap_or(defaults.llm.model),
            timeout: Duration::from_secs(env_parse("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?),
        };

        let logging = LoggingConfig {
            default_filter: defaults.logging.default_filter,
            format: env_string("LOG_FORMAT")
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            http_port: env_parse("HTTP_PORT", DEFAULT_HTTP_PORT)?,
            database_url: env_string("DATABASE_URL").unwrap_or(defaults.database_url),
            llm,
            chat_history_limit: env_parse("CHAT_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            request_timeout: Duration::from_secs(env_parse(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            logging,
        })
    }

    /// Summary safe to log (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} llm_model={} llm_base_url={} llm_key_set={} \
             history_limit={} request_timeout={}s log_format={}",
            self.http_port,
            self.database_url,
            self.llm.model,
            self.llm.base_url,
            !self.llm.api_key.is_empty(),
            self.chat_history_limit,
            self.request_timeout.as_secs(),
            self.logging.format
        )
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    env_string(name).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| AppError::config(format!("{name} has invalid value `{raw}`: {e}")))
    })
}
