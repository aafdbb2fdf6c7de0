use std::env;
use std::time::Duration;

use crate::core::models::Variant;
use crate::errors::RelayError;
use crate::utils::retry::RetryPolicy;

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODELS: [&str; 2] = ["gpt-4o-mini", "gpt-4.1-mini"];
pub const DEFAULT_NTFY_BASE_URL: &str = "https://ntfy.sh";
pub const DEFAULT_NTFY_TOPIC: &str = "notifications";

/// Where formatted notifications are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// Chat webhook receiving a rich embed. The URL is required at request time.
    Webhook { url: Option<String> },
    /// Pub/sub topic receiving a plain-text push notification.
    Topic { base_url: String, topic: String },
}

impl SinkConfig {
    #[must_use]
    pub const fn variant(&self) -> Variant {
        match self {
            SinkConfig::Webhook { .. } => Variant::Webhook,
            SinkConfig::Topic { .. } => Variant::Topic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_org_id: Option<String>,
    pub openai_models: Vec<String>,
    pub sink: SinkConfig,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Missing secrets do not fail loading; they are reported by
    /// [`AppConfig::require_openai_api_key`] and the sink constructors so the
    /// request handler can answer with a 500 before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConfigError`] when a value is present but malformed.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConfigError`] for an unknown `NOTIFY_VARIANT`, an
    /// empty `OPENAI_MODELS` list or a non-numeric retry setting.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_models = match non_empty("OPENAI_MODELS") {
            Some(raw) => parse_model_list(&raw),
            None => DEFAULT_OPENAI_MODELS.iter().map(ToString::to_string).collect(),
        };
        if openai_models.is_empty() {
            return Err(RelayError::ConfigError(
                "OPENAI_MODELS must list at least one model".to_string(),
            ));
        }

        let variant = match non_empty("NOTIFY_VARIANT") {
            Some(raw) => Variant::from_label(&raw).ok_or_else(|| {
                RelayError::ConfigError(format!(
                    "NOTIFY_VARIANT must be `webhook` or `topic`, got `{raw}`"
                ))
            })?,
            None => Variant::Webhook,
        };

        let sink = match variant {
            Variant::Webhook => SinkConfig::Webhook {
                url: non_empty("DISCORD_WEBHOOK_URL"),
            },
            Variant::Topic => SinkConfig::Topic {
                base_url: non_empty("NTFY_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_NTFY_BASE_URL.to_string()),
                topic: non_empty("NTFY_TOPIC").unwrap_or_else(|| DEFAULT_NTFY_TOPIC.to_string()),
            },
        };

        let mut retry = RetryPolicy::default();
        if let Some(raw) = non_empty("RETRY_MAX_ATTEMPTS") {
            retry.max_attempts = raw
                .trim()
                .parse()
                .map_err(|e| RelayError::ConfigError(format!("RETRY_MAX_ATTEMPTS: {e}")))?;
        }
        if let Some(raw) = non_empty("RETRY_BASE_DELAY_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|e| RelayError::ConfigError(format!("RETRY_BASE_DELAY_MS: {e}")))?;
            retry.base_delay = Duration::from_millis(millis);
        }

        Ok(Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_api_url: non_empty("OPENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            openai_org_id: non_empty("OPENAI_ORG_ID"),
            openai_models,
            sink,
            retry,
        })
    }

    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.sink.variant()
    }

    /// Check that every value the active variant needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConfigError`] naming the first missing variable.
    pub fn validate(&self) -> Result<(), RelayError> {
        self.require_openai_api_key()?;
        if let SinkConfig::Webhook { url: None } = &self.sink {
            return Err(missing("DISCORD_WEBHOOK_URL"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RelayError::ConfigError`] when `OPENAI_API_KEY` is not set.
    pub fn require_openai_api_key(&self) -> Result<&str, RelayError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| missing("OPENAI_API_KEY"))
    }
}

/// Configuration error for an unset required variable.
#[must_use]
pub fn missing(var: &str) -> RelayError {
    RelayError::ConfigError(format!("Missing configuration: {var}"))
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect()
}
