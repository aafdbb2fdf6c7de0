//! Model-fallback formatting: ask each configured model in order, keep the
//! first well-formed draft, fall back to a static draft otherwise.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::client::LlmClient;
use super::prompt::{strip_code_fence, system_prompt};
use crate::core::config::AppConfig;
use crate::core::models::{
    AttemptOutcome, COLOR_DEFAULT, EMBED_DESCRIPTION_LIMIT, EMBED_FIELD_NAME_LIMIT,
    EMBED_FIELD_VALUE_LIMIT, EMBED_FOOTER_LIMIT, EMBED_MAX_FIELDS, EMBED_TITLE_LIMIT, EmbedDraft,
    ModelAttempt, NotificationDraft, PUSH_MESSAGE_LIMIT, PUSH_TITLE_LIMIT, Priority, PushDraft,
    Variant, clip_chars,
};
use crate::errors::RelayError;
use crate::transport::HttpTransport;
use crate::utils::retry::{RetryPolicy, with_backoff};

pub const FALLBACK_TITLE: &str = "Notification";
pub const FALLBACK_FOOTER: &str = "Unclassified";
pub const FALLBACK_TAG: &str = "bell";

pub struct NotificationFormatter {
    client: LlmClient,
    models: Vec<String>,
    variant: Variant,
    retry: RetryPolicy,
}

impl NotificationFormatter {
    #[must_use]
    pub fn new(
        client: LlmClient,
        models: Vec<String>,
        variant: Variant,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            models,
            variant,
            retry,
        }
    }

    /// # Errors
    ///
    /// Returns [`RelayError::ConfigError`] when the LLM API key is missing.
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, RelayError> {
        let api_key = config.require_openai_api_key()?;
        let client = LlmClient::new(
            transport,
            config.openai_api_url.clone(),
            api_key.to_string(),
            config.openai_org_id.clone(),
        );
        Ok(Self::new(
            client,
            config.openai_models.clone(),
            config.variant(),
            config.retry,
        ))
    }

    /// Produce a draft for `text`. Never fails: exhausting every model yields
    /// [`fallback_draft`].
    pub async fn format(&self, text: &str) -> NotificationDraft {
        for model in &self.models {
            let attempt = self.attempt(model, text).await;
            match attempt.outcome {
                AttemptOutcome::Success(draft) => {
                    info!(model = %attempt.model, "Model produced notification draft");
                    return draft;
                }
                AttemptOutcome::Failure(reason) => {
                    warn!(model = %attempt.model, reason = %reason, "Model attempt failed");
                }
            }
        }

        warn!(
            models = self.models.len(),
            "All models failed, using fallback notification"
        );
        fallback_draft(self.variant, text)
    }

    async fn attempt(&self, model: &str, text: &str) -> ModelAttempt {
        let prompt = self.client.build_prompt(system_prompt(self.variant), text);
        let request = self.client.build_request(model, &prompt);

        #[cfg(feature = "debug-logs")]
        info!(model = %model, "Using system prompt:\n{}", system_prompt(self.variant));

        let client = &self.client;
        let request = &request;
        let reply = with_backoff(&self.retry, model, move || client.chat_completion(request)).await;

        let outcome = match reply {
            Ok(Some(content)) => {
                #[cfg(feature = "debug-logs")]
                info!(model = %model, "Raw model output:\n{}", content);

                match parse_draft(self.variant, &content) {
                    Ok(draft) => AttemptOutcome::Success(draft),
                    Err(e) => AttemptOutcome::Failure(e.to_string()),
                }
            }
            Ok(None) => AttemptOutcome::Failure("empty response content".to_string()),
            Err(e) => AttemptOutcome::Failure(e.to_string()),
        };

        ModelAttempt {
            model: model.to_string(),
            outcome,
        }
    }
}

/// Parse and validate a model reply for `variant`, stamping the timestamp.
///
/// # Errors
///
/// Returns [`RelayError::FormatError`] when the reply is not JSON of the
/// expected shape or lacks its mandatory text.
pub fn parse_draft(variant: Variant, raw: &str) -> Result<NotificationDraft, RelayError> {
    let json = strip_code_fence(raw);
    match variant {
        Variant::Webhook => {
            let mut draft: EmbedDraft = serde_json::from_str(json)?;
            if draft.title.trim().is_empty() {
                return Err(RelayError::FormatError("missing title".to_string()));
            }
            draft.title = clip_chars(&draft.title, EMBED_TITLE_LIMIT);
            draft.description = clip_chars(&draft.description, EMBED_DESCRIPTION_LIMIT);
            draft.footer = clip_chars(&draft.footer, EMBED_FOOTER_LIMIT);
            draft
                .fields
                .retain(|f| !f.name.trim().is_empty() && !f.value.trim().is_empty());
            draft.fields.truncate(EMBED_MAX_FIELDS);
            for field in &mut draft.fields {
                field.name = clip_chars(&field.name, EMBED_FIELD_NAME_LIMIT);
                field.value = clip_chars(&field.value, EMBED_FIELD_VALUE_LIMIT);
            }
            draft.timestamp = now_timestamp();
            Ok(NotificationDraft::Embed(draft))
        }
        Variant::Topic => {
            let mut draft: PushDraft = serde_json::from_str(json)?;
            if draft.message.trim().is_empty() {
                return Err(RelayError::FormatError("missing message".to_string()));
            }
            draft.message = clip_chars(&draft.message, PUSH_MESSAGE_LIMIT);
            draft.title = draft
                .title
                .filter(|t| !t.trim().is_empty())
                .map(|t| clip_chars(&t, PUSH_TITLE_LIMIT));
            draft.tag = draft.tag.filter(|t| !t.trim().is_empty());
            Ok(NotificationDraft::Push(draft))
        }
    }
}

/// Deterministic draft used when no model produced one.
#[must_use]
pub fn fallback_draft(variant: Variant, text: &str) -> NotificationDraft {
    match variant {
        Variant::Webhook => NotificationDraft::Embed(EmbedDraft {
            title: FALLBACK_TITLE.to_string(),
            description: clip_chars(text, EMBED_DESCRIPTION_LIMIT),
            color: COLOR_DEFAULT,
            fields: Vec::new(),
            footer: FALLBACK_FOOTER.to_string(),
            timestamp: now_timestamp(),
        }),
        Variant::Topic => NotificationDraft::Push(PushDraft {
            title: Some(FALLBACK_TITLE.to_string()),
            message: clip_chars(text, PUSH_MESSAGE_LIMIT),
            priority: Some(Priority::Default),
            tag: Some(FALLBACK_TAG.to_string()),
        }),
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
