//! Pub/sub topic (push notification) requests.

use base64::{Engine as _, engine::general_purpose};
use url::Url;

use crate::core::models::{Priority, PushDraft};
use crate::errors::RelayError;
use crate::transport::OutboundRequest;

pub const DEFAULT_TITLE: &str = "Notification";
pub const DEFAULT_TAG: &str = "bell";

/// Resolve `<base_url>/<topic>`.
///
/// # Errors
///
/// Returns [`RelayError::ConfigError`] when the base URL or topic is unusable.
pub fn topic_url(base_url: &str, topic: &str) -> Result<Url, RelayError> {
    let topic = topic.trim().trim_matches('/');
    if topic.is_empty() {
        return Err(RelayError::ConfigError("NTFY_TOPIC is empty".to_string()));
    }

    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    Url::parse(&base)
        .and_then(|b| b.join(topic))
        .map_err(|e| RelayError::ConfigError(format!("NTFY_BASE_URL / NTFY_TOPIC: {e}")))
}

/// Header values must be visible ASCII; anything else is sent RFC 2047 encoded.
#[must_use]
pub fn encode_header_value(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        value.to_string()
    } else {
        format!(
            "=?UTF-8?B?{}?=",
            general_purpose::STANDARD.encode(value.as_bytes())
        )
    }
}

#[must_use]
pub fn build_topic_request(url: &Url, draft: &PushDraft) -> OutboundRequest {
    let title = draft.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let priority = draft.priority.unwrap_or(Priority::Default);
    let tag = draft.tag.as_deref().unwrap_or(DEFAULT_TAG);

    OutboundRequest::text(url.as_str(), draft.message.clone())
        .with_header("Title", encode_header_value(title))
        .with_header("Priority", priority.as_str())
        .with_header("Tags", encode_header_value(tag))
}
