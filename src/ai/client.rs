//! LLM (`OpenAI`-compatible) chat-completion client
//!
//! Encapsulates the single request the formatter needs: one system prompt,
//! one user message, JSON-object output.

use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::RelayError;
use crate::transport::{HttpTransport, OutboundRequest};

/// LLM API client for turning payload text into notification JSON
pub struct LlmClient {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    api_key: String,
    org_id: Option<String>,
}

impl LlmClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_url: String,
        api_key: String,
        org_id: Option<String>,
    ) -> Self {
        Self {
            transport,
            api_url,
            api_key,
            org_id,
        }
    }

    #[must_use]
    pub fn build_prompt(
        &self,
        system_prompt: &str,
        payload_text: &str,
    ) -> Vec<ChatCompletionMessage> {
        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(system_prompt.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(payload_text.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    /// Build the outbound chat-completion request for `model`.
    #[must_use]
    pub fn build_request(&self, model: &str, prompt: &[ChatCompletionMessage]) -> OutboundRequest {
        let body = json!({
            "model": model,
            "messages": chat_messages_json(prompt),
            "response_format": { "type": "json_object" }
        });

        let mut request = OutboundRequest::json(self.api_url.clone(), body)
            .with_header("Authorization", format!("Bearer {}", self.api_key));
        if let Some(org) = &self.org_id {
            request = request.with_header("OpenAI-Organization", org.clone());
        }
        request
    }

    /// Issue one chat-completion call.
    ///
    /// Returns `Ok(None)` when the API answered 2xx but carried no usable
    /// assistant text; such a reply is not worth retrying.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HttpError`] on transport failure and
    /// [`RelayError::OpenAIError`] on a non-2xx status.
    pub async fn chat_completion(
        &self,
        request: &OutboundRequest,
    ) -> Result<Option<String>, RelayError> {
        let response = self.transport.post(request).await?;

        if !response.is_success() {
            return Err(RelayError::OpenAIError(format!(
                "OpenAI API error (status {}): {}",
                response.status, response.body
            )));
        }

        let response_json: Value = match serde_json::from_str(&response.body) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse OpenAI response envelope: {}", e);
                return Ok(None);
            }
        };

        if let Some(usage) = response_json.get("usage") {
            info!(usage = %usage, "Chat completion succeeded");
        }

        Ok(extract_message_text(&response_json))
    }
}

/// Assistant text at `choices[0].message.content`, ignoring blank replies.
#[must_use]
pub fn extract_message_text(response_json: &Value) -> Option<String> {
    response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}

/// Convert prompt messages to the `{role, content}` wire form.
pub(crate) fn chat_messages_json(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };

            match &m.content {
                Content::Text(t) => Some(json!({ "role": role_str, "content": t })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}
