//! Delivery of formatted notifications to the configured sink.

pub mod topic;
pub mod webhook;

use std::sync::Arc;
use tracing::{error, info};
use url::Url;

use crate::core::config::{AppConfig, SinkConfig, missing};
use crate::core::models::NotificationDraft;
use crate::errors::RelayError;
use crate::transport::{HttpTransport, OutboundRequest};
use crate::utils::retry::{RetryPolicy, with_backoff};

/// Resolved destination, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Webhook { url: String },
    Topic { url: Url },
}

pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    target: SinkTarget,
    retry: RetryPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, target: SinkTarget, retry: RetryPolicy) -> Self {
        Self {
            transport,
            target,
            retry,
        }
    }

    /// # Errors
    ///
    /// Returns [`RelayError::ConfigError`] when the webhook URL is missing or
    /// the topic URL cannot be built.
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, RelayError> {
        let target = match &config.sink {
            SinkConfig::Webhook { url } => SinkTarget::Webhook {
                url: url.clone().ok_or_else(|| missing("DISCORD_WEBHOOK_URL"))?,
            },
            SinkConfig::Topic { base_url, topic } => SinkTarget::Topic {
                url: topic::topic_url(base_url, topic)?,
            },
        };
        Ok(Self::new(transport, target, config.retry))
    }

    /// Build the sink request for `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::FormatError`] when the draft shape does not match the sink.
    pub fn build_request(&self, draft: &NotificationDraft) -> Result<OutboundRequest, RelayError> {
        match (&self.target, draft) {
            (SinkTarget::Webhook { url }, NotificationDraft::Embed(embed)) => Ok(
                OutboundRequest::json(url.clone(), webhook::build_webhook_payload(embed)),
            ),
            (SinkTarget::Topic { url }, NotificationDraft::Push(push)) => {
                Ok(topic::build_topic_request(url, push))
            }
            _ => Err(RelayError::FormatError(format!(
                "{:?} draft cannot be sent to this sink",
                draft.variant()
            ))),
        }
    }

    /// Send `draft`, retrying non-2xx responses with backoff.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DeliveryError`] with the last status and body once
    /// the retry budget is spent. Transport-level failures report status 0.
    pub async fn deliver(&self, draft: &NotificationDraft) -> Result<(), RelayError> {
        let request = self.build_request(draft)?;
        let transport = &self.transport;
        let request = &request;

        let result = with_backoff(&self.retry, "deliver", move || async move {
            let response = match transport.post(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, draft = ?draft, "Sink request failed");
                    return Err(e);
                }
            };
            if response.is_success() {
                return Ok(());
            }

            error!(
                status = response.status,
                body = %response.body,
                draft = ?draft,
                "Sink rejected notification"
            );
            Err(RelayError::DeliveryError {
                status: response.status,
                body: response.body,
            })
        })
        .await;

        match result {
            Ok(()) => {
                info!("Notification delivered");
                Ok(())
            }
            Err(e @ RelayError::DeliveryError { .. }) => Err(e),
            Err(other) => Err(RelayError::DeliveryError {
                status: 0,
                body: other.to_string(),
            }),
        }
    }
}
