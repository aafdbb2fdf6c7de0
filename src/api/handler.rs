//! Relay Lambda handler.
//!
//! This module handles:
//! - Request validation (method, configuration, body)
//! - Verbose-content trimming (skipped with `?verbose=true`)
//! - Formatting through the model list (delegated to `ai::formatter`)
//! - Delivery to the configured sink (delegated to `sink`)

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::helpers;
use super::parsing::{self, BodyError};
use crate::ai::NotificationFormatter;
use crate::core::config::AppConfig;
use crate::errors::RelayError;
use crate::sink::Dispatcher;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::utils::verbose::trim_verbose;

pub use self::function_handler as handler;

/// Lambda handler for the relay entrypoint.
///
/// # Errors
///
/// Never fails at the Lambda level; every outcome is mapped to an HTTP
/// response payload.
#[tracing::instrument(level = "info", skip(event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AppConfig::from_env();
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());

    Ok(handle_request(&config, transport, &event.payload).await)
}

/// Run one inbound request through validation, formatting and delivery.
///
/// `config` is passed as loaded so that a configuration failure is only
/// reported after the method check, and always before any outbound call.
pub async fn handle_request(
    config: &Result<AppConfig, RelayError>,
    transport: Arc<dyn HttpTransport>,
    event: &Value,
) -> Value {
    let correlation_id = Uuid::new_v4();
    let span = info_span!("relay", correlation_id = %correlation_id);

    process(config, transport, event).instrument(span).await
}

async fn process(
    config: &Result<AppConfig, RelayError>,
    transport: Arc<dyn HttpTransport>,
    event: &Value,
) -> Value {
    // ========================================================================
    // Method
    // ========================================================================

    let method = parsing::request_method(event);
    if !method.is_some_and(|m| m.eq_ignore_ascii_case("POST")) {
        info!(method = ?method, "Rejecting non-POST request");
        return helpers::method_not_allowed();
    }

    // ========================================================================
    // Configuration (before any network call)
    // ========================================================================

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("Config error: {}", e);
            return helpers::text_response(500, &e.to_string());
        }
    };

    if let Err(e) = config.validate() {
        error!("Config error: {}", e);
        return helpers::text_response(500, &e.to_string());
    }

    let (formatter, dispatcher) = match build_pipeline(config, transport) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Config error: {}", e);
            return helpers::text_response(500, &e.to_string());
        }
    };

    // ========================================================================
    // Body
    // ========================================================================

    let text = match parsing::normalize_body(event) {
        Ok(text) => text,
        Err(BodyError::Empty) => {
            info!("Request carried no data");
            return helpers::text_response(400, "No data");
        }
        Err(BodyError::Malformed(e)) => {
            error!("Failed to parse request body: {}", e);
            return helpers::text_response(400, "Bad body");
        }
    };

    let text = if parsing::is_verbose(event) {
        info!("Verbose mode requested, skipping trimming");
        text
    } else {
        trim_verbose(&text)
    };

    // ========================================================================
    // Format and deliver
    // ========================================================================

    let draft = formatter.format(&text).await;

    match dispatcher.deliver(&draft).await {
        Ok(()) => helpers::ok_sent(),
        Err(e) => {
            error!("Failed to deliver notification: {}", e);
            helpers::text_response(500, &format!("Failed to deliver notification: {e}"))
        }
    }
}

fn build_pipeline(
    config: &AppConfig,
    transport: Arc<dyn HttpTransport>,
) -> Result<(NotificationFormatter, Dispatcher), RelayError> {
    let formatter = NotificationFormatter::from_config(config, Arc::clone(&transport))?;
    let dispatcher = Dispatcher::from_config(config, transport)?;
    Ok((formatter, dispatcher))
}
