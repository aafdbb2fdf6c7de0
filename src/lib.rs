/// Notify Relay - turns arbitrary webhook payloads into structured notifications.
///
/// A single Lambda function accepts an HTTP POST with a JSON or plain-text
/// payload, asks an LLM to reformat it into a notification, and forwards the
/// result to a chat webhook (rich embed) or a pub/sub topic (push notification).
///
/// # Architecture
///
/// The request flows one way through:
/// - `api` for method, configuration and body validation
/// - `utils::verbose` for best-effort trimming of transport noise
/// - `ai::formatter` for the ordered model list with a static fallback
/// - `sink` for delivery, retried with exponential backoff
///
/// Outbound HTTP goes through the `transport::HttpTransport` seam so the whole
/// pipeline can run against an in-memory transport.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use notify_relay::core::config::AppConfig;
/// use notify_relay::transport::{HttpTransport, ReqwestTransport};
///
/// #[tokio::main]
/// async fn main() {
///     notify_relay::setup_logging();
///
///     let config = AppConfig::from_env();
///     let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
///     let event = serde_json::json!({
///         "requestContext": { "http": { "method": "POST" } },
///         "headers": { "content-type": "application/json" },
///         "body": "{\"message\":\"backup finished\"}"
///     });
///
///     let response = notify_relay::api::handle_request(&config, transport, &event).await;
///     println!("{}", response["statusCode"]);
/// }
/// ```
// Module declarations
pub mod ai;
pub mod api;
pub mod core;
pub mod errors;
pub mod sink;
pub mod transport;
pub mod utils;

pub use errors::RelayError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration, filtered by `RUST_LOG` (default `info`).
/// Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// notify_relay::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
