#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify_relay::RelayError;
use notify_relay::core::config::{AppConfig, SinkConfig};
use notify_relay::transport::{HttpTransport, OutboundBody, OutboundRequest, OutboundResponse};
use notify_relay::utils::retry::RetryPolicy;

pub const LLM_URL: &str = "https://llm.test/v1/chat/completions";
pub const WEBHOOK_URL: &str = "https://hooks.test/api/webhooks/1/abc";

type Responder = dyn Fn(&OutboundRequest) -> Result<OutboundResponse, RelayError> + Send + Sync;

/// In-memory transport that records every request and answers from a closure.
pub struct ScriptedTransport {
    calls: Mutex<Vec<OutboundRequest>>,
    responder: Box<Responder>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&OutboundRequest) -> Result<OutboundResponse, RelayError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url_prefix: &str) -> Vec<OutboundRequest> {
        self.calls()
            .into_iter()
            .filter(|r| r.url.starts_with(url_prefix))
            .collect()
    }

    /// Model names of the LLM calls, in call order.
    pub fn models_called(&self) -> Vec<String> {
        self.calls_to(LLM_URL)
            .iter()
            .map(|r| json_body(r)["model"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post(&self, request: &OutboundRequest) -> Result<OutboundResponse, RelayError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

pub fn json_body(request: &OutboundRequest) -> Value {
    match &request.body {
        OutboundBody::Json(v) => v.clone(),
        OutboundBody::Text(t) => panic!("expected JSON body, got text: {t}"),
    }
}

/// A chat-completion envelope whose assistant message is `content`.
pub fn completion(content: &str) -> OutboundResponse {
    OutboundResponse::new(
        200,
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
            .to_string(),
    )
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

pub fn webhook_config() -> AppConfig {
    AppConfig {
        openai_api_key: Some("sk-test".to_string()),
        openai_api_url: LLM_URL.to_string(),
        openai_org_id: None,
        openai_models: vec!["model-a".to_string(), "model-b".to_string()],
        sink: SinkConfig::Webhook {
            url: Some(WEBHOOK_URL.to_string()),
        },
        retry: fast_retry(),
    }
}

pub fn topic_config() -> AppConfig {
    AppConfig {
        sink: SinkConfig::Topic {
            base_url: "https://ntfy.test".to_string(),
            topic: "alerts".to_string(),
        },
        ..webhook_config()
    }
}

pub fn post_event(content_type: &str, body: &str) -> Value {
    json!({
        "version": "2.0",
        "rawPath": "/",
        "rawQueryString": "",
        "requestContext": { "http": { "method": "POST", "path": "/" } },
        "headers": { "content-type": content_type },
        "body": body,
        "isBase64Encoded": false
    })
}

/// In-memory sink for JSON log lines written by a test subscriber.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a JSON subscriber writing into this capture for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn events(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Events whose message equals `message`.
    pub fn events_with_message(&self, message: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e["fields"]["message"] == message)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
