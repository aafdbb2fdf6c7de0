mod common;

use serde_json::{Value, json};
use std::sync::Arc;

use common::{
    LLM_URL, ScriptedTransport, WEBHOOK_URL, completion, json_body, post_event, topic_config,
    webhook_config,
};
use notify_relay::RelayError;
use notify_relay::api::handle_request;
use notify_relay::core::config::{AppConfig, SinkConfig};
use notify_relay::transport::{OutboundBody, OutboundResponse};

fn all_ok() -> ScriptedTransport {
    ScriptedTransport::new(|req| {
        if req.url.starts_with(LLM_URL) {
            Ok(completion(
                r#"{"title":"Backup finished","description":"All volumes verified","color":5763719,"footer":"cron"}"#,
            ))
        } else {
            Ok(OutboundResponse::new(204, ""))
        }
    })
}

fn models_down_sink_ok() -> ScriptedTransport {
    ScriptedTransport::new(|req| {
        if req.url.starts_with(LLM_URL) {
            Ok(OutboundResponse::new(500, "model unavailable"))
        } else {
            Ok(OutboundResponse::new(204, ""))
        }
    })
}

async fn run(config: AppConfig, transport: &Arc<ScriptedTransport>, event: &Value) -> Value {
    handle_request(&Ok(config), transport.clone(), event).await
}

#[tokio::test]
async fn test_non_post_methods_are_rejected() {
    for method in ["GET", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
        let transport = Arc::new(all_ok());
        let mut event = post_event("application/json", r#"{"message":"test"}"#);
        event["requestContext"]["http"]["method"] = json!(method);

        let response = run(webhook_config(), &transport, &event).await;

        assert_eq!(response["statusCode"], 405, "method {method}");
        assert_eq!(response["body"], "Only POST");
        assert_eq!(response["headers"]["Allow"], "POST");
        assert!(transport.calls().is_empty());
    }
}

#[tokio::test]
async fn test_missing_method_is_rejected() {
    let transport = Arc::new(all_ok());
    let event = json!({ "body": "hello" });

    let response = run(webhook_config(), &transport, &event).await;

    assert_eq!(response["statusCode"], 405);
}

#[tokio::test]
async fn test_empty_body_is_bad_request() {
    for body in ["", "   ", "{}", "null"] {
        let transport = Arc::new(all_ok());
        let response = run(
            webhook_config(),
            &transport,
            &post_event("application/json", body),
        )
        .await;

        assert_eq!(response["statusCode"], 400, "body {body:?}");
        assert_eq!(response["body"], "No data");
        assert!(transport.calls().is_empty());
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let transport = Arc::new(all_ok());
    let response = run(
        webhook_config(),
        &transport,
        &post_event("application/json", "{\"message\":"),
    )
    .await;

    assert_eq!(response["statusCode"], 400);
    assert_eq!(response["body"], "Bad body");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_missing_api_key_fails_before_any_network_call() {
    let transport = Arc::new(all_ok());
    let config = AppConfig {
        openai_api_key: None,
        ..webhook_config()
    };

    let response = run(
        config,
        &transport,
        &post_event("application/json", r#"{"message":"test"}"#),
    )
    .await;

    assert_eq!(response["statusCode"], 500);
    assert_eq!(
        response["body"],
        "Configuration error: Missing configuration: OPENAI_API_KEY"
    );
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_missing_webhook_url_fails_before_any_network_call() {
    let transport = Arc::new(all_ok());
    let config = AppConfig {
        sink: SinkConfig::Webhook { url: None },
        ..webhook_config()
    };

    let response = run(
        config,
        &transport,
        &post_event("application/json", r#"{"message":"test"}"#),
    )
    .await;

    assert_eq!(response["statusCode"], 500);
    assert!(
        response["body"]
            .as_str()
            .unwrap()
            .contains("DISCORD_WEBHOOK_URL")
    );
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_config_load_failure_is_reported_after_method_check() {
    let transport = Arc::new(all_ok());
    let config: Result<AppConfig, RelayError> =
        Err(RelayError::ConfigError("NOTIFY_VARIANT must be `webhook` or `topic`".to_string()));

    let post = handle_request(
        &config,
        transport.clone(),
        &post_event("text/plain", "hello"),
    )
    .await;
    assert_eq!(post["statusCode"], 500);

    let mut get_event = post_event("text/plain", "hello");
    get_event["requestContext"]["http"]["method"] = json!("GET");
    let get = handle_request(&config, transport.clone(), &get_event).await;
    assert_eq!(get["statusCode"], 405);

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_all_models_fail_sink_receives_fallback() {
    let transport = Arc::new(models_down_sink_ok());

    let response = run(
        webhook_config(),
        &transport,
        &post_event("application/json", r#"{"message":"test"}"#),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["body"], "Notification sent");

    // Two models, three attempts each.
    assert_eq!(
        transport.models_called(),
        vec!["model-a", "model-a", "model-a", "model-b", "model-b", "model-b"]
    );

    let sink_calls = transport.calls_to(WEBHOOK_URL);
    assert_eq!(sink_calls.len(), 1);
    let payload = json_body(&sink_calls[0]);
    let embed = &payload["embeds"][0];
    assert_eq!(embed["title"], "Notification");
    assert_eq!(embed["description"], "{\n  \"message\": \"test\"\n}");
    assert_eq!(embed["color"], 9_807_270);
    assert_eq!(embed["footer"]["text"], "Unclassified");
    assert!(embed["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_model_draft_is_delivered() {
    let transport = Arc::new(all_ok());

    let response = run(
        webhook_config(),
        &transport,
        &post_event("text/plain", "backup job finished"),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    assert_eq!(transport.models_called(), vec!["model-a"]);

    let payload = json_body(&transport.calls_to(WEBHOOK_URL)[0]);
    assert_eq!(payload["username"], "Notify Relay");
    assert_eq!(payload["embeds"][0]["title"], "Backup finished");
    assert_eq!(payload["embeds"][0]["footer"]["text"], "cron");
    assert!(
        payload["avatar_url"]
            .as_str()
            .is_some_and(|u| u.ends_with("2705.png"))
    );
}

#[tokio::test]
async fn test_sink_failure_after_retries_is_server_error() {
    let transport = Arc::new(ScriptedTransport::new(|req| {
        if req.url.starts_with(LLM_URL) {
            Ok(completion(r#"{"title":"t","description":"d"}"#))
        } else {
            Ok(OutboundResponse::new(502, "bad gateway"))
        }
    }));

    let response = run(
        webhook_config(),
        &transport,
        &post_event("text/plain", "disk almost full"),
    )
    .await;

    assert_eq!(response["statusCode"], 500);
    let body = response["body"].as_str().unwrap();
    assert!(body.contains("502"), "body was {body}");
    assert!(body.contains("bad gateway"));
    assert_eq!(transport.calls_to(WEBHOOK_URL).len(), 3);
}

#[tokio::test]
async fn test_sink_recovers_on_retry() {
    let sink_attempts = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter = Arc::clone(&sink_attempts);
    let transport = Arc::new(ScriptedTransport::new(move |req| {
        if req.url.starts_with(LLM_URL) {
            return Ok(completion(r#"{"title":"t"}"#));
        }
        if counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
            Ok(OutboundResponse::new(429, "slow down"))
        } else {
            Ok(OutboundResponse::new(204, ""))
        }
    }));

    let response = run(webhook_config(), &transport, &post_event("text/plain", "x")).await;

    assert_eq!(response["statusCode"], 200);
    assert_eq!(transport.calls_to(WEBHOOK_URL).len(), 2);
}

#[tokio::test]
async fn test_verbose_flag_skips_trimming() {
    let hex_id = "0123456789abcdef0123456789abcdef";
    let body = format!("Build 42 of the payments service finished successfully.\nRun {hex_id}");

    let trimmed = Arc::new(all_ok());
    run(webhook_config(), &trimmed, &post_event("text/plain", &body)).await;
    let user_text = json_body(&trimmed.calls_to(LLM_URL)[0])["messages"][1]["content"].clone();
    assert!(!user_text.as_str().unwrap().contains(hex_id));

    let verbose = Arc::new(all_ok());
    let mut event = post_event("text/plain", &body);
    event["rawQueryString"] = json!("verbose=true");
    run(webhook_config(), &verbose, &event).await;
    let user_text = json_body(&verbose.calls_to(LLM_URL)[0])["messages"][1]["content"].clone();
    assert!(user_text.as_str().unwrap().contains(hex_id));
}

#[tokio::test]
async fn test_topic_variant_end_to_end() {
    let transport = Arc::new(ScriptedTransport::new(|req| {
        if req.url.starts_with(LLM_URL) {
            Ok(completion(
                r#"{"title":"Disk full","message":"db-01 at 99%","priority":"urgent","tag":"rotating_light"}"#,
            ))
        } else {
            Ok(OutboundResponse::new(200, "{}"))
        }
    }));

    let response = run(
        topic_config(),
        &transport,
        &post_event("application/json", r#"{"host":"db-01","disk":"99%"}"#),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    let sink_calls = transport.calls_to("https://ntfy.test/");
    assert_eq!(sink_calls.len(), 1);
    let request = &sink_calls[0];
    assert_eq!(request.url, "https://ntfy.test/alerts");
    assert_eq!(request.body, OutboundBody::Text("db-01 at 99%".to_string()));
    assert_eq!(request.header("Title"), Some("Disk full"));
    assert_eq!(request.header("Priority"), Some("urgent"));
    assert_eq!(request.header("Tags"), Some("rotating_light"));
}

#[tokio::test]
async fn test_topic_variant_fallback_uses_defaults() {
    let transport = Arc::new(models_down_sink_ok());

    let response = run(
        topic_config(),
        &transport,
        &post_event("text/plain", "something happened"),
    )
    .await;

    assert_eq!(response["statusCode"], 200);
    let request = &transport.calls_to("https://ntfy.test/")[0];
    assert_eq!(
        request.body,
        OutboundBody::Text("something happened".to_string())
    );
    assert_eq!(request.header("Title"), Some("Notification"));
    assert_eq!(request.header("Priority"), Some("default"));
    assert_eq!(request.header("Tags"), Some("bell"));
}
