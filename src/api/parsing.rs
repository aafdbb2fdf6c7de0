//! Extraction of method, headers, query and body from the HTTP gateway event.

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;
use tracing::warn;

use crate::errors::RelayError;

/// Width used when rendering HTML bodies to text.
const HTML_TEXT_WIDTH: usize = 120;

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

/// HTTP method from a v2 (`requestContext.http.method`) or v1 (`httpMethod`) event.
pub fn request_method(event: &Value) -> Option<&str> {
    v_str(event, &["requestContext", "http", "method"]).or_else(|| v_str(event, &["httpMethod"]))
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

pub fn content_type(event: &Value) -> Option<&str> {
    event
        .get("headers")
        .and_then(|h| get_header_value(h, "Content-Type"))
}

/// Query parameter from `queryStringParameters`, falling back to `rawQueryString`.
pub fn query_param(event: &Value, name: &str) -> Option<String> {
    if let Some(v) = v_str(event, &["queryStringParameters", name]) {
        return Some(v.to_string());
    }

    let raw = v_str(event, &["rawQueryString"])?;
    raw.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
        if key != name {
            return None;
        }
        urlencoding::decode(&value.replace('+', " "))
            .ok()
            .map(|v| v.into_owned())
    })
}

/// `verbose=true` disables the verbose-content trimming step.
pub fn is_verbose(event: &Value) -> bool {
    query_param(event, "verbose").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Raw body text, base64-decoded when the gateway flagged it.
///
/// # Errors
///
/// Returns [`RelayError::ParseError`] when a base64 body is invalid or not UTF-8.
pub fn raw_body(event: &Value) -> Result<Option<String>, RelayError> {
    let Some(body) = event.get("body").and_then(|b| b.as_str()) else {
        return Ok(None);
    };

    let is_base64 = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !is_base64 {
        return Ok(Some(body.to_string()));
    }

    let bytes = general_purpose::STANDARD
        .decode(body.trim())
        .map_err(|e| RelayError::ParseError(format!("invalid base64 body: {e}")))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| RelayError::ParseError(format!("body is not UTF-8: {e}")))
}

#[derive(Debug, PartialEq, Eq)]
pub enum BodyError {
    /// Nothing to relay.
    Empty,
    /// Declared JSON (or an encoding) could not be decoded.
    Malformed(String),
}

/// Normalize the inbound body into the text handed to the pipeline.
///
/// JSON bodies are re-rendered with two-space indentation (a bare JSON string
/// is used as-is); HTML bodies are rendered to plain text; anything else is
/// taken verbatim.
///
/// # Errors
///
/// Returns [`BodyError::Empty`] for a missing or blank payload and
/// [`BodyError::Malformed`] for undecodable input.
pub fn normalize_body(event: &Value) -> Result<String, BodyError> {
    let body = raw_body(event)
        .map_err(|e| BodyError::Malformed(e.to_string()))?
        .unwrap_or_default();
    if body.trim().is_empty() {
        return Err(BodyError::Empty);
    }

    let content_type = content_type(event).unwrap_or("").to_ascii_lowercase();

    let text = if content_type.contains("json") {
        let value: Value =
            serde_json::from_str(&body).map_err(|e| BodyError::Malformed(e.to_string()))?;
        render_json(&value)
    } else if content_type.contains("html") {
        html_to_text(&body)
    } else {
        body
    };

    if text.trim().is_empty() {
        return Err(BodyError::Empty);
    }
    Ok(text)
}

fn render_json(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) if map.is_empty() => String::new(),
        Value::Array(items) if items.is_empty() => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to render HTML body, using raw text: {}", e);
            html.to_string()
        }
    }
}
