//! Response builders for the HTTP gateway.

use serde_json::{Value, json};

pub const SUCCESS_BODY: &str = "Notification sent";

/// Returns a plain-text response with the given status code.
#[must_use]
pub fn text_response(status_code: u16, body: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "text/plain; charset=utf-8" },
        "body": body
    })
}

/// Returns the 200 confirmation response.
#[must_use]
pub fn ok_sent() -> Value {
    text_response(200, SUCCESS_BODY)
}

/// Returns a 405 response advertising POST as the only method.
#[must_use]
pub fn method_not_allowed() -> Value {
    json!({
        "statusCode": 405,
        "headers": {
            "Allow": "POST",
            "Content-Type": "text/plain; charset=utf-8"
        },
        "body": "Only POST"
    })
}
