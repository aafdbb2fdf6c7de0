//! Chat-webhook (rich embed) payloads.

use serde_json::{Value, json};

use crate::core::models::{
    COLOR_DEFAULT, COLOR_ERROR, COLOR_INFO, COLOR_SUCCESS, COLOR_WARNING, EmbedDraft,
};

pub const WEBHOOK_USERNAME: &str = "Notify Relay";

const AVATAR_SUCCESS: &str =
    "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/2705.png";
const AVATAR_INFO: &str =
    "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/2139.png";
const AVATAR_WARNING: &str =
    "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/26a0.png";
const AVATAR_ERROR: &str =
    "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/274c.png";
pub const AVATAR_DEFAULT: &str =
    "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/1f514.png";

const AVATARS: [(u32, &str); 5] = [
    (COLOR_SUCCESS, AVATAR_SUCCESS),
    (COLOR_INFO, AVATAR_INFO),
    (COLOR_WARNING, AVATAR_WARNING),
    (COLOR_ERROR, AVATAR_ERROR),
    (COLOR_DEFAULT, AVATAR_DEFAULT),
];

/// Avatar icon for an embed colour; unknown colours get the grey bell.
#[must_use]
pub fn avatar_for(color: u32) -> &'static str {
    AVATARS
        .iter()
        .find(|(c, _)| *c == color)
        .map_or(AVATAR_DEFAULT, |(_, url)| *url)
}

/// Build the webhook body carrying `draft` as its single embed.
///
/// Empty description, footer and field list are left out: the sink rejects
/// empty embed text.
#[must_use]
pub fn build_webhook_payload(draft: &EmbedDraft) -> Value {
    let mut embed = json!({
        "title": draft.title,
        "color": draft.color,
        "timestamp": draft.timestamp,
    });

    if !draft.description.trim().is_empty() {
        embed["description"] = json!(draft.description);
    }
    if !draft.footer.trim().is_empty() {
        embed["footer"] = json!({ "text": draft.footer });
    }
    if !draft.fields.is_empty() {
        embed["fields"] = json!(draft.fields);
    }

    json!({
        "username": WEBHOOK_USERNAME,
        "avatar_url": avatar_for(draft.color),
        "embeds": [embed],
    })
}
