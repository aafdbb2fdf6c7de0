use serde::{Deserialize, Deserializer, Serialize};

pub const EMBED_TITLE_LIMIT: usize = 256;
pub const EMBED_DESCRIPTION_LIMIT: usize = 2000;
pub const EMBED_FIELD_NAME_LIMIT: usize = 256;
pub const EMBED_FIELD_VALUE_LIMIT: usize = 1024;
pub const EMBED_MAX_FIELDS: usize = 25;
pub const EMBED_FOOTER_LIMIT: usize = 2048;
pub const PUSH_TITLE_LIMIT: usize = 250;
pub const PUSH_MESSAGE_LIMIT: usize = 4096;

/// Embed colours the prompt asks the model to choose from.
pub const COLOR_SUCCESS: u32 = 5_763_719;
pub const COLOR_INFO: u32 = 3_447_003;
pub const COLOR_WARNING: u32 = 16_776_960;
pub const COLOR_ERROR: u32 = 15_548_997;
pub const COLOR_DEFAULT: u32 = 9_807_270;

/// Which notification shape a deployment produces. Never mixed within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Rich chat embed posted to a webhook.
    Webhook,
    /// Plain push notification posted to a pub/sub topic.
    Topic,
}

impl Variant {
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "webhook" | "discord" => Some(Variant::Webhook),
            "topic" | "ntfy" => Some(Variant::Topic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Variant A draft: a chat embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_color")]
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, deserialize_with = "footer_text")]
    pub footer: String,
    /// Always stamped locally; whatever the model sends is discarded.
    #[serde(default, skip_deserializing)]
    pub timestamp: String,
}

const fn default_color() -> u32 {
    COLOR_DEFAULT
}

/// Accepts either `"footer": "text"` or the webhook-native `"footer": {"text": "..."}`.
fn footer_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Footer {
        Text(String),
        Object { text: String },
        Missing(()),
    }

    Ok(match Footer::deserialize(deserializer)? {
        Footer::Text(text) | Footer::Object { text } => text,
        Footer::Missing(()) => String::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Default,
    Low,
    Min,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Default => "default",
            Priority::Low => "low",
            Priority::Min => "min",
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "urgent" | "max" | "5" => Priority::Urgent,
            "high" | "4" => Priority::High,
            "low" | "2" => Priority::Low,
            "min" | "1" => Priority::Min,
            _ => Priority::Default,
        }
    }
}

/// Variant B draft: a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushDraft {
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationDraft {
    Embed(EmbedDraft),
    Push(PushDraft),
}

impl NotificationDraft {
    #[must_use]
    pub const fn variant(&self) -> Variant {
        match self {
            NotificationDraft::Embed(_) => Variant::Webhook,
            NotificationDraft::Push(_) => Variant::Topic,
        }
    }
}

/// Result of asking one model for a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(NotificationDraft),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub outcome: AttemptOutcome,
}

/// Truncate to at most `max` characters without splitting a code point.
#[must_use]
pub fn clip_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
