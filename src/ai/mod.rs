//! All AI/LLM functionality

pub mod client;
pub mod formatter;
pub mod prompt;

// Re-export main types for convenience
pub use client::LlmClient;
pub use formatter::{NotificationFormatter, fallback_draft, parse_draft};
