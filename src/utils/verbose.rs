//! Best-effort removal of verbose content (mail transport headers, long hex ids)
//! before the payload is handed to the model.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// A trimmed result shorter than this share of the input is discarded.
const MIN_KEPT_RATIO_PERCENT: usize = 40;

/// Labeled sections whose value runs until the next capitalized line or blank line.
const VERBOSE_SECTION_LABELS: [&str; 14] = [
    "ARC-Seal",
    "ARC-Message-Signature",
    "ARC-Authentication-Results",
    "Authentication-Results",
    "DKIM-Signature",
    "X-Google-DKIM-Signature",
    "X-Gm-Message-State",
    "X-Google-Smtp-Source",
    "X-Received",
    "Received-SPF",
    "Received",
    "Return-Path",
    "List-Unsubscribe",
    "Authorization",
];

static VERBOSE_PATTERNS: Lazy<Result<Vec<Regex>, regex::Error>> =
    Lazy::new(compile_verbose_patterns);

static EXCESS_NEWLINES: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"\n{3,}"));

/// Strip known-verbose sections from `text`.
///
/// Returns the input unchanged when the patterns are unavailable or when the
/// result would keep less than 40% of the original characters.
#[must_use]
pub fn trim_verbose(text: &str) -> String {
    let trimmed = match apply_patterns(text) {
        Ok(trimmed) => trimmed,
        Err(e) => {
            warn!("Verbose trimming unavailable, using original text: {}", e);
            return text.to_string();
        }
    };

    let original_len = text.chars().count();
    let trimmed_len = trimmed.chars().count();
    if trimmed_len * 100 < original_len * MIN_KEPT_RATIO_PERCENT {
        debug!(
            original_len,
            trimmed_len, "Trimming removed too much content, keeping original"
        );
        return text.to_string();
    }

    debug!(original_len, trimmed_len, "Trimmed verbose content");
    trimmed
}

fn compile_verbose_patterns() -> Result<Vec<Regex>, regex::Error> {
    let mut patterns = VERBOSE_SECTION_LABELS
        .iter()
        .map(|label| {
            Regex::new(&format!(
                r"(?m)^[ \t]*{}:.*(?:\n[^A-Z\n].*)*\n?",
                regex::escape(label)
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;
    patterns.push(Regex::new(r"\b[0-9A-Fa-f]{32,}\b")?);
    Ok(patterns)
}

fn apply_patterns(text: &str) -> Result<String, &'static regex::Error> {
    let patterns = VERBOSE_PATTERNS.as_ref()?;
    let newlines = EXCESS_NEWLINES.as_ref()?;

    let mut out = text.replace("\r\n", "\n");
    for pattern in patterns {
        out = pattern.replace_all(&out, "").into_owned();
    }
    let out = newlines.replace_all(&out, "\n\n");
    Ok(out.trim().to_string())
}
