//! Log Redaction Layer
//!
//! Scrubs presenter tokens from strings prior to logging. A presenter URL
//! printed at startup or echoed in an error must never leak the capability.

use regex::Regex;
use std::sync::LazyLock;

static QUERY_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(token=)[^&\s#]+").unwrap());
static PRESENTER_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bsd_[A-Za-z0-9]{8,}").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = QUERY_TOKEN_RE.replace_all(input, "${1}[REDACTED_TOKEN]").to_string();
    redacted = PRESENTER_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();
    redacted = BEARER_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();
    redacted
}
