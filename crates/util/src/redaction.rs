//! Masking of credentials in text that may reach logs or the terminal.
//!
//! Backend error bodies are echoed back to the user, and the effective
//! configuration is printed by `orca config`; both pass through here first.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Replacement inserted in place of a secret value.
pub const REDACTED: &str = "[REDACTED]";

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Authorization headers, keeping the header name.
        r"(?i)(authorization:\s+)([^\s,]+(?:\s+[^\s,]+)?)",
        r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)",
        r"(?i)((?:^|\b)Basic\s+)([A-Za-z0-9+/]+=*)",
        // key=value and "key": "value" pairs whose key names a credential.
        r#"(?i)((?:token|secret|password|api[_-]?key)["']?\s*[:=]\s*["']?)([^\s"',&]+)"#,
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Replaces values that look like credentials with [`REDACTED`].
///
/// Key names and header prefixes are kept so the output stays readable.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                format!("{prefix}{REDACTED}")
            })
            .into_owned();
    }
    redacted
}

/// Masks an optional secret for display, leaving absence visible.
pub fn redact_secret(secret: Option<&str>) -> Option<&'static str> {
    secret.filter(|value| !value.is_empty()).map(|_| REDACTED)
}
