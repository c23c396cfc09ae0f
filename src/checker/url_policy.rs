//! URL normalization and screening applied before a submission is stored

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::checker::error::UrlError;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid scheme pattern"));

static SUSPICIOUS_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "url shortener",
            r"(?i)\b(bit\.ly|tinyurl|t\.co|goo\.gl|short\.link)\b",
        ),
        (
            "suspicious keyword",
            r"(?i)\b(phishing|malware|virus|hack|crack|keygen)\b",
        ),
        ("non-printable character", r"[^\x20-\x7E]"),
        ("raw IP address", r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b"),
    ]
    .into_iter()
    .map(|(reason, pattern)| (reason, Regex::new(pattern).expect("valid screening pattern")))
    .collect()
});

/// Make a submitted URL absolute and canonical
///
/// Input without an `http://` or `https://` prefix gets `http://` prepended.
pub fn normalize_url(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();
    let candidate = if SCHEME.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let parsed = Url::parse(&candidate)?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost(input.to_string()));
    }
    Ok(parsed.to_string())
}

/// Name the first suspicious pattern `url` matches, if any
pub fn suspicious_reason(url: &str) -> Option<&'static str> {
    SUSPICIOUS_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(url))
        .map(|(reason, _)| *reason)
}

/// Normalize and screen a submitted URL
pub fn screen_submission(input: &str) -> Result<String, UrlError> {
    // Screen the raw input too; canonicalization punycodes non-ASCII hosts.
    if let Some(reason) = suspicious_reason(input.trim()) {
        return Err(UrlError::Suspicious {
            url: input.trim().to_string(),
            reason,
        });
    }
    let url = normalize_url(input)?;
    match suspicious_reason(&url) {
        Some(reason) => Err(UrlError::Suspicious { url, reason }),
        None => Ok(url),
    }
}
