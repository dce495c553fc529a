use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

pub const REDACTION_PLACEHOLDER: &str = "[REDACTED]";

// Order matters: key-like tokens before digit patterns, card numbers before
// phone numbers, IP addresses before phone numbers.
const PATTERNS: &[(&str, &str)] = &[
    ("api_key", r"\b(?:sk|pk|rk)-[A-Za-z0-9_\-]{16,}"),
    ("bearer_token", r"(?i)\bbearer\s+[A-Za-z0-9._~+/\-]{8,}=*"),
    ("email", r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"),
    ("credit_card", r"\b\d{4}[ \-]?\d{4}[ \-]?\d{4}[ \-]?\d{1,4}\b"),
    ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    ("ip_address", r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
    ("phone", r"(?:\+\d{1,3}[ .\-]?)?(?:\(\d{3}\)|\b\d{3})[ .\-]?\d{3}[ .\-]?\d{4}\b"),
];

/// Redaction filter applied to every outbound prompt.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    patterns: Vec<(&'static str, Regex)>,
}

impl Sanitizer {
    pub fn new() -> Result<Self> {
        let mut patterns = Vec::with_capacity(PATTERNS.len());

        for (name, pattern) in PATTERNS {
            let regex = Regex::new(pattern).map_err(|e| {
                Error::configuration(format!("Invalid redaction pattern '{}': {}", name, e))
            })?;
            patterns.push((*name, regex));
        }

        Ok(Self { patterns })
    }

    pub fn sanitize(&self, text: &str) -> String {
        let mut output = text.to_string();
        for (name, regex) in &self.patterns {
            if regex.is_match(&output) {
                debug!("Redacting {} from outbound text", name);
                output = regex.replace_all(&output, REDACTION_PLACEHOLDER).into_owned();
            }
        }
        output
    }
}
