//! Secret scrubbing for log text and persisted parameters.
//!
//! Two distinct rules live here:
//! - log text: every case-insensitive occurrence of a sensitive word is
//!   replaced in place by [`LOG_REDACTION`];
//! - parameter bags: the *value* of any parameter whose name contains a
//!   sensitive word is replaced by [`PARAM_REDACTION`]. Values are never
//!   inspected, only key names.

use crate::Parameters;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

pub const LOG_REDACTION: &str = "***";
pub const PARAM_REDACTION: &str = "***HIDDEN***";

const LOG_SENSITIVE_WORDS: [&str; 5] = ["password", "credential", "token", "key", "secret"];

const PARAM_SENSITIVE_WORDS: [&str; 6] =
    ["password", "credential", "token", "key", "secret", "api_key"];

static LOG_SENSITIVE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    let alternation = LOG_SENSITIVE_WORDS
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation).case_insensitive(true).build()
});

/// Scrub sensitive words out of a log message.
///
/// If the pattern could not be compiled the whole message is withheld.
pub fn sanitize_log_text(text: &str) -> String {
    match LOG_SENSITIVE.as_ref() {
        Ok(re) => re.replace_all(text, LOG_REDACTION).into_owned(),
        Err(e) => {
            tracing::warn!("log redaction pattern unavailable: {}", e);
            LOG_REDACTION.to_string()
        }
    }
}

/// True if a parameter name looks like it holds a secret.
pub fn is_sensitive_key(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    PARAM_SENSITIVE_WORDS.iter().any(|w| lowered.contains(w))
}

/// Copy of `parameters` with secret-named values replaced. Idempotent.
pub fn sanitize_parameters(parameters: &Parameters) -> Parameters {
    parameters
        .iter()
        .map(|(k, v)| {
            if is_sensitive_key(k) {
                (k.clone(), serde_json::Value::String(PARAM_REDACTION.to_string()))
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}
