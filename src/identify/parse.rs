//! Turning a free-form model reply into a [`SpeciesRecord`].
//!
//! The model is asked for JSON but often wraps it in a markdown fence or adds
//! prose around it. Anything that does not validate against the record shape
//! degrades to [`SpeciesRecord::fallback`] instead of failing the request.

use crate::models::{SpeciesRecord, OPTIONAL_FIELDS};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fenced block pattern is valid")
});

/// Result of validating a reply against the record schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    Valid(SpeciesRecord),
    Invalid(String),
}

/// The JSON candidate inside `content`: the first fenced block's interior if
/// there is one, otherwise the whole trimmed content.
pub fn extract_json(content: &str) -> &str {
    match FENCED_BLOCK.captures(content).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => content.trim(),
    }
}

/// Parse and schema-check a model reply.
pub fn validate_reply(content: &str) -> ReplyOutcome {
    let candidate = extract_json(content);
    if candidate.is_empty() {
        return ReplyOutcome::Invalid("reply is empty".to_string());
    }

    let value: serde_json::Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => return ReplyOutcome::Invalid(format!("reply is not JSON: {}", e)),
    };
    if !value.is_object() {
        return ReplyOutcome::Invalid("reply is not a JSON object".to_string());
    }

    // Explicit nulls decode to `None`, which is not serialized; carry them
    // in `extra` so the key survives in the response.
    let nulls: Vec<String> = OPTIONAL_FIELDS
        .iter()
        .filter(|key| value.get(**key).is_some_and(|v| v.is_null()))
        .map(|key| key.to_string())
        .collect();

    match serde_json::from_value::<SpeciesRecord>(value) {
        Ok(mut record) => {
            for key in nulls {
                record.extra.insert(key, serde_json::Value::Null);
            }
            ReplyOutcome::Valid(record)
        }
        Err(e) => ReplyOutcome::Invalid(format!("reply does not match the species schema: {}", e)),
    }
}

/// Always yields a structurally complete record.
pub fn normalize_reply(content: &str) -> SpeciesRecord {
    match validate_reply(content) {
        ReplyOutcome::Valid(record) => record,
        ReplyOutcome::Invalid(reason) => {
            tracing::error!("Failed to parse AI response as species JSON: {}", reason);
            SpeciesRecord::fallback(content)
        }
    }
}
