//! Species identification: prompt construction, the gateway call and reply
//! normalisation.

pub mod parse;
pub mod service;

pub use parse::{extract_json, normalize_reply, validate_reply, ReplyOutcome};
pub use service::{Identifier, MISSING_KEY_MESSAGE};
