//! Species identification service for the eDNA learning site
//!
//! Accepts a species name or a photo, asks a multimodal model about it through
//! an AI gateway and always answers with a complete species record, falling
//! back to a placeholder record when the model's reply cannot be read.

pub mod ai;
pub mod error;
pub mod identify;
pub mod models;
pub mod prompts;
pub mod render;
pub mod requester;
pub mod server;
pub mod upload;

pub use error::{Error, Result};
