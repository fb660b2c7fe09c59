//! AI gateway integration
//!
//! Speaks the OpenAI-compatible chat-completion protocol used to ask a
//! multimodal model about a species.

pub mod client;
pub mod mock;
pub mod types;

pub use client::GatewayHttpClient;
pub use mock::{MockGatewayClient, MockReply};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ImageUrl, MessagePart,
};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send one chat completion authenticated with `api_key`.
    ///
    /// Non-success statuses come back as `RateLimited`, `QuotaExhausted` or
    /// `Upstream` errors.
    async fn chat_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}
