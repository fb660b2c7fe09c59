use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use super::ChatGateway;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// HTTP client for an OpenAI-compatible chat-completion gateway.
pub struct GatewayHttpClient {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl GatewayHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Per-request timeout. Without one the call waits as long as the platform lets it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatGateway for GatewayHttpClient {
    async fn chat_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        tracing::debug!("Sending chat completion request to {} (model: {})", url, request.model);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to AI gateway: {}", e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::from_gateway_status(status, &error_text));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse AI gateway response: {}\nBody: {}", e, body);
            Error::Upstream(format!("Failed to parse AI gateway response: {}", e))
        })
    }
}
