use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use super::ChatGateway;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Canned outcome for one mocked gateway call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A successful completion whose first choice carries this text.
    Content(String),
    /// A successful completion with no choices at all.
    Empty,
    /// A non-success HTTP status from the gateway.
    Status(u16),
}

/// In-memory gateway that replays canned replies and records requests.
#[derive(Clone)]
pub struct MockGatewayClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn with_content(self, content: impl Into<String>) -> Self {
        self.with_reply(MockReply::Content(content.into()))
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(api_key, request body)` of every call so far, in order.
    pub fn recorded_requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGatewayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for MockGatewayClient {
    async fn chat_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((api_key.to_string(), serde_json::to_value(request)?));
            requests.len()
        };

        let reply = {
            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                MockReply::Content("{}".to_string())
            } else {
                replies[(count - 1) % replies.len()].clone()
            }
        };

        match reply {
            MockReply::Content(text) => Ok(ChatCompletionResponse::with_text(text)),
            MockReply::Empty => Ok(ChatCompletionResponse::default()),
            MockReply::Status(code) => {
                let status = StatusCode::from_u16(code)
                    .map_err(|e| Error::Upstream(format!("Invalid mock status {}: {}", code, e)))?;
                Err(Error::from_gateway_status(status, "mock gateway failure"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::ChatMessage;

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "mock".to_string(),
            messages: vec![ChatMessage::system("hi")],
        }
    }

    #[tokio::test]
    async fn test_mock_replies_cycle() {
        let gateway = MockGatewayClient::new()
            .with_content("first")
            .with_content("second");

        let r1 = gateway.chat_completion("k", &request()).await.unwrap();
        let r2 = gateway.chat_completion("k", &request()).await.unwrap();
        let r3 = gateway.chat_completion("k", &request()).await.unwrap();

        assert_eq!(r1.first_text(), Some("first"));
        assert_eq!(r2.first_text(), Some("second"));
        assert_eq!(r3.first_text(), Some("first"));
    }

    #[tokio::test]
    async fn test_mock_status_reply_maps_like_gateway() {
        let gateway = MockGatewayClient::new().with_reply(MockReply::Status(429));
        let err = gateway.chat_completion("k", &request()).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited));
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let gateway = MockGatewayClient::new();
        assert_eq!(gateway.get_call_count(), 0);

        gateway.chat_completion("secret", &request()).await.unwrap();

        assert_eq!(gateway.get_call_count(), 1);
        let (key, body) = &gateway.recorded_requests()[0];
        assert_eq!(key, "secret");
        assert_eq!(body["model"], "mock");
    }
}
