use super::parse::normalize_reply;
use crate::ai::{ChatCompletionRequest, ChatGateway, ChatMessage, ImageUrl, MessagePart};
use crate::models::{IdentificationRequest, SpeciesQuery, SpeciesRecord};
use crate::{prompts, Error, Result};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub const MISSING_KEY_MESSAGE: &str = "LOVABLE_API_KEY is not configured";
const LOGGED_REPLY_CHARS: usize = 200;

/// Runs one species identification against the AI gateway.
///
/// Holds no per-request state; a single instance serves every request.
#[derive(Clone)]
pub struct Identifier {
    gateway: Arc<dyn ChatGateway>,
    api_key: Option<String>,
    model: String,
}

impl Identifier {
    pub fn new(gateway: Arc<dyn ChatGateway>, api_key: Option<String>, model: String) -> Self {
        Self {
            gateway,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Identify the species described by `request`.
    ///
    /// Gateway failures are errors; an unreadable reply is not, it yields the
    /// fallback record.
    pub async fn identify(&self, request: &IdentificationRequest) -> Result<SpeciesRecord> {
        let span = tracing::info_span!("identify", request_id = %Uuid::new_v4());
        self.identify_inner(request).instrument(span).await
    }

    async fn identify_inner(&self, request: &IdentificationRequest) -> Result<SpeciesRecord> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Configuration(MISSING_KEY_MESSAGE.to_string()))?;
        let query = request.query()?;

        let chat_request = self.build_request(&query);
        tracing::info!(
            "Calling AI gateway for species identification ({})",
            match query {
                SpeciesQuery::Image(_) => "image",
                SpeciesQuery::Name(_) => "name",
            }
        );

        let response = self.gateway.chat_completion(api_key, &chat_request).await?;
        let content = response.first_text().unwrap_or_default();

        let preview: String = content.chars().take(LOGGED_REPLY_CHARS).collect();
        tracing::info!("AI response received: {}", preview);

        Ok(normalize_reply(content))
    }

    pub fn build_request(&self, query: &SpeciesQuery) -> ChatCompletionRequest {
        let parts = match query {
            SpeciesQuery::Image(data_url) => vec![
                MessagePart::Text {
                    text: prompts::IDENTIFY_IMAGE.to_string(),
                },
                MessagePart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_url.clone(),
                    },
                },
            ],
            SpeciesQuery::Name(name) => vec![MessagePart::Text {
                text: prompts::render(prompts::IDENTIFY_NAME, &[("species_name", name)]),
            }],
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::IDENTIFY_SYSTEM),
                ChatMessage::user(parts),
            ],
        }
    }
}
