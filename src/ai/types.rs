//! Chat-completion payloads spoken by the AI gateway.

use serde::{Deserialize, Deserializer, Serialize};

/// Gateways send `null` where a field has nothing; read it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request body for a chat completion.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Message content: a bare string or an ordered list of parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatMessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

/// One segment of a multipart user message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatMessageContent>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(ChatMessageContent::Text(text.into())),
        }
    }

    pub fn user(parts: Vec<MessagePart>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(ChatMessageContent::Parts(parts)),
        }
    }
}

/// Top-level chat completion response.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ChatCompletionResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the model produced a plain string.
    pub fn first_text(&self) -> Option<&str> {
        match self.choices.first()?.message.as_ref()?.content.as_ref()? {
            ChatMessageContent::Text(text) => Some(text),
            ChatMessageContent::Parts(_) => None,
        }
    }

    /// Single-choice response carrying `content`, as the gateway would send it.
    pub fn with_text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChatChoice {
                message: Some(ChatMessage {
                    role: "assistant".to_string(),
                    content: Some(ChatMessageContent::Text(content.into())),
                }),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_parts_serialize_with_type_tags() {
        let message = ChatMessage::user(vec![
            MessagePart::Text {
                text: "look".to_string(),
            },
            MessagePart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AA".to_string(),
                },
            },
        ]);

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "look"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AA"}}
                ]
            })
        );
    }

    #[test]
    fn test_system_message_is_plain_string() {
        let value = serde_json::to_value(ChatMessage::system("be a biologist")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "be a biologist"}));
    }

    #[test]
    fn test_first_text_tolerates_missing_pieces() {
        let empty: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), None);

        let no_content: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"role": "assistant"}}]}))
                .unwrap();
        assert_eq!(no_content.first_text(), None);

        let text: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(text.first_text(), Some("hi"));
    }

    #[test]
    fn test_null_choices_and_role_decode() {
        let null_choices: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": null})).unwrap();
        assert!(null_choices.choices.is_empty());
        assert_eq!(null_choices.first_text(), None);

        let null_role: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": null, "content": "hi"}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(null_role.first_text(), Some("hi"));

        let null_message: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": null}]})).unwrap();
        assert_eq!(null_message.first_text(), None);
    }
}
