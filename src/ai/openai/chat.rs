use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent, ImageUrl, MessagePart};
use crate::ai::GameService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Secondary vision transport: Chat Completions with an `image_url` content part.
pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, Duration::from_secs(60), reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, timeout, client),
            model,
        }
    }
}

super::impl_with_openai_base_url!(OpenAiChatClient);

#[async_trait]
impl GameService for OpenAiChatClient {
    async fn generate_game(&self, prompt: &str, image_source: &str) -> Result<String> {
        tracing::debug!("Requesting game plan via chat completions ({})", self.model);

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: Some(ChatMessageContent::ImageContent(vec![
                MessagePart {
                    part_type: "text".to_string(),
                    text: Some(prompt.to_string()),
                    image_url: None,
                },
                MessagePart {
                    part_type: "image_url".to_string(),
                    text: None,
                    image_url: Some(ImageUrl {
                        url: image_source.to_string(),
                    }),
                },
            ])),
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![user_message],
            max_completion_tokens: None,
        };

        let response = self.http.chat_completion(&request).await?;
        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::AiProvider("No response from OpenAI chat API".to_string()))?;

        match &choice.message.content {
            Some(ChatMessageContent::Text(text)) if !text.trim().is_empty() => {
                Ok(text.trim().to_string())
            }
            _ => {
                let reason = choice.finish_reason.as_deref().unwrap_or("unknown");
                tracing::debug!("Chat completion had no text (finish_reason: {})", reason);
                Err(Error::AiProvider(format!(
                    "Empty response from OpenAI chat API (finish_reason: {})",
                    reason
                )))
            }
        }
    }
}
