use super::client::OpenAiHttpClient;
use super::types::{ResponseInputMessage, ResponseInputPart, ResponsesRequest};
use crate::ai::GameService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Primary vision transport: the OpenAI Responses API.
pub struct OpenAiResponsesClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiResponsesClient {
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

super::impl_with_openai_base_url!(OpenAiResponsesClient);

#[async_trait]
impl GameService for OpenAiResponsesClient {
    async fn generate_game(&self, prompt: &str, image_source: &str) -> Result<String> {
        tracing::debug!("Requesting game plan via responses API ({})", self.model);

        let request = ResponsesRequest {
            model: self.model.clone(),
            input: vec![ResponseInputMessage {
                role: "user".to_string(),
                content: vec![
                    ResponseInputPart::InputText {
                        text: prompt.to_string(),
                    },
                    ResponseInputPart::InputImage {
                        image_url: image_source.to_string(),
                    },
                ],
            }],
        };

        let response = self.http.create_response(&request).await?;

        response
            .text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::AiProvider("Empty response from OpenAI responses API".to_string()))
    }
}
