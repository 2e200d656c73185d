use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::IllustrationService;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiIllustrationClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiIllustrationClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, Duration::from_secs(120), reqwest::Client::new())
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

super::impl_with_openai_base_url!(OpenAiIllustrationClient);

#[async_trait]
impl IllustrationService for OpenAiIllustrationClient {
    async fn generate_illustration(&self, plan: &str) -> Result<String> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompts::illustration_prompt(plan),
            n: 1,
            size: "1024x1024".to_string(),
            quality: "medium".to_string(),
        };

        let response: ImageGenerationResponse = self.http.image_generation(&request).await?;

        let image_data = response
            .data
            .first()
            .ok_or_else(|| Error::AiProvider("No image data in OpenAI response".to_string()))?;

        // gpt-image models always answer with base64; dall-e style models may hand back a URL.
        match (&image_data.b64_json, &image_data.url) {
            (Some(b64_json), _) if !b64_json.is_empty() => {
                Ok(format!("data:image/png;base64,{}", b64_json))
            }
            (_, Some(url)) if !url.is_empty() => Ok(url.clone()),
            _ => Err(Error::AiProvider(
                "No image data (neither base64 nor URL) in response".to_string(),
            )),
        }
    }
}
