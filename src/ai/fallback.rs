use super::GameService;
use crate::{Error, Result};
use async_trait::async_trait;
use tracing::warn;

/// Tries `primary`, and on an error or blank answer asks `secondary` exactly once.
///
/// Only a failure of both transports reaches the caller, always as
/// [`Error::AiProvider`].
pub struct FallbackGameClient {
    primary: Box<dyn GameService>,
    secondary: Box<dyn GameService>,
}

impl FallbackGameClient {
    pub fn new(primary: Box<dyn GameService>, secondary: Box<dyn GameService>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl GameService for FallbackGameClient {
    async fn generate_game(&self, prompt: &str, image_source: &str) -> Result<String> {
        match self.primary.generate_game(prompt, image_source).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => warn!("Primary transport returned empty text, falling back"),
            Err(e) => warn!("Primary transport failed: {}. Falling back", e),
        }

        match self.secondary.generate_game(prompt, image_source).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => Err(Error::AiProvider("Empty response from OpenAI".to_string())),
            Err(Error::AiProvider(message)) => Err(Error::AiProvider(message)),
            Err(e) => Err(Error::AiProvider(e.to_string())),
        }
    }
}
