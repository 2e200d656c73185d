//! AI service integration for game-plan and illustration generation
//!
//! Provides interfaces to OpenAI's Responses, Chat Completions and Image APIs.
//! Vision transports implement [`GameService`]; [`FallbackGameClient`] chains
//! two of them so a failing primary API shape degrades to the secondary one.

pub mod fallback;
pub mod mock;
pub mod openai;

pub use fallback::FallbackGameClient;
pub use mock::{MockGameClient, MockIllustrationClient};
pub use openai::{OpenAiChatClient, OpenAiIllustrationClient, OpenAiResponsesClient};

use crate::Result;
use async_trait::async_trait;

/// Turns a prompt plus an image reference (`data:` URL or remote URL) into plan text.
#[async_trait]
pub trait GameService: Send + Sync {
    async fn generate_game(&self, prompt: &str, image_source: &str) -> Result<String>;
}

/// Renders an illustration for a generated plan, returned as a displayable URL.
#[async_trait]
pub trait IllustrationService: Send + Sync {
    async fn generate_illustration(&self, plan: &str) -> Result<String>;
}
