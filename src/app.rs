//! Request pipeline: build the prompt, generate the plan, then illustrate it.

use crate::ai::{
    FallbackGameClient, GameService, IllustrationService, OpenAiChatClient,
    OpenAiIllustrationClient, OpenAiResponsesClient,
};
use crate::models::{Config, GenerationRequest, GenerationResult};
use crate::{prompts, Error, Result};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Runs generate requests against the configured provider services.
///
/// Holds no per-request state; one instance is shared by every handler.
pub struct App {
    services: Option<AppServices>,
    provider_permits: Semaphore,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generator: Box<dyn GameService>,
    /// `None` disables illustrations entirely.
    pub illustrator: Option<Box<dyn IllustrationService>>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, max_concurrent_provider_calls: usize) -> Self {
        Self {
            services: Some(services),
            provider_permits: Semaphore::new(max_concurrent_provider_calls.max(1)),
        }
    }

    /// An app without provider credentials. Every generate request fails with
    /// [`Error::Configuration`] once its input has been validated.
    pub fn unconfigured(max_concurrent_provider_calls: usize) -> Self {
        Self {
            services: None,
            provider_permits: Semaphore::new(max_concurrent_provider_calls.max(1)),
        }
    }

    /// Construct the OpenAI-backed services described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let Some(api_key) = config.openai_api_key.clone() else {
            warn!("OPENAI_API_KEY is not set; generate requests will fail until it is configured");
            return Self::unconfigured(config.max_concurrent_provider_calls);
        };

        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        info!(
            "Game provider: OpenAI responses API with chat completions fallback (model: {})",
            config.chat_model
        );
        let primary = OpenAiResponsesClient::new_with_client(
            api_key.clone(),
            config.chat_model.clone(),
            config.provider_timeout,
            http_client.clone(),
        )
        .with_base_url(config.openai_base_url.clone());
        let secondary = OpenAiChatClient::new_with_client(
            api_key.clone(),
            config.chat_model.clone(),
            config.provider_timeout,
            http_client.clone(),
        )
        .with_base_url(config.openai_base_url.clone());

        let illustrator: Option<Box<dyn IllustrationService>> = if config.illustrations_enabled {
            info!("Illustration provider: OpenAI (model: {})", config.image_model);
            Some(Box::new(
                OpenAiIllustrationClient::new_with_client(
                    api_key,
                    config.image_model.clone(),
                    config.provider_timeout * 2,
                    http_client,
                )
                .with_base_url(config.openai_base_url.clone()),
            ))
        } else {
            info!("Illustrations disabled");
            None
        };

        Self::with_services(
            AppServices {
                generator: Box::new(FallbackGameClient::new(
                    Box::new(primary),
                    Box::new(secondary),
                )),
                illustrator,
            },
            config.max_concurrent_provider_calls,
        )
    }

    pub fn is_configured(&self) -> bool {
        self.services.is_some()
    }

    /// Generate a plan (and, best-effort, an illustration) for a validated request.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let services = self.services.as_ref().ok_or_else(|| {
            Error::Configuration("OpenAI API key not configured".to_string())
        })?;

        let prompt = prompts::build_prompt(prompts::GAME_BASE, request.instruction.as_deref());
        debug!(
            topic = ?request.topic,
            level = ?request.level,
            items = ?request.items,
            "Request metadata accepted; not part of the prompt"
        );

        let _permit = self
            .provider_permits
            .acquire()
            .await
            .map_err(|e| Error::Generic(format!("Provider permit unavailable: {}", e)))?;

        let plan = services
            .generator
            .generate_game(&prompt, &request.image_source)
            .await?
            .trim()
            .to_string();
        info!("Generated game plan ({} chars)", plan.len());

        let illustration = match &services.illustrator {
            Some(illustrator) => illustrate(illustrator.as_ref(), &plan).await,
            None => None,
        };

        Ok(GenerationResult {
            result: plan,
            illustration,
        })
    }
}

/// Illustration failures never fail the request; they just yield no image.
async fn illustrate(illustrator: &dyn IllustrationService, plan: &str) -> Option<String> {
    match illustrator.generate_illustration(plan).await {
        Ok(url) if !url.is_empty() => Some(url),
        Ok(_) => {
            warn!("Illustration provider returned an empty payload");
            None
        }
        Err(e) => {
            warn!("Illustration generation failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices};
    use crate::ai::{MockGameClient, MockIllustrationClient};
    use crate::models::GenerationRequest;
    use crate::{prompts, Error};
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    const IMAGE: &str = "data:image/png;base64,iVBORw0=";

    fn build_test_app(generator: &MockGameClient, illustrator: Option<&MockIllustrationClient>) -> App {
        App::with_services(
            AppServices {
                generator: Box::new(generator.clone()),
                illustrator: illustrator
                    .map(|i| Box::new(i.clone()) as Box<dyn crate::ai::IllustrationService>),
            },
            4,
        )
    }

    #[tokio::test]
    async fn test_generate_sends_instruction_and_illustrates_plan() {
        let generator = MockGameClient::new().with_response("  1. Find blue things.  ".to_string());
        let illustrator =
            MockIllustrationClient::new().with_response("data:image/png;base64,AAA=".to_string());
        let app = build_test_app(&generator, Some(&illustrator));

        let request =
            GenerationRequest::new(IMAGE.to_string()).with_instruction("use only blue objects");
        let result = app.generate(&request).await.unwrap();

        assert_eq!(result.result, "1. Find blue things.");
        assert_eq!(result.illustration.as_deref(), Some("data:image/png;base64,AAA="));
        assert_eq!(generator.get_call_count(), 1);
        assert!(generator.get_prompts()[0]
            .ends_with("Please also incorporate: use only blue objects"));
        assert_eq!(generator.get_image_sources(), vec![IMAGE.to_string()]);
        assert_eq!(illustrator.get_plans(), vec!["1. Find blue things.".to_string()]);
    }

    #[tokio::test]
    async fn test_metadata_is_not_woven_into_prompt() {
        let generator = MockGameClient::new();
        let app = build_test_app(&generator, None);

        let mut request = GenerationRequest::new(IMAGE.to_string());
        request.topic = Some("colors".to_string());
        request.level = Some("easy".to_string());
        request.items = Some(3);
        app.generate(&request).await.unwrap();

        assert_eq!(generator.get_prompts(), vec![prompts::GAME_BASE.to_string()]);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_illustration() {
        let generator = MockGameClient::new().with_failure("both transports down".to_string());
        let illustrator = MockIllustrationClient::new();
        let app = build_test_app(&generator, Some(&illustrator));

        let err = app
            .generate(&GenerationRequest::new(IMAGE.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
        assert_eq!(illustrator.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_illustration_failure_is_swallowed() {
        let generator = MockGameClient::new().with_response("A plan".to_string());
        let illustrator = MockIllustrationClient::new().with_failure("image model down".to_string());
        let app = build_test_app(&generator, Some(&illustrator));

        let result = app
            .generate(&GenerationRequest::new(IMAGE.to_string()))
            .await
            .unwrap();

        assert_eq!(result.result, "A plan");
        assert_eq!(result.illustration, None);
        assert_eq!(illustrator.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_illustration_payload_is_absent() {
        let generator = MockGameClient::new().with_response("A plan".to_string());
        let illustrator = MockIllustrationClient::new().with_response(String::new());
        let app = build_test_app(&generator, Some(&illustrator));

        let result = app
            .generate(&GenerationRequest::new(IMAGE.to_string()))
            .await
            .unwrap();
        assert_eq!(result.illustration, None);
    }

    #[tokio::test]
    async fn test_disabled_illustrations_return_none() {
        let generator = MockGameClient::new();
        let app = build_test_app(&generator, None);

        let result = app
            .generate(&GenerationRequest::new(IMAGE.to_string()))
            .await
            .unwrap();
        assert_eq!(result.illustration, None);
    }

    #[tokio::test]
    async fn test_unconfigured_app_is_configuration_error() {
        let app = App::unconfigured(1);
        assert!(!app.is_configured());

        let err = app
            .generate(&GenerationRequest::new(IMAGE.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_provider_calls_wait_for_a_free_permit() {
        let generator = MockGameClient::new().with_delay(Duration::from_millis(200));
        let app = App::with_services(
            AppServices {
                generator: Box::new(generator.clone()),
                illustrator: None,
            },
            1,
        );
        let request = GenerationRequest::new(IMAGE.to_string());

        let started = Instant::now();
        let (first, second) = tokio::join!(app.generate(&request), app.generate(&request));

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(generator.get_call_count(), 2);
        assert_eq!(generator.get_max_in_flight(), 1);
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_provider_calls_run_together_below_the_cap() {
        let generator = MockGameClient::new().with_delay(Duration::from_millis(200));
        let app = App::with_services(
            AppServices {
                generator: Box::new(generator.clone()),
                illustrator: None,
            },
            2,
        );
        let request = GenerationRequest::new(IMAGE.to_string());

        let (first, second) = tokio::join!(app.generate(&request), app.generate(&request));

        assert!(first.is_ok() && second.is_ok());
        assert_eq!(generator.get_max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_from_config_without_key_is_unconfigured() {
        let app = App::from_config(&crate::models::Config::default());
        assert!(!app.is_configured());
    }
}
