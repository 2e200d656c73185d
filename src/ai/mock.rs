use super::{GameService, IllustrationService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_PLAN: &str = "1. Find every object in the photo.\n2. Take turns hiding one.\n3. Guess which object is missing.";
const DEFAULT_ILLUSTRATION: &str = "data:image/png;base64,iVBORw0KGgo=";

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Failure(String),
}

impl MockReply {
    fn to_result(&self) -> Result<String> {
        match self {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}

/// Picks the reply for call number `count` (1-based), cycling through the queue.
fn next_reply(replies: &[MockReply], count: usize, default: &str) -> Result<String> {
    if replies.is_empty() {
        Ok(default.to_string())
    } else {
        replies[(count - 1) % replies.len()].to_result()
    }
}

/// Scripted [`GameService`]. Clones share state so a clone can be kept to inspect calls.
#[derive(Clone)]
pub struct MockGameClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    delay: Option<Duration>,
    /// (currently running, highest seen)
    in_flight: Arc<Mutex<(usize, usize)>>,
}

impl MockGameClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            in_flight: Arc::new(Mutex::new((0, 0))),
        }
    }

    /// Hold every call open for `delay` before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Largest number of calls that were running at the same time.
    pub fn get_max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().1
    }

    pub fn with_response(self, response: String) -> Self {
        self.replies.lock().unwrap().push(MockReply::Text(response));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.replies.lock().unwrap().push(MockReply::Failure(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn get_image_sources(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, image)| image.clone())
            .collect()
    }
}

impl Default for MockGameClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameService for MockGameClient {
    async fn generate_game(&self, prompt: &str, image_source: &str) -> Result<String> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), image_source.to_string()));
            calls.len()
        };

        if let Some(delay) = self.delay {
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                in_flight.0 += 1;
                in_flight.1 = in_flight.1.max(in_flight.0);
            }
            tokio::time::sleep(delay).await;
            self.in_flight.lock().unwrap().0 -= 1;
        }

        let replies = self.replies.lock().unwrap();
        next_reply(&replies, count, DEFAULT_PLAN)
    }
}

/// Scripted [`IllustrationService`].
#[derive(Clone)]
pub struct MockIllustrationClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    plans: Arc<Mutex<Vec<String>>>,
}

impl MockIllustrationClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            plans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.replies.lock().unwrap().push(MockReply::Text(response));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.replies.lock().unwrap().push(MockReply::Failure(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    pub fn get_plans(&self) -> Vec<String> {
        self.plans.lock().unwrap().clone()
    }
}

impl Default for MockIllustrationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IllustrationService for MockIllustrationClient {
    async fn generate_illustration(&self, plan: &str) -> Result<String> {
        let count = {
            let mut plans = self.plans.lock().unwrap();
            plans.push(plan.to_string());
            plans.len()
        };

        let replies = self.replies.lock().unwrap();
        next_reply(&replies, count, DEFAULT_ILLUSTRATION)
    }
}
