pub mod chat;
pub mod client;
pub mod image;
pub mod responses;
pub mod types;

pub use chat::OpenAiChatClient;
pub use client::OpenAiHttpClient;
pub use image::OpenAiIllustrationClient;
pub use responses::OpenAiResponsesClient;

/// Adds a `with_base_url` builder that forwards to the inner HTTP client.
macro_rules! impl_with_openai_base_url {
    ($client:ty) => {
        impl $client {
            pub fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}
pub(crate) use impl_with_openai_base_url;
