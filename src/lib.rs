//! HTTP service that turns a photo into a step-based children's game plan
//!
//! Accepts an image upload (multipart or JSON), sends it with a fixed prompt to
//! an OpenAI vision model, and returns the generated plan plus an optional
//! illustration.

pub mod ai;
pub mod api;
pub mod app;
pub mod error;
pub mod input;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
