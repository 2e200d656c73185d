//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror. Each
//! variant maps onto exactly one HTTP status so handlers can bail out with `?`.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing input (400).
    #[error("{0}")]
    Validation(String),

    /// Request body is neither multipart form data nor JSON (415).
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// A field is present but has the wrong type (422).
    #[error("{0}")]
    InvalidField(String),

    /// Request body exceeds the configured upload limit (413).
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Provider credentials are missing (500).
    #[error("{0}")]
    Configuration(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::InvalidField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::AiProvider(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Configuration(_) | Error::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
