use crate::app::App;
use crate::input::{BodyKind, MultipartForm, RequestBody, UploadedFile};
use crate::models::GenerationResult;
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// `POST /api/generate-game` (also served as `/generate_game`).
pub async fn generate_game(
    State(app): State<Arc<App>>,
    request: Request,
) -> Result<Json<GenerationResult>> {
    let request_id = Uuid::new_v4();

    async move {
        let body = read_body(request).await?;
        let generation = body.normalize()?;
        info!(
            "Generating game (instruction: {}, remote image: {})",
            generation.instruction.is_some(),
            !generation.image_source.starts_with("data:")
        );

        let result = app.generate(&generation).await?;
        Ok::<_, Error>(Json(result))
    }
    .instrument(info_span!("generate_game", %request_id))
    .await
}

pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Decode the body once into the shape-tagged [`RequestBody`].
async fn read_body(request: Request) -> Result<RequestBody> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match BodyKind::from_content_type(content_type.as_deref())? {
        BodyKind::Multipart => {
            let multipart = Multipart::from_request(request, &()).await.map_err(|e| {
                Error::Validation(format!("Invalid multipart body: {}", e.body_text()))
            })?;
            read_multipart(multipart).await.map(RequestBody::Multipart)
        }
        BodyKind::Json => {
            let bytes = Bytes::from_request(request, &()).await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    Error::PayloadTooLarge("Request body too large".to_string())
                } else {
                    Error::Validation(format!("Failed to read request body: {}", e.body_text()))
                }
            })?;
            RequestBody::from_json_slice(&bytes)
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.image = Some(UploadedFile {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "topic" => form.topic = Some(field.text().await.map_err(multipart_error)?),
            "level" => form.level = Some(field.text().await.map_err(multipart_error)?),
            "items" => form.items = Some(field.text().await.map_err(multipart_error)?),
            "instruction" => {
                form.instruction = Some(field.text().await.map_err(multipart_error)?)
            }
            _ => debug!("Ignoring unknown multipart field '{}'", name),
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge("Upload too large".to_string())
    } else {
        Error::Validation(format!("Failed to read multipart data: {}", e.body_text()))
    }
}
