//! Request body normalization
//!
//! Generate requests arrive either as multipart form data or as JSON. The HTTP
//! layer decodes them once into [`RequestBody`]; [`RequestBody::normalize`]
//! then validates the fields and produces a [`GenerationRequest`] whose image
//! is a single `data:` URL or remote URL.

use crate::models::GenerationRequest;
use crate::{Error, Result};
use base64::Engine as _;
use serde::Deserialize;

/// MIME type assumed for bare base64 payloads.
pub const DEFAULT_BASE64_MIME: &str = "image/jpeg";

/// Transport shape of an incoming generate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Multipart,
    Json,
}

impl BodyKind {
    /// Classify a `Content-Type` header value; anything else is a 415.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if essence == "multipart/form-data" {
            Ok(BodyKind::Multipart)
        } else if essence == "application/json" || essence.ends_with("+json") {
            Ok(BodyKind::Json)
        } else if essence.is_empty() {
            Err(Error::UnsupportedMediaType(
                "Missing content type; expected multipart/form-data or application/json"
                    .to_string(),
            ))
        } else {
            Err(Error::UnsupportedMediaType(format!(
                "Unsupported content type '{}'; expected multipart/form-data or application/json",
                essence
            )))
        }
    }
}

/// One file part from a multipart upload.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart form fields relevant to generation, still untyped.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub image: Option<UploadedFile>,
    pub topic: Option<String>,
    pub level: Option<String>,
    pub items: Option<String>,
    pub instruction: Option<String>,
}

/// JSON request body. `items` stays loosely typed so it can be coerced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonBody {
    pub topic: Option<String>,
    pub level: Option<String>,
    pub items: Option<serde_json::Value>,
    pub instruction: Option<String>,
    pub image_url: Option<String>,
    pub image_b64: Option<String>,
    pub image_data_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Multipart(MultipartForm),
    Json(JsonBody),
}

/// Every way a caller can hand us an image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Upload { mime: String, bytes: Vec<u8> },
    DataUrl(String),
    Base64(String),
    RemoteUrl(String),
}

impl ImageSource {
    /// Collapse the source into the string form sent to the provider.
    pub fn into_reference(self) -> String {
        match self {
            ImageSource::Upload { mime, bytes } => format!(
                "data:{};base64,{}",
                mime,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
            ImageSource::Base64(payload) => {
                format!("data:{};base64,{}", DEFAULT_BASE64_MIME, payload)
            }
            ImageSource::DataUrl(url) | ImageSource::RemoteUrl(url) => url,
        }
    }
}

impl RequestBody {
    /// Decode a JSON body. Malformed JSON is a 400, well-formed JSON of the wrong shape a 422.
    pub fn from_json_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice::<JsonBody>(body)
            .map(RequestBody::Json)
            .map_err(|e| match e.classify() {
                serde_json::error::Category::Data => {
                    Error::InvalidField(format!("Invalid field in JSON body: {}", e))
                }
                _ => Error::Validation(format!("Invalid JSON body: {}", e)),
            })
    }

    pub fn normalize(self) -> Result<GenerationRequest> {
        match self {
            RequestBody::Multipart(form) => normalize_multipart(form),
            RequestBody::Json(body) => normalize_json(body),
        }
    }
}

fn normalize_multipart(form: MultipartForm) -> Result<GenerationRequest> {
    let items = match form.items.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_items_text(raw)?),
        _ => None,
    };

    let file = form
        .image
        .ok_or_else(|| Error::Validation("Missing required file field 'image'.".to_string()))?;

    if file.bytes.is_empty() {
        return Err(Error::Validation(
            "Empty upload: the image file contains no data.".to_string(),
        ));
    }

    let mime = file.content_type.unwrap_or_default().trim().to_string();
    if !mime.to_ascii_lowercase().starts_with("image/") {
        return Err(Error::Validation(
            "Only image uploads are supported.".to_string(),
        ));
    }

    let source = ImageSource::Upload {
        mime,
        bytes: file.bytes,
    };

    Ok(GenerationRequest {
        image_source: source.into_reference(),
        topic: non_empty(form.topic),
        level: non_empty(form.level),
        items,
        instruction: non_empty(form.instruction),
    })
}

fn normalize_json(body: JsonBody) -> Result<GenerationRequest> {
    let items = match body.items {
        Some(value) => coerce_items(&value)?,
        None => None,
    };

    let source = resolve_json_image(
        non_empty(body.image_data_url),
        non_empty(body.image_b64),
        non_empty(body.image_url),
    )?;

    Ok(GenerationRequest {
        image_source: source.into_reference(),
        topic: non_empty(body.topic),
        level: non_empty(body.level),
        items,
        instruction: non_empty(body.instruction),
    })
}

/// Pick the image in precedence order `image_data_url > image_b64 > image_url`.
fn resolve_json_image(
    data_url: Option<String>,
    b64: Option<String>,
    url: Option<String>,
) -> Result<ImageSource> {
    if let Some(data_url) = data_url {
        let data_url = parse_image_data_url(&data_url).ok_or_else(|| {
            Error::Validation(
                "image_data_url must look like data:image/<type>;base64,<payload>".to_string(),
            )
        })?;
        return Ok(ImageSource::DataUrl(data_url));
    }

    if let Some(b64) = b64 {
        let payload = decodable_base64(&b64)
            .ok_or_else(|| Error::Validation("image_b64 is not valid base64".to_string()))?;
        return Ok(ImageSource::Base64(payload));
    }

    if let Some(url) = url {
        return Ok(ImageSource::RemoteUrl(url));
    }

    Err(Error::Validation(
        "Missing image: provide one of image_data_url, image_b64, or image_url.".to_string(),
    ))
}

fn parse_items_text(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| Error::InvalidField(format!("items must be an integer, got '{}'", raw)))
}

fn coerce_items(value: &serde_json::Value) -> Result<Option<i64>> {
    use serde_json::Value;

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| {
                Error::InvalidField(format!("items must be an integer, got {}", n))
            }),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_items_text(s.trim()).map(Some),
        other => Err(Error::InvalidField(format!(
            "items must be an integer, got {}",
            other
        ))),
    }
}

/// Re-assemble a `data:image/<type>;base64,` URL with its payload compacted.
fn parse_image_data_url(value: &str) -> Option<String> {
    let rest = value.strip_prefix("data:image/")?;
    let (subtype, payload) = rest.split_once(";base64,")?;

    let valid_subtype = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'));
    if !valid_subtype {
        return None;
    }

    let payload = decodable_base64(payload)?;
    Some(format!("data:image/{};base64,{}", subtype, payload))
}

/// Drop line breaks and other ASCII whitespace (MIME-style wrapping), then
/// keep the payload only if it decodes as standard base64.
fn decodable_base64(value: &str) -> Option<String> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .ok()
        .map(|_| compact)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
