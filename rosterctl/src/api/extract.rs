//! Request extractors shared by handlers.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::errors::Error;

/// An uploaded profile image, held in memory until the handler decides
/// whether the rest of the request is valid.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Body extractor accepting either a JSON document or a
/// `multipart/form-data` submission whose text fields deserialize into the
/// same payload type. Registration and profile updates couple their fields
/// with an optional `profile_image` file part, so browser clients send
/// multipart while API clients send JSON; handlers see one shape for both.
pub struct JsonOrMultipart<T> {
    pub payload: T,
    pub image: Option<ImagePart>,
}

impl<S, T> FromRequest<S> for JsonOrMultipart<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| Error::BadRequest {
                message: rejection.body_text(),
            })?;
            return Ok(Self { payload, image: None });
        }

        let mut multipart = Multipart::from_request(req, state).await.map_err(|e| Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        })?;

        let mut fields = serde_json::Map::new();
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        })? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "profile_image" {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read uploaded file: {e}"),
                })?;
                image = Some(ImagePart {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read field '{name}': {e}"),
                })?;
                fields.insert(name, serde_json::Value::String(value));
            }
        }

        let payload = serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| Error::BadRequest {
            message: format!("Invalid form data: {e}"),
        })?;

        Ok(Self { payload, image })
    }
}
