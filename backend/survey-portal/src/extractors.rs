use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Multipart, Path, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::models::admin::{ImageUpload, QUESTION_IMAGE_FIELD};

/// JSON body extractor whose rejections use the API's JSON error shape.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = rejection_message(&rejection);
                tracing::warn!("{}", message);
                Err(ApiError::BadRequest(message))
            }
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    format!("Failed to parse JSON request body: {}", rejection.body_text())
}

/// Question body sent either as `multipart/form-data` (text fields plus an
/// optional `image` file) or as JSON.
pub struct QuestionForm<T> {
    pub payload: T,
    pub image: Option<ImageUpload>,
}

impl<T, S> FromRequest<S> for QuestionForm<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(req.headers()) {
            let AppJson(payload) = AppJson::<T>::from_request(req, state).await?;
            return Ok(QuestionForm {
                payload,
                image: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| invalid_form(e.body_text()))?;

        let mut fields = Map::new();
        let mut image = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| invalid_form(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == QUESTION_IMAGE_FIELD {
                if let Some(file_name) = field.file_name().map(str::to_string) {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| invalid_form(e.body_text()))?;
                    // Browsers send an empty file part when nothing was picked
                    if !bytes.is_empty() {
                        image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                    continue;
                }
            }
            let text = field.text().await.map_err(|e| invalid_form(e.body_text()))?;
            fields.insert(name, Value::String(text));
        }

        let payload = serde_json::from_value(Value::Object(fields))
            .map_err(|e| invalid_form(e.to_string()))?;
        Ok(QuestionForm { payload, image })
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}

fn invalid_form(detail: String) -> ApiError {
    let message = format!("Failed to parse form data: {}", detail);
    tracing::warn!("{}", message);
    ApiError::BadRequest(message)
}

/// Session id from the path. Malformed ids read as unknown sessions.
pub struct SessionId(pub Uuid);

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("Session not found or expired"))?;
        Uuid::parse_str(raw.trim())
            .map(SessionId)
            .map_err(|_| ApiError::not_found("Session not found or expired"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn multipart_is_detected_from_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        assert!(is_multipart(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_multipart(&headers));
    }
}
