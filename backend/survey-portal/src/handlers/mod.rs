use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::{
    backend_client::BackendError,
    session_service::SessionServiceError,
    survey_session::SessionError,
    AppState,
};

pub mod admin;
pub mod sessions;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = check_backend(&state).await;
    let healthy = backend.get("status").and_then(|v| v.as_str()) == Some("healthy");
    let active_sessions = state.sessions.len().await;

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "service": "survey-portal",
            "version": env!("CARGO_PKG_VERSION"),
            "active_sessions": active_sessions,
            "dependencies": { "backend": backend }
        })),
    )
}

async fn check_backend(state: &AppState) -> serde_json::Map<String, serde_json::Value> {
    let mut result = serde_json::Map::new();

    match tokio::time::timeout(
        std::time::Duration::from_secs(2),
        state.backend.fetch_ui_config(&state.config.ui_config_page),
    )
    .await
    {
        Ok(Ok(_)) => {
            result.insert("status".to_string(), json!("healthy"));
            result.insert("message".to_string(), json!("Survey backend reachable"));
        }
        Ok(Err(e)) => {
            result.insert("status".to_string(), json!("unhealthy"));
            result.insert("error".to_string(), json!(format!("Backend error: {}", e)));
        }
        Err(_) => {
            result.insert("status".to_string(), json!("unhealthy"));
            result.insert("error".to_string(), json!("Backend timeout after 2s"));
        }
    }

    result
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects /metrics with HTTP Basic auth (`METRICS_AUTH=user:password`).
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let encoded = auth_header
        .strip_prefix("Basic ")
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

/// HTTP-edge error. Rendered as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    /// Backend client error passed through with its own status.
    Upstream(StatusCode, String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(status, _) => *status,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionServiceError> for ApiError {
    fn from(err: SessionServiceError) -> Self {
        let message = err.to_string();
        match err {
            SessionServiceError::NotFound => ApiError::NotFound(message),
            SessionServiceError::Rejected(reason) => match reason {
                SessionError::DisclaimerNotAccepted
                | SessionError::UnknownOption { .. }
                | SessionError::ExpectsText(_)
                | SessionError::ExpectsChoice(_) => ApiError::BadRequest(message),
                _ => ApiError::Conflict(message),
            },
            SessionServiceError::ContentUnavailable(_)
            | SessionServiceError::SubmissionFailed(_)
            | SessionServiceError::ReportFailed(_) => ApiError::BadGateway(message),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err.status() {
            Some(401) => ApiError::Unauthorized(err.message()),
            Some(404) => ApiError::NotFound(err.message()),
            Some(code @ 400..=499) => match StatusCode::from_u16(code) {
                Ok(status) => ApiError::Upstream(status, err.message()),
                Err(_) => ApiError::BadGateway(err.message()),
            },
            _ => {
                tracing::error!("Survey backend call failed: {}", err);
                ApiError::BadGateway(err.message())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Upstream(_, message)
            | ApiError::BadGateway(message)
            | ApiError::Internal(message) => message,
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
