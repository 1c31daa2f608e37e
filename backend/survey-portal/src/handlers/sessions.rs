use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::extractors::{AppJson, SessionId};
use crate::handlers::ApiError;
use crate::models::{
    report::ReportSection,
    session::{AcceptDisclaimerRequest, SelectOptionRequest, SessionView, SetTextRequest},
};
use crate::services::{session_service::SessionService, AppState};

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(url_token): Path<String>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let url_token = url_token.trim();
    if url_token.is_empty() {
        return Err(ApiError::not_found("Survey not found"));
    }
    let service = SessionService::new(&state);
    let view = service.start(url_token).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.view(id).await?))
}

pub async fn accept_disclaimer(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
    AppJson(payload): AppJson<AcceptDisclaimerRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.accept_disclaimer(id, payload.accepted).await?))
}

pub async fn select_option(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
    AppJson(payload): AppJson<SelectOptionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.select_option(id, &payload.option_id).await?))
}

pub async fn set_text(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
    AppJson(payload): AppJson<SetTextRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.set_text(id, payload.value).await?))
}

pub async fn next_question(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.next(id).await?))
}

pub async fn previous_question(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.back(id).await?))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
) -> Result<Json<SessionView>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.submit(id).await?))
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
) -> Result<Json<Vec<ReportSection>>, ApiError> {
    let service = SessionService::new(&state);
    Ok(Json(service.report(id).await?))
}

pub async fn report_pdf(
    State(state): State<Arc<AppState>>,
    SessionId(id): SessionId,
) -> Result<Response, ApiError> {
    let service = SessionService::new(&state);
    let file = service.report_pdf(id).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.filename))
        .map_err(|e| ApiError::Internal(format!("Invalid report filename: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
