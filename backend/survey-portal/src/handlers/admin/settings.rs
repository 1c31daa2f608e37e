use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    middlewares::auth::AdminToken,
    models::ui_config::{SurveyUiConfig, ThankYouConfig, UpdateUiConfigRequest},
    services::{admin_service::AdminService, AppState},
};

use super::ApiError;

pub async fn get_ui_config(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(page): Path<String>,
) -> Result<Json<SurveyUiConfig>, ApiError> {
    let service = AdminService::new(&state);
    let config = service.ui_config(&page, &token).await?;
    Ok(Json(config))
}

pub async fn update_ui_config(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(page): Path<String>,
    AppJson(payload): AppJson<UpdateUiConfigRequest>,
) -> Result<Json<Value>, ApiError> {
    let service = AdminService::new(&state);
    let updated = service
        .update_ui_config(&page, payload.config, &token)
        .await?;
    Ok(Json(updated))
}

pub async fn get_thank_you_config(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(page): Path<String>,
) -> Result<Json<ThankYouConfig>, ApiError> {
    let service = AdminService::new(&state);
    let config = service.thank_you_config(&page, &token).await?;
    Ok(Json(config))
}

pub async fn update_thank_you_config(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(page): Path<String>,
    AppJson(payload): AppJson<ThankYouConfig>,
) -> Result<Json<Value>, ApiError> {
    let service = AdminService::new(&state);
    let updated = service
        .update_thank_you_config(&page, &payload, &token)
        .await?;
    Ok(Json(updated))
}
