mod catalog;
mod results;
mod settings;

pub use catalog::*;
pub use results::*;
pub use settings::*;

use axum::{
    extract::{Extension, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::AdminToken,
    models::admin::{AuthMeta, LoginRequest, LoginResponse, StatsSummary},
    services::{admin_service::AdminService, AppState},
};

use super::ApiError;

pub async fn auth_meta(State(state): State<Arc<AppState>>) -> Result<Json<AuthMeta>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.auth_meta().await?))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    Ok(Json(service.login(&payload).await?))
}

pub async fn stats_summary(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
) -> Result<Json<StatsSummary>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.stats_summary(&token).await?))
}
