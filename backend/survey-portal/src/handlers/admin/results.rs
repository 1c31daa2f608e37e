use axum::{
    extract::{Extension, Query, State},
    Json,
};
use std::sync::Arc;

use crate::{
    middlewares::auth::AdminToken,
    models::admin::ResultView,
    services::{results_service::ResultsService, AppState},
    utils::listing::{ListQuery, Page},
};

use super::ApiError;

/// Result rows joined with their catalog records, then filtered and paged.
pub async fn list_results(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ResultView>>, ApiError> {
    let service = ResultsService::new(&state);
    let page = service.list(&query, &token).await?;
    Ok(Json(page))
}
