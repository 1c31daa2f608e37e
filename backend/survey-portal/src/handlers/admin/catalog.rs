use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::{AppJson, QuestionForm},
    middlewares::auth::AdminToken,
    models::admin::{
        AdminOption, AdminQuestion, Company, CompanyPayload, OptionPayload, QuestionListItem,
        QuestionPayload, Survey, SurveyListItem, SurveyPayload, UpdateQuestionPayload,
    },
    services::{
        admin_service::{AdminService, Catalog},
        AppState,
    },
    utils::listing::{ListQuery, Page},
};

use super::ApiError;

// Companies

pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Company>>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.list_companies(&query, &token).await?))
}

pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.get(Catalog::Companies, &id, &token).await?))
}

pub async fn create_company(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    AppJson(payload): AppJson<CompanyPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = payload.normalized();
    payload.validate()?;
    let service = AdminService::new(&state);
    let created = service.create(Catalog::Companies, &payload, &token).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_company(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CompanyPayload>,
) -> Result<Json<Value>, ApiError> {
    let payload = payload.normalized();
    payload.validate()?;
    let service = AdminService::new(&state);
    Ok(Json(
        service
            .update(Catalog::Companies, &id, &payload, &token)
            .await?,
    ))
}

pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_record(&state, Catalog::Companies, &id, &token).await
}

// Surveys

pub async fn list_surveys(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<SurveyListItem>>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.list_surveys(&query, &token).await?))
}

pub async fn get_survey(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<Json<Survey>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.get(Catalog::Surveys, &id, &token).await?))
}

pub async fn create_survey(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    AppJson(payload): AppJson<SurveyPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    let created = service.create(Catalog::Surveys, &payload, &token).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_survey(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<SurveyPayload>,
) -> Result<Json<Value>, ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    Ok(Json(
        service.update(Catalog::Surveys, &id, &payload, &token).await?,
    ))
}

pub async fn delete_survey(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_record(&state, Catalog::Surveys, &id, &token).await
}

/// Issues the public link token for a survey.
pub async fn create_survey_url(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.create_survey_url(&id, &token).await?))
}

// Questions

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<QuestionListItem>>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.list_questions(&query, &token).await?))
}

pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<Json<AdminQuestion>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.get(Catalog::Questions, &id, &token).await?))
}

pub async fn create_question(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    QuestionForm { payload, image }: QuestionForm<QuestionPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    let created = service.create_question(&payload, image, &token).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
    QuestionForm { payload, image }: QuestionForm<UpdateQuestionPayload>,
) -> Result<Json<Value>, ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    Ok(Json(
        service
            .update_question(&id, &payload, image, &token)
            .await?,
    ))
}

pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_record(&state, Catalog::Questions, &id, &token).await
}

// Options

pub async fn list_options(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<AdminOption>>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.list_options(&query, &token).await?))
}

pub async fn get_option(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<Json<AdminOption>, ApiError> {
    let service = AdminService::new(&state);
    Ok(Json(service.get(Catalog::Options, &id, &token).await?))
}

pub async fn create_option(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    AppJson(payload): AppJson<OptionPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    let created = service.create(Catalog::Options, &payload, &token).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_option(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<OptionPayload>,
) -> Result<Json<Value>, ApiError> {
    payload.validate()?;
    let service = AdminService::new(&state);
    Ok(Json(
        service.update(Catalog::Options, &id, &payload, &token).await?,
    ))
}

pub async fn delete_option(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_record(&state, Catalog::Options, &id, &token).await
}

async fn delete_record(
    state: &AppState,
    catalog: Catalog,
    id: &str,
    token: &str,
) -> Result<StatusCode, ApiError> {
    let service = AdminService::new(state);
    service.delete(catalog, id, token).await?;
    Ok(StatusCode::NO_CONTENT)
}
