//! Admin dashboard operations, proxied to the survey backend with the
//! caller's bearer token.

use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::models::{
    admin::{
        AdminOption, AdminQuestion, AuthMeta, Company, ImageUpload, LoginRequest, LoginResponse,
        QuestionListItem, QuestionPayload, StatsSummary, Survey, SurveyListItem,
        UpdateQuestionPayload, QUESTION_IMAGE_FIELD,
    },
    ui_config::{SurveyUiConfig, ThankYouConfig, UpdateUiConfigRequest},
};
use crate::services::{
    backend_client::{encode_segment, BackendClient, BackendError},
    AppState,
};
use crate::utils::listing::{any_field_contains, ListQuery, Page};

const MISSING_NAME: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Companies,
    Surveys,
    Questions,
    Options,
}

impl Catalog {
    pub fn path(&self) -> &'static str {
        match self {
            Catalog::Companies => "/companies",
            Catalog::Surveys => "/surveys",
            Catalog::Questions => "/questions",
            Catalog::Options => "/options",
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), encode_segment(id))
    }
}

pub struct AdminService {
    client: BackendClient,
}

impl AdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            client: state.client.clone(),
        }
    }

    pub async fn auth_meta(&self) -> Result<AuthMeta, BackendError> {
        self.client.get("/auth/meta", None).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        let response: LoginResponse = self.client.post("/auth/login", request, None).await?;
        info!("Admin login succeeded for {}", request.email);
        Ok(response)
    }

    pub async fn stats_summary(&self, token: &str) -> Result<StatsSummary, BackendError> {
        let summary: Option<StatsSummary> = self.client.get("/stats/summary", Some(token)).await?;
        Ok(summary.unwrap_or_default())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        catalog: Catalog,
        id: &str,
        token: &str,
    ) -> Result<T, BackendError> {
        self.client.get(&catalog.item_path(id), Some(token)).await
    }

    pub async fn create<B: Serialize>(
        &self,
        catalog: Catalog,
        body: &B,
        token: &str,
    ) -> Result<Value, BackendError> {
        let created = self.client.post(catalog.path(), body, Some(token)).await?;
        info!("Created record in {}", catalog.path());
        Ok(created)
    }

    pub async fn update<B: Serialize>(
        &self,
        catalog: Catalog,
        id: &str,
        body: &B,
        token: &str,
    ) -> Result<Value, BackendError> {
        let updated = self
            .client
            .put(&catalog.item_path(id), body, Some(token))
            .await?;
        info!("Updated {}/{}", catalog.path(), id);
        Ok(updated)
    }

    pub async fn delete(&self, catalog: Catalog, id: &str, token: &str) -> Result<(), BackendError> {
        let _: Value = self
            .client
            .delete(&catalog.item_path(id), Some(token))
            .await?;
        info!("Deleted {}/{}", catalog.path(), id);
        Ok(())
    }

    /// Questions go to the backend as multipart forms so an image can ride along.
    pub async fn create_question(
        &self,
        payload: &QuestionPayload,
        image: Option<ImageUpload>,
        token: &str,
    ) -> Result<Value, BackendError> {
        let form = question_form(payload, image)?;
        let path = Catalog::Questions.path();
        let created = self
            .client
            .send_form(Method::POST, path, form, Some(token))
            .await?;
        info!("Created record in {}", path);
        Ok(created)
    }

    pub async fn update_question(
        &self,
        id: &str,
        payload: &UpdateQuestionPayload,
        image: Option<ImageUpload>,
        token: &str,
    ) -> Result<Value, BackendError> {
        let form = question_form(payload, image)?;
        let path = Catalog::Questions.item_path(id);
        let updated = self
            .client
            .send_form(Method::PUT, &path, form, Some(token))
            .await?;
        info!("Updated {}", path);
        Ok(updated)
    }

    pub async fn create_survey_url(&self, id: &str, token: &str) -> Result<Value, BackendError> {
        let path = format!("{}/create-url", Catalog::Surveys.item_path(id));
        self.client
            .post(&path, &serde_json::json!({}), Some(token))
            .await
    }

    /// Full, unpaginated list; a `null` body reads as empty.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        catalog: Catalog,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Vec<T>, BackendError> {
        let list: Option<Vec<T>> = self
            .client
            .get_with_query(catalog.path(), query, Some(token))
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Lists outside the catalog, such as `/results`.
    pub async fn fetch_all_at<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<Vec<T>, BackendError> {
        let list: Option<Vec<T>> = self.client.get(path, Some(token)).await?;
        Ok(list.unwrap_or_default())
    }

    pub async fn list_companies(
        &self,
        query: &ListQuery,
        token: &str,
    ) -> Result<Page<Company>, BackendError> {
        let companies: Vec<Company> = self.fetch_all(Catalog::Companies, &[], token).await?;
        Ok(query.paginate(filter_companies(companies, query)))
    }

    pub async fn list_surveys(
        &self,
        query: &ListQuery,
        token: &str,
    ) -> Result<Page<SurveyListItem>, BackendError> {
        let params = backend_filter("companyId", query.company_filter());
        let (surveys, companies) = futures::try_join!(
            self.fetch_all::<Survey>(Catalog::Surveys, &params, token),
            self.fetch_all::<Company>(Catalog::Companies, &[], token),
        )?;
        Ok(query.paginate(enrich_surveys(surveys, &companies, query)))
    }

    pub async fn list_questions(
        &self,
        query: &ListQuery,
        token: &str,
    ) -> Result<Page<QuestionListItem>, BackendError> {
        let params = backend_filter("surveyId", query.survey_filter());
        let (questions, companies, surveys) = futures::try_join!(
            self.fetch_all::<AdminQuestion>(Catalog::Questions, &params, token),
            self.fetch_all::<Company>(Catalog::Companies, &[], token),
            self.fetch_all::<Survey>(Catalog::Surveys, &[], token),
        )?;
        Ok(query.paginate(enrich_questions(questions, &companies, &surveys, query)))
    }

    pub async fn list_options(
        &self,
        query: &ListQuery,
        token: &str,
    ) -> Result<Page<AdminOption>, BackendError> {
        let params = backend_filter("questionId", query.question_filter());
        let options: Vec<AdminOption> = self.fetch_all(Catalog::Options, &params, token).await?;
        Ok(query.paginate(filter_options(options, query)))
    }

    pub async fn ui_config(&self, page: &str, token: &str) -> Result<SurveyUiConfig, BackendError> {
        let config: Option<SurveyUiConfig> = self
            .client
            .get(&format!("/ui-config/{}", encode_segment(page)), Some(token))
            .await?;
        Ok(config.unwrap_or_default())
    }

    pub async fn update_ui_config(
        &self,
        page: &str,
        config: SurveyUiConfig,
        token: &str,
    ) -> Result<Value, BackendError> {
        let body = UpdateUiConfigRequest { config };
        let updated = self
            .client
            .put(&format!("/ui-config/{}", encode_segment(page)), &body, Some(token))
            .await?;
        info!("UI config '{}' updated", page);
        Ok(updated)
    }

    pub async fn thank_you_config(
        &self,
        page: &str,
        token: &str,
    ) -> Result<ThankYouConfig, BackendError> {
        let config: Option<ThankYouConfig> = self
            .client
            .get(&format!("/thankyou-config/{}", encode_segment(page)), Some(token))
            .await?;
        Ok(config.unwrap_or_default())
    }

    pub async fn update_thank_you_config(
        &self,
        page: &str,
        config: &ThankYouConfig,
        token: &str,
    ) -> Result<Value, BackendError> {
        let updated = self
            .client
            .put(&format!("/thankyou-config/{}", encode_segment(page)), config, Some(token))
            .await?;
        info!("Thank-you config '{}' updated", page);
        Ok(updated)
    }
}

/// Text fields of a question form. An uploaded file replaces any `image` reference.
fn form_fields<B: Serialize>(
    body: &B,
    has_upload: bool,
) -> Result<Vec<(String, String)>, serde_json::Error> {
    let Value::Object(fields) = serde_json::to_value(body)? else {
        return Ok(Vec::new());
    };
    Ok(fields
        .into_iter()
        .filter(|(name, _)| !(has_upload && name == QUESTION_IMAGE_FIELD))
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((name, text)),
            other => Some((name, other.to_string())),
        })
        .collect())
}

fn question_form<B: Serialize>(body: &B, image: Option<ImageUpload>) -> Result<Form, BackendError> {
    let form = form_fields(body, image.is_some())?
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));

    let Some(image) = image else {
        return Ok(form);
    };
    let mut part = Part::bytes(image.bytes).file_name(image.file_name);
    if let Some(content_type) = image.content_type {
        part = part.mime_str(&content_type)?;
    }
    Ok(form.part(QUESTION_IMAGE_FIELD, part))
}

fn backend_filter(key: &'static str, value: Option<&str>) -> Vec<(&'static str, String)> {
    value.map(|v| vec![(key, v.to_string())]).unwrap_or_default()
}

pub fn name_lookup<'a, T>(
    items: &'a [T],
    key: impl Fn(&'a T) -> (&'a str, &'a str),
) -> HashMap<&'a str, &'a str> {
    items.iter().map(key).collect()
}

fn name_or_dash(names: &HashMap<&str, &str>, id: &str) -> String {
    names.get(id).copied().unwrap_or(MISSING_NAME).to_string()
}

pub fn filter_companies(companies: Vec<Company>, query: &ListQuery) -> Vec<Company> {
    match query.needle() {
        Some(needle) => companies
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect(),
        None => companies,
    }
}

pub fn enrich_surveys(
    surveys: Vec<Survey>,
    companies: &[Company],
    query: &ListQuery,
) -> Vec<SurveyListItem> {
    let company_names = name_lookup(companies, |c| (c.id.as_str(), c.name.as_str()));
    let needle = query.needle();

    surveys
        .into_iter()
        .filter(|s| query.company_filter().is_none_or(|id| s.company_id == id))
        .map(|survey| SurveyListItem {
            company_name: name_or_dash(&company_names, &survey.company_id),
            survey,
        })
        .filter(|item| match &needle {
            Some(needle) => any_field_contains(
                &[
                    item.survey.name.as_str(),
                    item.company_name.as_str(),
                    item.survey.url.as_deref().unwrap_or_default(),
                    item.survey.status.as_str(),
                ],
                needle,
            ),
            None => true,
        })
        .collect()
}

pub fn enrich_questions(
    questions: Vec<AdminQuestion>,
    companies: &[Company],
    surveys: &[Survey],
    query: &ListQuery,
) -> Vec<QuestionListItem> {
    let company_names = name_lookup(companies, |c| (c.id.as_str(), c.name.as_str()));
    let survey_names = name_lookup(surveys, |s| (s.id.as_str(), s.name.as_str()));
    let needle = query.needle();

    questions
        .into_iter()
        .filter(|q| query.survey_filter().is_none_or(|id| q.survey_id == id))
        .filter(|q| query.company_filter().is_none_or(|id| q.company_id == id))
        .map(|question| QuestionListItem {
            company_name: name_or_dash(&company_names, &question.company_id),
            survey_name: name_or_dash(&survey_names, &question.survey_id),
            question,
        })
        .filter(|item| match &needle {
            Some(needle) => any_field_contains(
                &[
                    item.company_name.as_str(),
                    item.survey_name.as_str(),
                    item.question.segment.as_str(),
                    item.question.segment_title.as_deref().unwrap_or_default(),
                    item.question.text.as_str(),
                    item.question.details.as_deref().unwrap_or_default(),
                    item.question.kind.as_str(),
                ],
                needle,
            ),
            None => true,
        })
        .collect()
}

pub fn filter_options(options: Vec<AdminOption>, query: &ListQuery) -> Vec<AdminOption> {
    let needle = query.needle();
    options
        .into_iter()
        .filter(|o| query.question_filter().is_none_or(|id| o.question_id == id))
        .filter(|o| match &needle {
            Some(needle) => {
                any_field_contains(&[o.text.as_str(), o.risk.as_deref().unwrap_or_default()], needle)
            }
            None => true,
        })
        .collect()
}
