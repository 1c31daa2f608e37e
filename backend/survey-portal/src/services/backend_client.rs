use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{multipart::Form, Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};

use crate::metrics::{BACKEND_REQUESTS_TOTAL, BACKEND_REQUEST_DURATION_SECONDS};
use crate::models::{
    answer::SubmitAnswersRequest,
    report::ReportRequest,
    survey::PublicSurvey,
    ui_config::{SurveyUiConfig, ThankYouConfig},
};

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for passing back to an admin caller.
    pub fn message(&self) -> String {
        match self {
            BackendError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Calls made by the respondent flow.
#[async_trait]
pub trait SurveyBackend: Send + Sync {
    async fn fetch_survey(&self, url_token: &str) -> Result<PublicSurvey, BackendError>;

    async fn fetch_ui_config(&self, page: &str) -> Result<SurveyUiConfig, BackendError>;

    async fn fetch_thank_you_config(&self, page: &str) -> Result<ThankYouConfig, BackendError>;

    async fn submit_answers(
        &self,
        url_token: &str,
        body: &SubmitAnswersRequest,
    ) -> Result<(), BackendError>;

    /// Returns the rendered PDF bytes.
    async fn render_report(&self, request: &ReportRequest) -> Result<Vec<u8>, BackendError>;
}

/// Thin JSON client for the survey REST backend.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        let builder = self.request(Method::GET, path, token);
        self.send_json(Method::GET, path, builder).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        let builder = self.request(Method::GET, path, token).query(query);
        self.send_json(Method::GET, path, builder).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, token: Option<&str>) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path, token).json(body);
        self.send_json(Method::POST, path, builder).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, token: Option<&str>) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path, token).json(body);
        self.send_json(Method::PUT, path, builder).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        let builder = self.request(Method::DELETE, path, token);
        self.send_json(Method::DELETE, path, builder).await
    }

    pub async fn send_form<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Form,
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        let builder = self.request(method.clone(), path, token).multipart(form);
        self.send_json(method, path, builder).await
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let bytes = self.send_bytes(method, path, builder).await?;
        // 204 and empty bodies decode as JSON null.
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        Ok(serde_json::from_slice(body)?)
    }

    async fn send_bytes(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Vec<u8>, BackendError> {
        let start = Instant::now();
        let result = execute(builder).await;

        let endpoint = endpoint_label(path);
        let status_label = match &result {
            Ok(_) => "success".to_string(),
            Err(BackendError::Status { status, .. }) => status.to_string(),
            Err(_) => "error".to_string(),
        };
        BACKEND_REQUESTS_TOTAL
            .with_label_values(&[method.as_str(), endpoint, &status_label])
            .inc();
        BACKEND_REQUEST_DURATION_SECONDS
            .with_label_values(&[method.as_str(), endpoint])
            .observe(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::debug!("Backend {} {} failed: {}", method, path, e);
        }
        result
    }
}

async fn execute(builder: RequestBuilder) -> Result<Vec<u8>, BackendError> {
    let response = builder.send().await?;
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            message: error_message(status, &bytes),
        });
    }
    Ok(bytes.to_vec())
}

#[async_trait]
impl SurveyBackend for BackendClient {
    async fn fetch_survey(&self, url_token: &str) -> Result<PublicSurvey, BackendError> {
        self.get(&format!("/public/surveys/{}", encode_segment(url_token)), None)
            .await
    }

    async fn fetch_ui_config(&self, page: &str) -> Result<SurveyUiConfig, BackendError> {
        self.get(&format!("/ui-config/{}", encode_segment(page)), None)
            .await
    }

    async fn fetch_thank_you_config(&self, page: &str) -> Result<ThankYouConfig, BackendError> {
        let config: Option<ThankYouConfig> = self
            .get(&format!("/thankyou-config/{}", encode_segment(page)), None)
            .await?;
        Ok(config.unwrap_or_default())
    }

    async fn submit_answers(
        &self,
        url_token: &str,
        body: &SubmitAnswersRequest,
    ) -> Result<(), BackendError> {
        let path = format!("/public/surveys/{}/submit", encode_segment(url_token));
        let builder = self.request(Method::POST, &path, None).json(body);
        self.send_bytes(Method::POST, &path, builder).await?;
        Ok(())
    }

    async fn render_report(&self, request: &ReportRequest) -> Result<Vec<u8>, BackendError> {
        let path = "/public/report.pdf";
        let builder = self.request(Method::POST, path, None).json(request);
        self.send_bytes(Method::POST, path, builder).await
    }
}

/// Percent-encodes one path segment (ids, url tokens, page names).
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Backend error text: JSON `error` field, else the raw body, else the reason phrase.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            if !message.is_empty() {
                return message.to_string();
            }
        }
        if let Some(message) = value.as_str() {
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() && !text.starts_with('{') {
        return text.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

/// Metric label: first path segment, so ids and tokens never become labels.
fn endpoint_label(path: &str) -> &str {
    path.trim_start_matches('/')
        .split(|c: char| c == '/' || c == '?')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("root")
}
