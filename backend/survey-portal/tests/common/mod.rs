#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use survey_portal::{
    config::Config,
    create_router,
    models::{
        answer::SubmitAnswersRequest,
        report::ReportRequest,
        survey::PublicSurvey,
        ui_config::{SurveyUiConfig, ThankYouConfig},
    },
    services::{
        backend_client::{BackendError, SurveyBackend},
        AppState,
    },
};
use tower::ServiceExt;

pub mod stub_backend;

pub const PDF_BYTES: &[u8] = b"%PDF-1.4 fake";

/// In-memory survey backend with switchable failures.
pub struct FakeBackend {
    survey: Value,
    pub fail_content: AtomicBool,
    pub fail_submit: AtomicBool,
    pub fail_report: AtomicBool,
    pub submit_calls: AtomicUsize,
    pub submissions: Mutex<Vec<SubmitAnswersRequest>>,
    pub report_requests: Mutex<Vec<ReportRequest>>,
}

impl FakeBackend {
    pub fn new(survey: Value) -> Self {
        Self {
            survey,
            fail_content: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            fail_report: AtomicBool::new(false),
            submit_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            report_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

fn unavailable() -> BackendError {
    BackendError::Status {
        status: 500,
        message: "backend unavailable".to_string(),
    }
}

#[async_trait]
impl SurveyBackend for FakeBackend {
    async fn fetch_survey(&self, url_token: &str) -> Result<PublicSurvey, BackendError> {
        if self.fail_content.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        if url_token != "intake" {
            return Err(BackendError::Status {
                status: 404,
                message: "Survey not found".to_string(),
            });
        }
        Ok(serde_json::from_value(self.survey.clone())?)
    }

    async fn fetch_ui_config(&self, _page: &str) -> Result<SurveyUiConfig, BackendError> {
        Ok(serde_json::from_value(json!({
            "backgroundImage": "/uploads/bg.jpg",
            "poweredBy": { "logo": "https://cdn.test/powered.png" },
            "disclaimer": { "text": "Your answers are stored anonymously." },
            "checkbox": { "text": "I understand" }
        }))?)
    }

    async fn fetch_thank_you_config(&self, _page: &str) -> Result<ThankYouConfig, BackendError> {
        Ok(ThankYouConfig {
            image: String::new(),
            heading: "Thank you!".to_string(),
            text: "Your answers were received.".to_string(),
        })
    }

    async fn submit_answers(
        &self,
        _url_token: &str,
        body: &SubmitAnswersRequest,
    ) -> Result<(), BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.submissions.lock().unwrap().push(body.clone());
        Ok(())
    }

    async fn render_report(&self, request: &ReportRequest) -> Result<Vec<u8>, BackendError> {
        if self.fail_report.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.report_requests.lock().unwrap().push(request.clone());
        Ok(PDF_BYTES.to_vec())
    }
}

pub fn intake_survey() -> Value {
    json!({
        "companyName": "Acme, Inc. (NL)",
        "companyLogos": ["https://cdn.test/acme.png"],
        "surveyName": "Onboarding",
        "segments": [
            { "title": "Intake", "questions": [
                { "id": "q1", "text": "Which plan?", "type": "radio",
                  "image": "/uploads/plan.png",
                  "options": [
                    { "id": "a", "text": "Basic", "risk": "red" },
                    { "id": "b", "text": "Pro", "risk": "green" }
                  ] },
                { "id": "q2", "text": "Which channels?", "type": "checkbox",
                  "options": [
                    { "id": "c1", "text": "Email", "risk": "amber" },
                    { "id": "c2", "text": "Phone" }
                  ] }
            ] },
            { "title": "Wrap-up", "questions": [
                { "id": "q3", "text": "Anything else?", "type": "text" }
            ] }
        ]
    })
}

/// Config pointing at a closed port; admin routes fail fast against it.
pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        api_base_url: "http://127.0.0.1:9/api".to_string(),
        api_timeout_seconds: 2,
        session_ttl_seconds: 3600,
        session_sweep_interval_seconds: 60,
        ui_config_page: "survey".to_string(),
        thank_you_page: "thank-you".to_string(),
    }
}

pub fn create_test_app() -> Router {
    create_test_app_with(Arc::new(FakeBackend::new(intake_survey())))
}

pub fn create_test_app_with(backend: Arc<FakeBackend>) -> Router {
    create_test_app_with_config(test_config(), backend)
}

pub fn create_test_app_with_config(config: Config, backend: Arc<FakeBackend>) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(
        AppState::with_backend(config, backend)
            .expect("Failed to initialize test app state"),
    );
    create_router(app_state)
}

/// Sends a request and returns the status with the JSON body (`Null` if empty).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

pub async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

/// Starts a session on the intake survey and returns its id.
pub async fn start_session(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/v1/surveys/intake/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body {}", body);
    body["session_id"].as_str().unwrap().to_string()
}

/// Starts a session and answers every question, leaving it on the last one.
pub async fn answered_session(app: &Router) -> String {
    let id = start_session(app).await;
    let base = format!("/api/v1/sessions/{}", id);

    let steps: [(&str, String, Option<Value>); 7] = [
        ("POST", format!("{}/disclaimer", base), Some(json!({ "accepted": true }))),
        ("POST", format!("{}/select", base), Some(json!({ "option_id": "b" }))),
        ("POST", format!("{}/next", base), None),
        ("POST", format!("{}/select", base), Some(json!({ "option_id": "c1" }))),
        ("POST", format!("{}/select", base), Some(json!({ "option_id": "c2" }))),
        ("POST", format!("{}/next", base), None),
        ("PUT", format!("{}/text", base), Some(json!({ "value": "All good" }))),
    ];
    for (method, uri, body) in steps {
        let (status, body) = send(app, method, &uri, body).await;
        assert_eq!(status, StatusCode::OK, "{} {} -> {}", method, uri, body);
    }
    id
}
