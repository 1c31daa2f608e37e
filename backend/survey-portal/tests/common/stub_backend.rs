//! In-process survey backend served over HTTP for the admin proxy tests.

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub const VALID_TOKEN: &str = "test-admin-token";

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl StubBackend {
    /// Binds 127.0.0.1:0 and returns the stub with its `/api` base URL.
    pub async fn start() -> (Self, String) {
        let stub = StubBackend::default();
        let app = Router::new()
            .nest("/api", routes())
            .layer(middleware::from_fn_with_state(stub.clone(), record));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (stub, format!("http://{}/api", addr))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }
}

async fn record(State(stub): State<StubBackend>, request: Request, next: Next) -> Response {
    let call = {
        let header_text = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedCall {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            authorization: header_text(header::AUTHORIZATION),
            content_type: header_text(header::CONTENT_TYPE),
        }
    };
    stub.calls.lock().unwrap().push(call);
    next.run(request).await
}

fn routes() -> Router {
    Router::new()
        .route("/stats/summary", get(stats_summary))
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/{id}", delete(delete_company))
        .route("/surveys", get(list_surveys))
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/{id}", put(update_question))
        .route("/options", get(list_options))
        .route("/results", get(list_results))
}

fn companies() -> Value {
    json!([
        { "id": "c1", "name": "Acme" },
        { "id": "c2", "name": "Globex" }
    ])
}

fn surveys() -> Value {
    json!([
        { "id": "s1", "companyId": "c1", "name": "Onboarding", "status": "ACTIVE" },
        { "id": "s2", "companyId": "c2", "name": "Exit", "status": "INACTIVE" }
    ])
}

fn questions() -> Value {
    json!([
        { "id": "q1", "companyId": "c1", "surveyId": "s1", "segment": "1",
          "text": "Which plan fits you?", "type": "radio" },
        { "id": "q2", "companyId": "c2", "surveyId": "s2", "segment": "1",
          "text": "Why are you leaving?", "type": "text" }
    ])
}

fn options() -> Value {
    json!([
        { "id": "o1", "questionId": "q1", "text": "Basic", "risk": "Red" },
        { "id": "o2", "questionId": "q1", "text": "Pro", "risk": "Green" },
        { "id": "o3", "questionId": "q2", "text": "Price", "risk": "Amber" }
    ])
}

/// Keeps the entries whose `field` equals the query parameter `param`, if given.
fn filtered(list: Value, params: &HashMap<String, String>, param: &str, field: &str) -> Value {
    let Some(wanted) = params.get(param) else {
        return list;
    };
    let kept = list
        .as_array()
        .into_iter()
        .flatten()
        .filter(|item| item[field] == wanted.as_str())
        .cloned()
        .collect();
    Value::Array(kept)
}

async fn stats_summary(request: Request) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", VALID_TOKEN).as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid token" })),
        )
            .into_response();
    }
    Json(json!({
        "companiesCount": 2,
        "questionsCount": 2,
        "resultsCount": 12,
        "pendingCount": 1
    }))
    .into_response()
}

async fn list_companies() -> Json<Value> {
    Json(companies())
}

async fn create_company() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "Company name already exists" })),
    )
}

async fn delete_company(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_surveys(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(filtered(surveys(), &params, "companyId", "companyId"))
}

async fn list_questions(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(filtered(questions(), &params, "surveyId", "surveyId"))
}

async fn list_options(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(filtered(options(), &params, "questionId", "questionId"))
}

/// Eleven rows for q1 that only name the question and option, plus one row
/// whose references point nowhere.
async fn list_results() -> Json<Value> {
    let mut rows: Vec<Value> = (1..=11u64)
        .map(|i| {
            let option = if i % 2 == 0 { "o2" } else { "o1" };
            let percentage = if i == 2 { 66.7 } else { i as f64 };
            json!({
                "id": format!("r{}", i),
                "questionId": "q1",
                "optionId": option,
                "total": i,
                "percentage": percentage
            })
        })
        .collect();
    rows.push(json!({
        "id": "r12",
        "companyId": "gone",
        "questionId": "missing",
        "optionId": "missing"
    }));
    Json(Value::Array(rows))
}

async fn create_question(multipart: Multipart) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(echo_form("q-new".to_string(), multipart).await),
    )
}

async fn update_question(Path(id): Path<String>, multipart: Multipart) -> Json<Value> {
    Json(echo_form(id, multipart).await)
}

/// Echoes the text fields and the uploaded image's metadata.
async fn echo_form(id: String, mut multipart: Multipart) -> Value {
    let mut fields = Map::new();
    let mut image = Value::Null;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.unwrap();
            image = json!({
                "field": name,
                "name": file_name,
                "contentType": content_type,
                "size": bytes.len()
            });
        } else {
            fields.insert(name, Value::String(field.text().await.unwrap()));
        }
    }
    json!({ "id": id, "fields": fields, "image": image })
}
