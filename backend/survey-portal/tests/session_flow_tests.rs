use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use std::sync::{atomic::Ordering, Arc};
use tower::ServiceExt;

mod common;

use common::{send, FakeBackend};

#[tokio::test]
async fn test_new_session_opens_on_disclaimer() {
    let app = common::create_test_app();

    let (status, body) = send(&app, "POST", "/api/v1/surveys/intake/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["screen"], "disclaimer");
    assert_eq!(body["text"], "Your answers are stored anonymously.");
    assert_eq!(body["checkbox_label"], "I understand");
    assert_eq!(body["survey_name"], "Onboarding");
    assert_eq!(body["company_name"], "Acme, Inc. (NL)");
    assert_eq!(body["logos"], json!(["https://cdn.test/acme.png"]));
    assert_eq!(
        body["chrome"]["background_image"],
        "http://127.0.0.1:9/api/uploads/bg.jpg"
    );
    assert_eq!(
        body["chrome"]["powered_by_logo"],
        "https://cdn.test/powered.png"
    );
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_disclaimer_requires_checkbox() {
    let app = common::create_test_app();
    let id = common::start_session(&app).await;
    let uri = format!("/api/v1/sessions/{}/disclaimer", id);

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "accepted": false }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please check the box to proceed.");

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "accepted": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["screen"], "question");
    assert_eq!(body["position"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["segment_title"], "Intake");
    assert_eq!(body["question"]["id"], "q1");
    assert_eq!(
        body["question"]["image_url"],
        "http://127.0.0.1:9/api/uploads/plan.png"
    );
    assert_eq!(body["can_back"], false);
    assert_eq!(body["can_next"], false);

    // The gate is one-way.
    let (status, _) = send(&app, "POST", &uri, Some(json!({ "accepted": true }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_answers_are_blocked_behind_disclaimer() {
    let app = common::create_test_app();
    let id = common::start_session(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/sessions/{}/select", id),
        Some(json!({ "option_id": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_navigation_guards() {
    let app = common::create_test_app();
    let id = common::start_session(&app).await;
    let base = format!("/api/v1/sessions/{}", id);
    send(&app, "POST", &format!("{}/disclaimer", base), Some(json!({ "accepted": true }))).await;

    let (status, _) = send(&app, "POST", &format!("{}/next", base), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "next without an answer");

    let (status, _) = send(&app, "POST", &format!("{}/back", base), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "back at the first question");

    let (status, _) = send(&app, "POST", &format!("{}/submit", base), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "submit before the last question");

    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/select", base),
        Some(json!({ "option_id": "zzz" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unknown option: {}", body);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{}/text", base),
        Some(json!({ "value": "free text" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "text on a choice question");

    // State is unchanged by the rejections.
    let (status, body) = send(&app, "GET", &base, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"]["id"], "q1");
    assert_eq!(body["answered_count"], 0);
}

#[tokio::test]
async fn test_selection_and_back_keep_answers() {
    let app = common::create_test_app();
    let id = common::start_session(&app).await;
    let base = format!("/api/v1/sessions/{}", id);
    send(&app, "POST", &format!("{}/disclaimer", base), Some(json!({ "accepted": true }))).await;

    send(&app, "POST", &format!("{}/select", base), Some(json!({ "option_id": "a" }))).await;
    let (_, body) = send(
        &app,
        "POST",
        &format!("{}/select", base),
        Some(json!({ "option_id": "b" })),
    )
    .await;
    let options = body["question"]["options"].as_array().unwrap();
    assert_eq!(options[0]["selected"], false);
    assert_eq!(options[1]["selected"], true);
    assert_eq!(body["can_next"], true);

    let (_, body) = send(&app, "POST", &format!("{}/next", base), None).await;
    assert_eq!(body["question"]["id"], "q2");
    assert_eq!(body["question"]["type"], "checkbox");

    send(&app, "POST", &format!("{}/select", base), Some(json!({ "option_id": "c1" }))).await;
    send(&app, "POST", &format!("{}/select", base), Some(json!({ "option_id": "c2" }))).await;
    let (_, body) = send(
        &app,
        "POST",
        &format!("{}/select", base),
        Some(json!({ "option_id": "c1" })),
    )
    .await;
    let options = body["question"]["options"].as_array().unwrap();
    assert_eq!(options[0]["selected"], false, "checkbox toggles off");
    assert_eq!(options[1]["selected"], true);
    assert_eq!(body["answered_count"], 2);
    assert_eq!(body["half_reached"], true);

    let (_, body) = send(&app, "POST", &format!("{}/back", base), None).await;
    assert_eq!(body["question"]["id"], "q1");
    assert_eq!(body["question"]["options"][1]["selected"], true);
}

#[tokio::test]
async fn test_full_flow_submits_once_and_reports() {
    let backend = Arc::new(FakeBackend::new(common::intake_survey()));
    let app = common::create_test_app_with(backend.clone());
    let id = common::answered_session(&app).await;
    let base = format!("/api/v1/sessions/{}", id);

    let (_, body) = send(&app, "GET", &base, None).await;
    assert_eq!(body["is_last"], true);
    assert_eq!(body["can_submit"], true);
    assert_eq!(body["segment_title"], "Wrap-up");

    // Reports exist only after submission.
    let (status, _) = send(&app, "GET", &format!("{}/report", base), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "POST", &format!("{}/submit", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["screen"], "submitted");
    assert_eq!(body["thank_you"]["heading"], "Thank you!");

    let (status, _) = send(&app, "POST", &format!("{}/submit", base), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(backend.submit_count(), 1);

    let submitted = backend.submissions.lock().unwrap()[0].clone();
    let answers = serde_json::to_value(&submitted).unwrap();
    assert_eq!(
        answers,
        json!({ "answers": { "q1": ["b"], "q2": ["c1", "c2"], "q3": "All good" } })
    );

    // Answers are frozen once submitted.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("{}/text", base),
        Some(json!({ "value": "changed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", &format!("{}/report", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "title": "Segment 1: Intake", "rows": [
                { "question": "Which plan?", "answer": "Pro",
                  "answers": ["Pro"], "risks": ["green"] },
                { "question": "Which channels?", "answer": "Email, Phone",
                  "answers": ["Email", "Phone"], "risks": ["yellow", null] }
            ] },
            { "title": "Segment 2: Wrap-up", "rows": [
                { "question": "Anything else?", "answer": "All good",
                  "answers": ["All good"], "risks": [] }
            ] }
        ])
    );
}

#[tokio::test]
async fn test_failed_submit_can_be_retried() {
    let backend = Arc::new(FakeBackend::new(common::intake_survey()));
    let app = common::create_test_app_with(backend.clone());
    let id = common::answered_session(&app).await;
    let uri = format!("/api/v1/sessions/{}/submit", id);

    backend.fail_submit.store(true, Ordering::SeqCst);
    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Your answers could not be submitted. Please try again."
    );

    let (_, view) = send(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(view["screen"], "question");
    assert_eq!(view["can_submit"], true);

    backend.fail_submit.store(false, Ordering::SeqCst);
    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["screen"], "submitted");
    assert_eq!(backend.submit_count(), 2);
    assert_eq!(backend.submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_report_pdf_download() {
    let backend = Arc::new(FakeBackend::new(common::intake_survey()));
    let app = common::create_test_app_with(backend.clone());
    let id = common::answered_session(&app).await;
    send(&app, "POST", &format!("/api/v1/sessions/{}/submit", id), None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/sessions/{}/report.pdf", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"acme_inc_nl.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], common::PDF_BYTES);

    let requests = backend.report_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].company_name, "Acme, Inc. (NL)");
    assert_eq!(requests[0].company_logo, vec!["https://cdn.test/acme.png"]);
    assert_eq!(requests[0].sections.len(), 2);
}

#[tokio::test]
async fn test_report_pdf_failure_returns_bad_gateway() {
    let backend = Arc::new(FakeBackend::new(common::intake_survey()));
    let app = common::create_test_app_with(backend.clone());
    let id = common::answered_session(&app).await;
    send(&app, "POST", &format!("/api/v1/sessions/{}/submit", id), None).await;

    backend.fail_report.store(true, Ordering::SeqCst);
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/sessions/{}/report.pdf", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "The PDF report could not be generated");
}

#[tokio::test]
async fn test_content_failure_creates_no_session() {
    let backend = Arc::new(FakeBackend::new(common::intake_survey()));
    backend.fail_content.store(true, Ordering::SeqCst);
    let app = common::create_test_app_with(backend);

    let (status, body) = send(&app, "POST", "/api/v1/surveys/intake/sessions", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Something went wrong. Please refresh and try again."
    );

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["active_sessions"], 0);
}

#[tokio::test]
async fn test_survey_without_questions_shows_empty_screen() {
    let backend = Arc::new(FakeBackend::new(json!({
        "companyName": "Acme",
        "surveyName": "Blank",
        "segments": []
    })));
    let app = common::create_test_app_with(backend);
    let id = common::start_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/sessions/{}/disclaimer", id),
        Some(json!({ "accepted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["screen"], "empty");
    assert_eq!(body["message"], "No questions");
}

#[tokio::test]
async fn test_unknown_sessions_are_not_found() {
    let app = common::create_test_app();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/sessions/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Session not found or expired");

    let (status, _) = send(&app, "POST", "/api/v1/sessions/not-a-uuid/next", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = common::create_test_app();
    let id = common::start_session(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/sessions/{}/disclaimer", id))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
