use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(middlewares::trace::TRACE_ID_HEADER),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .route(
            "/api/v1/surveys/{url_token}/sessions",
            post(handlers::sessions::create_session),
        )
        .nest("/api/v1/sessions", sessions_routes())
        .nest("/admin", admin_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn sessions_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{id}", get(handlers::sessions::get_session))
        .route(
            "/{id}/disclaimer",
            post(handlers::sessions::accept_disclaimer),
        )
        .route("/{id}/select", post(handlers::sessions::select_option))
        .route("/{id}/text", put(handlers::sessions::set_text))
        .route("/{id}/next", post(handlers::sessions::next_question))
        .route("/{id}/back", post(handlers::sessions::previous_question))
        .route("/{id}/submit", post(handlers::sessions::submit))
        .route("/{id}/report", get(handlers::sessions::report))
        .route("/{id}/report.pdf", get(handlers::sessions::report_pdf))
}

fn admin_routes() -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/auth/meta", get(handlers::admin::auth_meta))
        .route("/auth/login", post(handlers::admin::login));

    let protected_routes = Router::new()
        .route("/stats/summary", get(handlers::admin::stats_summary))
        // Companies
        .route(
            "/companies",
            get(handlers::admin::list_companies).post(handlers::admin::create_company),
        )
        .route(
            "/companies/{id}",
            get(handlers::admin::get_company)
                .put(handlers::admin::update_company)
                .delete(handlers::admin::delete_company),
        )
        // Surveys
        .route(
            "/surveys",
            get(handlers::admin::list_surveys).post(handlers::admin::create_survey),
        )
        .route(
            "/surveys/{id}",
            get(handlers::admin::get_survey)
                .put(handlers::admin::update_survey)
                .delete(handlers::admin::delete_survey),
        )
        .route(
            "/surveys/{id}/create-url",
            post(handlers::admin::create_survey_url),
        )
        // Questions
        .route(
            "/questions",
            get(handlers::admin::list_questions).post(handlers::admin::create_question),
        )
        .route(
            "/questions/{id}",
            get(handlers::admin::get_question)
                .put(handlers::admin::update_question)
                .delete(handlers::admin::delete_question),
        )
        // Options
        .route(
            "/options",
            get(handlers::admin::list_options).post(handlers::admin::create_option),
        )
        .route(
            "/options/{id}",
            get(handlers::admin::get_option)
                .put(handlers::admin::update_option)
                .delete(handlers::admin::delete_option),
        )
        .route("/results", get(handlers::admin::list_results))
        // Page configs
        .route(
            "/ui-config/{page}",
            get(handlers::admin::get_ui_config).put(handlers::admin::update_ui_config),
        )
        .route(
            "/thankyou-config/{page}",
            get(handlers::admin::get_thank_you_config)
                .put(handlers::admin::update_thank_you_config),
        )
        .route_layer(middleware::from_fn(
            middlewares::auth::admin_token_middleware,
        ));

    public_routes.merge(protected_routes)
}
