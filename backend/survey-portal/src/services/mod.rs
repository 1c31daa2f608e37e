use anyhow::Context;
use std::{sync::Arc, time::Duration};

use crate::config::Config;

pub mod admin_service;
pub mod backend_client;
pub mod report_service;
pub mod results_service;
pub mod session_service;
pub mod session_sweeper;
pub mod survey_session;

use backend_client::{BackendClient, SurveyBackend};
use session_service::SessionStore;

pub struct AppState {
    pub config: Config,
    /// Respondent-flow calls; swapped for a fake in tests.
    pub backend: Arc<dyn SurveyBackend>,
    /// Raw client used by the admin proxy.
    pub client: BackendClient,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = build_client(&config)?;
        tracing::info!("Survey backend client configured for {}", client.base_url());
        let backend: Arc<dyn SurveyBackend> = Arc::new(client.clone());
        Ok(Self::assemble(config, client, backend))
    }

    pub fn with_backend(config: Config, backend: Arc<dyn SurveyBackend>) -> anyhow::Result<Self> {
        let client = build_client(&config)?;
        Ok(Self::assemble(config, client, backend))
    }

    fn assemble(config: Config, client: BackendClient, backend: Arc<dyn SurveyBackend>) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_ttl_seconds));
        Self {
            config,
            backend,
            client,
            sessions,
        }
    }
}

fn build_client(config: &Config) -> anyhow::Result<BackendClient> {
    BackendClient::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.api_timeout_seconds),
    )
    .context("Failed to build survey backend HTTP client")
}
