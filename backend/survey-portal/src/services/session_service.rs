use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::MAX_SESSION_TTL_SECONDS;
use crate::metrics::{ANSWERS_RECORDED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL, SUBMISSIONS_TOTAL};
use crate::models::{
    report::{ReportFile, ReportSection},
    session::{ChromeView, OptionView, QuestionScreen, QuestionView, ScreenView, SessionView},
    survey::Question,
    ui_config::{SurveyUiConfig, ThankYouConfig},
};
use crate::services::{
    backend_client::{BackendError, SurveyBackend},
    report_service::ReportService,
    survey_session::{SessionError, Stage, SurveySession},
    AppState,
};

const NO_QUESTIONS: &str = "No questions";

#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("Session not found or expired")]
    NotFound,
    #[error(transparent)]
    Rejected(#[from] SessionError),
    #[error("Something went wrong. Please refresh and try again.")]
    ContentUnavailable(#[source] BackendError),
    #[error("Your answers could not be submitted. Please try again.")]
    SubmissionFailed(#[source] BackendError),
    #[error("The PDF report could not be generated")]
    ReportFailed(#[source] BackendError),
}

/// One respondent's session plus the chrome it was opened with.
pub struct SessionEntry {
    pub session: SurveySession,
    pub url_token: String,
    pub ui_config: SurveyUiConfig,
    /// Set once the submission is accepted.
    pub thank_you: Option<ThankYouConfig>,
    pub last_seen: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(session: SurveySession, url_token: String, ui_config: SurveyUiConfig) -> Self {
        Self {
            session,
            url_token,
            ui_config,
            thank_you: None,
            last_seen: Utc::now(),
        }
    }

    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.last_seen
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now > self.expires_at(ttl)
    }
}

fn session_ttl(ttl_seconds: i64) -> Duration {
    let seconds = ttl_seconds.clamp(1, MAX_SESSION_TTL_SECONDS);
    Duration::try_seconds(seconds).unwrap_or(Duration::MAX)
}

/// In-memory session table. Each entry has its own lock so requests for one
/// session are serialized while different sessions proceed independently.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<SessionEntry>>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: session_ttl(ttl_seconds),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn insert(&self, id: Uuid, entry: SessionEntry) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::new(Mutex::new(entry)));
        SESSIONS_ACTIVE.set(sessions.len() as i64);
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<SessionEntry>>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        SESSIONS_ACTIVE.set(sessions.len() as i64);
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops sessions idle past the TTL. Entries locked by a request in
    /// flight are in use and stay.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let keep = match entry.try_lock() {
                Ok(entry) => !entry.is_expired(now, ttl),
                Err(_) => true,
            };
            keep
        });
        let purged = before - sessions.len();
        SESSIONS_ACTIVE.set(sessions.len() as i64);
        purged
    }
}

pub struct SessionService {
    backend: Arc<dyn SurveyBackend>,
    sessions: Arc<SessionStore>,
    asset_base_url: String,
    ui_config_page: String,
    thank_you_page: String,
}

impl SessionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            sessions: state.sessions.clone(),
            asset_base_url: state.config.api_base_url.clone(),
            ui_config_page: state.config.ui_config_page.clone(),
            thank_you_page: state.config.thank_you_page.clone(),
        }
    }

    /// Loads survey content and chrome together; the session exists only if both arrive.
    pub async fn start(&self, url_token: &str) -> Result<SessionView, SessionServiceError> {
        let (survey, ui_config) = futures::try_join!(
            self.backend.fetch_survey(url_token),
            self.backend.fetch_ui_config(&self.ui_config_page),
        )
        .map_err(|e| {
            error!("Failed to load survey '{}': {}", url_token, e);
            SessionServiceError::ContentUnavailable(e)
        })?;

        let id = Uuid::new_v4();
        let question_count = survey.question_count();
        let entry = SessionEntry::new(SurveySession::new(survey), url_token.to_string(), ui_config);
        let view = self.render(id, &entry);
        self.sessions.insert(id, entry).await;

        SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        info!(
            session_id = %id,
            "Session started for survey '{}' ({} questions)",
            url_token,
            question_count
        );
        Ok(view)
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, SessionServiceError> {
        let entry = self.checkout(id).await?;
        Ok(self.render(id, &entry))
    }

    pub async fn accept_disclaimer(
        &self,
        id: Uuid,
        accepted: bool,
    ) -> Result<SessionView, SessionServiceError> {
        let mut entry = self.checkout(id).await?;
        entry
            .session
            .accept_disclaimer(accepted)
            .map_err(|e| rejected(id, "accept disclaimer", e))?;
        Ok(self.render(id, &entry))
    }

    pub async fn select_option(
        &self,
        id: Uuid,
        option_id: &str,
    ) -> Result<SessionView, SessionServiceError> {
        let mut entry = self.checkout(id).await?;
        entry
            .session
            .select_option(option_id)
            .map_err(|e| rejected(id, "select option", e))?;
        if let Some(question) = entry.session.current_question() {
            ANSWERS_RECORDED_TOTAL
                .with_label_values(&[question.kind.as_str()])
                .inc();
        }
        Ok(self.render(id, &entry))
    }

    pub async fn set_text(&self, id: Uuid, value: String) -> Result<SessionView, SessionServiceError> {
        let mut entry = self.checkout(id).await?;
        entry
            .session
            .set_text(value)
            .map_err(|e| rejected(id, "set text", e))?;
        ANSWERS_RECORDED_TOTAL.with_label_values(&["text"]).inc();
        Ok(self.render(id, &entry))
    }

    pub async fn next(&self, id: Uuid) -> Result<SessionView, SessionServiceError> {
        let mut entry = self.checkout(id).await?;
        entry.session.next().map_err(|e| rejected(id, "next", e))?;
        Ok(self.render(id, &entry))
    }

    pub async fn back(&self, id: Uuid) -> Result<SessionView, SessionServiceError> {
        let mut entry = self.checkout(id).await?;
        entry.session.back().map_err(|e| rejected(id, "back", e))?;
        Ok(self.render(id, &entry))
    }

    /// Sends the answers once. The session lock is released while the sink is
    /// called; the `Submitting` stage rejects concurrent submits meanwhile.
    pub async fn submit(&self, id: Uuid) -> Result<SessionView, SessionServiceError> {
        let (payload, url_token) = {
            let mut entry = self.checkout(id).await?;
            let payload = entry.session.begin_submission().map_err(|e| {
                SUBMISSIONS_TOTAL.with_label_values(&["rejected"]).inc();
                rejected(id, "submit", e)
            })?;
            (payload, entry.url_token.clone())
        };

        match self.backend.submit_answers(&url_token, &payload).await {
            Ok(()) => {
                let thank_you = self.load_thank_you().await;
                let mut entry = self.relock(id).await?;
                entry.session.complete_submission()?;
                entry.thank_you = Some(thank_you);

                SUBMISSIONS_TOTAL.with_label_values(&["success"]).inc();
                SESSIONS_TOTAL.with_label_values(&["submitted"]).inc();
                info!(
                    session_id = %id,
                    "Survey '{}' submitted with {} answers",
                    url_token,
                    payload.answers.len()
                );
                Ok(self.render(id, &entry))
            }
            Err(e) => {
                if let Ok(mut entry) = self.relock(id).await {
                    entry.session.abort_submission();
                }
                SUBMISSIONS_TOTAL.with_label_values(&["error"]).inc();
                error!(session_id = %id, "Submission for '{}' failed: {}", url_token, e);
                Err(SessionServiceError::SubmissionFailed(e))
            }
        }
    }

    pub async fn report(&self, id: Uuid) -> Result<Vec<ReportSection>, SessionServiceError> {
        let entry = self.checkout(id).await?;
        entry
            .session
            .report_sections()
            .map_err(|e| rejected(id, "report", e))
    }

    pub async fn report_pdf(&self, id: Uuid) -> Result<ReportFile, SessionServiceError> {
        let (survey, sections) = {
            let entry = self.checkout(id).await?;
            let sections = entry
                .session
                .report_sections()
                .map_err(|e| rejected(id, "report pdf", e))?;
            (entry.session.survey().clone(), sections)
        };

        ReportService::new(self.backend.clone())
            .export_pdf(&survey, sections)
            .await
            .map_err(SessionServiceError::ReportFailed)
    }

    /// Locks a live session and refreshes its idle timer.
    async fn checkout(&self, id: Uuid) -> Result<OwnedMutexGuard<SessionEntry>, SessionServiceError> {
        let handle = self
            .sessions
            .get(&id)
            .await
            .ok_or(SessionServiceError::NotFound)?;
        let mut entry = handle.lock_owned().await;

        let now = Utc::now();
        if entry.is_expired(now, self.sessions.ttl()) {
            drop(entry);
            if self.sessions.remove(&id).await {
                SESSIONS_TOTAL.with_label_values(&["expired"]).inc();
                info!(session_id = %id, "Session expired");
            }
            return Err(SessionServiceError::NotFound);
        }

        entry.last_seen = now;
        Ok(entry)
    }

    async fn relock(&self, id: Uuid) -> Result<OwnedMutexGuard<SessionEntry>, SessionServiceError> {
        let handle = self
            .sessions
            .get(&id)
            .await
            .ok_or(SessionServiceError::NotFound)?;
        Ok(handle.lock_owned().await)
    }

    async fn load_thank_you(&self) -> ThankYouConfig {
        match self.backend.fetch_thank_you_config(&self.thank_you_page).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Thank-you config unavailable, showing defaults: {}", e);
                ThankYouConfig::default()
            }
        }
    }

    fn render(&self, id: Uuid, entry: &SessionEntry) -> SessionView {
        let session = &entry.session;
        let survey = session.survey();
        let ui = &entry.ui_config;

        let screen = match session.stage() {
            Stage::Disclaimer => ScreenView::Disclaimer {
                text: ui.disclaimer.text.clone(),
                checkbox_label: ui.checkbox.text.clone(),
            },
            Stage::Answering { index } => match session.current_question() {
                Some(question) => ScreenView::Question(self.question_screen(session, index, question)),
                None => ScreenView::Empty {
                    message: NO_QUESTIONS.to_string(),
                },
            },
            Stage::Submitting { index } => ScreenView::Submitting {
                position: index + 1,
                total: session.question_count(),
            },
            Stage::Submitted => ScreenView::Submitted {
                thank_you: entry.thank_you.clone().unwrap_or_default(),
            },
        };

        SessionView {
            session_id: id,
            survey_name: survey.survey_name.clone(),
            company_name: survey.company_name.clone(),
            logos: survey.logos(),
            chrome: ChromeView {
                background_image: resolve_asset_url(&self.asset_base_url, &ui.background_image),
                powered_by_logo: resolve_asset_url(&self.asset_base_url, &ui.powered_by.logo),
            },
            screen,
            expires_at: entry.expires_at(self.sessions.ttl()),
        }
    }

    fn question_screen(
        &self,
        session: &SurveySession,
        index: usize,
        question: &Question,
    ) -> QuestionScreen {
        let answer = session.answer_for(&question.id);
        let selected = answer.map(|a| a.selected()).unwrap_or_default();

        QuestionScreen {
            position: index + 1,
            total: session.question_count(),
            segment_title: session.current_segment_title().unwrap_or_default().to_string(),
            question: QuestionView {
                id: question.id.clone(),
                text: question.text.clone(),
                details: question.details.clone(),
                image_url: question
                    .image
                    .as_deref()
                    .and_then(|path| resolve_asset_url(&self.asset_base_url, path)),
                kind: question.kind,
                options: question
                    .options
                    .iter()
                    .map(|o| OptionView {
                        id: o.id.clone(),
                        text: o.text.clone(),
                        selected: selected.contains(&o.id),
                    })
                    .collect(),
                text_answer: answer.and_then(|a| a.text()).map(str::to_string),
            },
            answered: crate::models::answer::is_answered(question.kind, answer),
            answered_count: session.answered_count(),
            half_reached: session.half_reached(),
            can_back: session.can_go_back(),
            can_next: session.can_go_next(),
            is_last: session.is_last(),
            can_submit: session.can_submit(),
        }
    }
}

fn rejected(id: Uuid, action: &str, err: SessionError) -> SessionServiceError {
    warn!(session_id = %id, "Rejected {}: {}", action, err);
    SessionServiceError::Rejected(err)
}

/// Absolute and inline URLs pass through; backend-relative paths get the base URL.
pub fn resolve_asset_url(base_url: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:")
        || lower.starts_with("//")
    {
        return Some(path.to_string());
    }
    if path.starts_with('/') {
        Some(format!("{}{}", base_url, path))
    } else {
        Some(format!("{}/{}", base_url, path))
    }
}
