use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{survey::QuestionType, ui_config::ThankYouConfig};

/// Everything a respondent page needs to render the current screen.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub survey_name: String,
    pub company_name: String,
    pub logos: Vec<String>,
    pub chrome: ChromeView,
    #[serde(flatten)]
    pub screen: ScreenView,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChromeView {
    pub background_image: Option<String>,
    pub powered_by_logo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenView {
    Disclaimer {
        text: String,
        checkbox_label: String,
    },
    Question(QuestionScreen),
    Empty {
        message: String,
    },
    Submitting {
        position: usize,
        total: usize,
    },
    Submitted {
        thank_you: ThankYouConfig,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionScreen {
    /// 1-based.
    pub position: usize,
    pub total: usize,
    pub segment_title: String,
    pub question: QuestionView,
    pub answered: bool,
    pub answered_count: usize,
    pub half_reached: bool,
    pub can_back: bool,
    pub can_next: bool,
    pub is_last: bool,
    pub can_submit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub details: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: Vec<OptionView>,
    pub text_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Deserialize)]
pub struct AcceptDisclaimerRequest {
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub option_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetTextRequest {
    pub value: String,
}
