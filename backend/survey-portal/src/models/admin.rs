use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SurveyStatus {
    Active,
    Inactive,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Active => "ACTIVE",
            SurveyStatus::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub status: SurveyStatus,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminQuestionType {
    Radio,
    Checkbox,
    Text,
    Select,
}

impl AdminQuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminQuestionType::Radio => "radio",
            AdminQuestionType::Checkbox => "checkbox",
            AdminQuestionType::Text => "text",
            AdminQuestionType::Select => "select",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuestion {
    pub id: String,
    pub company_id: String,
    pub survey_id: String,
    #[serde(default)]
    pub segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_title: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type")]
    pub kind: AdminQuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Risk as stored by the backend (`Red` / `Amber` / `Green`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Red,
    Amber,
    Green,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOption {
    pub id: String,
    pub question_id: String,
    pub text: String,
    /// Kept raw: older rows carry spellings outside [`RiskLevel`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
}

/// One aggregate row from `GET /results`. Every reference may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultRow {
    pub id: String,
    pub company_id: Option<String>,
    pub survey_id: Option<String>,
    pub question_id: Option<String>,
    pub option_id: Option<String>,
    pub question_text: Option<String>,
    pub option_text: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub total: Option<u64>,
    /// 0..100
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSummary {
    pub companies_count: u64,
    pub questions_count: u64,
    pub results_count: u64,
    pub pending_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthMeta {
    pub configured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(url(message = "Logo must be a valid URL"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_urls: Option<Vec<String>>,
}

impl CompanyPayload {
    /// The first logo of the list doubles as the single logo.
    pub fn normalized(mut self) -> Self {
        if let Some(list) = &self.logo_urls {
            if self.logo_url.is_none() {
                self.logo_url = list.first().cloned();
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SurveyPayload {
    #[validate(length(min = 1, message = "Company is required"))]
    pub company_id: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    pub status: SurveyStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[validate(length(min = 1, message = "Company is required"))]
    pub company_id: String,
    #[validate(length(min = 1, message = "Survey is required"))]
    pub survey_id: String,
    #[validate(length(min = 1, message = "Segment is required"))]
    pub segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_title: Option<String>,
    #[validate(length(min = 5, message = "Question must be at least 5 characters"))]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type")]
    pub kind: AdminQuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Editable question fields. Company, survey and segment are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_title: Option<String>,
    #[validate(length(min = 5, message = "Question must be at least 5 characters"))]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type")]
    pub kind: AdminQuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Form field carrying the question image file.
pub const QUESTION_IMAGE_FIELD: &str = "image";

/// Image file uploaded with a question form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OptionPayload {
    #[validate(length(min = 1, message = "Question is required"))]
    pub question_id: String,
    #[validate(length(min = 1, message = "Option text is required"))]
    pub text: String,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyListItem {
    #[serde(flatten)]
    pub survey: Survey,
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionListItem {
    #[serde(flatten)]
    pub question: AdminQuestion,
    pub company_name: String,
    pub survey_name: String,
}

/// A result row joined with its company, survey, question and option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub id: String,
    pub company_id: Option<String>,
    pub company_name: String,
    pub survey_id: Option<String>,
    pub survey_name: String,
    pub question_text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub option_text: String,
    pub total: u64,
    pub percentage: f64,
    pub percentage_display: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_names_fail_validation() {
        let payload = CompanyPayload {
            name: "A".into(),
            logo_url: None,
            logo_urls: None,
        };
        assert!(payload.validate().is_err());

        let payload = CompanyPayload {
            name: "Acme".into(),
            logo_url: Some("not a url".into()),
            logo_urls: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn question_text_needs_five_characters() {
        let payload: QuestionPayload = serde_json::from_value(json!({
            "companyId": "c1",
            "surveyId": "s1",
            "segment": "1",
            "text": "Why?",
            "type": "select"
        }))
        .unwrap();
        assert_eq!(payload.kind, AdminQuestionType::Select);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn question_update_needs_no_placement_fields() {
        let payload: UpdateQuestionPayload = serde_json::from_value(json!({
            "segmentTitle": "Intake",
            "text": "Which plan fits you?",
            "details": "",
            "type": "radio"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.segment_title.as_deref(), Some("Intake"));

        let body = serde_json::to_value(&payload).unwrap();
        assert!(body.get("companyId").is_none());
        assert!(body.get("segment").is_none());
    }

    #[test]
    fn option_risk_uses_backend_spelling() {
        let payload: OptionPayload = serde_json::from_value(json!({
            "questionId": "q1", "text": "Yes", "risk": "Amber"
        }))
        .unwrap();
        assert_eq!(payload.risk, RiskLevel::Amber);
        assert!(payload.validate().is_ok());

        let bad = serde_json::from_value::<OptionPayload>(json!({
            "questionId": "q1", "text": "Yes", "risk": "yellow"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn logo_list_fills_single_logo() {
        let payload = CompanyPayload {
            name: "Acme".into(),
            logo_url: None,
            logo_urls: Some(vec!["https://cdn.test/a.png".into()]),
        }
        .normalized();
        assert_eq!(payload.logo_url.as_deref(), Some("https://cdn.test/a.png"));
    }

    #[test]
    fn survey_list_item_flattens_record() {
        let item = SurveyListItem {
            survey: Survey {
                id: "s1".into(),
                company_id: "c1".into(),
                name: "Onboarding".into(),
                status: SurveyStatus::Active,
                total_count: 3,
                url: None,
            },
            company_name: "Acme".into(),
        };
        let value = serde_json::to_value(item).unwrap();
        assert_eq!(value["status"], "ACTIVE");
        assert_eq!(value["companyName"], "Acme");
        assert_eq!(value["totalCount"], 3);
    }
}
