use serde::{Deserialize, Deserializer, Serialize};

/// Survey content as served by `GET /public/surveys/{urlToken}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurvey {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_logo: Option<String>,
    #[serde(default)]
    pub company_logos: Option<Vec<String>>,
    #[serde(default)]
    pub survey_name: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl PublicSurvey {
    /// Branding logos: the explicit list if present, else the single logo.
    pub fn logos(&self) -> Vec<String> {
        match (&self.company_logos, &self.company_logo) {
            (Some(list), _) => list.iter().filter(|l| !l.is_empty()).cloned().collect(),
            (None, Some(single)) if !single.is_empty() => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    /// Navigation order: segments in order, questions in order within each.
    pub fn flattened_positions(&self) -> Vec<QuestionPosition> {
        self.segments
            .iter()
            .enumerate()
            .flat_map(|(segment, seg)| {
                (0..seg.questions.len()).map(move |question| QuestionPosition { segment, question })
            })
            .collect()
    }

    pub fn question_at(&self, pos: QuestionPosition) -> Option<&Question> {
        self.segments
            .get(pos.segment)
            .and_then(|seg| seg.questions.get(pos.question))
    }

    pub fn question_count(&self) -> usize {
        self.segments.iter().map(|s| s.questions.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionPosition {
    pub segment: usize,
    pub question: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub options: Vec<SurveyOption>,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&SurveyOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Radio,
    Checkbox,
    Text,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Radio => "radio",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Text => "text",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::Radio | QuestionType::Checkbox)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyOption {
    pub id: String,
    pub text: String,
    #[serde(default, deserialize_with = "lenient_risk")]
    pub risk: Option<RiskTag>,
}

/// Traffic-light classification attached to an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTag {
    Green,
    Yellow,
    Red,
}

impl RiskTag {
    /// Case-insensitive; `amber` is a synonym of yellow. Unknown values are absent.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "red" => Some(RiskTag::Red),
            "yellow" | "amber" => Some(RiskTag::Yellow),
            "green" => Some(RiskTag::Green),
            _ => None,
        }
    }
}

fn lenient_risk<'de, D>(deserializer: D) -> Result<Option<RiskTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RiskTag::parse))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
