use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::survey::QuestionType;

/// A respondent's answer to one question.
///
/// Serialized untagged, so the submission body keeps the backend's
/// `id -> string | string[]` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    /// Selected option ids in first-selection order, without duplicates.
    Choice(Vec<String>),
}

impl Answer {
    /// Selected option ids; a text answer selects nothing.
    pub fn selected(&self) -> &[String] {
        match self {
            Answer::Choice(ids) => ids,
            Answer::Text(_) => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Text(value) => Some(value),
            Answer::Choice(_) => None,
        }
    }

    /// Applies a click on `option_id` for a question of the given kind.
    ///
    /// Radio replaces the selection, checkbox toggles membership. Text
    /// questions are not affected.
    pub fn toggle(current: Option<&Answer>, kind: QuestionType, option_id: &str) -> Option<Answer> {
        match kind {
            QuestionType::Radio => Some(Answer::Choice(vec![option_id.to_string()])),
            QuestionType::Checkbox => {
                let mut ids = current.map(|a| a.selected().to_vec()).unwrap_or_default();
                if let Some(pos) = ids.iter().position(|id| id == option_id) {
                    ids.remove(pos);
                } else {
                    ids.push(option_id.to_string());
                }
                Some(Answer::Choice(ids))
            }
            QuestionType::Text => None,
        }
    }
}

/// Answers keyed by question id.
pub type AnswerMap = BTreeMap<String, Answer>;

/// Whether `answer` counts as answered for a question of `kind`.
pub fn is_answered(kind: QuestionType, answer: Option<&Answer>) -> bool {
    match (kind, answer) {
        (_, None) => false,
        (QuestionType::Text, Some(a)) => a.text().is_some_and(|t| !t.trim().is_empty()),
        (_, Some(a)) => !a.selected().is_empty(),
    }
}

/// Body of `POST /public/surveys/{urlToken}/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: AnswerMap,
}
