//! Respondent session state machine.
//!
//! A session starts behind the disclaimer gate, walks the flattened question
//! list one index at a time and ends in the terminal `Submitted` stage. It
//! performs no I/O: the caller drives submission through
//! [`SurveySession::begin_submission`] and reports the outcome back.

use crate::models::{
    answer::{is_answered, Answer, AnswerMap, SubmitAnswersRequest},
    report::ReportSection,
    survey::{PublicSurvey, Question, QuestionPosition, QuestionType},
};
use crate::services::report_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Disclaimer,
    Answering { index: usize },
    /// Submission in flight from the last question.
    Submitting { index: usize },
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Please check the box to proceed.")]
    DisclaimerNotAccepted,
    #[error("The disclaimer has already been accepted")]
    DisclaimerAlreadyAccepted,
    #[error("The disclaimer must be accepted first")]
    DisclaimerPending,
    #[error("No questions")]
    NoQuestions,
    #[error("Answer the current question before continuing")]
    Unanswered,
    #[error("Already at the last question")]
    AtLastQuestion,
    #[error("Already at the first question")]
    AtFirstQuestion,
    #[error("Submit is only available on the last question")]
    NotAtLastQuestion,
    #[error("A submission is already in progress")]
    SubmissionInProgress,
    #[error("The survey has already been submitted")]
    AlreadySubmitted,
    #[error("The survey has not been submitted yet")]
    NotSubmitted,
    #[error("Option '{option_id}' does not belong to question '{question_id}'")]
    UnknownOption {
        question_id: String,
        option_id: String,
    },
    #[error("Question '{0}' expects a text answer")]
    ExpectsText(String),
    #[error("Question '{0}' expects an option selection")]
    ExpectsChoice(String),
}

#[derive(Debug, Clone)]
pub struct SurveySession {
    survey: PublicSurvey,
    order: Vec<QuestionPosition>,
    answers: AnswerMap,
    stage: Stage,
}

impl SurveySession {
    pub fn new(survey: PublicSurvey) -> Self {
        let order = survey.flattened_positions();
        Self {
            survey,
            order,
            answers: AnswerMap::new(),
            stage: Stage::Disclaimer,
        }
    }

    pub fn survey(&self) -> &PublicSurvey {
        &self.survey
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn question_count(&self) -> usize {
        self.order.len()
    }

    pub fn disclaimer_accepted(&self) -> bool {
        self.stage != Stage::Disclaimer
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Submitted
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.stage {
            Stage::Answering { index } | Stage::Submitting { index } => Some(index),
            Stage::Disclaimer | Stage::Submitted => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.question(i))
    }

    pub fn current_segment_title(&self) -> Option<&str> {
        let index = self.current_index()?;
        let pos = self.order.get(index)?;
        self.survey.segments.get(pos.segment).map(|s| s.title.as_str())
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    fn question(&self, index: usize) -> Option<&Question> {
        self.order
            .get(index)
            .and_then(|pos| self.survey.question_at(*pos))
    }

    fn is_question_answered(&self, index: usize) -> bool {
        self.question(index)
            .is_some_and(|q| is_answered(q.kind, self.answers.get(&q.id)))
    }

    /// Index that may currently be edited or navigated from.
    fn active_index(&self) -> Result<usize, SessionError> {
        match self.stage {
            Stage::Answering { index } => {
                if self.order.is_empty() {
                    Err(SessionError::NoQuestions)
                } else {
                    Ok(index)
                }
            }
            Stage::Disclaimer => Err(SessionError::DisclaimerPending),
            Stage::Submitting { .. } => Err(SessionError::SubmissionInProgress),
            Stage::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    fn is_last_index(&self, index: usize) -> bool {
        index + 1 >= self.order.len()
    }

    pub fn is_last(&self) -> bool {
        self.current_index()
            .is_some_and(|i| !self.order.is_empty() && self.is_last_index(i))
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.stage, Stage::Answering { index } if index > 0)
    }

    pub fn can_go_next(&self) -> bool {
        match self.active_index() {
            Ok(index) => !self.is_last_index(index) && self.is_question_answered(index),
            Err(_) => false,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.active_index()
            .is_ok_and(|index| self.is_last_index(index))
    }

    /// Dismisses the gate. One-way: there is no transition back.
    pub fn accept_disclaimer(&mut self, checked: bool) -> Result<(), SessionError> {
        if self.stage != Stage::Disclaimer {
            return Err(SessionError::DisclaimerAlreadyAccepted);
        }
        if !checked {
            return Err(SessionError::DisclaimerNotAccepted);
        }
        self.stage = Stage::Answering { index: 0 };
        Ok(())
    }

    /// Applies an option click to the current question and returns its new answer.
    pub fn select_option(&mut self, option_id: &str) -> Result<&Answer, SessionError> {
        let index = self.active_index()?;
        let question = self.question(index).ok_or(SessionError::NoQuestions)?;

        if !question.kind.is_choice() {
            return Err(SessionError::ExpectsText(question.id.clone()));
        }
        if question.option(option_id).is_none() {
            return Err(SessionError::UnknownOption {
                question_id: question.id.clone(),
                option_id: option_id.to_string(),
            });
        }

        let question_id = question.id.clone();
        let kind = question.kind;
        match Answer::toggle(self.answers.get(&question_id), kind, option_id) {
            Some(answer) => {
                self.answers.insert(question_id.clone(), answer);
            }
            None => return Err(SessionError::ExpectsText(question_id)),
        }
        self.answers
            .get(&question_id)
            .ok_or(SessionError::NoQuestions)
    }

    /// Replaces the free-text answer of the current question. Whitespace is kept
    /// as typed; emptiness is judged on the trimmed value.
    pub fn set_text(&mut self, value: String) -> Result<(), SessionError> {
        let index = self.active_index()?;
        let question = self.question(index).ok_or(SessionError::NoQuestions)?;
        if question.kind != QuestionType::Text {
            return Err(SessionError::ExpectsChoice(question.id.clone()));
        }
        let question_id = question.id.clone();
        self.answers.insert(question_id, Answer::Text(value));
        Ok(())
    }

    pub fn next(&mut self) -> Result<usize, SessionError> {
        let index = self.active_index()?;
        if self.is_last_index(index) {
            return Err(SessionError::AtLastQuestion);
        }
        if !self.is_question_answered(index) {
            return Err(SessionError::Unanswered);
        }
        self.stage = Stage::Answering { index: index + 1 };
        Ok(index + 1)
    }

    pub fn back(&mut self) -> Result<usize, SessionError> {
        let index = self.active_index()?;
        if index == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        self.stage = Stage::Answering { index: index - 1 };
        Ok(index - 1)
    }

    /// Moves to `Submitting` and returns the payload for the submission sink.
    pub fn begin_submission(&mut self) -> Result<SubmitAnswersRequest, SessionError> {
        let index = self.active_index()?;
        if !self.is_last_index(index) {
            return Err(SessionError::NotAtLastQuestion);
        }
        self.stage = Stage::Submitting { index };
        Ok(SubmitAnswersRequest {
            answers: self.answers.clone(),
        })
    }

    pub fn complete_submission(&mut self) -> Result<(), SessionError> {
        match self.stage {
            Stage::Submitting { .. } => {
                self.stage = Stage::Submitted;
                Ok(())
            }
            Stage::Submitted => Err(SessionError::AlreadySubmitted),
            _ => Err(SessionError::NotSubmitted),
        }
    }

    /// Returns to the last question with answers intact so the respondent can retry.
    pub fn abort_submission(&mut self) {
        if let Stage::Submitting { index } = self.stage {
            self.stage = Stage::Answering { index };
        }
    }

    pub fn answered_count(&self) -> usize {
        (0..self.order.len())
            .filter(|i| self.is_question_answered(*i))
            .count()
    }

    /// At least half of the questions (rounded up) are answered.
    pub fn half_reached(&self) -> bool {
        let total = self.order.len();
        total > 0 && self.answered_count() >= total.div_ceil(2)
    }

    pub fn report_sections(&self) -> Result<Vec<ReportSection>, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::NotSubmitted);
        }
        Ok(report_service::build_sections(&self.survey, &self.answers))
    }
}
