use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

use crate::metrics::REPORT_EXPORTS_TOTAL;
use crate::models::{
    answer::{Answer, AnswerMap},
    report::{ReportFile, ReportRequest, ReportRow, ReportSection},
    survey::{PublicSurvey, Question, QuestionType},
};
use crate::services::backend_client::{BackendError, SurveyBackend};

const DEFAULT_REPORT_NAME: &str = "report";

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
}

/// Builds report sections in survey order, dropping unanswered questions and
/// segments left without rows.
pub fn build_sections(survey: &PublicSurvey, answers: &AnswerMap) -> Vec<ReportSection> {
    survey
        .segments
        .iter()
        .enumerate()
        .filter_map(|(idx, segment)| {
            let rows: Vec<ReportRow> = segment
                .questions
                .iter()
                .filter_map(|q| build_row(q, answers.get(&q.id)))
                .collect();
            if rows.is_empty() {
                return None;
            }
            Some(ReportSection {
                title: format!("Segment {}: {}", idx + 1, segment.title),
                rows,
            })
        })
        .collect()
}

fn build_row(question: &Question, answer: Option<&Answer>) -> Option<ReportRow> {
    let answer = answer?;
    let (answers, risks): (Vec<String>, Vec<_>) = match question.kind {
        QuestionType::Text => {
            let text = answer.text().map(str::trim).unwrap_or_default();
            if text.is_empty() {
                return None;
            }
            (vec![text.to_string()], Vec::new())
        }
        // Authored option order, not selection order.
        QuestionType::Radio | QuestionType::Checkbox => {
            let selected = answer.selected();
            question
                .options
                .iter()
                .filter(|o| selected.contains(&o.id))
                .map(|o| (o.text.clone(), o.risk))
                .unzip()
        }
    };

    if answers.is_empty() {
        return None;
    }

    Some(ReportRow {
        question: question.text.clone(),
        answer: answers.join(", "),
        answers,
        risks,
    })
}

/// Download name for a company's report: unsafe runs collapse to `_`.
pub fn report_filename(company_name: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(company_name, "_");
    let base = replaced.trim_matches('_').to_lowercase();
    if base.is_empty() {
        format!("{}.pdf", DEFAULT_REPORT_NAME)
    } else {
        format!("{}.pdf", base)
    }
}

pub struct ReportService {
    backend: Arc<dyn SurveyBackend>,
}

impl ReportService {
    pub fn new(backend: Arc<dyn SurveyBackend>) -> Self {
        Self { backend }
    }

    /// Sends the sections with company branding to the renderer. Failures are
    /// logged and returned; nothing is retried.
    pub async fn export_pdf(
        &self,
        survey: &PublicSurvey,
        sections: Vec<ReportSection>,
    ) -> Result<ReportFile, BackendError> {
        let request = ReportRequest {
            company_name: survey.company_name.clone(),
            company_logo: survey.logos(),
            sections,
        };

        match self.backend.render_report(&request).await {
            Ok(bytes) => {
                REPORT_EXPORTS_TOTAL.with_label_values(&["success"]).inc();
                let filename = report_filename(&survey.company_name);
                tracing::info!(
                    "Report rendered for '{}' ({} bytes) as {}",
                    survey.company_name,
                    bytes.len(),
                    filename
                );
                Ok(ReportFile { filename, bytes })
            }
            Err(e) => {
                REPORT_EXPORTS_TOTAL.with_label_values(&["error"]).inc();
                tracing::error!("PDF build failed for '{}': {}", survey.company_name, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::survey::RiskTag;
    use crate::services::survey_session::tests::intake_survey;
    use serde_json::json;

    fn answers(pairs: &[(&str, Answer)]) -> AnswerMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn intake_scenario_produces_one_section() {
        let survey = intake_survey();
        let map = answers(&[
            ("q1", Answer::Choice(vec!["b".into()])),
            ("q2", Answer::Text("fine".into())),
        ]);

        let sections = build_sections(&survey, &map);
        assert_eq!(
            sections,
            vec![ReportSection {
                title: "Segment 1: Intake".into(),
                rows: vec![
                    ReportRow {
                        question: "Which plan?".into(),
                        answer: "B".into(),
                        answers: vec!["B".into()],
                        risks: vec![Some(RiskTag::Green)],
                    },
                    ReportRow {
                        question: "Anything else?".into(),
                        answer: "fine".into(),
                        answers: vec!["fine".into()],
                        risks: vec![],
                    },
                ],
            }]
        );
    }

    #[test]
    fn unanswered_rows_and_empty_segments_are_dropped() {
        let survey: PublicSurvey = serde_json::from_value(json!({
            "companyName": "Acme",
            "surveyName": "S",
            "segments": [
                { "title": "Skipped", "questions": [
                    { "id": "s1", "text": "Nothing here", "type": "text" }
                ] },
                { "questions": [
                    { "id": "c1", "text": "Pick", "type": "checkbox", "options": [
                        { "id": "o1", "text": "One", "risk": "Amber" },
                        { "id": "o2", "text": "Two", "risk": "RED" },
                        { "id": "o3", "text": "Three", "risk": "unknown" }
                    ] },
                    { "id": "c2", "text": "Blank", "type": "text" },
                    { "id": "c3", "text": "Empty choice", "type": "radio", "options": [
                        { "id": "r1", "text": "R" }
                    ] }
                ] }
            ]
        }))
        .unwrap();

        let map = answers(&[
            ("s1", Answer::Text("   ".into())),
            ("c1", Answer::Choice(vec!["o3".into(), "o1".into(), "o2".into()])),
            ("c3", Answer::Choice(vec![])),
        ]);

        let sections = build_sections(&survey, &map);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Segment 2: ");
        assert_eq!(sections[0].rows.len(), 1);

        let row = &sections[0].rows[0];
        assert_eq!(row.answers, vec!["One", "Two", "Three"]);
        assert_eq!(row.answer, "One, Two, Three");
        assert_eq!(
            row.risks,
            vec![Some(RiskTag::Yellow), Some(RiskTag::Red), None]
        );
        assert!(sections.iter().all(|s| !s.rows.is_empty()));
        assert!(sections
            .iter()
            .flat_map(|s| &s.rows)
            .all(|r| !r.answers.is_empty()));
    }

    #[test]
    fn text_answers_are_trimmed() {
        let survey = intake_survey();
        let map = answers(&[("q2", Answer::Text("  all good \n".into()))]);
        let sections = build_sections(&survey, &map);
        assert_eq!(sections[0].rows.len(), 1);
        assert_eq!(sections[0].rows[0].answer, "all good");
    }

    #[test]
    fn filename_strips_punctuation() {
        assert_eq!(report_filename("Acme, Inc. (NL)"), "acme_inc_nl.pdf");
        assert_eq!(report_filename("north-star_BV"), "north-star_bv.pdf");
        assert_eq!(report_filename(""), "report.pdf");
        assert_eq!(report_filename("   "), "report.pdf");
        assert_eq!(report_filename("(((...)))"), "report.pdf");
    }
}
