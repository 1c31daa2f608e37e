use std::collections::HashMap;

use crate::models::admin::{AdminOption, AdminQuestion, Company, ResultRow, ResultView, Survey};
use crate::services::{
    admin_service::{AdminService, Catalog},
    backend_client::BackendError,
    AppState,
};
use crate::utils::listing::{row_contains, ListQuery, Page};

const MISSING: &str = "-";

pub struct ResultsService {
    admin: AdminService,
}

impl ResultsService {
    pub fn new(state: &AppState) -> Self {
        Self {
            admin: AdminService::new(state),
        }
    }

    pub async fn list(
        &self,
        query: &ListQuery,
        token: &str,
    ) -> Result<Page<ResultView>, BackendError> {
        let (companies, surveys, questions, options, results) = futures::try_join!(
            self.admin.fetch_all::<Company>(Catalog::Companies, &[], token),
            self.admin.fetch_all::<Survey>(Catalog::Surveys, &[], token),
            self.admin.fetch_all::<AdminQuestion>(Catalog::Questions, &[], token),
            self.admin.fetch_all::<AdminOption>(Catalog::Options, &[], token),
            self.fetch_results(token),
        )?;

        let lookups = Lookups::new(&companies, &surveys, &questions, &options);
        let rows = results.iter().map(|r| lookups.normalize(r)).collect();
        Ok(query.paginate(filter_results(rows, query)))
    }

    async fn fetch_results(&self, token: &str) -> Result<Vec<ResultRow>, BackendError> {
        self.admin
            .fetch_all_at::<ResultRow>("/results", token)
            .await
    }
}

pub struct Lookups<'a> {
    companies: HashMap<&'a str, &'a Company>,
    surveys: HashMap<&'a str, &'a Survey>,
    questions: HashMap<&'a str, &'a AdminQuestion>,
    options: HashMap<&'a str, &'a AdminOption>,
}

impl<'a> Lookups<'a> {
    pub fn new(
        companies: &'a [Company],
        surveys: &'a [Survey],
        questions: &'a [AdminQuestion],
        options: &'a [AdminOption],
    ) -> Self {
        Self {
            companies: companies.iter().map(|c| (c.id.as_str(), c)).collect(),
            surveys: surveys.iter().map(|s| (s.id.as_str(), s)).collect(),
            questions: questions.iter().map(|q| (q.id.as_str(), q)).collect(),
            options: options.iter().map(|o| (o.id.as_str(), o)).collect(),
        }
    }

    /// Fills missing references from the question's survey, and missing
    /// names with `-`. Row-level text wins over catalog text.
    pub fn normalize(&self, row: &ResultRow) -> ResultView {
        let question = row
            .question_id
            .as_deref()
            .and_then(|id| self.questions.get(id).copied());
        let survey = match row.survey_id.as_deref() {
            Some(id) => self.surveys.get(id).copied(),
            None => question.and_then(|q| self.surveys.get(q.survey_id.as_str()).copied()),
        };
        let option = row
            .option_id
            .as_deref()
            .and_then(|id| self.options.get(id).copied());

        let company_id = row
            .company_id
            .clone()
            .or_else(|| survey.map(|s| s.company_id.clone()));
        let survey_id = row.survey_id.clone().or_else(|| survey.map(|s| s.id.clone()));

        let company_name = company_id
            .as_deref()
            .and_then(|id| self.companies.get(id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| MISSING.to_string());
        let survey_name = survey_id
            .as_deref()
            .and_then(|id| self.surveys.get(id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| MISSING.to_string());

        let percentage = row.percentage.unwrap_or(0.0);

        ResultView {
            id: row.id.clone(),
            company_id,
            company_name,
            survey_id,
            survey_name,
            question_text: row
                .question_text
                .clone()
                .or_else(|| question.map(|q| q.text.clone()))
                .unwrap_or_else(|| MISSING.to_string()),
            kind: row
                .kind
                .clone()
                .or_else(|| question.map(|q| q.kind.as_str().to_string()))
                .unwrap_or_else(|| MISSING.to_string()),
            option_text: row
                .option_text
                .clone()
                .or_else(|| option.map(|o| o.text.clone()))
                .unwrap_or_else(|| MISSING.to_string()),
            total: row.total.unwrap_or(0),
            percentage,
            percentage_display: percentage.round() as i64,
        }
    }
}

/// Company and survey filters, then free-text search over the displayed columns.
pub fn filter_results(rows: Vec<ResultView>, query: &ListQuery) -> Vec<ResultView> {
    let needle = query.needle();
    rows.into_iter()
        .filter(|r| {
            query
                .company_filter()
                .is_none_or(|id| r.company_id.as_deref() == Some(id))
        })
        .filter(|r| {
            query
                .survey_filter()
                .is_none_or(|id| r.survey_id.as_deref() == Some(id))
        })
        .filter(|r| match &needle {
            Some(needle) => {
                let total = r.total.to_string();
                let percentage = r.percentage.to_string();
                row_contains(
                    &[
                        r.company_name.as_str(),
                        r.survey_name.as_str(),
                        r.question_text.as_str(),
                        r.kind.as_str(),
                        r.option_text.as_str(),
                        total.as_str(),
                        percentage.as_str(),
                    ],
                    needle,
                )
            }
            None => true,
        })
        .collect()
}
