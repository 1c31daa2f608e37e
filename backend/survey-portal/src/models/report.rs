use serde::{Deserialize, Serialize};

use super::survey::RiskTag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub question: String,
    /// Resolved answers joined with ", ".
    pub answer: String,
    pub answers: Vec<String>,
    /// One entry per selected option; empty for text answers.
    pub risks: Vec<Option<RiskTag>>,
}

/// Body of `POST /public/report.pdf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub company_name: String,
    pub company_logo: Vec<String>,
    pub sections: Vec<ReportSection>,
}

/// Rendered PDF plus the suggested download name.
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}
