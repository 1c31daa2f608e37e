pub mod admin;
pub mod answer;
pub mod report;
pub mod session;
pub mod survey;
pub mod ui_config;
