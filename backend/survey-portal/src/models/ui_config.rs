use serde::{Deserialize, Serialize};

/// Survey chrome served by `GET /ui-config/{page}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveyUiConfig {
    pub background_image: String,
    pub powered_by: LogoRef,
    pub disclaimer: TextBlock,
    pub checkbox: TextBlock,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoRef {
    pub logo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlock {
    pub text: String,
}

/// Body of `PUT /ui-config/{page}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUiConfigRequest {
    pub config: SurveyUiConfig,
}

/// Thank-you panel shown after submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThankYouConfig {
    pub image: String,
    pub heading: String,
    pub text: String,
}
