use serde::Deserialize;
use std::env;

/// Upper bound for the idle session TTL (30 days).
pub const MAX_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    /// Base URL of the survey REST backend, without trailing slash.
    pub api_base_url: String,
    pub api_timeout_seconds: u64,
    pub session_ttl_seconds: i64,
    pub session_sweep_interval_seconds: u64,
    pub ui_config_page: String,
    pub thank_you_page: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let api_base_url = settings
            .get_string("backend.api_url")
            .or_else(|_| env::var("API_URL"))
            .or_else(|_| env::var("API_BASE_URL"))
            .unwrap_or_else(|_| {
                eprintln!("WARNING: API_URL not set, using local backend default");
                "http://localhost:4000/api".to_string()
            });
        let api_base_url = normalize_base_url(&api_base_url)?;

        let api_timeout_seconds = settings
            .get_int("backend.timeout_seconds")
            .ok()
            .or_else(|| parse_env("API_TIMEOUT_SECONDS"))
            .filter(|v| *v > 0)
            .unwrap_or(10) as u64;

        let session_ttl_seconds = settings
            .get_int("sessions.ttl_seconds")
            .ok()
            .or_else(|| parse_env("SESSION_DURATION_SECONDS"))
            .filter(|v| *v > 0)
            .unwrap_or(3600)
            .min(MAX_SESSION_TTL_SECONDS);

        let session_sweep_interval_seconds = settings
            .get_int("sessions.sweep_interval_seconds")
            .ok()
            .or_else(|| parse_env("SESSION_SWEEP_INTERVAL_SECONDS"))
            .filter(|v| *v > 0)
            .unwrap_or(60) as u64;

        let ui_config_page = settings
            .get_string("ui.page")
            .or_else(|_| env::var("UI_CONFIG_PAGE"))
            .unwrap_or_else(|_| "survey".to_string());

        let thank_you_page = settings
            .get_string("ui.thank_you_page")
            .or_else(|_| env::var("THANK_YOU_CONFIG_PAGE"))
            .unwrap_or_else(|_| "thank-you".to_string());

        Ok(Config {
            bind_addr,
            api_base_url,
            api_timeout_seconds,
            session_ttl_seconds,
            session_sweep_interval_seconds,
            ui_config_page,
            thank_you_page,
        })
    }
}

fn parse_env(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<i64>().ok())
}

/// Trims trailing slashes and rejects values that are not absolute URLs.
fn normalize_base_url(raw: &str) -> Result<String, config::ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|e| {
        config::ConfigError::Message(format!("Invalid backend URL '{}': {}", trimmed, e))
    })?;
    Ok(trimmed.to_string())
}
