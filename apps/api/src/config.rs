use anyhow::{Context, Result};

use crate::usage::budgets::BudgetConfig;

/// Application configuration loaded from environment variables.
/// Required variables abort startup when missing; usage-guard budgets and the
/// analytics collector are optional and fall back to documented defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub auth_api_url: String,
    pub auth_api_key: String,
    pub memory_api_url: String,
    pub memory_api_key: String,
    pub analytics_api_url: Option<String>,
    pub analytics_api_key: Option<String>,
    pub usage: BudgetConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            auth_api_url: require_env("AUTH_API_URL")?,
            auth_api_key: require_env("AUTH_API_KEY")?,
            memory_api_url: require_env("MEMORY_API_URL")?,
            memory_api_key: require_env("MEMORY_API_KEY")?,
            analytics_api_url: optional_env("ANALYTICS_API_URL"),
            analytics_api_key: optional_env("ANALYTICS_API_KEY"),
            usage: BudgetConfig::from_env(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
