use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Emails allowed to use admin capabilities. Compared case-insensitively.
    pub admin_emails: Vec<String>,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC secret for bearer session tokens. Empty means session decoding
    /// is disabled and every request resolves to "no user".
    pub session_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_emails = parse_admin_emails(env::var("ADMIN_EMAILS").ok().as_deref());

        if admin_emails.is_empty() {
            tracing::warn!("ADMIN_EMAILS not set or empty; no email will pass admin checks");
        }

        Self {
            admin_emails,
            security: SecurityConfig {
                session_secret: env::var("SESSION_SECRET").unwrap_or_default(),
            },
        }
    }
}

/// Split a comma-separated ADMIN_EMAILS value into trimmed, non-empty entries.
pub fn parse_admin_emails(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
