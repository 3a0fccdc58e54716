use crate::auth::Account;
use crate::i18n::DEFAULT_EXCLUDED_PREFIXES;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Storage (in-memory when unset)
    pub database_url: Option<String>,

    // Dictionaries (embedded when unset)
    pub dictionary_dir: Option<PathBuf>,

    // Routing
    pub excluded_path_prefixes: Vec<String>,

    // Auth
    pub allowed_email_domain: String,
    pub accounts: Vec<Account>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            database_url: non_empty_var("DATABASE_URL"),

            dictionary_dir: non_empty_var("DICTIONARY_DIR").map(PathBuf::from),

            excluded_path_prefixes: non_empty_var("EXCLUDED_PATH_PREFIXES")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|| {
                    DEFAULT_EXCLUDED_PREFIXES
                        .iter()
                        .map(|prefix| prefix.to_string())
                        .collect()
                }),

            allowed_email_domain: non_empty_var("ALLOWED_EMAIL_DOMAIN")
                .unwrap_or_else(|| "meet365.net".to_string()),

            accounts: Account::parse_list(&std::env::var("CRM_ACCOUNTS").unwrap_or_default())
                .context("CRM_ACCOUNTS is malformed")?,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
