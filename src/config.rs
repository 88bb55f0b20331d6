use std::time::Duration;

use anyhow::{Result, anyhow, bail};

use crate::constants::*;

/// Base URLs of the REST services a client may talk to.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceUrls {
    pub category: String,
    pub expense: String,
    pub income: String,
    pub account: String,
    pub goals: String,
    pub recurring: String,
    pub currency: String,
    pub pdf_parser: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub debug: bool,
    pub frontend_origin: String,
    pub request_timeout: Duration,
    pub services: ServiceUrls,
}

impl Config {
    /// Reads configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port_raw = get("PORT", DEFAULT_PORT);
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| anyhow!("PORT must be a valid port number, got '{}'", port_raw))?;

        let timeout_raw = get(
            "REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        );
        let timeout_secs = timeout_raw.parse::<u64>().map_err(|_| {
            anyhow!(
                "REQUEST_TIMEOUT_SECS must be a positive integer, got '{}'",
                timeout_raw
            )
        })?;
        if timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than 0");
        }

        let debug = matches!(
            get("DEBUG", "false").to_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        let service = |key: &str| -> Result<String> {
            let url = get(key, DEFAULT_SERVICE_URL);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("{} must be an http(s) URL, got '{}'", key, url);
            }
            Ok(url.trim_end_matches('/').to_string())
        };

        let services = ServiceUrls {
            category: service("CATEGORY_SERVICE_URL")?,
            expense: service("EXPENSE_SERVICE_URL")?,
            income: service("INCOME_SERVICE_URL")?,
            account: service("ACCOUNT_SERVICE_URL")?,
            goals: service("GOALS_SERVICE_URL")?,
            recurring: service("RECURRING_SERVICE_URL")?,
            currency: service("CURRENCY_SERVICE_URL")?,
            pdf_parser: service("PDF_PARSER_SERVICE_URL")?,
        };

        Ok(Self {
            host: get("HOST", DEFAULT_HOST),
            port,
            data_path: get("DATABASE_PATH", DEFAULT_DATA_PATH),
            debug,
            frontend_origin: get("FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN),
            request_timeout: Duration::from_secs(timeout_secs),
            services,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
