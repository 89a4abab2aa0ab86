use crate::route::Route;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Where the session store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub store: StoreLocation,
    /// Unset means requests may wait forever.
    pub request_timeout: Option<Duration>,
    pub start: Route,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend_url = lookup("PARLOR_BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = Url::parse(backend_url.trim())
            .with_context(|| format!("Invalid PARLOR_BACKEND_URL '{}'", backend_url))?;

        let store = match lookup("PARLOR_DB").filter(|v| !v.trim().is_empty()) {
            Some(path) if path.trim() == ":memory:" => StoreLocation::Memory,
            Some(path) => StoreLocation::File(PathBuf::from(path)),
            None => {
                // We use ~/.parlor/parlor.db
                let home_dir = lookup("HOME").unwrap_or_else(|| ".".into());
                StoreLocation::File(PathBuf::from(home_dir).join(".parlor").join("parlor.db"))
            }
        };

        let request_timeout = match lookup("PARLOR_HTTP_TIMEOUT_SECS") {
            Some(secs) if !secs.trim().is_empty() => {
                let secs: u64 = secs
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid PARLOR_HTTP_TIMEOUT_SECS '{}'", secs))?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        let start = match lookup("PARLOR_START") {
            Some(path) if !path.trim().is_empty() => path
                .parse()
                .with_context(|| format!("Invalid PARLOR_START '{}'", path))?,
            _ => Route::Login,
        };

        Ok(Self {
            backend_url,
            store,
            request_timeout,
            start,
        })
    }
}
