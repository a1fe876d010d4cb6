use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::{FailureKind, RemoteError};

pub const ENV_URL: &str = "CSE_REPORTS_URL";
pub const ENV_KEY: &str = "CSE_REPORTS_KEY";
pub const ENV_BUCKET: &str = "CSE_REPORTS_BUCKET";
pub const ENV_TABLE: &str = "CSE_REPORTS_TABLE";

pub const DEFAULT_BUCKET: &str = "cse-statements";
pub const DEFAULT_TABLE: &str = "reports";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("{var} is not a valid url: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
}

/// Where the hosted backend lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: Url,
    pub api_key: String,
    pub bucket: String,
    pub table: String,
    pub connect_timeout: Duration,
    /// Applies to storage and table calls. The change feed is long-lived and
    /// only bounded by `connect_timeout`.
    pub request_timeout: Duration,
}

impl RemoteSettings {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            bucket: DEFAULT_BUCKET.to_string(),
            table: DEFAULT_TABLE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_url = get(ENV_URL).ok_or(ConfigError::Missing(ENV_URL))?;
        let base_url = Url::parse(&raw_url).map_err(|err| ConfigError::InvalidUrl {
            var: ENV_URL,
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                var: ENV_URL,
                reason: "not a base url".to_string(),
            });
        }
        let api_key = get(ENV_KEY).ok_or(ConfigError::Missing(ENV_KEY))?;

        let mut settings = Self::new(base_url, api_key);
        if let Some(bucket) = get(ENV_BUCKET) {
            settings.bucket = bucket;
        }
        if let Some(table) = get(ENV_TABLE) {
            settings.table = table;
        }
        Ok(settings)
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::new(
                    FailureKind::InvalidUrl,
                    format!("{} cannot be a base url", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
