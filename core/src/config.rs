//! Client configuration.

/// Endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://api.postmaster.io";

pub const DEFAULT_API_VERSION: &str = "v1";

/// Environment variable consulted by `ClientConfig::from_env`.
pub const BASE_URL_ENV: &str = "POSTMASTER_BASE_URL";

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL; `None` or blank means `DEFAULT_BASE_URL`.
    pub base_url: Option<String>,
    /// Version segment inserted between the base URL and the endpoint.
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the base URL taken from
    /// `POSTMASTER_BASE_URL` when it is set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(BASE_URL_ENV) {
            Ok(url) => config.base_url(url),
            Err(_) => config,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// The effective base URL without a trailing slash.
    pub fn resolved_base_url(&self) -> &str {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/'),
            _ => DEFAULT_BASE_URL,
        }
    }
}
