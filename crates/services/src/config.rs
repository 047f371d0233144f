use std::env;
use std::fmt;

use url::Url;

use crate::error::ConfigError;

/// Where the study backend lives and how to authenticate against it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    token: Option<String>,
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:5000/api";

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = base_url.into();
        let trimmed = raw.trim();
        let parsed = Url::parse(trimmed).map_err(|_| ConfigError::InvalidBaseUrl {
            raw: raw.clone(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl { raw });
        }
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Read `STUDY_API_BASE_URL` and `STUDY_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL from the environment is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("STUDY_API_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.into());
        let config = Self::new(base_url)?;
        Ok(config.with_token(env::var("STUDY_API_TOKEN").ok()))
    }

    /// Attach a bearer token. Blank tokens are dropped.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = ApiConfig::new("https://example.test/api/").unwrap();
        assert_eq!(config.base_url(), "https://example.test/api");
    }

    #[test]
    fn relative_url_is_rejected() {
        assert!(matches!(
            ApiConfig::new("/api"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        assert!(ApiConfig::new("ftp://example.test").is_err());
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = ApiConfig::new(ApiConfig::DEFAULT_BASE_URL)
            .unwrap()
            .with_token(Some("   ".into()));
        assert!(config.token().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config = ApiConfig::new(ApiConfig::DEFAULT_BASE_URL)
            .unwrap()
            .with_token(Some("secret".into()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
