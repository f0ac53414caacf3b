use std::env;

use crate::core::error::CrowdinError;

pub const DEFAULT_BASE_URL: &str = "https://api.crowdin.com/api/v2";

/// Startup configuration for every Crowdin call.
///
/// Validated once when the process starts; a missing token is fatal here,
/// never a per-call error.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub base_url: String,
}

impl Config {
    /// Build the configuration from the environment. `CROWDIN_TOKEN` is
    /// required; `CROWDIN_BASE_URL` overrides the API host (useful for
    /// enterprise instances and tests).
    pub fn from_env() -> Result<Self, CrowdinError> {
        let token = env::var("CROWDIN_TOKEN").ok();
        let base_url = env::var("CROWDIN_BASE_URL").ok();
        Self::new(token, base_url)
    }

    pub fn new(token: Option<String>, base_url: Option<String>) -> Result<Self, CrowdinError> {
        let token = match token {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(CrowdinError::MissingToken),
        };

        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_token_is_fatal() {
        let err = Config::new(None, None).unwrap_err();
        assert!(matches!(err, CrowdinError::MissingToken));
    }

    #[test]
    fn blank_token_is_fatal() {
        let err = Config::new(Some("   ".to_string()), None).unwrap_err();
        assert!(matches!(err, CrowdinError::MissingToken));
    }

    #[test]
    fn defaults_base_url_and_strips_trailing_slash() {
        let config = Config::new(Some("tok".to_string()), None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let config = Config::new(
            Some("tok".to_string()),
            Some("https://example.crowdin.com/api/v2/".to_string()),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://example.crowdin.com/api/v2");
    }
}
