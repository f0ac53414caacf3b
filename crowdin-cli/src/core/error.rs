use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrowdinError {
    #[error("CROWDIN_TOKEN environment variable is required")]
    MissingToken,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by the Crowdin API")]
    RateLimited,

    #[error("Crowdin API error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CrowdinError {
    /// True for errors that should be retried once after a cooldown.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, CrowdinError::RateLimited)
    }
}
