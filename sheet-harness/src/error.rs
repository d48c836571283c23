use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx reply; `message` is already translated for display.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {source} - body: {body}")]
    Parse {
        source: serde_json::Error,
        body: String,
    },

    #[error("No choices in response")]
    NoChoices,

    #[error("Failed to load scenarios from {path}: {message}")]
    Scenarios { path: String, message: String },
}
