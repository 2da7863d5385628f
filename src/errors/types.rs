use thiserror::Error;

#[derive(Debug, Error)]
pub enum HuntsmanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HuntsmanError {
    /// Transient failures are worth retrying before giving up on a provider;
    /// everything else fails immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HuntsmanError::Network(_) | HuntsmanError::Provider(_))
    }
}
