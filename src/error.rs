//! Error types for FarmTwin

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'farmtwin init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server explicitly rejected the email/password pair
    #[error("{0}")]
    InvalidCredentials(String),

    /// Timeout or unreachable backend
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Persisted state violates the token/user pairing
    #[error("Corrupted session: {0}")]
    CorruptedSession(String),

    /// An authenticated request was answered with 401
    #[error("Authorization expired: {0}")]
    AuthorizationExpired(String),

    #[error("Please enter email and password")]
    MissingCredentials,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Classify a transport-level failure from the HTTP client
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::InvalidResponse(err.to_string())
        } else {
            Error::NetworkUnavailable(err.to_string())
        }
    }

    /// Whether the user can simply retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::InvalidCredentials(_) | Error::NetworkUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
