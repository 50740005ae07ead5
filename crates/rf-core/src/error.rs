use crate::types::enums::ErrorType;
use crate::types::query::QueryError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String },
    /// Non-2xx response; the body is kept so the normalizer can read it.
    #[error("http error {status}")]
    Http { status: u16, body: Vec<u8> },
    #[error("could not parse response body: {message}")]
    BodyParse { message: String },
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
    #[error("{message}")]
    Other {
        code: String,
        message: String,
        kind: Option<ErrorType>,
    },
}

impl FetchError {
    pub fn code(&self) -> &str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Http { .. } => "http_error",
            Self::BodyParse { .. } => "invalid_response",
            Self::Configuration { .. } => "invalid_configuration",
            Self::Other { code, .. } => code,
        }
    }
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("invalid attribute {name}: {message}")]
    InvalidAttribute { name: String, message: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("review not found")]
    ReviewNotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum RevfeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Mount(#[from] MountError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
