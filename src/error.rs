use thiserror::Error;

/// Errors that prevent a run from starting.
///
/// These are the only errors surfaced to the operator. Everything that goes
/// wrong once virtual users are running ends up as a failed check instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("invalid run parameters: {0}")]
    Run(String),

    #[error("invalid base_url '{url}': {reason}")]
    BaseUrl { url: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Load(Box::new(error))
    }
}

/// Network-level failure category of a request that never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportErrorKind {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed")]
    Connect,
    #[error("request could not be built")]
    Request,
    #[error("response body could not be read")]
    Body,
    #[error("transport failure")]
    Other,
}

impl TransportErrorKind {
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_builder() || error.is_request() {
            TransportErrorKind::Request
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Other => "other",
        }
    }
}
