use thiserror::Error;

/// Stable classification of a [`ClientError`], for automated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Permission,
    Validation,
    NotFound,
    Server,
    Connection,
    Timeout,
    Serialization,
    Unknown,
}

/// Error type shared by every layer of the SDK.
///
/// Transport-level failures are classified once, at the boundary where the
/// HTTP status is known; everything above works with the typed variant.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("authentication failed: {message}")]
    Authentication { message: String },
    #[error("permission denied: {message}")]
    Permission { message: String },
    #[error("invalid request: {message}")]
    Validation { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },
    #[error("connection failed: {message}")]
    Connection { message: String },
    #[error("timed out: {message}")]
    Timeout { message: String },
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    #[error("{message}")]
    Unknown { message: String },
}

impl ClientError {
    /// Classify an HTTP status code together with the server-supplied message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Authentication { message },
            403 => Self::Permission { message },
            400 | 422 => Self::Validation { message },
            404 => Self::NotFound { message },
            500..=599 => Self::Server { status, message },
            408 => Self::Timeout { message },
            _ => Self::Unknown { message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Server { .. } => ErrorKind::Server,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Remediation hint suitable for showing to a human, where one exists.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Authentication { .. } => {
                Some("check that AGENTLINE_API_KEY is set to a valid token")
            }
            Self::Permission { .. } => {
                Some("the credential is valid but lacks access to this agent")
            }
            Self::Connection { .. } => {
                Some("verify the agent address and that the server is running")
            }
            Self::Timeout { .. } => {
                Some("increase the configured timeout or check server load")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
