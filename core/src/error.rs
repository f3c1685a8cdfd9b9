use serde::{Deserialize, Serialize};

/// Machine-readable error codes carried in `Reply::error`.
pub mod codes {
    pub const AUTH_REQUIRED: &str = "auth-required";
    pub const EMPTY_MESSAGE: &str = "empty-message";
    pub const VALIDATION_REJECTED: &str = "validation-rejected";
    pub const NETWORK_UNAVAILABLE: &str = "network-unavailable";
    pub const SERVER_ERROR: &str = "server-error";
    pub const UNKNOWN: &str = "unknown";
}

/// Classification of a failed exchange with the chat backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// No bearer credential available. Surfaced to the caller, never retried.
    AuthRequired,
    /// Blank message. Surfaced to the caller, never sent.
    EmptyMessage,
    /// The backend rejected the payload shape (HTTP 422).
    ValidationRejected,
    /// Timeout, DNS or connection failure.
    NetworkUnavailable,
    /// Any other non-2xx status.
    ServerError,
    Unknown,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::AuthRequired => codes::AUTH_REQUIRED,
            ErrorKind::EmptyMessage => codes::EMPTY_MESSAGE,
            ErrorKind::ValidationRejected => codes::VALIDATION_REJECTED,
            ErrorKind::NetworkUnavailable => codes::NETWORK_UNAVAILABLE,
            ErrorKind::ServerError => codes::SERVER_ERROR,
            ErrorKind::Unknown => codes::UNKNOWN,
        }
    }

    /// Map an HTTP status to a failure kind. Only meaningful for non-2xx statuses.
    pub fn from_status(status: u16) -> Self {
        match status {
            422 => ErrorKind::ValidationRejected,
            _ => ErrorKind::ServerError,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified failure of one request to the backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("no bearer token available")]
    AuthRequired,
    #[error("message is empty")]
    EmptyMessage,
    #[error("payload rejected by schema validation (HTTP {status}): {detail}")]
    ValidationRejected { status: u16, detail: String },
    #[error("backend unreachable: {0}")]
    NetworkUnavailable(String),
    #[error("backend returned HTTP {status}: {detail}")]
    ServerError { status: u16, detail: String },
    #[error("{0}")]
    Unknown(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::AuthRequired => ErrorKind::AuthRequired,
            ChatError::EmptyMessage => ErrorKind::EmptyMessage,
            ChatError::ValidationRejected { .. } => ErrorKind::ValidationRejected,
            ChatError::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
            ChatError::ServerError { .. } => ErrorKind::ServerError,
            ChatError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status when the backend answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ChatError::ValidationRejected { status, .. } | ChatError::ServerError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Build the error for a non-2xx response.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match ErrorKind::from_status(status) {
            ErrorKind::ValidationRejected => ChatError::ValidationRejected { status, detail },
            _ => ChatError::ServerError { status, detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_422_is_validation_rejection() {
        let err = ChatError::from_status(422, "field required");
        assert_eq!(err.kind(), ErrorKind::ValidationRejected);
        assert_eq!(err.http_status(), Some(422));
    }

    #[test]
    fn other_statuses_are_server_errors() {
        for status in [400, 401, 404, 500, 502, 503] {
            let err = ChatError::from_status(status, "");
            assert_eq!(err.kind(), ErrorKind::ServerError, "status {status}");
        }
    }

    #[test]
    fn codes_serialize_kebab_case() {
        let json = serde_json::to_value(ErrorKind::NetworkUnavailable).unwrap();
        assert_eq!(json, "network-unavailable");
        assert_eq!(ErrorKind::AuthRequired.code(), codes::AUTH_REQUIRED);
    }
}
