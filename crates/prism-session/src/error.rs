//! Errors surfaced by the session client.

use thiserror::Error;

/// Why a refresh cycle failed.
///
/// Cloned to every request waiting on the same cycle, so it carries
/// rendered messages instead of the underlying error values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token stored; no network call was made
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-2xx status
    #[error("Refresh rejected with HTTP {status}")]
    Rejected { status: u16 },

    /// The refresh call never produced a response
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// A 2xx response without both tokens
    #[error("Refresh response did not contain a usable token pair")]
    MalformedPayload,

    /// Credentials were cleared (e.g. logout) while the refresh was in flight
    #[error("Session was cleared during refresh")]
    SessionCleared,

    /// Reading or writing the credential store failed
    #[error("Credential storage failed: {0}")]
    Storage(String),

    /// The task driving the refresh went away before finishing
    #[error("Refresh abandoned before completion")]
    Abandoned,
}

impl RefreshError {
    /// Returns true if the failure came from the network rather than the server's verdict.
    pub fn is_transient(&self) -> bool {
        matches!(self, RefreshError::Transport(_) | RefreshError::Abandoned)
    }
}

/// Everything a PRISM request or account operation can fail with.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login rejected by the server
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A request was answered with 401 and could not be recovered by a refresh
    #[error("Unauthorized: {method} {url} ({body_summary})")]
    Unauthorized {
        method: String,
        url: String,
        body_summary: String,
    },

    /// Explicit refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefresh(#[from] RefreshError),

    /// No stored session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Non-2xx response from the PRISM API
    #[error("API error: HTTP {status} ({body_summary})")]
    Api { status: u16, body_summary: String },

    /// 2xx response whose body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid auth state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] prism_storage::StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure outside reqwest
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<prism_config::ConfigError> for AuthError {
    fn from(err: prism_config::ConfigError) -> Self {
        AuthError::Config(err.to_string())
    }
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Connection failures and timeouts
    /// - 5xx responses
    /// - Refresh cycles that failed in transit
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Transport(_) => true,
            AuthError::Api { status, .. } => *status >= 500,
            AuthError::TokenRefresh(e) => e.is_transient(),
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Unauthorized { .. } => Some(401),
            AuthError::Api { status, .. } => Some(*status),
            AuthError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_transport() {
        assert!(AuthError::Transport("connection reset".to_string()).is_transient());
    }

    #[test]
    fn test_is_transient_server_error() {
        let err = AuthError::Api {
            status: 503,
            body_summary: "len=0".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_is_not_transient_client_error() {
        let err = AuthError::Api {
            status: 404,
            body_summary: "len=0".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_is_not_transient_unauthorized() {
        let err = AuthError::Unauthorized {
            method: "GET".to_string(),
            url: "http://localhost:8000/worklets/".to_string(),
            body_summary: "len=0".to_string(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_refresh_error_transience() {
        assert!(AuthError::from(RefreshError::Transport("timeout".into())).is_transient());
        assert!(!AuthError::from(RefreshError::Rejected { status: 401 }).is_transient());
        assert!(!AuthError::from(RefreshError::MissingRefreshToken).is_transient());
    }

    #[test]
    fn test_is_not_transient_not_logged_in() {
        assert!(!AuthError::NotLoggedIn.is_transient());
        assert!(!AuthError::InvalidCredentials("bad password".to_string()).is_transient());
    }
}
