//! Custom error types for bb
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

use crate::core::resolver::ResolveError;

/// Main error type for the bb application
#[derive(Error, Debug)]
pub enum BbError {
    /// Not running in a git repository
    #[error("This directory is not a git repository.\n\n  → Run 'git init' to create one, or pass --repo <workspace/slug> to target a repository explicitly.")]
    NotGitRepository,

    /// Repository override or remote URL that cannot be parsed
    #[error("Cannot parse repository: {0}\n\n  → Expected workspace/slug, host/workspace/slug, or a full URL like https://bitbucket.org/workspace/slug")]
    InvalidRepository(String),

    /// Remote resolution error (no remotes, no authenticated hosts, ...)
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Structured HTTP error from a non-2xx API response
    #[error(transparent)]
    Http(#[from] HttpError),

    /// No credential stored for a host that needs one
    #[error("Not logged in to {0}.\n\n  → Run 'bb auth login --host {0}' to authenticate.")]
    NotLoggedIn(String),

    /// Credential verification failed during login
    #[error("Authentication failed: {0}\n\n  → Check the username and app password and try again.")]
    AuthenticationFailed(String),

    /// Redirect chain exceeded the hop limit
    #[error("Stopped after too many redirects while requesting {0}.")]
    TooManyRedirects(String),

    /// Redirect response with an unusable Location header
    #[error("Invalid redirect location in response from {0}.")]
    InvalidRedirect(String),

    /// A 2xx response with no body where one was required
    #[error("The server returned an empty response for {0}.")]
    EmptyResponse(String),

    /// Git operation error
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Credential storage error
    #[error("Cannot access secure storage: {0}\n\n  → On macOS: Make sure Keychain Access is available.\n  → On Linux: Ensure a secret service (like gnome-keyring) is running.")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),
}

/// Structured error built from a non-2xx API response.
///
/// Carries everything a caller needs to classify or report the failure:
/// the status code, the extracted message, the originating URL and the
/// raw response body.
#[derive(Error, Debug)]
#[error("HTTP {status} for {url}: {message}")]
pub struct HttpError {
    pub status: u16,
    pub message: String,
    pub url: String,
    pub body: String,
}

impl BbError {
    /// The underlying HTTP error, if this error came from an API response.
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            BbError::Http(err) => Some(err),
            _ => None,
        }
    }

    fn status(&self) -> Option<u16> {
        self.http().map(|err| err.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

impl From<keyring::Error> for BbError {
    fn from(err: keyring::Error) -> Self {
        BbError::Credential(err.to_string())
    }
}

impl From<toml::de::Error> for BbError {
    fn from(err: toml::de::Error) -> Self {
        BbError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for BbError {
    fn from(err: toml::ser::Error) -> Self {
        BbError::Toml(err.to_string())
    }
}

/// Result type alias using BbError
pub type Result<T> = std::result::Result<T, BbError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: u16) -> BbError {
        BbError::Http(HttpError {
            status,
            message: "boom".to_string(),
            url: "https://api.bitbucket.org/2.0/x".to_string(),
            body: String::new(),
        })
    }

    #[test]
    fn test_not_found_classifies_only_as_not_found() {
        let err = http_error(404);
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
        assert!(!err.is_forbidden());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_status_predicates() {
        assert!(http_error(401).is_unauthorized());
        assert!(http_error(403).is_forbidden());
        assert!(http_error(409).is_conflict());
    }

    #[test]
    fn test_non_http_error_matches_no_predicate() {
        let err = BbError::NotGitRepository;
        assert!(!err.is_not_found());
        assert!(!err.is_unauthorized());
        assert!(err.http().is_none());
    }
}
