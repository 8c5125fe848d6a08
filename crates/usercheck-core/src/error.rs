//! Error types for Usercheck

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Setup Errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Directory Errors
    #[error("Directory connection failed: {0}")]
    Connection(String),

    #[error("Directory bind failed: {0}")]
    Bind(String),

    #[error("Directory search failed: {0}")]
    Search(String),

    // Request Errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled by shutdown")]
    Cancelled,

    // Internal Errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "ConfigurationError",
            Error::Connection(_) => "ConnectionError",
            Error::Bind(_) => "BindError",
            Error::Search(_) => "SearchError",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::NotFound(_) => "NotFound",
            Error::Cancelled => "Cancelled",
            Error::Internal(_) | Error::Io(_) => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Error::Search(_) | Error::InvalidArgument(_) => 400,

            Error::NotFound(_) => 404,

            Error::Cancelled => 503,

            _ => 500,
        }
    }

    /// True for failures caused by the deployment rather than the request.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Configuration("x".into()).http_status(), 500);
        assert_eq!(Error::Connection("x".into()).http_status(), 500);
        assert_eq!(Error::Bind("x".into()).http_status(), 500);
        assert_eq!(Error::Search("x".into()).http_status(), 400);
        assert_eq!(Error::InvalidArgument("x".into()).http_status(), 400);
        assert_eq!(Error::NotFound("x".into()).http_status(), 404);
        assert_eq!(Error::Cancelled.http_status(), 503);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Error::Search("boom".into()).code(), "SearchError");
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.code(), "InternalError");
        assert_eq!(io.http_status(), 500);
    }

    #[test]
    fn test_setup_failure() {
        assert!(Error::Configuration("x".into()).is_setup_failure());
        assert!(Error::Connection("x".into()).is_setup_failure());
        assert!(!Error::Search("x".into()).is_setup_failure());
    }
}
