use thiserror::Error;

/// Unified error type for mkrelease operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    /// The proposed version can never follow the latest one
    #[error("{0}")]
    Rejected(String),

    /// The operator declined a confirmation prompt
    #[error("Aborted!")]
    Aborted,

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in mkrelease
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        ReleaseError::Configuration(msg.into())
    }

    /// Create a runtime error with context
    pub fn runtime(msg: impl Into<String>) -> Self {
        ReleaseError::Runtime(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        ReleaseError::Rejected(msg.into())
    }

    /// Whether this error came from the operator declining a prompt
    pub fn is_abort(&self) -> bool {
        matches!(self, ReleaseError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::configuration("working directory is not clean");
        assert_eq!(
            err.to_string(),
            "Configuration error: working directory is not clean"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_rejected_is_bare_message() {
        let err = ReleaseError::rejected("0.5.3 is not the next release after 0.5.1");
        assert_eq!(err.to_string(), "0.5.3 is not the next release after 0.5.1");
    }

    #[test]
    fn test_abort() {
        assert!(ReleaseError::Aborted.is_abort());
        assert!(!ReleaseError::runtime("x").is_abort());
        assert_eq!(ReleaseError::Aborted.to_string(), "Aborted!");
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ReleaseError::configuration("x"), "Configuration error"),
            (ReleaseError::runtime("x"), "Runtime error"),
            (ReleaseError::version("x"), "Version parsing error"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_error_from_toml() {
        let parse_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: ReleaseError = parse_err.into();
        assert!(err.to_string().starts_with("Invalid configuration file"));
    }
}
