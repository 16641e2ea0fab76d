//! Error types for the jobprep core library.

use std::path::PathBuf;

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}

/// A type alias for results using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid() {
        let err = ConfigError::invalid("train_fraction must be in (0, 1)");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: train_fraction must be in (0, 1)"
        );
    }

    #[test]
    fn test_error_display_not_found() {
        let err = ConfigError::FileNotFound {
            path: PathBuf::from("/tmp/missing.toml"),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /tmp/missing.toml"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
