//! Error types and handling
//!
//! Domain-specific error enums (configuration, transport, lifecycle) wrapped
//! in the main `KilnError` enum for unified error handling. Configuration
//! errors fail fast before any container is created; transport errors are
//! fatal and never retried; a phase failure carries the phase name and the
//! container exit code.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration validation error (bad image name, malformed phase
    /// arguments, missing application directory)
    #[error("Configuration validation error: {message}")]
    Validation { message: String },

    /// Configuration file parsing error
    #[error("Failed to parse configuration file: {message}")]
    Parsing { message: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    /// Configuration file I/O error
    #[error("Failed to read configuration file")]
    Io(#[from] std::io::Error),
}

/// Docker Engine API transport errors
///
/// Every variant is fatal for the build in progress; the executor performs
/// no automatic retry.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Docker daemon could not be reached over its socket
    #[error("Docker daemon is not reachable: {message}")]
    Unreachable { message: String },

    /// Engine API call failed
    #[error("Docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    /// Container disappeared between lifecycle calls
    #[error("Container not found: {id}")]
    ContainerNotFound { id: String },
}

/// Build lifecycle errors
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A phase container exited with a non-zero status code
    #[error("Builder lifecycle phase '{phase}' failed with status code {status}")]
    PhaseFailed { phase: String, status: i64 },
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum KilnError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Docker Engine API transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Build lifecycle errors
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Convenience type alias for Results with KilnError
pub type Result<T> = std::result::Result<T, KilnError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Validation {
            message: "image name must not be empty".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Configuration validation error: image name must not be empty"
        );

        let error = ConfigError::Parsing {
            message: "invalid TOML".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Failed to parse configuration file: invalid TOML"
        );

        let error = ConfigError::NotFound {
            path: "/path/to/kiln.toml".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Configuration file not found: /path/to/kiln.toml"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::Unreachable {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Docker daemon is not reachable: connection refused"
        );

        let error = TransportError::ContainerNotFound {
            id: "abc123".to_string(),
        };
        assert_eq!(format!("{}", error), "Container not found: abc123");
    }

    #[test]
    fn test_lifecycle_error_display() {
        let error = LifecycleError::PhaseFailed {
            phase: "detector".to_string(),
            status: 100,
        };
        assert_eq!(
            format!("{}", error),
            "Builder lifecycle phase 'detector' failed with status code 100"
        );
    }

    #[test]
    fn test_kiln_error_from_domain_errors() {
        let config_error = ConfigError::Validation {
            message: "test".to_string(),
        };
        let kiln_error: KilnError = config_error.into();
        assert!(matches!(kiln_error, KilnError::Config(_)));

        let transport_error = TransportError::Unreachable {
            message: "test".to_string(),
        };
        let kiln_error: KilnError = transport_error.into();
        assert!(matches!(kiln_error, KilnError::Transport(_)));

        let lifecycle_error = LifecycleError::PhaseFailed {
            phase: "builder".to_string(),
            status: 51,
        };
        let kiln_error: KilnError = lifecycle_error.into();
        assert!(matches!(kiln_error, KilnError::Lifecycle(_)));
    }

    #[test]
    fn test_anyhow_conversions() {
        let lifecycle_error = LifecycleError::PhaseFailed {
            phase: "exporter".to_string(),
            status: 62,
        };
        // thiserror automatically provides the conversion
        let anyhow_error = anyhow::Error::from(KilnError::from(lifecycle_error));
        assert!(anyhow_error
            .to_string()
            .contains("phase 'exporter' failed with status code 62"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let config_error: ConfigError = io_error.into();
        assert!(matches!(config_error, ConfigError::Io(_)));
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let config_error = ConfigError::Io(io_error);
        let kiln_error = KilnError::Config(config_error);

        // Source chain is preserved down to the underlying io::Error
        assert!(kiln_error.source().is_some());
        if let Some(source) = kiln_error.source() {
            assert!(source.source().is_some());
        }
    }
}
