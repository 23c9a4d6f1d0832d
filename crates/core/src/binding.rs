//! Volume binding parsing and rendering
//!
//! A `Binding` pairs a host source with a container destination path. The
//! source is either an absolute host path (bind mount) or a named Docker
//! volume; the Engine API accepts both in the same `Binds` string form:
//!
//! ```text
//! /host/path:/container/path
//! volume-name:/container/path
//! ```
//!
//! Bindings are value types with no identity beyond their two parts.

use crate::errors::{ConfigError, KilnError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A host-source to container-destination volume binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Host path or named volume
    source: String,
    /// Absolute path inside the container
    destination: String,
}

impl Binding {
    /// Create a binding from a host source and a container destination
    pub fn from(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// The host path or volume name
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The destination path inside the container
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Validate the binding for use in container creation
    ///
    /// The source must be non-empty and the destination must be an absolute
    /// path; anything else is a configuration error surfaced before any
    /// container is created.
    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            return Err(ConfigError::Validation {
                message: "Binding source must not be empty".to_string(),
            }
            .into());
        }
        if !self.destination.starts_with('/') {
            return Err(ConfigError::Validation {
                message: format!(
                    "Binding destination '{}' must be an absolute path",
                    self.destination
                ),
            }
            .into());
        }
        Ok(())
    }
}

impl FromStr for Binding {
    type Err = KilnError;

    /// Parse a `source:destination` binding specification
    fn from_str(s: &str) -> Result<Self> {
        // The destination is everything after the last ':' so that sources
        // containing a colon (rare, but legal on the host side) still parse.
        let (source, destination) = s.rsplit_once(':').ok_or_else(|| {
            KilnError::from(ConfigError::Validation {
                message: format!("Invalid binding '{}': expected SOURCE:DESTINATION", s),
            })
        })?;
        let binding = Binding::from(source, destination);
        binding.validate()?;
        Ok(binding)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.destination)
    }
}
