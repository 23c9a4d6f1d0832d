//! Build cache volume naming
//!
//! Cache volumes are named deterministically from the target image name so
//! repeated builds of the same image reuse their build and launch caches,
//! while scratch volumes (layers) get a random per-run name and are removed
//! when the run finishes.

use sha2::{Digest, Sha256};
use std::fmt;

const RANDOM_NAME_LENGTH: usize = 10;

/// Name of a Docker volume
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeName(String);

impl VolumeName {
    /// Use the given value directly as a volume name
    pub fn of(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive a deterministic volume name from a source string
    ///
    /// The name is `<prefix><digest><suffix>` where `digest` is the first
    /// `digest_length` hex characters of the SHA-256 of `source`.
    pub fn based_on(source: &str, prefix: &str, suffix: &str, digest_length: usize) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        let mut hex = String::with_capacity(digest_length + 2);
        for byte in digest.iter() {
            if hex.len() >= digest_length {
                break;
            }
            hex.push_str(&format!("{:02x}", byte));
        }
        hex.truncate(digest_length);
        Self(format!("{}{}{}", prefix, hex, suffix))
    }

    /// Generate a random volume name with the given prefix
    pub fn random(prefix: &str) -> Self {
        let mut name = String::with_capacity(prefix.len() + RANDOM_NAME_LENGTH);
        name.push_str(prefix);
        for _ in 0..RANDOM_NAME_LENGTH {
            name.push(fastrand::lowercase());
        }
        Self(name)
    }

    /// The volume name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
