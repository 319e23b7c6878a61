//! Checksum utilities for generated artefacts and anchor names

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 checksum of generated content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum of a string
    pub fn of(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` hex characters, used as a disambiguating suffix
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        Self::of(content) == *self
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let iri = "http://localhost/psm-class/1";
        assert_eq!(Checksum::of(iri), Checksum::of(iri));
        assert_ne!(Checksum::of(iri), Checksum::of("http://localhost/psm-class/2"));
    }

    #[test]
    fn test_short_prefix() {
        let checksum = Checksum::of("content");
        assert_eq!(checksum.short(6).len(), 6);
        assert!(checksum.as_str().starts_with(checksum.short(6)));
        assert_eq!(checksum.short(1000), checksum.as_str());
    }

    #[test]
    fn test_checksum_verification() {
        let checksum = Checksum::of("{\"type\": \"object\"}");
        assert!(checksum.verify("{\"type\": \"object\"}"));
        assert!(!checksum.verify("different content"));
    }
}
