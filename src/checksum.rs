//! Schema hashes correlating descriptors across boundary calls
//!
//! The registry stores and reports a [`SchemaHash`] but never derives one.
//! Collaborators that want a stable token can digest their own layout
//! description with [`SchemaHash::digest`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// Opaque 64-bit correlation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaHash(u64);

impl SchemaHash {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// First eight bytes of the SHA256 digest of `data`, big-endian
    pub fn digest(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut word = [0u8; 8];
        word.copy_from_slice(&hash[..8]);
        Self(u64::from_be_bytes(word))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for SchemaHash {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for SchemaHash {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|e| RegistryError::InvalidSchema(format!("bad schema hash '{s}': {e}")))
    }
}

impl TryFrom<String> for SchemaHash {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SchemaHash> for String {
    fn from(h: SchemaHash) -> Self {
        h.to_string()
    }
}
