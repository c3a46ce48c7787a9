//! Data-layout versions for foreign types

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// A (major, minor, patch) data-layout revision
///
/// Ordering is lexicographic over major, minor, patch. Versions serialize as
/// `"major.minor.patch"` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl TypeVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Encode into a 32-bit word: major in bits 16-31, minor in 8-15, patch in 0-7.
    ///
    /// Lossy: components that do not fit their field bleed into neighbouring
    /// bits and are not recovered by [`TypeVersion::unpack`].
    pub fn pack(&self) -> u32 {
        (self.major << 16) | (self.minor << 8) | self.patch
    }

    /// Decode a packed word, masking minor and patch to 8 bits each.
    pub fn unpack(word: u32) -> Self {
        Self {
            major: word >> 16,
            minor: (word >> 8) & 0xFF,
            patch: word & 0xFF,
        }
    }

    /// Whether data at `other` can be read by a reader at `self`.
    ///
    /// Not symmetric: `self` must share the major line and be no older than `other`.
    pub fn is_compatible(&self, other: &TypeVersion) -> bool {
        self.major == other.major
            && (self.minor > other.minor
                || (self.minor == other.minor && self.patch >= other.patch))
    }

    pub fn compare(&self, other: &TypeVersion) -> Ordering {
        self.cmp(other)
    }
}

impl fmt::Display for TypeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<u32> for TypeVersion {
    fn from(word: u32) -> Self {
        Self::unpack(word)
    }
}

impl From<TypeVersion> for semver::Version {
    fn from(v: TypeVersion) -> Self {
        semver::Version::new(v.major.into(), v.minor.into(), v.patch.into())
    }
}

impl TryFrom<&semver::Version> for TypeVersion {
    type Error = RegistryError;

    fn try_from(v: &semver::Version) -> Result<Self, Self::Error> {
        let component = |n: u64| {
            u32::try_from(n).map_err(|_| {
                RegistryError::InvalidVersion(format!("{v}: component {n} out of range"))
            })
        };
        Ok(Self::new(component(v.major)?, component(v.minor)?, component(v.patch)?))
    }
}

impl FromStr for TypeVersion {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Strip leading 'v' if present
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);
        let version = semver::Version::parse(s)?;
        Self::try_from(&version)
    }
}

impl TryFrom<String> for TypeVersion {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TypeVersion> for String {
    fn from(v: TypeVersion) -> Self {
        v.to_string()
    }
}
