//! Capabilities attached to descriptors by the registering collaborator
//!
//! Migration, validation and destruction are supplied from outside the
//! registry. Descriptors hold shared handles to them; the collaborator keeps
//! its own handle and decides how long the capability lives.
//!
//! Plain closures implement each trait, so most callers never name them:
//!
//! ```
//! use std::sync::Arc;
//! use foreign_type_registry::{MigrationError, MigrationHandle, TypeVersion};
//!
//! let noop: MigrationHandle = Arc::new(|data: &[u8], _: TypeVersion, _: TypeVersion| {
//!     Ok::<_, MigrationError>(data.to_vec())
//! });
//! ```

use std::sync::Arc;

use crate::error::MigrationError;
use crate::version::TypeVersion;

/// Transforms a raw buffer from one layout revision to another
pub trait Migration: Send + Sync {
    fn migrate(
        &self,
        data: &[u8],
        from: TypeVersion,
        to: TypeVersion,
    ) -> Result<Vec<u8>, MigrationError>;
}

impl<F> Migration for F
where
    F: Fn(&[u8], TypeVersion, TypeVersion) -> Result<Vec<u8>, MigrationError> + Send + Sync,
{
    fn migrate(
        &self,
        data: &[u8],
        from: TypeVersion,
        to: TypeVersion,
    ) -> Result<Vec<u8>, MigrationError> {
        self(data, from, to)
    }
}

/// Decides whether a raw buffer satisfies a type's contract
pub trait Validation: Send + Sync {
    fn validate(&self, data: &[u8], size: usize) -> bool;
}

impl<F> Validation for F
where
    F: Fn(&[u8], usize) -> bool + Send + Sync,
{
    fn validate(&self, data: &[u8], size: usize) -> bool {
        self(data, size)
    }
}

/// Releases resources held by a value when the bridge discards it
pub trait Destructor: Send + Sync {
    fn destroy(&self, data: &mut [u8]);
}

impl<F> Destructor for F
where
    F: Fn(&mut [u8]) + Send + Sync,
{
    fn destroy(&self, data: &mut [u8]) {
        self(data)
    }
}

pub type MigrationHandle = Arc<dyn Migration>;
pub type ValidationHandle = Arc<dyn Validation>;
pub type DestructorHandle = Arc<dyn Destructor>;

/// Grows a buffer to `target_size`, keeping the leading bytes and zero-filling the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingMigration {
    pub target_size: usize,
}

impl PaddingMigration {
    pub fn new(target_size: usize) -> Self {
        Self { target_size }
    }
}

impl Migration for PaddingMigration {
    fn migrate(
        &self,
        data: &[u8],
        _from: TypeVersion,
        _to: TypeVersion,
    ) -> Result<Vec<u8>, MigrationError> {
        if data.len() > self.target_size {
            return Err(MigrationError::SizeMismatch {
                expected: self.target_size,
                actual: data.len(),
            });
        }

        let mut out = Vec::new();
        out.try_reserve_exact(self.target_size)
            .map_err(|e| MigrationError::allocation(self.target_size, e))?;
        out.extend_from_slice(data);
        out.resize(self.target_size, 0);
        Ok(out)
    }
}

/// Returns the input unchanged.
///
/// Stands in for field reordering between revisions whose byte layout is the
/// same; types that actually shuffle fields supply their own [`Migration`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityMigration;

impl Migration for IdentityMigration {
    fn migrate(
        &self,
        data: &[u8],
        _from: TypeVersion,
        _to: TypeVersion,
    ) -> Result<Vec<u8>, MigrationError> {
        let mut out = Vec::new();
        out.try_reserve_exact(data.len())
            .map_err(|e| MigrationError::allocation(data.len(), e))?;
        out.extend_from_slice(data);
        Ok(out)
    }
}
