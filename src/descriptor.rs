//! Type descriptors and their versioned wrappers

use std::fmt;
use std::sync::Arc;

use crate::capability::{
    Destructor, DestructorHandle, Migration, MigrationHandle, Validation, ValidationHandle,
};
use crate::checksum::SchemaHash;
use crate::version::TypeVersion;

/// Shape of a foreign type as seen by the marshaling bridge
#[derive(Clone)]
pub struct TypeDescriptor {
    /// Unique name of the type (e.g., "Point", "Widget")
    pub name: String,
    /// Size of one value in bytes
    pub size: usize,
    /// Required alignment in bytes
    pub alignment: usize,
    /// Invoked by the bridge when a value is discarded
    pub destructor: Option<DestructorHandle>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, size: usize, alignment: usize) -> Self {
        Self {
            name: name.into(),
            size,
            alignment,
            destructor: None,
        }
    }

    /// Layout of a host-side Rust type, as this compiler lays it out.
    ///
    /// Only describes values the host itself owns. Types marshaled across the
    /// script boundary should be registered with [`TypeDescriptor::new`] and
    /// the explicit size and alignment the bridge uses.
    pub fn of<T>(name: impl Into<String>) -> Self {
        Self::new(name, std::mem::size_of::<T>(), std::mem::align_of::<T>())
    }

    pub fn with_destructor(mut self, destructor: impl Destructor + 'static) -> Self {
        self.destructor = Some(Arc::new(destructor));
        self
    }

    /// Run the destruction capability over `data`, if one is attached.
    ///
    /// Returns whether a destructor ran.
    pub fn destroy(&self, data: &mut [u8]) -> bool {
        match &self.destructor {
            Some(destructor) => {
                destructor.destroy(data);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("alignment", &self.alignment)
            .field("destructor", &self.destructor.is_some())
            .finish()
    }
}

/// A descriptor annotated with its layout revision and upgrade capabilities
#[derive(Clone)]
pub struct VersionedDescriptor {
    pub base: TypeDescriptor,
    /// Current layout revision
    pub version: TypeVersion,
    /// Oldest revision this descriptor still reads
    pub min_compatible: TypeVersion,
    pub migration: Option<MigrationHandle>,
    pub validation: Option<ValidationHandle>,
    pub schema_hash: SchemaHash,
    pub supports_migration: bool,
}

impl VersionedDescriptor {
    /// Wrap a base descriptor; the compatibility floor starts at `version`.
    pub fn new(base: TypeDescriptor, version: TypeVersion) -> Self {
        Self {
            base,
            version,
            min_compatible: version,
            migration: None,
            validation: None,
            schema_hash: SchemaHash::default(),
            supports_migration: false,
        }
    }

    pub fn with_min_compatible(mut self, min_compatible: TypeVersion) -> Self {
        self.min_compatible = min_compatible;
        self
    }

    /// Attach a migration capability and flag migration as supported
    pub fn with_migration(mut self, migration: impl Migration + 'static) -> Self {
        self.migration = Some(Arc::new(migration));
        self.supports_migration = true;
        self
    }

    /// Attach an already shared migration capability
    pub fn with_migration_handle(mut self, migration: MigrationHandle) -> Self {
        self.migration = Some(migration);
        self.supports_migration = true;
        self
    }

    pub fn with_validation(mut self, validation: impl Validation + 'static) -> Self {
        self.validation = Some(Arc::new(validation));
        self
    }

    pub fn with_validation_handle(mut self, validation: ValidationHandle) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_schema_hash(mut self, schema_hash: SchemaHash) -> Self {
        self.schema_hash = schema_hash;
        self
    }

    /// Set the supports-migration flag without touching the capability
    pub fn with_supports_migration(mut self, supported: bool) -> Self {
        self.supports_migration = supported;
        self
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// Whether data written at `v` can be read through this descriptor
    pub fn is_compatible_with(&self, v: &TypeVersion) -> bool {
        self.version.is_compatible(v) && *v >= self.min_compatible
    }

    /// Whether data at `v` is strictly older, still compatible, and migratable
    pub fn needs_migration(&self, v: &TypeVersion) -> bool {
        self.supports_migration && self.version > *v && self.is_compatible_with(v)
    }
}

impl fmt::Debug for VersionedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedDescriptor")
            .field("base", &self.base)
            .field("version", &self.version)
            .field("min_compatible", &self.min_compatible)
            .field("migration", &self.migration.is_some())
            .field("validation", &self.validation.is_some())
            .field("schema_hash", &self.schema_hash)
            .field("supports_migration", &self.supports_migration)
            .finish()
    }
}
