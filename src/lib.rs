//! Foreign Type Registry
//!
//! Tracks versioned descriptors for opaque data types exchanged between a host
//! application and an embedded scripting engine.
//!
//! ## Features
//!
//! - **Layout Versions**: Every type carries a (major, minor, patch) revision
//!   and a floor below which old data is no longer read
//! - **Append-Only History**: Each name keeps every version it was registered at
//! - **Migration Dispatch**: Older buffers are upgraded through a capability
//!   supplied by the registering collaborator
//! - **Validation**: Buffers are checked by a custom validator or a size rule
//! - **Introspection**: Compatibility matrix and aggregate statistics
//!
//! ## Example
//!
//! ```
//! use foreign_type_registry::{
//!     PaddingMigration, TypeDescriptor, TypeRegistry, TypeVersion, VersionedDescriptor,
//! };
//!
//! let mut registry = TypeRegistry::new();
//! let v1 = TypeVersion::new(1, 0, 0);
//! let v2 = TypeVersion::new(1, 1, 0);
//!
//! registry.register(VersionedDescriptor::new(TypeDescriptor::new("Point", 8, 4), v1))?;
//! registry.register(
//!     VersionedDescriptor::new(TypeDescriptor::new("Point", 16, 4), v2)
//!         .with_min_compatible(v1)
//!         .with_migration(PaddingMigration::new(16)),
//! )?;
//!
//! let upgraded = registry.migrate("Point", &[1; 8], &v1, &v2)?;
//! assert_eq!(upgraded.len(), 16);
//! # Ok::<(), foreign_type_registry::RegistryError>(())
//! ```
//!
//! The bridge that turns script values into byte buffers lives outside this
//! crate; the registry only describes types by name, size and alignment.

pub mod capability;
pub mod checksum;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod introspection;
pub mod manifest;
pub mod registry;
pub mod version;

pub use capability::{
    Destructor, DestructorHandle, IdentityMigration, Migration, MigrationHandle, PaddingMigration,
    Validation, ValidationHandle,
};
pub use checksum::SchemaHash;
pub use config::{RegistryConfig, SizePolicy};
pub use descriptor::{TypeDescriptor, VersionedDescriptor};
pub use error::{MigrationError, RegistryError, Result};
pub use introspection::{CompatibilityEntry, CompatibilityMatrix, RegistryStats};
pub use manifest::{AppliedVersion, Manifest, MigrationSpec, TypeSpec, VersionSpec};
pub use registry::{Registration, TypeRegistry};
pub use version::TypeVersion;
