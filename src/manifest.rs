//! Declarative type manifests
//!
//! A manifest lists foreign types and the versions to register for each, so a
//! registry can be populated from a file instead of code.
//!
//! ## Example manifest (types.toml):
//! ```toml
//! [[types]]
//! name = "Point"
//! alignment = 4
//! min_compatible = "1.0.0"
//!
//! [[types.versions]]
//! version = "1.0.0"
//! size = 8
//!
//! [[types.versions]]
//! version = "1.1.0"
//! size = 16
//! migration = { strategy = "padding", target_size = 16 }
//! ```
//!
//! JSON manifests use the same shape and are selected by a `.json` extension.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capability::{IdentityMigration, PaddingMigration};
use crate::checksum::SchemaHash;
use crate::descriptor::{TypeDescriptor, VersionedDescriptor};
use crate::error::{RegistryError, Result};
use crate::registry::{Registration, TypeRegistry};
use crate::version::TypeVersion;

/// A set of type declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

/// One foreign type and its versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    /// Size shared by versions that do not declare their own
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default = "default_alignment")]
    pub alignment: usize,
    /// Floor shared by versions that do not declare their own
    #[serde(default)]
    pub min_compatible: Option<TypeVersion>,
    /// Registered in the order listed
    pub versions: Vec<VersionSpec>,
}

/// One registered revision of a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSpec {
    pub version: TypeVersion,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub alignment: Option<usize>,
    #[serde(default)]
    pub min_compatible: Option<TypeVersion>,
    #[serde(default)]
    pub schema_hash: Option<SchemaHash>,
    #[serde(default)]
    pub migration: Option<MigrationSpec>,
}

/// Reference migration strategies a manifest can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MigrationSpec {
    Padding { target_size: usize },
    Identity,
}

/// Result of registering one manifest version
#[derive(Debug)]
pub struct AppliedVersion {
    pub name: String,
    pub version: TypeVersion,
    pub result: Result<Registration>,
}

fn default_alignment() -> usize {
    1
}

impl Manifest {
    /// Load a manifest, choosing JSON or TOML by file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.check()?;
        Ok(manifest)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Register every listed version into `registry`.
    ///
    /// Rejected versions do not stop the remaining ones; each outcome is
    /// reported in manifest order.
    pub fn apply(&self, registry: &mut TypeRegistry) -> Vec<AppliedVersion> {
        let mut applied = Vec::new();

        for spec in &self.types {
            for version in &spec.versions {
                let result = spec
                    .descriptor(version)
                    .and_then(|descriptor| registry.register(descriptor));

                if let Err(e) = &result {
                    warn!(
                        name = %spec.name,
                        version = %version.version,
                        error = %e,
                        "manifest version rejected"
                    );
                } else {
                    debug!(
                        name = %spec.name,
                        version = %version.version,
                        "manifest version applied"
                    );
                }

                applied.push(AppliedVersion {
                    name: spec.name.clone(),
                    version: version.version,
                    result,
                });
            }
        }

        applied
    }

    fn check(&self) -> Result<()> {
        for spec in &self.types {
            if spec.versions.is_empty() {
                return Err(RegistryError::Manifest(format!("{}: no versions listed", spec.name)));
            }
            for version in &spec.versions {
                if version.size.or(spec.size).is_none() {
                    return Err(RegistryError::Manifest(format!(
                        "{} v{}: no size declared",
                        spec.name, version.version
                    )));
                }
            }
        }
        Ok(())
    }
}

impl TypeSpec {
    fn descriptor(&self, version: &VersionSpec) -> Result<VersionedDescriptor> {
        let size = version.size.or(self.size).ok_or_else(|| {
            RegistryError::Manifest(format!("{} v{}: no size declared", self.name, version.version))
        })?;
        let alignment = version.alignment.unwrap_or(self.alignment);

        let base = TypeDescriptor::new(self.name.clone(), size, alignment);
        let mut descriptor = VersionedDescriptor::new(base, version.version);

        // A floor above the version itself would make the descriptor unreadable
        if let Some(floor) = version.min_compatible.or(self.min_compatible) {
            descriptor = descriptor.with_min_compatible(floor.min(version.version));
        }
        if let Some(hash) = version.schema_hash {
            descriptor = descriptor.with_schema_hash(hash);
        }
        descriptor = match version.migration {
            Some(MigrationSpec::Padding { target_size }) => {
                descriptor.with_migration(PaddingMigration::new(target_size))
            }
            Some(MigrationSpec::Identity) => descriptor.with_migration(IdentityMigration),
            None => descriptor,
        };

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT: &str = r#"
[[types]]
name = "Point"
alignment = 4
min_compatible = "1.0.0"

[[types.versions]]
version = "1.0.0"
size = 8

[[types.versions]]
version = "1.1.0"
size = 16
schema_hash = "00000000000000ff"
migration = { strategy = "padding", target_size = 16 }
"#;

    #[test]
    fn test_parse_toml_manifest() {
        let manifest = Manifest::from_toml_str(POINT).unwrap();
        assert_eq!(manifest.types.len(), 1);

        let point = &manifest.types[0];
        assert_eq!(point.alignment, 4);
        assert_eq!(point.versions[1].migration, Some(MigrationSpec::Padding { target_size: 16 }));
        assert_eq!(point.versions[1].schema_hash, Some(SchemaHash::new(0xff)));
    }

    #[test]
    fn test_apply_registers_in_order() {
        let manifest = Manifest::from_toml_str(POINT).unwrap();
        let mut registry = TypeRegistry::new();
        let applied = manifest.apply(&mut registry);

        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|a| a.result.is_ok()));

        let current = registry.lookup("Point", None).unwrap().unwrap();
        assert_eq!(current.version, TypeVersion::new(1, 1, 0));
        assert_eq!(current.base.size, 16);
        assert!(current.supports_migration);

        let migrated = registry
            .migrate("Point", &[7; 8], &TypeVersion::new(1, 0, 0), &TypeVersion::new(1, 1, 0))
            .unwrap();
        assert_eq!(migrated.len(), 16);
    }

    #[test]
    fn test_apply_reports_rejections() {
        let manifest = Manifest::from_json_str(
            r#"{"types": [{"name": "Widget", "size": 4, "alignment": 4,
                "versions": [{"version": "1.0.0"}, {"version": "0.9.0"}, {"version": "1.1.0"}]}]}"#,
        )
        .unwrap();
        let mut registry = TypeRegistry::new();
        let applied = manifest.apply(&mut registry);

        assert!(applied[0].result.is_ok());
        assert!(matches!(applied[1].result, Err(RegistryError::IncompatibleVersion { .. })));
        assert!(applied[2].result.is_ok());
        assert_eq!(
            registry.history("Widget").unwrap(),
            &[TypeVersion::new(1, 0, 0), TypeVersion::new(1, 1, 0)]
        );
    }

    #[test]
    fn test_missing_size_rejected() {
        let err = Manifest::from_toml_str(
            r#"
[[types]]
name = "Blob"
[[types.versions]]
version = "1.0.0"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::Manifest(_)));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("types.toml");
        std::fs::write(&toml_path, POINT).unwrap();
        assert_eq!(Manifest::load(&toml_path).unwrap().types[0].name, "Point");

        let json_path = dir.path().join("types.json");
        std::fs::write(&json_path, r#"{"types": []}"#).unwrap();
        assert!(Manifest::load(&json_path).unwrap().types.is_empty());
    }
}
