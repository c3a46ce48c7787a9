//! Type Registry
//!
//! Tracks the current versioned descriptor and the version history of every
//! foreign type known to the bridge.
//!
//! The registry is a plain context object: it has no internal locking, and
//! owners that share it across threads wrap it in their own mutex.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::descriptor::VersionedDescriptor;
use crate::error::{RegistryError, Result};
use crate::version::TypeVersion;

/// Outcome of a single `register` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First registration of the name
    Inserted,
    /// Replaced the current descriptor with a newer compatible one
    Upgraded { previous: TypeVersion },
    /// Compatible but not newer; nothing changed
    Unchanged { current: TypeVersion },
}

/// Current descriptor plus every version registered for one name
pub(crate) struct TypeEntry {
    pub(crate) descriptor: VersionedDescriptor,
    pub(crate) history: Vec<TypeVersion>,
}

/// Registry of versioned foreign type descriptors
pub struct TypeRegistry {
    types: HashMap<String, TypeEntry>,
    config: RegistryConfig,
}

impl TypeRegistry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            types: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a descriptor, or upgrade the existing one for its name.
    ///
    /// A known name only moves forward within its major line. A strictly newer
    /// version replaces the current descriptor and is appended to the history;
    /// an older or equal version the current descriptor still reads is accepted
    /// without any change. Anything else fails with `IncompatibleVersion` and
    /// leaves the registry untouched.
    pub fn register(&mut self, descriptor: VersionedDescriptor) -> Result<Registration> {
        self.check_layout(&descriptor)?;

        let incoming = descriptor.version;

        let Some(entry) = self.types.get_mut(descriptor.name()) else {
            debug!(name = descriptor.name(), version = %incoming, "registering new type");
            let name = descriptor.name().to_string();
            self.types.insert(
                name,
                TypeEntry {
                    descriptor,
                    history: vec![incoming],
                },
            );
            return Ok(Registration::Inserted);
        };

        let current = entry.descriptor.version;
        // Newer versions must read the current one; older ones must be
        // readable by the current descriptor.
        let accepted = if incoming > current {
            incoming.is_compatible(&current)
        } else {
            entry.descriptor.is_compatible_with(&incoming)
        };
        if !accepted {
            warn!(
                name = descriptor.name(),
                current = %current,
                requested = %incoming,
                "rejecting incompatible registration"
            );
            return Err(RegistryError::incompatible(descriptor.name(), current, incoming));
        }

        if incoming > current {
            info!(name = descriptor.name(), from = %current, to = %incoming, "upgrading type");
            entry.descriptor = descriptor;
            entry.history.push(incoming);
            Ok(Registration::Upgraded { previous: current })
        } else {
            debug!(
                name = descriptor.name(),
                current = %current,
                requested = %incoming,
                "registration not newer, ignored"
            );
            Ok(Registration::Unchanged { current })
        }
    }

    /// Get the current descriptor for `name`.
    ///
    /// When `required` is given, the descriptor must be able to read it.
    pub fn lookup(
        &self,
        name: &str,
        required: Option<&TypeVersion>,
    ) -> Result<Option<&VersionedDescriptor>> {
        let Some(entry) = self.types.get(name) else {
            debug!(name, "lookup of unknown type");
            return Ok(None);
        };

        if let Some(required) = required {
            if !entry.descriptor.is_compatible_with(required) {
                return Err(RegistryError::incompatible(name, entry.descriptor.version, *required));
            }
        }

        Ok(Some(&entry.descriptor))
    }

    /// Every version registered for `name`, oldest first
    pub fn history(&self, name: &str) -> Option<&[TypeVersion]> {
        self.types.get(name).map(|entry| entry.history.as_slice())
    }

    /// Whether `name` is known and its current descriptor reads `version`
    pub fn supports(&self, name: &str, version: &TypeVersion) -> bool {
        self.types
            .get(name)
            .is_some_and(|entry| entry.descriptor.is_compatible_with(version))
    }

    /// Bring `data` written at `old_version` up to date.
    ///
    /// Data that needs no migration is handed back borrowed; a migrated buffer
    /// is newly allocated and owned by the caller.
    pub fn migrate<'a>(
        &self,
        name: &str,
        data: &'a [u8],
        old_version: &TypeVersion,
        target_version: &TypeVersion,
    ) -> Result<Cow<'a, [u8]>> {
        let entry = self
            .types
            .get(name)
            .ok_or_else(|| RegistryError::not_found(name))?;
        let descriptor = &entry.descriptor;

        if !descriptor.needs_migration(old_version) {
            if descriptor.is_compatible_with(old_version) {
                return Ok(Cow::Borrowed(data));
            }
            return Err(RegistryError::incompatible(name, descriptor.version, *old_version));
        }

        let Some(migration) = &descriptor.migration else {
            warn!(name, from = %old_version, "migration flagged but no capability attached");
            return Err(RegistryError::MigrationFailed {
                name: name.to_string(),
                from: *old_version,
                to: *target_version,
                source: None,
            });
        };

        match migration.migrate(data, *old_version, *target_version) {
            Ok(migrated) => {
                debug!(
                    name,
                    from = %old_version,
                    to = %target_version,
                    bytes = migrated.len(),
                    "migrated buffer"
                );
                Ok(Cow::Owned(migrated))
            }
            Err(e) => {
                warn!(
                    name,
                    from = %old_version,
                    to = %target_version,
                    error = %e,
                    "migration failed"
                );
                Err(RegistryError::MigrationFailed {
                    name: name.to_string(),
                    from: *old_version,
                    to: *target_version,
                    source: Some(e),
                })
            }
        }
    }

    /// Check `data` against the type's validation contract.
    ///
    /// Unknown names are invalid. Without a validation capability the
    /// configured size policy applies to `size`.
    pub fn validate(&self, name: &str, data: &[u8], size: usize) -> bool {
        let Some(entry) = self.types.get(name) else {
            return false;
        };
        let descriptor = &entry.descriptor;

        match &descriptor.validation {
            Some(validation) => validation.validate(data, size),
            None => self.config.validation.default_policy.accepts(descriptor.base.size, size),
        }
    }

    /// Like [`TypeRegistry::validate`], but reports why the buffer was refused
    pub fn ensure_valid(&self, name: &str, data: &[u8]) -> Result<()> {
        if !self.types.contains_key(name) {
            return Err(RegistryError::not_found(name));
        }
        if self.validate(name, data, data.len()) {
            Ok(())
        } else {
            Err(RegistryError::ValidationFailed {
                name: name.to_string(),
                size: data.len(),
            })
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &TypeEntry)> {
        self.types.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    fn check_layout(&self, descriptor: &VersionedDescriptor) -> Result<()> {
        let base = &descriptor.base;
        if base.name.is_empty() {
            return Err(RegistryError::InvalidSchema("type name must not be empty".to_string()));
        }
        if base.alignment == 0 {
            return Err(RegistryError::InvalidSchema(format!(
                "{}: alignment must be non-zero",
                base.name
            )));
        }
        if self.config.registry.enforce_alignment {
            if !base.alignment.is_power_of_two() {
                return Err(RegistryError::InvalidSchema(format!(
                    "{}: alignment {} is not a power of two",
                    base.name, base.alignment
                )));
            }
            if base.size % base.alignment != 0 {
                return Err(RegistryError::InvalidSchema(format!(
                    "{}: size {} is not a multiple of alignment {}",
                    base.name, base.size, base.alignment
                )));
            }
        }
        Ok(())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
