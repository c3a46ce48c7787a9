//! Read-only views derived from registry state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::TypeRegistry;
use crate::version::TypeVersion;

/// Compatibility summary for one registered type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    pub name: String,
    pub current: TypeVersion,
    pub min_compatible: TypeVersion,
    pub supports_migration: bool,
    /// History entries the current descriptor still reads, oldest first
    pub compatible_versions: Vec<TypeVersion>,
}

/// Compatibility entries for every registered type, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityMatrix {
    pub entries: Vec<CompatibilityEntry>,
}

impl CompatibilityMatrix {
    pub fn entry(&self, name: &str) -> Option<&CompatibilityEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompatibilityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Aggregate counts over the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_types: usize,
    /// Sum of all history lengths
    pub total_versions: usize,
    pub types_with_migration: usize,
    pub types_with_validation: usize,
    pub max_history_length: usize,
}

impl RegistryStats {
    pub fn average_versions_per_type(&self) -> f64 {
        if self.total_types == 0 {
            0.0
        } else {
            self.total_versions as f64 / self.total_types as f64
        }
    }
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} types, {} versions ({:.2} per type, max {}), {} migratable, {} with validators",
            self.total_types,
            self.total_versions,
            self.average_versions_per_type(),
            self.max_history_length,
            self.types_with_migration,
            self.types_with_validation,
        )
    }
}

impl TypeRegistry {
    /// Snapshot which historical versions each type's current descriptor still reads
    pub fn build_compatibility_matrix(&self) -> CompatibilityMatrix {
        let mut entries: Vec<CompatibilityEntry> = self
            .entries()
            .map(|(name, entry)| {
                let descriptor = &entry.descriptor;
                CompatibilityEntry {
                    name: name.to_string(),
                    current: descriptor.version,
                    min_compatible: descriptor.min_compatible,
                    supports_migration: descriptor.supports_migration,
                    compatible_versions: entry
                        .history
                        .iter()
                        .filter(|v| descriptor.is_compatible_with(v))
                        .copied()
                        .collect(),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        CompatibilityMatrix { entries }
    }

    pub fn statistics(&self) -> RegistryStats {
        self.entries()
            .fold(RegistryStats::default(), |mut stats, (_, entry)| {
                stats.total_types += 1;
                stats.total_versions += entry.history.len();
                stats.max_history_length = stats.max_history_length.max(entry.history.len());
                if entry.descriptor.supports_migration {
                    stats.types_with_migration += 1;
                }
                if entry.descriptor.validation.is_some() {
                    stats.types_with_validation += 1;
                }
                stats
            })
    }
}
