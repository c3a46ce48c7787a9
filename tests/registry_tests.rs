//! End-to-end registry behaviour through the public API

use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use foreign_type_registry::{
    IdentityMigration, Manifest, MigrationError, MigrationHandle, PaddingMigration, RegistryError,
    SchemaHash, TypeDescriptor, TypeRegistry, TypeVersion, VersionedDescriptor,
};

fn v(major: u32, minor: u32, patch: u32) -> TypeVersion {
    TypeVersion::new(major, minor, patch)
}

fn versioned(name: &str, size: usize, version: TypeVersion) -> VersionedDescriptor {
    VersionedDescriptor::new(TypeDescriptor::new(name, size, 4), version)
}

// =============================================================================
// Versions
// =============================================================================

#[test]
fn test_version_properties() {
    let v1 = v(1, 2, 3);
    let v2 = v(1, 2, 4);
    let v3 = v(2, 0, 0);

    assert!(v2.is_compatible(&v1));
    assert!(!v1.is_compatible(&v2));
    assert!(!v3.is_compatible(&v1));
    assert_eq!(v1.compare(&v2), Ordering::Less);
    assert_eq!(v1.compare(&v1), Ordering::Equal);
}

#[test]
fn test_packed_encoding_edges() {
    let max = v(65535, 255, 255);
    assert_eq!(TypeVersion::unpack(max.pack()), max);

    let oversized = v(1, 300, 0);
    assert_ne!(TypeVersion::unpack(oversized.pack()).minor, 300);
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_downgrade_leaves_widget_untouched() {
    let mut registry = TypeRegistry::new();
    registry.register(versioned("Widget", 4, v(1, 0, 0))).unwrap();

    let err = registry.register(versioned("Widget", 4, v(0, 9, 0))).unwrap_err();
    assert!(matches!(err, RegistryError::IncompatibleVersion { .. }));
    assert_eq!(registry.lookup("Widget", None).unwrap().unwrap().version, v(1, 0, 0));
}

#[test]
fn test_widget_history_grows_in_order() {
    let mut registry = TypeRegistry::new();
    for version in [v(1, 0, 0), v(1, 1, 0), v(1, 2, 0)] {
        registry.register(versioned("Widget", 4, version)).unwrap();
    }

    assert_eq!(
        registry.history("Widget").unwrap(),
        &[v(1, 0, 0), v(1, 1, 0), v(1, 2, 0)]
    );
    assert_eq!(registry.lookup("Widget", None).unwrap().unwrap().version, v(1, 2, 0));
}

#[test]
fn test_schema_hash_follows_current_descriptor() {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            versioned("Widget", 4, v(1, 0, 0)).with_schema_hash(SchemaHash::digest(b"widget-v1")),
        )
        .unwrap();
    registry
        .register(
            versioned("Widget", 4, v(1, 1, 0)).with_schema_hash(SchemaHash::digest(b"widget-v2")),
        )
        .unwrap();

    let current = registry.lookup("Widget", None).unwrap().unwrap();
    assert_eq!(current.schema_hash, SchemaHash::digest(b"widget-v2"));
}

// =============================================================================
// Migration and validation
// =============================================================================

#[test]
fn test_point_padding_migration() {
    let mut registry = TypeRegistry::new();
    registry.register(versioned("Point", 8, v(1, 0, 0))).unwrap();
    registry
        .register(
            versioned("Point", 16, v(1, 1, 0))
                .with_min_compatible(v(1, 0, 0))
                .with_migration(PaddingMigration::new(16)),
        )
        .unwrap();

    let input: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
    let migrated = registry.migrate("Point", &input, &v(1, 0, 0), &v(1, 1, 0)).unwrap();

    assert!(matches!(migrated, Cow::Owned(_)));
    assert_eq!(migrated.len(), 16);
    assert_eq!(&migrated[..8], &input);
    assert!(migrated[8..].iter().all(|b| *b == 0));
}

#[test]
fn test_point_default_validation() {
    let mut registry = TypeRegistry::new();
    registry.register(versioned("Point", 8, v(1, 0, 0))).unwrap();

    assert!(registry.validate("Point", &[0; 8], 8));
    for len in [0usize, 4, 7, 9, 16] {
        let buffer = vec![0u8; len];
        assert!(!registry.validate("Point", &buffer, len));
    }
}

#[test]
fn test_shared_migration_handle_outlives_registration() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handle: MigrationHandle = Arc::new(move |data: &[u8], _: TypeVersion, _: TypeVersion| {
        counter.fetch_add(1, AtomicOrdering::SeqCst);
        Ok::<_, MigrationError>(data.iter().rev().copied().collect::<Vec<u8>>())
    });

    let mut registry = TypeRegistry::new();
    registry.register(versioned("Pair", 4, v(1, 0, 0))).unwrap();
    registry
        .register(
            versioned("Pair", 4, v(1, 0, 1))
                .with_min_compatible(v(1, 0, 0))
                .with_migration_handle(Arc::clone(&handle)),
        )
        .unwrap();

    let out = registry.migrate("Pair", &[1, 2, 3, 4], &v(1, 0, 0), &v(1, 0, 1)).unwrap();
    assert_eq!(&*out, &[4, 3, 2, 1]);
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);

    drop(registry);
    assert_eq!(Arc::strong_count(&handle), 1);
}

#[test]
fn test_identity_migration_copies_buffer() {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            versioned("Record", 8, v(2, 3, 0))
                .with_min_compatible(v(2, 0, 0))
                .with_migration(IdentityMigration),
        )
        .unwrap();

    let data = [5u8; 8];
    let out = registry.migrate("Record", &data, &v(2, 1, 0), &v(2, 3, 0)).unwrap();
    assert!(matches!(out, Cow::Owned(_)));
    assert_eq!(&*out, &data);

    // below the floor: refused rather than migrated
    assert!(registry.migrate("Record", &data, &v(1, 9, 0), &v(2, 3, 0)).is_err());
}

// =============================================================================
// Introspection
// =============================================================================

#[test]
fn test_statistics_for_two_single_version_types() {
    let mut registry = TypeRegistry::new();
    registry.register(versioned("Point", 8, v(1, 0, 0))).unwrap();
    registry.register(versioned("Widget", 4, v(1, 0, 0))).unwrap();

    let stats = registry.statistics();
    assert_eq!(stats.total_types, 2);
    assert_eq!(stats.total_versions, 2);
    assert_eq!(stats.average_versions_per_type(), 1.0);
}

#[test]
fn test_manifest_populates_matrix() {
    let manifest = Manifest::from_toml_str(
        r#"
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
migration = { strategy = "padding", target_size = 16 }

[[types]]
name = "Handle"
size = 8
alignment = 8

[[types.versions]]
version = "3.0.0"
"#,
    )
    .unwrap();

    let mut registry = TypeRegistry::new();
    assert!(manifest.apply(&mut registry).iter().all(|a| a.result.is_ok()));

    let matrix = registry.build_compatibility_matrix();
    let names: Vec<_> = matrix.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Handle", "Point"]);

    let point = matrix.entry("Point").unwrap();
    assert!(point.supports_migration);
    assert_eq!(point.compatible_versions, vec![v(1, 0, 0), v(1, 1, 0)]);

    let stats = registry.statistics();
    assert_eq!(stats.total_versions, 3);
    assert_eq!(stats.max_history_length, 2);
    assert_eq!(stats.average_versions_per_type(), 1.5);
}
