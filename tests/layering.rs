//! The domain layer must not reach into the layers built on top of it.

const DOMAIN_SOURCES: &[(&str, &str)] = &[
    ("domain/mod.rs", include_str!("../src/domain/mod.rs")),
    ("domain/entities/mod.rs", include_str!("../src/domain/entities/mod.rs")),
    ("domain/entities/pool.rs", include_str!("../src/domain/entities/pool.rs")),
    (
        "domain/entities/cached_image.rs",
        include_str!("../src/domain/entities/cached_image.rs"),
    ),
];

const OUTER_LAYERS: &[&str] = &[
    "crate::application",
    "crate::infrastructure",
    "crate::api",
    "crate::state",
    "crate::server",
];

#[test]
fn test_domain_depends_on_no_outer_layer() {
    for (file, source) in DOMAIN_SOURCES {
        for layer in OUTER_LAYERS {
            assert!(!source.contains(layer), "{} references {}", file, layer);
        }
    }
}

#[test]
fn test_background_processing_lives_in_application() {
    let application = include_str!("../src/application/mod.rs");

    assert!(application.contains("pub mod background_job;"));
    assert!(application.contains("pub mod background_worker;"));
}
