//! Runtime hash

use cbo_domain::value_objects::{Capability, ComponentDescriptor, DiscoveredTypes};
use cbo_infrastructure::runtime::RuntimeHashBuilder;
use std::fs;
use tempfile::TempDir;

fn discovered(names: &[&str]) -> DiscoveredTypes {
    DiscoveredTypes::new(
        names
            .iter()
            .map(|name| ComponentDescriptor {
                name: (*name).to_string(),
                module: "app".to_string(),
                capabilities: vec![Capability::Component],
            })
            .collect(),
    )
}

#[test]
fn test_hash_is_stable() {
    let a = RuntimeHashBuilder::new("site")
        .with_components(&discovered(&["a", "b"]))
        .build()
        .unwrap();
    let b = RuntimeHashBuilder::new("site")
        .with_components(&discovered(&["b", "a"]))
        .build()
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str().len(), 64);
}

#[test]
fn test_hash_depends_on_application_and_components() {
    let base = RuntimeHashBuilder::new("site")
        .with_components(&discovered(&["a"]))
        .build()
        .unwrap();
    let other_app = RuntimeHashBuilder::new("intranet")
        .with_components(&discovered(&["a"]))
        .build()
        .unwrap();
    let more = RuntimeHashBuilder::new("site")
        .with_components(&discovered(&["a", "b"]))
        .build()
        .unwrap();
    assert_ne!(base, other_app);
    assert_ne!(base, more);
}

#[test]
fn test_hash_tracks_watched_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("one.bin"), b"1").unwrap();
    let build = || RuntimeHashBuilder::new("site").with_path(dir.path()).build().unwrap();

    let before = build();
    assert_eq!(before, build());

    fs::create_dir(dir.path().join("plugins")).unwrap();
    fs::write(dir.path().join("plugins/two.bin"), b"22").unwrap();
    assert_ne!(before, build());
}

#[test]
fn test_missing_folder_contributes_nothing() {
    let dir = TempDir::new().unwrap();
    let without = RuntimeHashBuilder::new("site").build().unwrap();
    let missing = RuntimeHashBuilder::new("site")
        .with_path(dir.path().join("absent"))
        .build()
        .unwrap();
    assert_eq!(without, missing);
}
