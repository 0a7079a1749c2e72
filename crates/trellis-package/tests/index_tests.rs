//! Manifest directory loading and resolution through the package index

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use trellis_package::{
    keys, DependencyRef, DependencyResolver, Identity, IdentitySet, PackageError, PackageId,
    PackageIndex, ResolveError,
};

fn write_manifest(root: &Path, dir: &str, content: &str) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("pkg.toml"), content).unwrap();
}

fn active(ids: &[&str]) -> IdentitySet {
    ids.iter().map(|s| Identity::from(*s)).collect()
}

#[test]
fn test_load_dir_indexes_nested_manifests() {
    let temp = TempDir::new().unwrap();
    write_manifest(
        temp.path(),
        "core/sys/log",
        r#"
[package]
name = "sys/log"
repository = "core"

[pkg]
deps = ["sys/stats"]
"#,
    );
    write_manifest(
        temp.path(),
        "core/sys/stats",
        r#"
[package]
name = "sys/stats"
repository = "core"
"#,
    );
    fs::write(temp.path().join("README.md"), "not a manifest").unwrap();

    let index = PackageIndex::load_dir(temp.path()).unwrap();
    assert_eq!(index.len(), 2);

    let dep = DependencyRef::parse("apps", "@core/sys/log").unwrap();
    let package = index.resolve(&dep).unwrap();
    assert_eq!(package.id(), PackageId::new("core", "sys/log"));
    assert_eq!(
        trellis_package::resolve(&package, keys::DEPS, &IdentitySet::new()),
        vec!["sys/stats"]
    );
}

#[test]
fn test_load_dir_reports_bad_manifest() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "broken", "[package\nname = ");

    let err = PackageIndex::load_dir(temp.path()).unwrap_err();
    assert!(matches!(err, PackageError::ParseError(_)));
}

#[test]
fn test_conditional_resolution_from_manifest() {
    let temp = TempDir::new().unwrap();
    write_manifest(
        temp.path(),
        "hw/bsp",
        r#"
[package]
name = "hw/bsp/native"
repository = "core"
version = "0.9.0"

[pkg]
cflags = ["-O2"]
identities = ["BSP_NATIVE"]

[identity.BSP_NATIVE]
cflags = ["-DNATIVE"]
identities = ["POSIX"]

[identity.DEBUG]
cflags = ["-g"]
"#,
    );

    let index = PackageIndex::load_dir(temp.path()).unwrap();
    let dep = DependencyRef::parse("core", "hw/bsp/native>=0.9").unwrap();
    let package = index.resolve(&dep).unwrap();

    assert_eq!(
        trellis_package::resolve(&package, keys::CFLAGS, &active(&["DEBUG", "BSP_NATIVE"])),
        vec!["-O2", "-DNATIVE", "-g"]
    );
    assert_eq!(
        trellis_package::resolve(&package, keys::IDENTITIES, &active(&["BSP_NATIVE"])),
        vec!["BSP_NATIVE", "POSIX"]
    );
    assert!(trellis_package::resolve(&package, keys::LFLAGS, &active(&["DEBUG"])).is_empty());
}

#[test]
fn test_missing_reference_reports_name() {
    let index = PackageIndex::new();
    let dep = DependencyRef::parse("repo", "missing").unwrap();
    let err = index.resolve(&dep).unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(_)));
    insta::assert_snapshot!(err.to_string(), @"Package not found: @repo/missing");
}
