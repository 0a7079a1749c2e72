//! Resolved graph tests: build order, API lookups and JSON output

use pretty_assertions::assert_eq;
use rstest::rstest;
use trellis_build::{BuildError, Builder, ResolvedGraph};
use trellis_package::{keys, DependencyRef, Package, PackageId, PackageIndex};

fn id(name: &str) -> PackageId {
    PackageId::new("core", name)
}

// Test helper: resolve a graph rooted at `root` from (name, deps, apis, req_apis)
fn resolve(root: &str, packages: &[(&str, &[&str], &[&str], &[&str])]) -> ResolvedGraph {
    let index = packages
        .iter()
        .fold(PackageIndex::new(), |index, (name, deps, apis, req_apis)| {
            index.with(
                Package::new("core", *name)
                    .with_values(keys::DEPS, deps)
                    .with_values(keys::APIS, apis)
                    .with_values(keys::REQ_APIS, req_apis),
            )
        });
    let mut builder = Builder::new(index);
    builder
        .add_target(&DependencyRef::parse("core", root).unwrap())
        .unwrap();
    builder.run_to_fixpoint().unwrap();
    builder.into_graph().unwrap()
}

#[test]
fn test_build_order_linear() {
    // pkg1 -> pkg2 -> pkg3
    let graph = resolve(
        "pkg1",
        &[
            ("pkg1", &["pkg2"], &[], &[]),
            ("pkg2", &["pkg3"], &[], &[]),
            ("pkg3", &[], &[], &[]),
        ],
    );

    assert_eq!(
        graph.build_order().unwrap(),
        vec![id("pkg3"), id("pkg2"), id("pkg1")]
    );
}

#[test]
fn test_build_order_diamond() {
    // root -> left -> bottom
    //      -> right -> bottom
    let graph = resolve(
        "root",
        &[
            ("root", &["left", "right"], &[], &[]),
            ("left", &["bottom"], &[], &[]),
            ("right", &["bottom"], &[], &[]),
            ("bottom", &[], &[], &[]),
        ],
    );

    assert_eq!(
        graph.build_order().unwrap(),
        vec![id("bottom"), id("left"), id("right"), id("root")]
    );
}

#[test]
fn test_unreachable_packages_are_not_resolved() {
    let graph = resolve(
        "app",
        &[("app", &[], &[], &[]), ("orphan", &[], &[], &[])],
    );
    assert_eq!(graph.len(), 1);
    assert!(!graph.contains(&id("orphan")));
    assert!(matches!(
        graph.package(&id("orphan")),
        Err(BuildError::UnknownPackage(_))
    ));
}

#[rstest]
#[case("console", vec!["uart"])]
#[case("log", vec!["full-log", "null-log"])]
#[case("missing", vec![])]
fn test_api_providers(#[case] api: &str, #[case] expected: Vec<&str>) {
    let graph = resolve(
        "app",
        &[
            ("app", &["uart", "full-log", "null-log"], &[], &["console"]),
            ("uart", &[], &["console"], &[]),
            ("full-log", &[], &["log"], &[]),
            ("null-log", &[], &["log"], &[]),
        ],
    );

    let providers: Vec<PackageId> = graph.api_providers(api).into_iter().cloned().collect();
    let expected: Vec<PackageId> = expected.into_iter().map(id).collect();
    assert_eq!(providers, expected);
}

#[test]
fn test_unsatisfied_apis() {
    let graph = resolve(
        "app",
        &[
            ("app", &["shell"], &[], &["console", "stats"]),
            ("shell", &[], &["stats"], &["console"]),
        ],
    );

    let missing: Vec<(String, String)> = graph
        .unsatisfied_apis()
        .into_iter()
        .map(|(pkg, api)| (pkg.name.clone(), api.name.clone()))
        .collect();
    assert_eq!(
        missing,
        vec![
            ("app".to_string(), "console".to_string()),
            ("shell".to_string(), "console".to_string()),
        ]
    );
    assert!(matches!(
        graph.check_apis(),
        Err(BuildError::UnsatisfiedApi { .. })
    ));
}

#[test]
fn test_graph_json() {
    let graph = resolve(
        "app",
        &[("app", &["lib"], &["app-api"], &[]), ("lib", &[], &[], &[])],
    );
    let json: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();

    let packages = json["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0]["id"]["name"], "app");
    assert_eq!(packages[0]["dependencies"][0]["name"], "lib");
    assert_eq!(packages[0]["apis"][0]["repository"], "core");
    assert!(packages[1]["compiler_info"]["cflags"]
        .as_array()
        .unwrap()
        .is_empty());
}
