#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
//! Integration tests for manifest loading and dependency-graph validation.
//!
//! These tests exercise the full path from a TOML document on disk through
//! [`Manifest::load`], OS filtering, and [`TaskGraph`] construction, including
//! the interaction between OS filtering and dependency resolution.

mod common;

use common::FixtureBuilder;
use provision_cli::config::Manifest;
use provision_cli::error::{GraphError, ManifestError};
use provision_cli::platform::Os;
use provision_cli::tasks::graph::TaskGraph;

/// A realistic manifest loads, filters, validates, and orders end to end.
#[test]
fn full_pipeline_orders_dependencies_first() {
    let fixture = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "homebrew"
            name = "Homebrew"
            [tasks.mac]
            script = "scripts/install-brew.sh"

            [[tasks]]
            id = "git"
            name = "Git"
            deps = ["homebrew"]
            [tasks.mac]
            brew = "git"
            [tasks.linux]
            apt = "git"

            [[tasks]]
            id = "dotfiles"
            name = "Dotfiles"
            type = "script"
            deps = ["git"]
            [tasks.mac]
            script = "scripts/dotfiles.sh"
            [tasks.linux]
            script = "scripts/dotfiles.sh"
            "#,
        )
        .build();

    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Mac);
    assert_eq!(tasks.len(), 3);

    let graph = TaskGraph::new(&tasks).expect("valid graph");
    let order = graph.topological().expect("topological order");
    let pos = |id: &str| order.iter().position(|&n| n == id).unwrap();
    assert!(pos("homebrew") < pos("git"));
    assert!(pos("git") < pos("dotfiles"));
}

/// A dependency cycle in the manifest is rejected at graph construction.
#[test]
fn cyclic_manifest_is_rejected() {
    let fixture = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "a"
            name = "A"
            deps = ["b"]
            [tasks.linux]
            apt = "a"

            [[tasks]]
            id = "b"
            name = "B"
            deps = ["a"]
            [tasks.linux]
            apt = "b"
            "#,
        )
        .build();

    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);
    let err = TaskGraph::new(&tasks).unwrap_err();
    assert!(matches!(err, GraphError::Cycle(_)));
}

/// A dependency on a task that exists in the manifest but has no mapping for
/// the current OS is indistinguishable from a missing task: OS filtering
/// removes it before the graph is built.
#[test]
fn dependency_filtered_out_by_os_is_missing() {
    let fixture = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "chocolatey"
            name = "Chocolatey"
            [tasks.windows]
            script = "scripts/install-choco.ps1"

            [[tasks]]
            id = "git"
            name = "Git"
            deps = ["chocolatey"]
            [tasks.windows]
            choco = "git"
            [tasks.linux]
            apt = "git"
            "#,
        )
        .build();

    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");

    // On windows both tasks are present and the graph is valid.
    let win_tasks = manifest.for_os(Os::Windows);
    assert!(TaskGraph::new(&win_tasks).is_ok());

    // On linux the dependency disappears and the reference dangles.
    let linux_tasks = manifest.for_os(Os::Linux);
    let err = TaskGraph::new(&linux_tasks).unwrap_err();
    match err {
        GraphError::MissingDependency { task, dependency } => {
            assert_eq!(task, "git");
            assert_eq!(dependency, "chocolatey");
        }
        other => panic!("expected MissingDependency, got {other}"),
    }
}

/// Manifest-level validation failures surface as typed errors.
#[test]
fn validation_errors_are_typed() {
    let no_tasks = FixtureBuilder::new()
        .with_manifest("[settings]\nversion = 1\n")
        .build();
    assert!(matches!(
        Manifest::load(&no_tasks.manifest_path()).unwrap_err(),
        ManifestError::MissingTasks
    ));

    let duplicate = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "git"
            name = "Git"
            [tasks.linux]
            apt = "git"

            [[tasks]]
            id = "git"
            name = "Git again"
            [tasks.linux]
            apt = "git"
            "#,
        )
        .build();
    assert!(matches!(
        Manifest::load(&duplicate.manifest_path()).unwrap_err(),
        ManifestError::DuplicateId(id) if id == "git"
    ));
}

/// Tasks without any schedulable mapping for the OS never enter the run.
#[test]
fn for_os_drops_version_only_mappings() {
    let fixture = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "pinned"
            name = "Pinned but inert"
            [tasks.linux]
            version = "2.0"

            [[tasks]]
            id = "real"
            name = "Real"
            [tasks.linux]
            apt = "real"
            "#,
        )
        .build();

    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let ids: Vec<&str> = manifest
        .for_os(Os::Linux)
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, vec!["real"]);
}
