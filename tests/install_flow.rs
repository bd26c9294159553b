#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
//! Integration tests for the full install pipeline: manifest on disk, OS
//! filtering, graph validation, and the execution engine driven by a
//! recording executor.

mod common;

use common::{FixtureBuilder, ManifestFixture, RecordingExecutor};
use provision_cli::config::Manifest;
use provision_cli::platform::Os;
use provision_cli::tasks::TaskStatus;
use provision_cli::tasks::graph::TaskGraph;
use provision_cli::tasks::runner::Runner;

fn workstation_fixture() -> ManifestFixture {
    FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "curl"
            name = "curl"
            [tasks.linux]
            apt = "curl"

            [[tasks]]
            id = "git"
            name = "Git"
            [tasks.linux]
            apt = "git"

            [[tasks]]
            id = "dotfiles"
            name = "Dotfiles"
            type = "script"
            deps = ["git", "curl"]
            [tasks.linux]
            script = "scripts/dotfiles.sh"
            post = ["scripts/post-config.sh"]
            "#,
        )
        .with_script("scripts/dotfiles.sh")
        .with_script("scripts/post-config.sh")
        .build()
}

/// The happy path: every task succeeds and dependency order is respected in
/// the actual commands spawned.
#[test]
fn install_flow_runs_everything_in_order() {
    let fixture = workstation_fixture();
    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);
    TaskGraph::new(&tasks).expect("valid graph");

    let exec = RecordingExecutor::passing();
    let results = Runner::new(Os::Linux, fixture.root_path(), false, &exec)
        .run(&tasks)
        .expect("run completes");

    for id in ["curl", "git", "dotfiles"] {
        assert_eq!(results[id].status, TaskStatus::Success, "task {id}");
    }

    let calls = exec.call_log();
    assert_eq!(calls.len(), 4, "two apt installs, one script, one post");
    let pos = |needle: &str| {
        calls
            .iter()
            .position(|c| c.contains(needle))
            .unwrap_or_else(|| panic!("no call containing {needle} in {calls:?}"))
    };
    assert!(pos("apt-get install -y git") < pos("dotfiles.sh"));
    assert!(pos("apt-get install -y curl") < pos("dotfiles.sh"));
    assert!(pos("dotfiles.sh") < pos("post-config.sh"));
}

/// Script paths from the manifest resolve against the manifest's directory.
#[test]
fn script_paths_resolve_against_fixture_root() {
    let fixture = workstation_fixture();
    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);

    let exec = RecordingExecutor::passing();
    Runner::new(Os::Linux, fixture.root_path(), false, &exec)
        .run(&tasks)
        .expect("run completes");

    let root = fixture.root_path().display().to_string();
    let script_calls: Vec<String> = exec
        .call_log()
        .into_iter()
        .filter(|c| c.starts_with("bash "))
        .collect();
    assert_eq!(script_calls.len(), 2);
    for call in &script_calls {
        assert!(call.contains(&root), "call '{call}' not rooted in fixture");
    }
}

/// A failed dependency skips its dependents but leaves independent tasks
/// untouched.
#[test]
fn failed_dependency_skips_dependents_only() {
    let fixture = workstation_fixture();
    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);

    let exec = RecordingExecutor::failing("apt-get install -y git");
    let results = Runner::new(Os::Linux, fixture.root_path(), false, &exec)
        .run(&tasks)
        .expect("run completes");

    assert_eq!(results["git"].status, TaskStatus::Failed);
    assert_eq!(results["dotfiles"].status, TaskStatus::Skipped);
    assert_eq!(results["curl"].status, TaskStatus::Success);
    // The dotfiles scripts never ran.
    assert!(exec.call_log().iter().all(|c| !c.contains("dotfiles.sh")));
}

/// `exit_on_failure` on a failing task skips everything still pending.
#[test]
fn exit_on_failure_ends_run_early() {
    let fixture = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "bootstrap"
            name = "Bootstrap"
            exit_on_failure = true
            [tasks.linux]
            script = "bootstrap.sh"

            [[tasks]]
            id = "git"
            name = "Git"
            [tasks.linux]
            apt = "git"
            "#,
        )
        .with_script("bootstrap.sh")
        .build();
    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);

    let exec = RecordingExecutor::failing("bootstrap.sh");
    let results = Runner::new(Os::Linux, fixture.root_path(), false, &exec)
        .run(&tasks)
        .expect("run completes");

    assert_eq!(results["bootstrap"].status, TaskStatus::Failed);
    assert_eq!(results["git"].status, TaskStatus::Skipped);
    assert_eq!(exec.call_log().len(), 1);
}

/// Dry run walks the whole graph without spawning a single command.
#[test]
fn dry_run_spawns_nothing() {
    let fixture = workstation_fixture();
    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);

    let exec = RecordingExecutor::passing();
    let results = Runner::new(Os::Linux, fixture.root_path(), true, &exec)
        .run(&tasks)
        .expect("run completes");

    assert!(results.values().all(|r| r.status == TaskStatus::Success));
    assert!(exec.call_log().is_empty());
}

/// A post-only task runs exactly its post scripts, in declared order.
#[test]
fn post_only_task_runs_posts_in_order() {
    let fixture = FixtureBuilder::new()
        .with_manifest(
            r#"
            [[tasks]]
            id = "configure"
            name = "Configure"
            [tasks.linux]
            post = ["one.sh", "two.sh"]
            "#,
        )
        .with_script("one.sh")
        .with_script("two.sh")
        .build();
    let manifest = Manifest::load(&fixture.manifest_path()).expect("load manifest");
    let tasks = manifest.for_os(Os::Linux);

    let exec = RecordingExecutor::passing();
    let results = Runner::new(Os::Linux, fixture.root_path(), false, &exec)
        .run(&tasks)
        .expect("run completes");

    assert_eq!(results["configure"].status, TaskStatus::Success);
    let calls = exec.call_log();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("one.sh"));
    assert!(calls[1].contains("two.sh"));
}
