// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed manifest fixture and a fluent builder
// so each integration test can set up an isolated environment without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use provision_cli::exec::{ExecResult, Executor};

/// An isolated manifest fixture backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped (via the underlying
/// [`tempfile::TempDir`]).
pub struct ManifestFixture {
    /// Temporary directory containing `manifest.toml` and any scripts.
    pub root: tempfile::TempDir,
}

impl ManifestFixture {
    /// Path to the fixture root directory.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path to the manifest file inside the fixture.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.path().join("manifest.toml")
    }
}

/// Fluent builder for [`ManifestFixture`].
pub struct FixtureBuilder {
    root: tempfile::TempDir,
}

impl FixtureBuilder {
    /// Begin building a fixture in a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Write `content` as the fixture's `manifest.toml`.
    pub fn with_manifest(self, content: &str) -> Self {
        std::fs::write(self.root.path().join("manifest.toml"), content)
            .expect("write manifest.toml");
        self
    }

    /// Create a script file at `name` (relative to the fixture root) so that
    /// relative script paths in the manifest resolve to an existing file.
    pub fn with_script(self, name: &str) -> Self {
        let path = self.root.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create script parent dir");
        }
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write script file");
        self
    }

    /// Finish building and return the fixture.
    pub fn build(self) -> ManifestFixture {
        ManifestFixture { root: self.root }
    }
}

/// Executor that records every invocation and fails commands whose rendered
/// form contains a configured marker string.
///
/// `which` always answers false, so Windows script synthesis falls back to
/// its default interpreter regardless of the host.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: std::sync::Mutex<Vec<String>>,
    fail_matching: Option<String>,
}

impl RecordingExecutor {
    /// An executor for which every command succeeds.
    pub fn passing() -> Self {
        Self::default()
    }

    /// An executor that fails any command whose rendering contains `marker`.
    pub fn failing(marker: &str) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail_matching: Some(marker.to_string()),
        }
    }

    /// Every invocation so far, rendered as `program arg arg ...`.
    pub fn call_log(&self) -> Vec<String> {
        self.calls
            .lock()
            .map_or_else(|_| Vec::new(), |g| g.clone())
    }
}

impl Executor for RecordingExecutor {
    fn run_unchecked(&self, _dir: &Path, program: &str, args: &[String]) -> Result<ExecResult> {
        let rendered = format!("{program} {}", args.join(" "));
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(rendered.clone());
        }
        let fails = self
            .fail_matching
            .as_ref()
            .is_some_and(|marker| rendered.contains(marker.as_str()));
        Ok(ExecResult {
            stdout: String::new(),
            stderr: if fails {
                "command failed".to_string()
            } else {
                String::new()
            },
            success: !fails,
            code: Some(i32::from(fails)),
        })
    }

    fn which(&self, _program: &str) -> bool {
        false
    }
}
