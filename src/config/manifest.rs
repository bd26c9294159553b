//! The task manifest: a declarative, ordered list of provisioning tasks.
//!
//! The manifest is a TOML document with a top-level `tasks` array. Each task
//! carries an identifier, a display name, dependency ids, and up to three
//! OS-specific mappings describing how to install it on windows, mac and
//! linux. The manifest is loaded once per run and never mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ManifestError;
use crate::platform::Os;

/// OS-specific install instructions for one task.
///
/// At most one package-manager field is consulted per run (fixed priority
/// order, see [`crate::tasks::command::synthesize`]); `script` and every
/// `post` entry each become one interpreter invocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsMapping {
    /// Chocolatey package name (windows).
    pub choco: Option<String>,
    /// Winget package id (windows).
    pub winget: Option<String>,
    /// Homebrew formula name (mac).
    pub brew: Option<String>,
    /// Homebrew cask name (mac).
    pub brew_cask: Option<String>,
    /// APT package name (linux).
    pub apt: Option<String>,
    /// Standalone install script, relative to the manifest root.
    pub script: Option<String>,
    /// Post-install scripts, run in declared order after the primary action.
    #[serde(default)]
    pub post: Vec<String>,
    /// Optional version constraint, informational only.
    pub version: Option<String>,
}

impl OsMapping {
    /// Whether any primary action field (package manager or script) is set.
    #[must_use]
    pub const fn has_action(&self) -> bool {
        self.choco.is_some()
            || self.winget.is_some()
            || self.brew.is_some()
            || self.brew_cask.is_some()
            || self.apt.is_some()
            || self.script.is_some()
    }

    /// Whether this mapping produces at least one command when scheduled.
    ///
    /// A mapping with only `post` scripts has no primary action but is still
    /// schedulable: its post scripts run on their own.
    #[must_use]
    pub fn is_schedulable(&self) -> bool {
        self.has_action() || !self.post.is_empty()
    }
}

/// One unit of installable or configurable work.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    /// Unique identifier, referenced by other tasks' `deps`.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Free-form task kind (e.g. `"package"`), informational only.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Identifiers of tasks that must succeed before this one runs.
    #[serde(default)]
    pub deps: Vec<String>,
    /// When set, a failure of this task skips every still-pending task and
    /// terminates the whole run early.
    #[serde(default)]
    pub exit_on_failure: bool,
    /// Install instructions for Windows.
    pub windows: Option<OsMapping>,
    /// Install instructions for macOS.
    pub mac: Option<OsMapping>,
    /// Install instructions for Linux.
    pub linux: Option<OsMapping>,
}

fn default_kind() -> String {
    "package".to_string()
}

impl Task {
    /// The mapping for the given OS, if declared.
    #[must_use]
    pub const fn mapping(&self, os: Os) -> Option<&OsMapping> {
        match os {
            Os::Windows => self.windows.as_ref(),
            Os::Mac => self.mac.as_ref(),
            Os::Linux => self.linux.as_ref(),
        }
    }
}

/// An ordered, validated collection of [`Task`]s.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Tasks in document order.
    pub tasks: Vec<Task>,
}

impl Manifest {
    /// Load and validate a manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] if the file cannot be read, the document
    /// does not deserialize, the top-level `tasks` section is absent, a task
    /// id is duplicated, or a task declares no OS mapping at all.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let value: toml::Value =
            toml::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if value.get("tasks").is_none() {
            return Err(ManifestError::MissingTasks);
        }

        let manifest: Self = value.try_into().map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check per-task invariants: unique ids, at least one OS mapping each.
    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(ManifestError::DuplicateId(task.id.clone()));
            }
            if task.windows.is_none() && task.mac.is_none() && task.linux.is_none() {
                return Err(ManifestError::NoOsMapping(task.id.clone()));
            }
        }
        Ok(())
    }

    /// Tasks schedulable on the given OS, in document order.
    ///
    /// A task is included exactly when its mapping for `os` exists and is
    /// schedulable; tasks without an actionable mapping for the current OS
    /// never enter the run at all.
    #[must_use]
    pub fn for_os(&self, os: Os) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.mapping(os).is_some_and(OsMapping::is_schedulable))
            .collect()
    }
}
