//! Domain-specific error types for the provisioning engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors ([`ManifestError`], [`GraphError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! Both error families are fatal setup errors: they are raised before any
//! task is scheduled, so no partial run is ever executed against a broken
//! manifest or graph. Task-level failures are *not* errors — the execution
//! engine records them as status values in the result map.

use thiserror::Error;

/// Errors that arise while loading and validating the task manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// An I/O error occurred while reading the manifest file.
    #[error("failed to read manifest {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the expected shape.
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        /// Path to the file that could not be parsed.
        path: String,
        /// Underlying TOML deserialization error.
        source: toml::de::Error,
    },

    /// The top-level `tasks` key is absent from the document.
    #[error("manifest is missing the 'tasks' section")]
    MissingTasks,

    /// A task declares no OS mapping at all.
    #[error("task '{0}' must define at least one OS mapping")]
    NoOsMapping(String),

    /// Two tasks share the same identifier.
    #[error("duplicate task id '{0}'")]
    DuplicateId(String),
}

/// Errors that arise while building or ordering the task dependency graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A task references a dependency id absent from the task set.
    #[error("task '{task}' depends on missing task '{dependency}'")]
    MissingDependency {
        /// Task declaring the dependency.
        task: String,
        /// Identifier that could not be resolved.
        dependency: String,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected at task '{0}'")]
    Cycle(String),

    /// Kahn's algorithm emitted fewer nodes than the graph contains,
    /// meaning a cycle survived the DFS validation at construction time.
    #[error("residual cycle detected during topological sort")]
    ResidualCycle,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn manifest_error_missing_tasks_display() {
        let e = ManifestError::MissingTasks;
        assert_eq!(e.to_string(), "manifest is missing the 'tasks' section");
    }

    #[test]
    fn manifest_error_no_os_mapping_display() {
        let e = ManifestError::NoOsMapping("git".to_string());
        assert_eq!(
            e.to_string(),
            "task 'git' must define at least one OS mapping"
        );
    }

    #[test]
    fn manifest_error_duplicate_id_display() {
        let e = ManifestError::DuplicateId("git".to_string());
        assert_eq!(e.to_string(), "duplicate task id 'git'");
    }

    #[test]
    fn manifest_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ManifestError::Io {
            path: "/tmp/manifest.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("/tmp/manifest.toml"));
        assert!(e.source().is_some());
    }

    #[test]
    fn graph_error_missing_dependency_display() {
        let e = GraphError::MissingDependency {
            task: "docker".to_string(),
            dependency: "curl".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "task 'docker' depends on missing task 'curl'"
        );
    }

    #[test]
    fn graph_error_cycle_display() {
        let e = GraphError::Cycle("a".to_string());
        assert_eq!(e.to_string(), "dependency cycle detected at task 'a'");
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_types_are_send_sync() {
        assert_send_sync::<ManifestError>();
        assert_send_sync::<GraphError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _e: anyhow::Error = ManifestError::MissingTasks.into();
        let _e: anyhow::Error = GraphError::ResidualCycle.into();
    }
}
