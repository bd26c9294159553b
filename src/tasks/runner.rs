//! The execution engine: dependency-aware, fault-tolerant task scheduling.
//!
//! Scheduling is a repeated readiness scan rather than a single static
//! topological pass, because dependency satisfaction is defined by *runtime
//! outcome*: a task is ready only once every declared dependency has reached
//! `Success`. Execution is deliberately sequential (one task at a time) so a
//! failure is always visible to the readiness computation before any
//! dependent is considered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, bail};
use tracing::{debug, error};

use super::command::synthesize;
use super::{TaskResult, TaskStatus};
use crate::config::manifest::Task;
use crate::exec::Executor;
use crate::platform::Os;

/// Executes an OS-filtered, graph-validated task list and records per-task
/// outcomes.
#[derive(Debug)]
pub struct Runner<'a> {
    os: Os,
    /// Directory against which relative script paths resolve (the manifest's
    /// parent directory); also the working directory for spawned commands.
    root: PathBuf,
    dry_run: bool,
    executor: &'a dyn Executor,
}

impl<'a> Runner<'a> {
    /// Create a runner for one provisioning run.
    #[must_use]
    pub fn new(os: Os, root: &Path, dry_run: bool, executor: &'a dyn Executor) -> Self {
        Self {
            os,
            root: root.to_path_buf(),
            dry_run,
            executor,
        }
    }

    /// Execute every task, respecting dependencies, and return the result map
    /// keyed by task id. Every input task appears exactly once.
    ///
    /// Task failures are recorded as [`TaskStatus::Failed`] values, never
    /// returned as errors. A failed task's dependents end up
    /// [`TaskStatus::Skipped`]; a failed task with `exit_on_failure` skips
    /// every still-pending task and ends the run early.
    ///
    /// # Errors
    ///
    /// Returns an error only when the scheduler stalls: nothing is ready,
    /// nothing has failed, yet tasks remain pending. That cannot happen for a
    /// graph that passed cycle validation, so it is surfaced as a hard fault
    /// rather than leaving tasks pending silently.
    pub fn run(&self, tasks: &[&Task]) -> Result<HashMap<String, TaskResult>> {
        let mut results: HashMap<String, TaskResult> = tasks
            .iter()
            .map(|t| (t.id.clone(), TaskResult::new(t.name.clone())))
            .collect();
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), *t)).collect();
        // Document order, so simultaneously-ready tasks run deterministically.
        let mut pending: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

        while !pending.is_empty() {
            let ready: Vec<&str> = pending
                .iter()
                .copied()
                .filter(|id| deps_satisfied(id, &by_id, &results))
                .collect();

            if ready.is_empty() {
                // Deadlock caused by failed dependencies: skip the blocked
                // tasks and end the run.
                let blocked: Vec<&str> = pending
                    .iter()
                    .copied()
                    .filter(|id| has_failed_dep(id, &by_id, &results))
                    .collect();
                if blocked.is_empty() {
                    bail!(
                        "scheduler stalled: {} task(s) pending with unresolved dependencies: {}",
                        pending.len(),
                        pending.join(", ")
                    );
                }
                for id in blocked {
                    if let Some(res) = results.get_mut(id) {
                        res.status = TaskStatus::Skipped;
                    }
                }
                break;
            }

            let mut stop = false;
            for id in ready {
                pending.retain(|p| *p != id);
                let Some(task) = by_id.get(id) else { continue };
                if let Some(res) = results.get_mut(id) {
                    self.run_task(task, res);
                    if res.status == TaskStatus::Failed && task.exit_on_failure {
                        error!("task '{id}' failed with exit_on_failure set, stopping run");
                        for pid in &pending {
                            if let Some(skipped) = results.get_mut(*pid) {
                                skipped.status = TaskStatus::Skipped;
                            }
                        }
                        pending.clear();
                        stop = true;
                        break;
                    }
                }
            }
            if stop {
                break;
            }
        }

        Ok(results)
    }

    /// Run one task to a terminal state, recording timing and error detail.
    fn run_task(&self, task: &Task, res: &mut TaskResult) {
        res.status = TaskStatus::Running;
        res.started = Some(Instant::now());

        if self.dry_run {
            debug!("dry run: task '{}' marked success", task.id);
            res.status = TaskStatus::Success;
            res.finished = Some(Instant::now());
            return;
        }

        let Some(mapping) = task.mapping(self.os) else {
            // Unreachable for a properly filtered task list; recorded as
            // skipped rather than invented work.
            res.status = TaskStatus::Skipped;
            res.finished = Some(Instant::now());
            return;
        };

        res.status = TaskStatus::Success;
        for cmd in synthesize(mapping, self.os, &self.root, self.executor) {
            debug!("task '{}': executing {cmd}", task.id);
            match self.executor.run_unchecked(&self.root, &cmd.program, &cmd.args) {
                Ok(outcome) if outcome.success => {
                    if !outcome.stdout.is_empty() {
                        debug!("{}", outcome.stdout.trim_end());
                    }
                }
                Ok(outcome) => {
                    let detail = outcome.stderr.trim().to_string();
                    error!("task '{}' failed: {detail}", task.id);
                    res.status = TaskStatus::Failed;
                    res.error = Some(detail);
                    break;
                }
                Err(fault) => {
                    let detail = format!("{fault:#}");
                    error!("task '{}' could not run: {detail}", task.id);
                    res.status = TaskStatus::Failed;
                    res.error = Some(detail);
                    break;
                }
            }
        }
        res.finished = Some(Instant::now());
    }
}

/// Whether every declared dependency of `id` has reached `Success`.
fn deps_satisfied(
    id: &str,
    by_id: &HashMap<&str, &Task>,
    results: &HashMap<String, TaskResult>,
) -> bool {
    by_id.get(id).is_some_and(|task| {
        task.deps.iter().all(|dep| {
            results
                .get(dep)
                .is_some_and(|r| r.status == TaskStatus::Success)
        })
    })
}

/// Whether at least one declared dependency of `id` has failed.
fn has_failed_dep(
    id: &str,
    by_id: &HashMap<&str, &Task>,
    results: &HashMap<String, TaskResult>,
) -> bool {
    by_id.get(id).is_some_and(|task| {
        task.deps.iter().any(|dep| {
            results
                .get(dep)
                .is_some_and(|r| r.status == TaskStatus::Failed)
        })
    })
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::manifest::OsMapping;
    use crate::exec::ExecResult;
    use std::sync::Mutex;

    /// Executor that records every invocation and fails commands whose
    /// program (or first argument) matches a configured marker.
    #[derive(Debug, Default)]
    struct ScriptedExecutor {
        calls: Mutex<Vec<String>>,
        fail_matching: Option<String>,
        stderr: String,
    }

    impl ScriptedExecutor {
        fn failing(marker: &str, stderr: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_matching: Some(marker.to_string()),
                stderr: stderr.to_string(),
            }
        }

        fn call_log(&self) -> Vec<String> {
            self.calls.lock().map_or_else(|_| Vec::new(), |g| g.clone())
        }
    }

    impl Executor for ScriptedExecutor {
        fn run_unchecked(
            &self,
            _dir: &Path,
            program: &str,
            args: &[String],
        ) -> Result<ExecResult> {
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
                stderr: if fails { self.stderr.clone() } else { String::new() },
                success: !fails,
                code: Some(i32::from(fails)),
            })
        }

        fn which(&self, _program: &str) -> bool {
            false
        }
    }

    fn task(id: &str, deps: &[&str], mapping: OsMapping) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_uppercase(),
            kind: "package".to_string(),
            deps: deps.iter().map(ToString::to_string).collect(),
            exit_on_failure: false,
            windows: None,
            mac: None,
            linux: Some(mapping),
        }
    }

    fn apt(pkg: &str) -> OsMapping {
        OsMapping {
            apt: Some(pkg.to_string()),
            ..OsMapping::default()
        }
    }

    fn runner<'a>(executor: &'a ScriptedExecutor, dry_run: bool) -> Runner<'a> {
        Runner::new(Os::Linux, Path::new("/repo"), dry_run, executor)
    }

    #[test]
    fn all_tasks_succeed_in_dependency_order() {
        let a = task("a", &[], apt("a"));
        let b = task("b", &["a"], apt("b"));
        let c = task("c", &["a"], apt("c"));
        let exec = ScriptedExecutor::default();
        let results = runner(&exec, false).run(&[&b, &c, &a]).unwrap();

        assert_eq!(results.len(), 3);
        for id in ["a", "b", "c"] {
            assert_eq!(results[id].status, TaskStatus::Success, "task {id}");
            assert!(results[id].elapsed().is_some());
        }
        // a's command must run before b's and c's.
        let calls = exec.call_log();
        let pos = |pkg: &str| {
            calls
                .iter()
                .position(|c| c.ends_with(pkg))
                .unwrap_or_else(|| panic!("no call for {pkg} in {calls:?}"))
        };
        assert!(pos("-y a") < pos("-y b"));
        assert!(pos("-y a") < pos("-y c"));
    }

    #[test]
    fn dependent_of_failed_task_is_skipped() {
        let a = task("a", &[], apt("broken"));
        let b = task("b", &["a"], apt("b"));
        let exec = ScriptedExecutor::failing("broken", "E: unable to locate package");
        let results = runner(&exec, false).run(&[&a, &b]).unwrap();

        assert_eq!(results["a"].status, TaskStatus::Failed);
        assert_eq!(
            results["a"].error.as_deref(),
            Some("E: unable to locate package")
        );
        assert_eq!(results["b"].status, TaskStatus::Skipped);
        assert!(results["b"].started.is_none(), "b must never start");
    }

    #[test]
    fn independent_task_still_runs_after_failure() {
        let a = task("a", &[], apt("broken"));
        let c = task("c", &[], apt("c"));
        let exec = ScriptedExecutor::failing("broken", "boom");
        let results = runner(&exec, false).run(&[&a, &c]).unwrap();

        assert_eq!(results["a"].status, TaskStatus::Failed);
        assert_eq!(results["c"].status, TaskStatus::Success);
    }

    #[test]
    fn exit_on_failure_skips_unrelated_pending_tasks() {
        let mut a = task("a", &[], apt("broken"));
        a.exit_on_failure = true;
        let c = task("c", &[], apt("c"));
        let d = task("d", &[], apt("d"));
        let exec = ScriptedExecutor::failing("broken", "boom");
        let results = runner(&exec, false).run(&[&a, &c, &d]).unwrap();

        assert_eq!(results["a"].status, TaskStatus::Failed);
        assert_eq!(results["c"].status, TaskStatus::Skipped);
        assert_eq!(results["d"].status, TaskStatus::Skipped);
        // Only a's command ever ran.
        assert_eq!(exec.call_log().len(), 1);
    }

    #[test]
    fn dry_run_succeeds_without_spawning_anything() {
        let a = task("a", &[], apt("a"));
        let b = task("b", &["a"], apt("b"));
        let exec = ScriptedExecutor::default();
        let results = runner(&exec, true).run(&[&a, &b]).unwrap();

        assert_eq!(results["a"].status, TaskStatus::Success);
        assert_eq!(results["b"].status, TaskStatus::Success);
        assert!(exec.call_log().is_empty());
    }

    #[test]
    fn failing_script_stops_remaining_commands_of_that_task() {
        let m = OsMapping {
            script: Some("setup.sh".to_string()),
            post: vec!["after.sh".to_string()],
            ..OsMapping::default()
        };
        let a = task("a", &[], m);
        let exec = ScriptedExecutor::failing("setup.sh", "setup.sh: line 3: oops");
        let results = runner(&exec, false).run(&[&a]).unwrap();

        assert_eq!(results["a"].status, TaskStatus::Failed);
        assert_eq!(results["a"].error.as_deref(), Some("setup.sh: line 3: oops"));
        // after.sh never runs once setup.sh failed.
        assert_eq!(exec.call_log().len(), 1);
    }

    #[test]
    fn mapping_without_commands_is_immediate_success() {
        let m = OsMapping {
            version: Some("1.0".to_string()),
            ..OsMapping::default()
        };
        let a = task("a", &[], m);
        let exec = ScriptedExecutor::default();
        let results = runner(&exec, false).run(&[&a]).unwrap();

        assert_eq!(results["a"].status, TaskStatus::Success);
        assert!(exec.call_log().is_empty());
    }

    #[test]
    fn transitively_blocked_task_stays_pending() {
        // a fails, b (dep a) is skipped, c (dep b) has no *failed* dep and is
        // left pending when the loop terminates.
        let a = task("a", &[], apt("broken"));
        let b = task("b", &["a"], apt("b"));
        let c = task("c", &["b"], apt("c"));
        let exec = ScriptedExecutor::failing("broken", "boom");
        let results = runner(&exec, false).run(&[&a, &b, &c]).unwrap();

        assert_eq!(results["b"].status, TaskStatus::Skipped);
        assert_eq!(results["c"].status, TaskStatus::Pending);
    }

    #[test]
    fn unresolvable_dependency_is_a_hard_fault() {
        // Bypasses graph validation on purpose: dependency id never resolves.
        let a = task("a", &["ghost"], apt("a"));
        let exec = ScriptedExecutor::default();
        let err = runner(&exec, false).run(&[&a]).unwrap_err();
        assert!(err.to_string().contains("scheduler stalled"));
        assert!(err.to_string().contains('a'));
    }

    #[test]
    fn worked_example_brew_ok_script_fails() {
        // Manifest: a installs git via brew, b runs setup.sh and depends on a.
        let a = Task {
            id: "a".to_string(),
            name: "Git".to_string(),
            kind: "package".to_string(),
            deps: vec![],
            exit_on_failure: false,
            windows: None,
            mac: Some(OsMapping {
                brew: Some("git".to_string()),
                ..OsMapping::default()
            }),
            linux: None,
        };
        let b = Task {
            id: "b".to_string(),
            name: "Setup".to_string(),
            kind: "script".to_string(),
            deps: vec!["a".to_string()],
            exit_on_failure: false,
            windows: None,
            mac: Some(OsMapping {
                script: Some("setup.sh".to_string()),
                ..OsMapping::default()
            }),
            linux: None,
        };
        let exec = ScriptedExecutor::failing("setup.sh", "setup.sh: exit 1");
        let results = Runner::new(Os::Mac, Path::new("/repo"), false, &exec)
            .run(&[&a, &b])
            .unwrap();

        assert_eq!(results["a"].status, TaskStatus::Success);
        assert_eq!(results["b"].status, TaskStatus::Failed);
        assert_eq!(results["b"].error.as_deref(), Some("setup.sh: exit 1"));
    }
}
