//! The `install` command: load the manifest, validate the task graph, run
//! the execution engine, and report results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::Manifest;
use crate::config::manifest::Task;
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::platform::Os;
use crate::tasks::graph::TaskGraph;
use crate::tasks::runner::Runner;
use crate::tasks::{TaskResult, TaskStatus};

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the manifest fails to load, the dependency graph is
/// invalid, the JSON report cannot be written, or at least one task failed.
/// Individual task failures never abort the run itself; they surface here
/// only as the final non-zero exit.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let started = Instant::now();
    let os = global.os.unwrap_or(Os::detect());
    let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("provision {version}"));

    log.stage("Loading manifest");
    let manifest = Manifest::load(&global.manifest)?;
    let tasks = manifest.for_os(os);
    if tasks.is_empty() {
        log.warn(&format!("no tasks for os '{os}' in manifest"));
        return Ok(());
    }
    let root = resolve_root(global);

    log.stage("Validating dependencies");
    TaskGraph::new(&tasks)?;
    let independent = tasks.iter().filter(|t| t.deps.is_empty()).count();
    log.info(&format!("manifest: {}", global.manifest.display()));
    log.info(&format!("os: {os}"));
    log.info(&format!(
        "tasks: {} ({independent} independent, {} dependent)",
        tasks.len(),
        tasks.len() - independent
    ));
    if let Some(path) = log.log_path() {
        log.info(&format!("log: {}", path.display()));
    }

    // A console break is acknowledged but never aborts an in-flight command;
    // the summary below reflects whatever completed.
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
            tracing::warn!("interrupt received, finishing current task before summarizing");
        }) {
            log.debug(&format!("could not install interrupt handler: {e}"));
        }
    }

    if global.dry_run {
        log.dry_run("no commands will be executed");
    }
    log.stage("Executing tasks");
    let executor = SystemExecutor;
    let results = Runner::new(os, &root, global.dry_run, &executor).run(&tasks)?;

    print_summary(log, &tasks, &results, started.elapsed());
    if interrupted.load(Ordering::SeqCst) {
        log.warn("run was interrupted; the summary reflects completed work only");
    }

    if let Some(path) = &opts.report {
        write_report(path, &tasks, &results)?;
        log.info(&format!("report: {}", path.display()));
    }

    let failed = count(&results, TaskStatus::Failed);
    if failed > 0 {
        anyhow::bail!("{failed} task(s) failed");
    }
    Ok(())
}

/// Directory against which relative script paths resolve: `--root` when
/// given, otherwise the manifest's parent directory.
fn resolve_root(global: &GlobalOpts) -> PathBuf {
    global.root.clone().unwrap_or_else(|| {
        global
            .manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    })
}

fn count(results: &HashMap<String, TaskResult>, status: TaskStatus) -> usize {
    results.values().filter(|r| r.status == status).count()
}

/// Print the per-task summary and totals in manifest order.
fn print_summary(
    log: &Logger,
    tasks: &[&Task],
    results: &HashMap<String, TaskResult>,
    total: Duration,
) {
    log.stage("Summary");
    for task in tasks {
        let Some(res) = results.get(&task.id) else {
            continue;
        };
        let (icon, color) = match res.status {
            TaskStatus::Success => ("✓", "\x1b[32m"),
            TaskStatus::Failed => ("✗", "\x1b[31m"),
            TaskStatus::Skipped => ("○", "\x1b[33m"),
            TaskStatus::Running => ("▹", "\x1b[36m"),
            TaskStatus::Pending => ("·", "\x1b[2m"),
        };
        let elapsed = res
            .elapsed()
            .map_or_else(String::new, |d| format!(" ({:.2}s)", d.as_secs_f64()));
        let detail = res
            .error
            .as_ref()
            .map_or_else(String::new, |e| format!(": {e}"));
        log.info(&format!(
            "{color}{icon} {}{elapsed}{detail}\x1b[0m",
            res.name
        ));
    }

    let success = count(results, TaskStatus::Success);
    let failed = count(results, TaskStatus::Failed);
    let skipped = count(results, TaskStatus::Skipped);
    log.info(&format!(
        "{} tasks: \x1b[32m{success} success\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m in {:.2}s",
        results.len(),
        total.as_secs_f64()
    ));
}

/// One row of the JSON result report.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    id: &'a str,
    name: &'a str,
    status: TaskStatus,
    elapsed_secs: Option<f64>,
    error: Option<&'a str>,
}

/// Write the result set as a JSON array, in manifest order.
fn write_report(path: &Path, tasks: &[&Task], results: &HashMap<String, TaskResult>) -> Result<()> {
    let rows: Vec<ReportRow<'_>> = tasks
        .iter()
        .filter_map(|task| {
            results.get(&task.id).map(|res| ReportRow {
                id: &task.id,
                name: &res.name,
                status: res.status,
                elapsed_secs: res.elapsed().map(|d| d.as_secs_f64()),
                error: res.error.as_deref(),
            })
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows)?;
    std::fs::write(path, json)?;
    Ok(())
}
