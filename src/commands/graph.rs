//! The `graph` command: print the dependency graph and topological order.

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::Manifest;
use crate::logging::Logger;
use crate::platform::Os;
use crate::tasks::graph::TaskGraph;

/// Run the graph command.
///
/// Loads the manifest, filters tasks for the current (or overridden) OS,
/// validates the dependency graph, and prints one `task -> deps` line per
/// task followed by the topological order.
///
/// # Errors
///
/// Returns an error if the manifest fails to load or the graph is invalid
/// (missing dependency or cycle).
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let os = global.os.unwrap_or(Os::detect());
    let manifest = Manifest::load(&global.manifest)?;
    let tasks = manifest.for_os(os);
    if tasks.is_empty() {
        log.warn(&format!("no tasks for os '{os}' in manifest"));
        return Ok(());
    }

    let graph = TaskGraph::new(&tasks)?;

    log.stage(&format!("Dependency graph ({os})"));
    for &id in graph.nodes() {
        let deps = graph.deps_of(id);
        if deps.is_empty() {
            log.info(&format!("{id} -> -"));
        } else {
            log.info(&format!("{id} -> {}", deps.join(", ")));
        }
    }

    log.stage("Topological order");
    log.info(&graph.topological()?.join(" -> "));
    Ok(())
}
