//! Command synthesis: turn one OS mapping into the ordered list of external
//! commands the engine will run.

use std::fmt;
use std::path::Path;

use crate::config::manifest::OsMapping;
use crate::exec::Executor;
use crate::platform::Os;

/// One external command invocation: a program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Pick the PowerShell-family interpreter for Windows script invocations.
///
/// Checks a preference order of known executable names on the search path and
/// falls back to `pwsh` when none are found.
fn powershell(executor: &dyn Executor) -> String {
    for candidate in ["pwsh", "powershell.exe"] {
        if executor.which(candidate) {
            return candidate.to_string();
        }
    }
    "pwsh".to_string()
}

/// Build the interpreter invocation for one script path.
fn script_command(script: &str, os: Os, root: &Path, executor: &dyn Executor) -> CommandSpec {
    let path = root.join(script).display().to_string();
    if os.is_windows() {
        CommandSpec::new(
            &powershell(executor),
            &["-NoProfile", "-ExecutionPolicy", "Bypass", "-File", &path],
        )
    } else {
        CommandSpec::new("bash", &[&path])
    }
}

/// Synthesize the ordered command list for one OS mapping.
///
/// At most one package-manager command comes first, chosen by fixed priority
/// (choco, winget, brew, `brew_cask`, apt — first non-empty field wins). A
/// `script`, if set, is appended as one interpreter invocation, followed by
/// one invocation per `post` entry in declared order. Relative script paths
/// resolve against `root`.
///
/// A mapping with no primary action and no post scripts yields an empty list;
/// the engine treats that as an immediate success with zero commands run.
#[must_use]
pub fn synthesize(
    mapping: &OsMapping,
    os: Os,
    root: &Path,
    executor: &dyn Executor,
) -> Vec<CommandSpec> {
    let mut cmds: Vec<CommandSpec> = Vec::new();

    if let Some(pkg) = &mapping.choco {
        cmds.push(CommandSpec::new("choco", &["install", "-y", pkg]));
    } else if let Some(pkg) = &mapping.winget {
        cmds.push(CommandSpec::new(
            "winget",
            &[
                "install",
                "--id",
                pkg,
                "--accept-package-agreements",
                "--accept-source-agreements",
                "--silent",
            ],
        ));
    } else if let Some(pkg) = &mapping.brew {
        cmds.push(CommandSpec::new("brew", &["install", pkg]));
    } else if let Some(pkg) = &mapping.brew_cask {
        cmds.push(CommandSpec::new("brew", &["install", "--cask", pkg]));
    } else if let Some(pkg) = &mapping.apt {
        cmds.push(CommandSpec::new(
            "sudo",
            &["apt-get", "install", "-y", pkg],
        ));
    }

    if let Some(script) = &mapping.script {
        cmds.push(script_command(script, os, root, executor));
    }
    for post in &mapping.post {
        cmds.push(script_command(post, os, root, executor));
    }

    cmds
}
