//! Operating-system detection and manifest key mapping.

use std::fmt;
use std::str::FromStr;

/// Operating system a manifest task can target.
///
/// Each [`Task`](crate::config::manifest::Task) carries up to one mapping per
/// variant; the variant doubles as the manifest key (`windows`, `mac`,
/// `linux`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Windows family platforms.
    Windows,
    /// macOS.
    Mac,
    /// Linux and any other Unix-like system.
    Linux,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Mac => write!(f, "mac"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" => Ok(Self::Windows),
            "mac" => Ok(Self::Mac),
            "linux" => Ok(Self::Linux),
            other => Err(format!(
                "unknown OS key '{other}': must be one of windows, mac, linux"
            )),
        }
    }
}

impl Os {
    /// Detect the operating system of the current build target.
    ///
    /// Windows-family targets map to [`Os::Windows`], macOS to [`Os::Mac`],
    /// anything else to [`Os::Linux`].
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Mac
        } else {
            Self::Linux
        }
    }

    /// Whether script commands on this OS use a PowerShell-family interpreter.
    #[must_use]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}
