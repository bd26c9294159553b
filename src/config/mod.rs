//! Manifest parsing and validation.

pub mod manifest;

pub use manifest::{Manifest, OsMapping, Task};
