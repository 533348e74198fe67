//! Subcommand implementations.

pub mod inspect;
pub mod publish;

use std::path::PathBuf;

use anyhow::{Context, Result};

/// The repository root: the given path, or the current directory.
pub(crate) fn workspace_root(workspace: Option<&PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
        _ => std::env::current_dir().context("Failed to determine the current directory"),
    }
}
