//! Test utilities for goplate
//!
//! This crate provides shared testing utilities used across the goplate
//! workspace: workspace-scoped temp directories, Go environment isolation,
//! and Go source fixtures (providers, pipes, fake `go` binaries).

mod env;
mod fixtures;

pub use env::{with_go_env, ENV_LOCK};
pub use fixtures::{
    write_custom_pipes, write_logging_provider, write_string_provider,
};
#[cfg(unix)]
pub use fixtures::write_fake_go;

use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the workspace root
///
/// This centralizes all test temporary files in a single gitignored
/// location that is easy to clean up manually if needed.
///
/// # Panics
///
/// Panics if the current directory cannot be determined or the temporary
/// directory cannot be created.
pub fn temp_dir_in_workspace() -> TempDir {
    let workspace_root = std::env::current_dir().expect("Failed to get current directory");
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base).expect("Failed to create .tmp directory");
    TempDir::new_in(&tmp_base).expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-panicking call sites.
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}
