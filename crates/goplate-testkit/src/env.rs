//! Environment isolation utilities for testing
//!
//! Tests that control Go binary resolution via `GOPLATE_GO` must not
//! interfere with each other when run in parallel; this module serializes
//! them behind one mutex and restores the original environment afterwards.

use std::path::Path;
use std::sync::Mutex;

/// Static mutex to serialize tests that modify environment variables
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run a test with `GOPLATE_GO` controlled.
///
/// With `Some(path)` the resolver is pinned to that binary; with `None` the
/// variable is removed so resolution falls through to `PATH`.
pub fn with_go_env<F, R>(go_binary: Option<&Path>, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| {
        // environment variables remain valid after a panic; we are only
        // serializing access, not protecting data
        poisoned.into_inner()
    });

    let original = std::env::var_os("GOPLATE_GO");

    // SAFETY: we hold ENV_LOCK, so no other test mutates the environment
    // concurrently.
    unsafe {
        match go_binary {
            Some(path) => std::env::set_var("GOPLATE_GO", path),
            None => std::env::remove_var("GOPLATE_GO"),
        }
    }

    let result = f();

    // SAFETY: still holding ENV_LOCK.
    unsafe {
        match original {
            Some(value) => std::env::set_var("GOPLATE_GO", value),
            None => std::env::remove_var("GOPLATE_GO"),
        }
    }

    result
}
