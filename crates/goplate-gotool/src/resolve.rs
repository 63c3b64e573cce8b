//! Go binary resolution.

use goplate_core::{GoplateError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable overriding Go binary discovery.
pub const GO_BINARY_ENV: &str = "GOPLATE_GO";

/// Locate the `go` binary: the `GOPLATE_GO` override wins, then `PATH`.
pub fn resolve_go() -> Result<PathBuf> {
    if let Ok(explicit) = std::env::var(GO_BINARY_ENV) {
        let path = PathBuf::from(&explicit);
        if path.is_file() {
            return Ok(path);
        }
        return Err(GoplateError::GoNotResolved {
            searched: format!("{GO_BINARY_ENV}={explicit}"),
        });
    }

    which::which("go").map_err(|_| GoplateError::GoNotResolved {
        searched: format!("{GO_BINARY_ENV} (unset), PATH"),
    })
}

/// Query `go version` and extract the version number.
///
/// Parses output like `go version go1.22.1 linux/amd64` into `1.22.1`.
pub fn go_version(go: &Path) -> Result<String> {
    let output = Command::new(go)
        .arg("version")
        .output()
        .map_err(|e| GoplateError::GoExecFailed(format!("failed to execute go version: {e}")))?;

    if !output.status.success() {
        return Err(GoplateError::GoExecFailed(format!(
            "go version exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_go_version(&stdout).ok_or_else(|| {
        GoplateError::GoExecFailed(format!(
            "could not parse version from go version output: {}",
            stdout.trim()
        ))
    })
}

fn parse_go_version(output: &str) -> Option<String> {
    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix("go version ") else {
            continue;
        };
        let token = rest.split_whitespace().next()?;
        let version = token.strip_prefix("go").unwrap_or(token);
        if version.contains('.') {
            return Some(version.to_string());
        }
    }
    None
}
