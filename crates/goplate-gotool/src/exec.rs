//! Toolchain invocation: `go get` / `go run` against a staged workspace.
//!
//! The dependency-resolution root (`GOPATH`) is pinned to the workspace so
//! a run cannot resolve providers or registries from outside it. Both child
//! streams are drained concurrently; a full pipe buffer on one stream must
//! never deadlock the child while the caller drains the other.

use goplate_core::plan::Plan;
use goplate_core::{GoplateError, Result};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How often the exit wait polls for completion or cancellation.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Cooperative cancellation flag for a run in progress.
///
/// Cloneable and cheap; a caller-imposed deadline is layered on top by
/// cancelling from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for one toolchain run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub go_binary: PathBuf,
    /// Run `go get ./...` in the workspace before the run step. Only useful
    /// when providers import packages beyond the standard library.
    pub fetch_deps: bool,
}

/// Execute a plan's hosting program, streaming stdout/stderr to the sinks.
///
/// Returns `Ok(())` only when the external process exits with status zero.
/// A non-zero exit or a failure to start surfaces as
/// [`GoplateError::Execution`] carrying the captured stderr, where the
/// primary diagnostic almost always lives.
pub fn run_plan<O, E>(
    plan: &Plan,
    options: &RunOptions,
    stdout_sink: O,
    stderr_sink: E,
    cancel: &CancelToken,
) -> Result<()>
where
    O: Write + Send,
    E: Write + Send,
{
    if options.fetch_deps {
        fetch_deps(&options.go_binary, &plan.workspace_root)?;
    }

    let mut files = vec![plan.program.clone()];
    files.extend(plan.source_args());
    run_go(
        &options.go_binary,
        &plan.workspace_root,
        &files,
        stdout_sink,
        stderr_sink,
        cancel,
    )
}

/// `go get ./...` with the workspace pinned as the dependency root.
///
/// A failure here is an environment or connectivity problem, reported
/// distinctly from a run-time failure in provider code.
fn fetch_deps(go: &Path, workspace: &Path) -> Result<()> {
    let output = Command::new(go)
        .args(["get", "./..."])
        .current_dir(workspace)
        .env("GOPATH", pinned_gopath(workspace))
        .output()
        .map_err(|e| GoplateError::DependencyResolution {
            detail: format!("failed to start '{}': {e}", go.display()),
        })?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined: Vec<&str> = [stdout.trim(), stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        return Err(GoplateError::DependencyResolution {
            detail: format!(
                "go get exited with {}: {}",
                output.status,
                combined.join("\n")
            ),
        });
    }
    Ok(())
}

fn run_go<O, E>(
    go: &Path,
    workspace: &Path,
    files: &[PathBuf],
    stdout_sink: O,
    stderr_sink: E,
    cancel: &CancelToken,
) -> Result<()>
where
    O: Write + Send,
    E: Write + Send,
{
    let mut cmd = Command::new(go);
    cmd.arg("run")
        .args(files)
        .current_dir(workspace)
        .env("GOPATH", pinned_gopath(workspace))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| GoplateError::Execution {
        status: None,
        detail: format!("failed to start '{}': {e}", go.display()),
    })?;
    let Some(child_stdout) = child.stdout.take() else {
        return Err(GoplateError::Execution {
            status: None,
            detail: "child stdout pipe missing".to_string(),
        });
    };
    let Some(child_stderr) = child.stderr.take() else {
        return Err(GoplateError::Execution {
            status: None,
            detail: "child stderr pipe missing".to_string(),
        });
    };

    let stderr_tail: Mutex<Vec<u8>> = Mutex::new(Vec::new());
    let mut out_res: io::Result<()> = Ok(());
    let mut err_res: io::Result<()> = Ok(());

    let status = thread::scope(|scope| {
        let out_handle = scope.spawn(move || drain(child_stdout, stdout_sink, None));
        let tail = &stderr_tail;
        let err_handle =
            scope.spawn(move || drain(child_stderr, stderr_sink, Some(tail)));

        let status = wait_with_cancel(&mut child, cancel);

        // the pipes close when the child exits, so both drains finish on EOF
        out_res = out_handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdout drain panicked")));
        err_res = err_handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr drain panicked")));
        status
    })?;

    out_res?;
    err_res?;

    if !status.success() {
        let tail = stderr_tail
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        return Err(GoplateError::Execution {
            status: status.code(),
            detail: format!(
                "go run exited with {}: {}",
                status,
                String::from_utf8_lossy(&tail).trim()
            ),
        });
    }
    Ok(())
}

/// GOPATH pinned to the workspace, keeping any previous GOPATH as a
/// fallback entry.
fn pinned_gopath(workspace: &Path) -> String {
    match std::env::var("GOPATH") {
        Ok(old) if !old.is_empty() => {
            format!("{}{}{}", workspace.display(), PATH_LIST_SEP, old)
        }
        _ => workspace.display().to_string(),
    }
}

#[cfg(windows)]
const PATH_LIST_SEP: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEP: char = ':';

/// Copy a child stream to a sink as bytes arrive, optionally teeing into a
/// retained tail buffer for error reporting.
fn drain<R: Read, W: Write>(
    mut reader: R,
    mut sink: W,
    tail: Option<&Mutex<Vec<u8>>>,
) -> io::Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
        if let Some(tail) = tail {
            let mut tail = tail
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            tail.extend_from_slice(&buf[..n]);
        }
    }
    sink.flush()
}

/// Poll for child exit, honoring cancellation by killing the child.
fn wait_with_cancel(child: &mut Child, cancel: &CancelToken) -> Result<ExitStatus> {
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let status = child.wait()?;
            return Err(GoplateError::Execution {
                status: status.code(),
                detail: "run cancelled".to_string(),
            });
        }
        match child.try_wait()? {
            Some(status) => return Ok(status),
            None => thread::sleep(WAIT_POLL),
        }
    }
}
