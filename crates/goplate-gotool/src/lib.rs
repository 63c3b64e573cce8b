//! Go toolchain wrapper: binary resolution and workspace-pinned execution
//! of synthesized hosting programs.

pub mod exec;
pub mod resolve;

pub use exec::{run_plan, CancelToken, RunOptions};
pub use resolve::{go_version, resolve_go, GO_BINARY_ENV};
