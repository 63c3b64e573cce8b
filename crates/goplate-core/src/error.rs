use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoplateError {
    // Input resolution errors
    #[error("INPUT_SPEC_INVALID: {0}")]
    InputSpecInvalid(String),

    #[error(
        "INPUT_IDENTIFIER_COLLISION: identifier '{identifier}' is produced by both '{}' and '{}'",
        .first.display(),
        .second.display()
    )]
    IdentifierCollision {
        identifier: String,
        first: PathBuf,
        second: PathBuf,
    },

    // Staging errors
    #[error("SOURCE_NOT_FOUND: input file '{}' is missing or unreadable", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("SOURCES_NOT_FOUND: missing input files: {}", join_paths(.paths))]
    SourcesNotFound { paths: Vec<PathBuf> },

    #[error("STAGING_IO_ERROR: failed to stage '{}': {source}", .path.display())]
    StagingIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Registry errors (merge cannot currently fail; reserved for override
    // shape validation)
    #[error("REGISTRY_MERGE_ERROR: {0}")]
    RegistryMerge(String),

    // Synthesis errors: a failure here is a defect in the embedded bootstrap
    // template, not in user input
    #[error("SYNTHESIS_FAILED: bootstrap template expansion failed: {0}")]
    Synthesis(String),

    // Toolchain errors
    #[error("GO_NOT_RESOLVED: go binary not found (searched: {searched})")]
    GoNotResolved { searched: String },

    #[error("GO_EXEC_FAILED: {0}")]
    GoExecFailed(String),

    #[error("DEPENDENCY_RESOLUTION_FAILED: {detail}")]
    DependencyResolution { detail: String },

    #[error("EXECUTION_FAILED: {detail}")]
    Execution { status: Option<i32>, detail: String },

    // IO errors
    #[error("IO_ERROR: {0}")]
    IoError(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, GoplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_not_found_lists_every_path() {
        let err = GoplateError::SourcesNotFound {
            paths: vec![PathBuf::from("/a/one.go"), PathBuf::from("/b/two.go")],
        };
        let msg = err.to_string();
        assert!(msg.contains("SOURCES_NOT_FOUND"));
        assert!(msg.contains("/a/one.go"));
        assert!(msg.contains("/b/two.go"));
    }

    #[test]
    fn source_not_found_names_the_path() {
        let err = GoplateError::SourceNotFound {
            path: PathBuf::from("/WRONG/FILE"),
        };
        assert!(err.to_string().contains("/WRONG/FILE"));
    }
}
