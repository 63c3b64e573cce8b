//! Workspace materialization: collision-free staging of one run's artifacts.
//!
//! The workspace directory itself is caller-created and caller-destroyed;
//! this module only ever writes into it.

use crate::error::{GoplateError, Result};
use crate::input::ProviderInput;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name reserved for the synthesized hosting program.
pub const PROGRAM_FILE: &str = "main.go";

/// Deterministic source of unique staged-file tokens.
///
/// Owned by a [`Workspace`] so staged names are reproducible in tests; no
/// process-global random state is involved.
#[derive(Debug, Default)]
pub struct NameSource {
    counter: u32,
}

impl NameSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_token(&mut self) -> String {
        self.counter += 1;
        format!("gp{:04}.go", self.counter)
    }
}

/// A provider staged into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub source: PathBuf,
    pub staged: PathBuf,
    pub identifier: String,
    pub var_name: String,
}

/// An isolated staging directory for exactly one run.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    staged_names: HashSet<String>,
    names: NameSource,
}

impl Workspace {
    /// Open an existing directory as the staging root.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(GoplateError::SourceNotFound { path: root });
        }
        let mut staged_names = HashSet::new();
        // main.go is reserved for the synthesized program
        staged_names.insert(PROGRAM_FILE.to_string());
        Ok(Self {
            root,
            staged_names,
            names: NameSource::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy one source file into the workspace under a collision-free name.
    ///
    /// The staged name is the source's base name with a `.go` extension
    /// appended if absent; when that name is already taken (or reserved) a
    /// generated token name is used instead.
    pub fn stage(&mut self, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(GoplateError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let name = self.claim_name_for(source);
        let dest = self.root.join(&name);
        if let Err(e) = fs::copy(source, &dest) {
            // never leave a half-written artifact a later run could mistake
            // for a valid file
            let _ = fs::remove_file(&dest);
            return Err(GoplateError::StagingIo {
                path: source.to_path_buf(),
                source: e,
            });
        }
        Ok(dest)
    }

    /// Stage every resolved input, in order.
    ///
    /// All paths are checked for existence up front so a failure reports the
    /// complete set of missing inputs, not just the first.
    pub fn stage_inputs(&mut self, inputs: &[ProviderInput]) -> Result<Vec<Provider>> {
        let mut missing: Vec<PathBuf> = inputs
            .iter()
            .filter(|input| !input.path.is_file())
            .map(|input| input.path.clone())
            .collect();
        match missing.len() {
            0 => {}
            1 => {
                return Err(GoplateError::SourceNotFound {
                    path: missing.remove(0),
                })
            }
            _ => return Err(GoplateError::SourcesNotFound { paths: missing }),
        }

        inputs
            .iter()
            .map(|input| {
                let staged = self.stage(&input.path)?;
                Ok(Provider {
                    source: input.path.clone(),
                    staged,
                    identifier: input.identifier.clone(),
                    var_name: input.var_name.clone(),
                })
            })
            .collect()
    }

    /// Write the rendered pipe-registry source under a generated token name.
    ///
    /// A token name is always used here: the registry never competes with
    /// user-chosen base names.
    pub fn stage_registry(&mut self, go_source: &str) -> Result<PathBuf> {
        let name = self.claim_token();
        self.write_artifact(&name, go_source)
    }

    /// Write the synthesized hosting program as `main.go`.
    pub fn stage_program(&mut self, go_source: &str) -> Result<PathBuf> {
        // the name was reserved at construction time
        self.write_artifact(PROGRAM_FILE, go_source)
    }

    fn write_artifact(&mut self, name: &str, contents: &str) -> Result<PathBuf> {
        let dest = self.root.join(name);
        if let Err(e) = fs::write(&dest, contents) {
            let _ = fs::remove_file(&dest);
            return Err(GoplateError::StagingIo {
                path: dest,
                source: e,
            });
        }
        Ok(dest)
    }

    fn claim_name_for(&mut self, source: &Path) -> String {
        let Some(base) = source.file_name() else {
            return self.claim_token();
        };
        let base = base.to_string_lossy();
        let name = if base.ends_with(".go") {
            base.into_owned()
        } else {
            format!("{base}.go")
        };
        if self.staged_names.insert(name.clone()) {
            name
        } else {
            self.claim_token()
        }
    }

    fn claim_token(&mut self) -> String {
        loop {
            let token = self.names.next_token();
            if self.staged_names.insert(token.clone()) {
                return token;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::resolve_inputs;
    use goplate_testkit::temp_dir_in_workspace;

    fn write_source(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn stage_copies_under_base_name() {
        let sources = temp_dir_in_workspace();
        let staging = temp_dir_in_workspace();
        let source = write_source(sources.path(), "repos.go", "package main\n");

        let mut ws = Workspace::new(staging.path()).unwrap();
        let staged = ws.stage(&source).unwrap();

        assert_eq!(staged, staging.path().join("repos.go"));
        assert_eq!(fs::read_to_string(&staged).unwrap(), "package main\n");
    }

    #[test]
    fn stage_appends_go_extension() {
        let sources = temp_dir_in_workspace();
        let staging = temp_dir_in_workspace();
        let source = write_source(sources.path(), "a-private-note", "package main\n");

        let mut ws = Workspace::new(staging.path()).unwrap();
        let staged = ws.stage(&source).unwrap();
        assert_eq!(staged, staging.path().join("a-private-note.go"));
    }

    #[test]
    fn colliding_base_names_never_overwrite() {
        let sources = temp_dir_in_workspace();
        let staging = temp_dir_in_workspace();
        let first = write_source(sources.path(), "repos.go", "first\n");
        let nested = sources.path().join("nested");
        fs::create_dir(&nested).unwrap();
        let second = write_source(&nested, "repos.go", "second\n");

        let mut ws = Workspace::new(staging.path()).unwrap();
        let staged_first = ws.stage(&first).unwrap();
        let staged_second = ws.stage(&second).unwrap();

        assert_ne!(staged_first, staged_second);
        assert_eq!(fs::read_to_string(&staged_first).unwrap(), "first\n");
        assert_eq!(fs::read_to_string(&staged_second).unwrap(), "second\n");
    }

    #[test]
    fn main_go_is_reserved_for_the_program() {
        let sources = temp_dir_in_workspace();
        let staging = temp_dir_in_workspace();
        let source = write_source(sources.path(), "main.go", "user file\n");

        let mut ws = Workspace::new(staging.path()).unwrap();
        let staged = ws.stage(&source).unwrap();
        assert_ne!(staged, staging.path().join(PROGRAM_FILE));

        let program = ws.stage_program("package main\n").unwrap();
        assert_eq!(program, staging.path().join(PROGRAM_FILE));
        assert_eq!(fs::read_to_string(&staged).unwrap(), "user file\n");
    }

    #[test]
    fn missing_source_is_reported_with_its_path() {
        let staging = temp_dir_in_workspace();
        let mut ws = Workspace::new(staging.path()).unwrap();

        let err = ws.stage(Path::new("/WRONG/FILE")).unwrap_err();
        match err {
            GoplateError::SourceNotFound { path } => {
                assert_eq!(path, PathBuf::from("/WRONG/FILE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stage_inputs_reports_all_missing_paths_and_stages_nothing() {
        let staging = temp_dir_in_workspace();
        let mut ws = Workspace::new(staging.path()).unwrap();
        let inputs = resolve_inputs(&["/WRONG/ONE.go", "/WRONG/TWO.go"]).unwrap();

        let err = ws.stage_inputs(&inputs).unwrap_err();
        match &err {
            GoplateError::SourcesNotFound { paths } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("/WRONG/ONE.go"));
        assert!(msg.contains("/WRONG/TWO.go"));

        let staged: Vec<_> = fs::read_dir(staging.path()).unwrap().collect();
        assert!(staged.is_empty());
    }

    #[test]
    fn stage_inputs_preserves_order_and_descriptors() {
        let sources = temp_dir_in_workspace();
        let staging = temp_dir_in_workspace();
        write_source(sources.path(), "first.go", "package main\n");
        write_source(sources.path(), "second.go", "package main\n");

        let specs = [
            sources.path().join("first.go").display().to_string(),
            format!("{}:Custom", sources.path().join("second.go").display()),
        ];
        let inputs = resolve_inputs(&specs).unwrap();

        let mut ws = Workspace::new(staging.path()).unwrap();
        let providers = ws.stage_inputs(&inputs).unwrap();

        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].identifier, "First");
        assert_eq!(providers[1].identifier, "Custom");
        assert_eq!(providers[1].var_name, "custom");
        assert!(providers[0].staged.is_file());
        assert!(providers[1].staged.is_file());
    }

    #[test]
    fn registry_gets_a_token_name() {
        let staging = temp_dir_in_workspace();
        let mut ws = Workspace::new(staging.path()).unwrap();

        let first = ws.stage_registry("package main\n").unwrap();
        let second = ws.stage_registry("package main\n").unwrap();
        assert_ne!(first, second);
        assert!(first.file_name().unwrap().to_string_lossy().ends_with(".go"));
    }

    #[test]
    fn missing_workspace_root_is_an_error() {
        let err = Workspace::new("/NO/SUCH/DIRECTORY").unwrap_err();
        assert!(matches!(err, GoplateError::SourceNotFound { .. }));
    }
}
