//! Run-plan assembly: resolution, staging, registry merge, and synthesis,
//! in fixed pipeline order.

use crate::bootstrap::synthesize_program;
use crate::error::Result;
use crate::input::resolve_inputs;
use crate::pipes::PipeRegistry;
use crate::workspace::{Provider, Workspace};
use std::path::{Path, PathBuf};

/// The immutable hand-off from plan assembly to the executor.
#[derive(Debug, Clone)]
pub struct Plan {
    pub workspace_root: PathBuf,
    pub program: PathBuf,
    pub registry_file: PathBuf,
    pub custom_pipes: Option<PathBuf>,
    pub providers: Vec<Provider>,
}

impl Plan {
    /// The staged sources passed to the toolchain alongside the hosting
    /// program: registry first, then the custom pipes file if any, then the
    /// providers in input order.
    pub fn source_args(&self) -> Vec<PathBuf> {
        let mut args = vec![self.registry_file.clone()];
        if let Some(pipes) = &self.custom_pipes {
            args.push(pipes.clone());
        }
        args.extend(self.providers.iter().map(|p| p.staged.clone()));
        args
    }
}

/// Builder staging everything a run needs into one workspace.
pub struct PlanBuilder {
    workspace: Workspace,
    registry: PipeRegistry,
    input_specs: Vec<String>,
    custom_pipes: Option<PathBuf>,
}

impl PlanBuilder {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            workspace: Workspace::new(workspace_root)?,
            registry: PipeRegistry::default_set(),
            input_specs: Vec::new(),
            custom_pipes: None,
        })
    }

    /// Ordered `path[:name]` input specifiers. Order fixes staging order and
    /// the synthesized program's provider invocation order.
    pub fn inputs<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_specs.extend(specs.into_iter().map(Into::into));
        self
    }

    /// Replace the default pipe set with a pre-merged registry.
    pub fn registry(mut self, registry: PipeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// A Go source file declaring `func CustomPipes() template.FuncMap`,
    /// applied over the staged registry at render time.
    pub fn custom_pipes(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_pipes = Some(path.into());
        self
    }

    /// Resolve, stage, and synthesize.
    ///
    /// The output template path is embedded as-is rather than validated
    /// here: a path that has gone missing by execution time surfaces through
    /// the hosting program's own diagnostic.
    pub fn finish(mut self, template: &Path) -> Result<Plan> {
        let inputs = resolve_inputs(&self.input_specs)?;
        let providers = self.workspace.stage_inputs(&inputs)?;
        let registry_file = self
            .workspace
            .stage_registry(&self.registry.to_go_source())?;
        let custom_pipes = match self.custom_pipes {
            Some(path) => Some(self.workspace.stage(&path)?),
            None => None,
        };
        let program_source =
            synthesize_program(template, &providers, custom_pipes.is_some())?;
        let program = self.workspace.stage_program(&program_source)?;

        Ok(Plan {
            workspace_root: self.workspace.root().to_path_buf(),
            program,
            registry_file,
            custom_pipes,
            providers,
        })
    }
}
