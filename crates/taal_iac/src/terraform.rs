//! Terraform invocation.
//!
//! Builds argument vectors for each subcommand and runs them through a
//! [`CommandRunner`] with an explicitly scoped environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use taal_runner::{CommandRunner, CommandSpec, ExecutionResult, RunConfig};

use crate::error::{CommandFailure, IacError, IacResult};
use crate::workspace::{Purpose, WorkspaceManager};

/// Appended to every invocation.
pub const NO_COLOR: &str = "-no-color";

/// The environment handed to a terraform child process.
///
/// Only `PATH` and `HOME` are taken from the calling process; everything
/// else must be added explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformEnv {
    vars: BTreeMap<String, String>,
}

impl TerraformEnv {
    /// `PATH` and `HOME` from the current process.
    pub fn base() -> Self {
        let mut vars = BTreeMap::new();
        for key in ["PATH", "HOME"] {
            let value = std::env::var_os(key)
                .map(|v| v.to_string_lossy().into_owned())
                .unwrap_or_default();
            vars.insert(key.to_string(), value);
        }
        Self { vars }
    }

    /// An environment with no variables at all.
    pub fn empty() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Point the provider at the credentials.
    pub fn with_credentials(mut self, env_name: &str, credentials: &[u8]) -> Self {
        self.vars.insert(
            env_name.to_string(),
            String::from_utf8_lossy(credentials).into_owned(),
        );
        self
    }

    /// Turn off HashiCorp's upgrade and security-bulletin check.
    pub fn with_checkpoint_disabled(mut self) -> Self {
        self.vars.insert("CHECKPOINT_DISABLE".to_string(), "1".to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.vars
    }
}

/// Check that every input name is a terraform identifier.
pub fn validate_inputs(inputs: &BTreeMap<String, String>) -> IacResult<()> {
    for name in inputs.keys() {
        if !is_identifier(name) {
            return Err(IacError::InvalidVariable(name.clone()));
        }
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `-var name=value` pairs in name order.
pub fn var_args(inputs: &BTreeMap<String, String>) -> Vec<String> {
    inputs
        .iter()
        .flat_map(|(name, value)| ["-var".to_string(), format!("{}={}", name, value)])
        .collect()
}

pub fn init_args(plugin_dir: Option<&Path>, workdir: &Path) -> Vec<String> {
    let mut args = vec![
        "init".to_string(),
        "-input=false".to_string(),
        "-get=true".to_string(),
        "-backend=false".to_string(),
    ];
    if let Some(dir) = plugin_dir {
        args.push(format!("-plugin-dir={}", dir.display()));
    }
    args.push(workdir.display().to_string());
    args
}

pub fn apply_args(inputs: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec![
        "apply".to_string(),
        "-auto-approve".to_string(),
        "-input=false".to_string(),
    ];
    args.extend(var_args(inputs));
    args
}

pub fn destroy_args(inputs: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec!["destroy".to_string(), "-force".to_string()];
    args.extend(var_args(inputs));
    args
}

pub fn output_args(state_file: &Path) -> Vec<String> {
    vec![
        "output".to_string(),
        "-json".to_string(),
        format!("-state={}", state_file.display()),
    ]
}

/// Terraform runner that executes commands as local processes.
#[derive(Clone)]
pub struct TerraformRunner {
    runner: Arc<dyn CommandRunner>,
    binary: PathBuf,
    run_config: RunConfig,
    workspaces: WorkspaceManager,
}

impl TerraformRunner {
    /// Create a new Terraform runner using `terraform` from `PATH`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            binary: PathBuf::from("terraform"),
            run_config: RunConfig::default(),
            workspaces: WorkspaceManager::new(),
        }
    }

    /// Set a custom Terraform executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_run_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }

    pub fn with_workspaces(mut self, workspaces: WorkspaceManager) -> Self {
        self.workspaces = workspaces;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Whether the Terraform executable can be run.
    pub async fn is_available(&self) -> IacResult<bool> {
        Ok(self.runner.is_available(&self.binary.to_string_lossy()).await?)
    }

    /// Terraform version line.
    pub async fn version(&self) -> IacResult<String> {
        Ok(self.runner.version(&self.binary.to_string_lossy()).await?)
    }

    /// Run a terraform subcommand.
    ///
    /// Without a directory a scratch workspace is used for the duration of
    /// the call. A non-zero exit becomes [`IacError::CommandFailed`] carrying
    /// both captured streams.
    pub async fn run(
        &self,
        directory: Option<&Path>,
        env: &TerraformEnv,
        args: Vec<String>,
    ) -> IacResult<ExecutionResult> {
        let scratch;
        let workdir = match directory {
            Some(dir) => dir,
            None => {
                scratch = self.workspaces.prepare(Purpose::Scratch)?;
                scratch.path()
            }
        };

        let subcommand = args.first().cloned().unwrap_or_default();
        let spec = CommandSpec::new(&self.binary)
            .args(args)
            .arg(NO_COLOR)
            .workdir(workdir)
            .envs(env.clone().into_map());

        debug!(
            "Running terraform {} in {:?} with env {:?}",
            subcommand,
            workdir,
            env.keys().collect::<Vec<_>>()
        );

        let result = self.runner.run(&spec, &self.run_config).await?;

        if !result.success() {
            warn!("terraform {} exited with code {}", subcommand, result.exit_code);
            return Err(IacError::CommandFailed(Box::new(CommandFailure {
                subcommand,
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            })));
        }

        Ok(result)
    }
}
