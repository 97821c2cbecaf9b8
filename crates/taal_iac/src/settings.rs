//! Client settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taal_runner::RunConfig;

use crate::error::IacResult;

/// Environment variable that carries the credentials path by default.
pub const DEFAULT_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Settings for a [`crate::TerraformClient`].
///
/// Loaded from YAML; every field is optional there.
///
/// ```yaml
/// binary: /usr/local/bin/terraform
/// credentials_env: GOOGLE_APPLICATION_CREDENTIALS
/// keep_workspaces: true
/// timeout_seconds: 900
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformSettings {
    /// Terraform executable (name resolved through `PATH`, or a path)
    pub binary: PathBuf,
    /// Variable that receives the session credentials
    pub credentials_env: String,
    /// Set `CHECKPOINT_DISABLE=1` for apply and destroy
    pub disable_checkpoint: bool,
    /// Leave workspaces on disk after each operation
    pub keep_workspaces: bool,
    /// Parent directory for workspaces (system temp dir when unset)
    pub workspace_root: Option<PathBuf>,
    /// Per-command timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
    /// Log terraform output lines at debug level
    pub stream_logs: bool,
}

impl Default for TerraformSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            credentials_env: DEFAULT_CREDENTIALS_ENV.to_string(),
            disable_checkpoint: true,
            keep_workspaces: false,
            workspace_root: None,
            timeout_seconds: 0,
            stream_logs: false,
        }
    }
}

impl TerraformSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str) -> IacResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> IacResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_credentials_env(mut self, name: impl Into<String>) -> Self {
        self.credentials_env = name.into();
        self
    }

    pub fn keep_workspaces(mut self, keep: bool) -> Self {
        self.keep_workspaces = keep;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn stream_logs(mut self, enabled: bool) -> Self {
        self.stream_logs = enabled;
        self
    }

    /// Run configuration applied to every terraform command.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::default()
            .timeout(self.timeout_seconds)
            .stream_logs(self.stream_logs)
    }
}
