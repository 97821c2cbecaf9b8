//! Ephemeral terraform working directories.
//!
//! Every operation gets its own freshly created directory. The directory is
//! removed when the [`Workspace`] is dropped unless the manager was told to
//! keep workspaces for debugging.

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{IacError, IacResult};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "terraform_client_workingdir";

/// Configuration file name inside a workspace.
pub const CONFIG_FILE: &str = "terraform.tf";

/// State file name inside a workspace.
pub const STATE_FILE: &str = "terraform.tfstate";

/// What a workspace is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Apply,
    Destroy,
    Outputs,
    /// Throwaway directory for a command that names no working directory
    Scratch,
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::Outputs => "outputs",
            Self::Scratch => "scratch",
        };
        write!(f, "{}", name)
    }
}

/// Allocates workspaces.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceManager {
    root: Option<PathBuf>,
    keep: bool,
}

impl WorkspaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create workspaces under `root` instead of the system temp dir.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Leave workspaces on disk after use.
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Create a fresh, uniquely named workspace.
    pub fn prepare(&self, purpose: Purpose) -> IacResult<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match &self.root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            let parent = self.root.clone().unwrap_or_else(std::env::temp_dir);
            IacError::workspace("create", parent, e)
        })?;

        let path = dir.path().to_path_buf();
        debug!("Prepared {} workspace at {:?}", purpose, path);

        Ok(Workspace {
            dir: Some(dir),
            path,
            purpose,
            keep: self.keep,
        })
    }
}

/// A single-use terraform working directory.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    purpose: Purpose,
    keep: bool,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.path.join(STATE_FILE)
    }

    /// Write the terraform configuration.
    pub fn write_config(&self, config: &[u8]) -> IacResult<PathBuf> {
        let path = self.config_path();
        std::fs::write(&path, config).map_err(|e| IacError::workspace("write", &path, e))?;
        Ok(path)
    }

    /// Write a state snapshot.
    pub fn write_state(&self, state: &[u8]) -> IacResult<PathBuf> {
        let path = self.state_path();
        std::fs::write(&path, state).map_err(|e| IacError::workspace("write", &path, e))?;
        Ok(path)
    }

    /// Read back the state file terraform left behind.
    pub fn read_state(&self) -> IacResult<Vec<u8>> {
        let path = self.state_path();
        std::fs::read(&path).map_err(|e| IacError::workspace("read", &path, e))
    }

    /// Keep the directory on disk and return its path.
    pub fn persist(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if self.keep {
                let path = dir.keep();
                info!("Keeping {} workspace at {:?}", self.purpose, path);
            } else if let Err(e) = dir.close() {
                debug!("Failed to remove workspace {:?}: {}", self.path, e);
            }
        }
    }
}
