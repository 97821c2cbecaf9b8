//! Error types for IaC module.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::markers;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during IaC operations.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("{}", markers::ERROR_MISSING_CREDENTIALS)]
    MissingCredentials,

    #[error("{}", markers::ERROR_MISSING_CONFIG)]
    MissingConfig,

    #[error("Invalid variable name: {0:?}")]
    InvalidVariable(String),

    #[error("Workspace {action} failed at {}: {source}", .path.display())]
    Workspace {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    CommandFailed(Box<CommandFailure>),

    #[error("Failed to decode terraform output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Runner error: {0}")]
    Runner(#[from] taal_runner::RunnerError),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IacError {
    pub(crate) fn workspace(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Workspace {
            action,
            path: path.into(),
            source,
        }
    }

    /// Whether the error was raised before any workspace or subprocess work.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::MissingConfig | Self::InvalidVariable(_)
        )
    }

    /// Captured terraform output for a failed command, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::CommandFailed(failure) => Some(failure.diagnostics()),
            _ => None,
        }
    }

    /// The failed command, if this error came from a non-zero exit.
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            Self::CommandFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A terraform invocation that exited non-zero.
///
/// Both captured streams are kept so callers can match them against the
/// banners in [`crate::markers`].
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub subcommand: String,
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

impl CommandFailure {
    /// Human-readable diagnostics: stderr, or stdout when stderr is empty.
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }

    /// Whether either stream contains the given marker.
    pub fn contains(&self, marker: &str) -> bool {
        self.stderr.contains(marker) || self.stdout.contains(marker)
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last_line = self
            .diagnostics()
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or("no output");
        write!(
            f,
            "terraform {} exited with code {}: {}",
            self.subcommand, self.exit_code, last_line
        )
    }
}
