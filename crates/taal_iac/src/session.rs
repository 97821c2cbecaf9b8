//! The infrastructure session.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a session stands in its lifecycle, derived from its state bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No state recorded yet
    Uninitialized,
    /// State from a previous apply is present
    Applied,
}

/// One unit of infrastructure under management.
///
/// A plain value: configuration, credentials, last-known state, an optional
/// provider plugin directory and variable overrides. Operations borrow it;
/// only [`crate::TerraformClient::apply_and_record`] writes back the state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Infra {
    config: Vec<u8>,
    credentials: Vec<u8>,
    state: Vec<u8>,
    plugin_dir: Option<PathBuf>,
    inputs: BTreeMap<String, String>,
}

impl Infra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &[u8] {
        &self.config
    }

    pub fn set_config(&mut self, config: impl Into<Vec<u8>>) {
        self.config = config.into();
    }

    pub fn with_config(mut self, config: impl Into<Vec<u8>>) -> Self {
        self.set_config(config);
        self
    }

    pub fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    pub fn set_credentials(&mut self, credentials: impl Into<Vec<u8>>) {
        self.credentials = credentials.into();
    }

    pub fn with_credentials(mut self, credentials: impl Into<Vec<u8>>) -> Self {
        self.set_credentials(credentials);
        self
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    pub fn set_state(&mut self, state: impl Into<Vec<u8>>) {
        self.state = state.into();
    }

    pub fn with_state(mut self, state: impl Into<Vec<u8>>) -> Self {
        self.set_state(state);
        self
    }

    pub fn plugin_dir(&self) -> Option<&Path> {
        self.plugin_dir.as_deref()
    }

    /// Set the provider plugin directory. An empty path clears it.
    pub fn set_plugin_dir(&mut self, plugin_dir: impl Into<PathBuf>) {
        let dir = plugin_dir.into();
        self.plugin_dir = if dir.as_os_str().is_empty() { None } else { Some(dir) };
    }

    pub fn with_plugin_dir(mut self, plugin_dir: impl Into<PathBuf>) -> Self {
        self.set_plugin_dir(plugin_dir);
        self
    }

    pub fn inputs(&self) -> &BTreeMap<String, String> {
        &self.inputs
    }

    pub fn set_inputs(&mut self, inputs: BTreeMap<String, String>) {
        self.inputs = inputs;
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn phase(&self) -> SessionPhase {
        if self.state.is_empty() {
            SessionPhase::Uninitialized
        } else {
            SessionPhase::Applied
        }
    }
}

// Credentials stay out of debug output.
impl fmt::Debug for Infra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Infra")
            .field("config_bytes", &self.config.len())
            .field("credentials", &if self.credentials.is_empty() { "<unset>" } else { "<redacted>" })
            .field("state_bytes", &self.state.len())
            .field("plugin_dir", &self.plugin_dir)
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .finish()
    }
}
