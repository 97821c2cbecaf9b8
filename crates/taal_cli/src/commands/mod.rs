//! CLI command definitions.
//!
//! Each subcommand maps to one lifecycle operation of a taal session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use taal_iac::{Infra, TerraformClient, TerraformSettings};

pub mod apply;
pub mod destroy;
pub mod output;
pub mod version;

/// taal - drive terraform as a library
#[derive(Parser)]
#[command(name = "taal")]
#[command(version, about = "taal - apply, destroy and read outputs of terraform configurations")]
#[command(long_about = r#"
taal runs terraform in a fresh, isolated working directory per operation.
Configuration, credentials and state are passed in as files; the child
process only sees PATH, HOME, the credentials variable and
CHECKPOINT_DISABLE.

WORKFLOWS:
  apply    → init + apply, then write the new state file
  destroy  → init + destroy against an existing state file
  output   → read declared outputs from a state file
  version  → show the terraform version in use

EXIT CODES:
  0 - Success
  1 - General error
  2 - Missing credentials or configuration, or a bad variable name
  5 - Terraform error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (YAML)
    #[arg(long, global = true, env = "TAAL_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Terraform executable, overrides the settings file
    #[arg(long, global = true, env = "TAAL_TERRAFORM_BIN")]
    pub terraform: Option<PathBuf>,

    /// Leave working directories on disk for inspection
    #[arg(long, global = true)]
    pub keep_workspaces: bool,
}

impl GlobalArgs {
    /// Resolve settings: file first, then command-line overrides.
    pub fn load_settings(&self) -> Result<TerraformSettings> {
        let mut settings = match &self.settings {
            Some(path) => TerraformSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => TerraformSettings::default(),
        };

        if let Some(binary) = &self.terraform {
            settings = settings.with_binary(binary);
        }
        if self.keep_workspaces {
            settings = settings.keep_workspaces(true);
        }
        if self.verbose {
            settings = settings.stream_logs(true);
        }

        Ok(settings)
    }

    pub fn client(&self) -> Result<TerraformClient> {
        Ok(TerraformClient::local(self.load_settings()?))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision a configuration and write the resulting state
    Apply(apply::ApplyArgs),

    /// Destroy the infrastructure recorded in a state file
    Destroy(destroy::DestroyArgs),

    /// Print the outputs recorded in a state file
    Output(output::OutputArgs),

    /// Show the terraform version
    Version,
}

/// Session inputs shared by apply and destroy.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Terraform configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Credentials passed to the provider (e.g. a service-account key path)
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", hide_env_values = true)]
    pub credentials: Option<String>,

    /// Directory of pre-downloaded provider plugins
    #[arg(long)]
    pub plugin_dir: Option<PathBuf>,

    /// Variable override, repeatable
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

impl SessionArgs {
    /// Build a session from the files named on the command line.
    pub fn to_infra(&self) -> Result<Infra> {
        let config = read_file(&self.config, "configuration")?;

        let mut infra = Infra::new()
            .with_config(config)
            .with_credentials(self.credentials.clone().unwrap_or_default());
        if let Some(dir) = &self.plugin_dir {
            infra.set_plugin_dir(dir);
        }
        infra.set_inputs(self.vars.iter().cloned().collect::<BTreeMap<_, _>>());

        Ok(infra)
    }
}

/// Parse a `NAME=VALUE` variable override.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {:?}", raw)),
    }
}

pub fn read_file(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {} from {}", what, path.display()))
}
