//! Apply, destroy and output orchestration.
//!
//! Each operation checks the session's preconditions, prepares its own
//! workspace, then runs `init` followed by the operation subcommand. Output
//! reads skip `init` and only need the state file.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use taal_runner::{CommandRunner, ProcessRunner};

use crate::error::{IacError, IacResult};
use crate::markers;
use crate::outputs::decode_outputs;
use crate::session::Infra;
use crate::settings::TerraformSettings;
use crate::terraform::{self, TerraformEnv, TerraformRunner};
use crate::workspace::{Purpose, Workspace, WorkspaceManager};

/// Result of a successful apply.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Terraform's stdout, containing [`crate::markers::APPLY_SUCCESS`]
    pub stdout: String,
    /// The freshly written state file
    pub state: Vec<u8>,
}

/// Result of a successful destroy.
#[derive(Debug, Clone)]
pub struct DestroyOutcome {
    /// Terraform's stdout, containing [`crate::markers::DESTROY_SUCCESS`]
    pub stdout: String,
}

/// Drives terraform for [`Infra`] sessions.
#[derive(Clone)]
pub struct TerraformClient {
    terraform: TerraformRunner,
    settings: TerraformSettings,
}

impl TerraformClient {
    /// Create a client on top of any command runner.
    pub fn new(runner: Arc<dyn CommandRunner>, settings: TerraformSettings) -> Self {
        let mut workspaces = WorkspaceManager::new().keep(settings.keep_workspaces);
        if let Some(root) = &settings.workspace_root {
            workspaces = workspaces.with_root(root);
        }

        let terraform = TerraformRunner::new(runner)
            .with_binary(settings.binary.clone())
            .with_run_config(settings.run_config())
            .with_workspaces(workspaces);

        Self { terraform, settings }
    }

    /// Create a client that spawns local terraform processes.
    pub fn local(settings: TerraformSettings) -> Self {
        Self::new(Arc::new(ProcessRunner::default()), settings)
    }

    pub fn settings(&self) -> &TerraformSettings {
        &self.settings
    }

    pub fn terraform(&self) -> &TerraformRunner {
        &self.terraform
    }

    /// Provision the session's configuration.
    ///
    /// The session is not modified; the new state is returned in the outcome.
    pub async fn apply(&self, infra: &Infra) -> IacResult<ApplyOutcome> {
        let span = info_span!("terraform_apply", operation_id = %Uuid::new_v4());
        self.run_apply(infra).instrument(span).await
    }

    async fn run_apply(&self, infra: &Infra) -> IacResult<ApplyOutcome> {
        check_credentials_and_config(infra)?;
        terraform::validate_inputs(infra.inputs())?;

        let ws = self.prepare(Purpose::Apply, infra)?;
        let env = self.lifecycle_env(infra);

        self.init(&ws, &env, infra).await?;

        info!("Applying configuration");
        let result = self
            .terraform
            .run(Some(ws.path()), &env, terraform::apply_args(infra.inputs()))
            .await?;

        if !markers::is_apply_success(&result.stdout) {
            warn!("terraform apply exited cleanly without its completion banner");
        }
        let state = ws.read_state()?;
        info!("Apply complete, state is {} bytes", state.len());

        Ok(ApplyOutcome {
            stdout: result.stdout,
            state,
        })
    }

    /// Apply and replace the session's state on success.
    ///
    /// On any failure the previous state is left untouched.
    pub async fn apply_and_record(&self, infra: &mut Infra) -> IacResult<String> {
        let outcome = self.apply(infra).await?;
        infra.set_state(outcome.state);
        Ok(outcome.stdout)
    }

    /// Tear down the infrastructure recorded in the session's state.
    ///
    /// The session's state is not updated afterwards.
    pub async fn destroy(&self, infra: &Infra) -> IacResult<DestroyOutcome> {
        let span = info_span!("terraform_destroy", operation_id = %Uuid::new_v4());
        self.run_destroy(infra).instrument(span).await
    }

    async fn run_destroy(&self, infra: &Infra) -> IacResult<DestroyOutcome> {
        check_credentials_and_config(infra)?;
        terraform::validate_inputs(infra.inputs())?;

        let ws = self.prepare(Purpose::Destroy, infra)?;
        ws.write_state(infra.state())?;
        let env = self.lifecycle_env(infra);

        self.init(&ws, &env, infra).await?;

        info!("Destroying infrastructure");
        let result = self
            .terraform
            .run(Some(ws.path()), &env, terraform::destroy_args(infra.inputs()))
            .await?;

        if !markers::is_destroy_success(&result.stdout) {
            warn!("terraform destroy exited cleanly without its completion banner");
        }
        info!("Destroy complete");
        Ok(DestroyOutcome {
            stdout: result.stdout,
        })
    }

    /// Read declared outputs from the session's state.
    pub async fn outputs(&self, infra: &Infra) -> IacResult<BTreeMap<String, String>> {
        let span = info_span!("terraform_output", operation_id = %Uuid::new_v4());
        self.run_outputs(infra).instrument(span).await
    }

    async fn run_outputs(&self, infra: &Infra) -> IacResult<BTreeMap<String, String>> {
        let ws = self.terraform.workspaces().prepare(Purpose::Outputs)?;
        let state_file = ws.write_state(infra.state())?;

        let result = self
            .terraform
            .run(Some(ws.path()), &TerraformEnv::base(), terraform::output_args(&state_file))
            .await?;

        let outputs = decode_outputs(&result.stdout)?;
        info!("Read {} outputs", outputs.len());
        Ok(outputs)
    }

    /// Terraform version line from the configured executable.
    pub async fn version(&self) -> IacResult<String> {
        self.terraform.version().await
    }

    fn prepare(&self, purpose: Purpose, infra: &Infra) -> IacResult<Workspace> {
        let ws = self.terraform.workspaces().prepare(purpose)?;
        ws.write_config(infra.config())?;
        Ok(ws)
    }

    fn lifecycle_env(&self, infra: &Infra) -> TerraformEnv {
        let env = TerraformEnv::base()
            .with_credentials(&self.settings.credentials_env, infra.credentials());
        if self.settings.disable_checkpoint {
            env.with_checkpoint_disabled()
        } else {
            env
        }
    }

    async fn init(&self, ws: &Workspace, env: &TerraformEnv, infra: &Infra) -> IacResult<()> {
        info!("Initializing workspace {:?}", ws.path());
        self.terraform
            .run(Some(ws.path()), env, terraform::init_args(infra.plugin_dir(), ws.path()))
            .await?;
        Ok(())
    }
}

fn check_credentials_and_config(infra: &Infra) -> IacResult<()> {
    if infra.credentials().is_empty() {
        return Err(IacError::MissingCredentials);
    }
    if infra.config().is_empty() {
        return Err(IacError::MissingConfig);
    }
    Ok(())
}
