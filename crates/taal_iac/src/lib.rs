//! # taal_iac
//!
//! Terraform lifecycle orchestration for taal.
//!
//! This crate treats provisioning as library calls: an [`Infra`] session
//! holds configuration, credentials, state, an optional plugin directory
//! and variable overrides, and a [`TerraformClient`] applies, destroys or
//! reads outputs for it by driving the terraform executable.
//!
//! ## Features
//!
//! - One fresh workspace per operation, removed afterwards unless kept
//! - `init` then `apply`/`destroy`, with sorted `-var` overrides
//! - Child processes see only `PATH`, `HOME`, the credentials variable and
//!   `CHECKPOINT_DISABLE`
//! - JSON output decoding
//!
//! ## Example
//!
//! ```rust,no_run
//! use taal_iac::{markers, Infra, TerraformClient, TerraformSettings};
//!
//! # async fn run() -> taal_iac::IacResult<()> {
//! let client = TerraformClient::local(TerraformSettings::default());
//!
//! let mut infra = Infra::new()
//!     .with_config(std::fs::read("main.tf")?)
//!     .with_credentials("/keys/service-account.json")
//!     .with_input("region", "us-central1");
//!
//! let stdout = client.apply_and_record(&mut infra).await?;
//! assert!(stdout.contains(markers::APPLY_SUCCESS));
//!
//! let outputs = client.outputs(&infra).await?;
//! println!("{:?}", outputs);
//!
//! client.destroy(&infra).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lifecycle;
pub mod markers;
pub mod outputs;
pub mod session;
pub mod settings;
pub mod terraform;
pub mod workspace;

pub use error::{CommandFailure, IacError, IacResult};
pub use lifecycle::{ApplyOutcome, DestroyOutcome, TerraformClient};
pub use outputs::{decode_outputs, TerraformOutput};
pub use session::{Infra, SessionPhase};
pub use settings::TerraformSettings;
pub use terraform::{TerraformEnv, TerraformRunner};
pub use workspace::{Purpose, Workspace, WorkspaceManager};
