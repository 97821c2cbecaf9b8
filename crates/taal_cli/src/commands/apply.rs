//! Apply command - Provision a configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::{GlobalArgs, SessionArgs};

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Where to write the resulting state
    #[arg(long, default_value = "terraform.tfstate")]
    pub state_out: PathBuf,
}

pub async fn execute(global: &GlobalArgs, args: ApplyArgs) -> Result<()> {
    info!("Applying configuration from {}", args.session.config.display());

    let client = global.client()?;
    let mut infra = args.session.to_infra()?;

    let stdout = client.apply_and_record(&mut infra).await?;

    std::fs::write(&args.state_out, infra.state())
        .with_context(|| format!("Failed to write state to {}", args.state_out.display()))?;

    print!("{}", stdout);
    if !global.quiet {
        eprintln!("State written to {}", args.state_out.display());
    }

    Ok(())
}
