//! Destroy command - Tear down recorded infrastructure.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{read_file, GlobalArgs, SessionArgs};

#[derive(Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// State file from a previous apply
    #[arg(long, default_value = "terraform.tfstate")]
    pub state: PathBuf,
}

pub async fn execute(global: &GlobalArgs, args: DestroyArgs) -> Result<()> {
    info!("Destroying infrastructure recorded in {}", args.state.display());

    let client = global.client()?;
    let infra = args
        .session
        .to_infra()?
        .with_state(read_file(&args.state, "state")?);

    let outcome = client.destroy(&infra).await?;
    print!("{}", outcome.stdout);

    Ok(())
}
