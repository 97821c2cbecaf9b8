//! Output command - Print outputs recorded in a state file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use taal_iac::Infra;

use super::{read_file, GlobalArgs};

#[derive(Args)]
pub struct OutputArgs {
    /// Print only this output's value
    pub name: Option<String>,

    /// State file to read
    #[arg(long, default_value = "terraform.tfstate")]
    pub state: PathBuf,

    /// Print all outputs as a JSON object
    #[arg(long, conflicts_with = "name")]
    pub json: bool,
}

pub async fn execute(global: &GlobalArgs, args: OutputArgs) -> Result<()> {
    let client = global.client()?;
    let infra = Infra::new().with_state(read_file(&args.state, "state")?);

    let outputs = client.outputs(&infra).await?;
    print!("{}", render(&outputs, &args)?);

    Ok(())
}

fn render(outputs: &BTreeMap<String, String>, args: &OutputArgs) -> Result<String> {
    if let Some(name) = &args.name {
        let value = outputs
            .get(name)
            .with_context(|| format!("Output {:?} not found", name))?;
        return Ok(format!("{}\n", value));
    }

    if args.json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(outputs)?));
    }

    Ok(outputs
        .iter()
        .map(|(name, value)| format!("{} = {}\n", name, value))
        .collect())
}
