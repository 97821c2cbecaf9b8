//! Version command - Show the terraform version in use.

use anyhow::{bail, Result};

use super::GlobalArgs;

pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let client = global.client()?;
    let binary = client.settings().binary.display().to_string();

    if !client.terraform().is_available().await? {
        bail!("terraform executable {} is not available", binary);
    }

    println!("taal {}", env!("CARGO_PKG_VERSION"));
    println!("{} ({})", client.version().await?, binary);

    Ok(())
}
