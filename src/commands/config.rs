//! `config` command: dump the configuration the forwarder would run with.

use anyhow::{Context, Result};
use ndnfw_core::ForwarderConfig;

pub fn show(config: &ForwarderConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
    println!("{}", json);
    Ok(())
}
