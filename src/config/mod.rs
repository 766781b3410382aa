use anyhow::{Context, Result};
use std::path::Path;

use common::config::{update_config, write_config, ExportConfig};

/// Prints the resolved configuration as TOML.
pub fn show(config: &ExportConfig) -> Result<()> {
    let toml_string =
        toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    print!("{toml_string}");
    Ok(())
}

/// Writes the resolved configuration to `path`, or to the first writable
/// default location.
pub fn init(config: &ExportConfig, path: Option<&Path>) -> Result<()> {
    let written = match path {
        Some(path) => {
            write_config(config, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path.to_path_buf()
        }
        None => update_config(config)?,
    };
    println!("{}", written.display());
    Ok(())
}
