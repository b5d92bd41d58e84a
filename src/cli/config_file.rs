//! Reads/writes the `KEY=VALUE` sidecar config file next to a recording,
//! thin glue around [`mm_export_core::config::ExportConfig`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mm_export_core::config::ExportConfig;

pub fn load(path: &Path) -> Result<ExportConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    Ok(ExportConfig::from_config_lines(&text))
}

pub fn save(path: &Path, config: &ExportConfig) -> Result<()> {
    fs::write(path, config.to_config_lines())
        .with_context(|| format!("writing config file {}", path.display()))?;
    Ok(())
}
