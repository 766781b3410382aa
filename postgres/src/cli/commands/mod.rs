use anyhow::{Context, Result};
use log::info;
use std::fs;

use ::common::config::ExportConfig;

use crate::cli::{CheckArgs, ExportArgs};
use crate::exporter::{Exporter, PostgresExporter};
use crate::wrapper::{PgDump, SystemRunner, Tar};

/// Runs one export and prints the archive path (or the JSON result).
pub fn export(args: &ExportArgs, file_config: &ExportConfig) -> Result<()> {
    let resolved = args.resolve(file_config);
    info!(
        "[CLI] Params: host={:?}, port={:?}, database={:?}, username={:?}, output_dir={:?}",
        resolved.config.host,
        resolved.config.port,
        resolved.config.database,
        resolved.config.username,
        resolved.output_dir
    );

    let mut exporter = PostgresExporter::new(resolved.config).tools(resolved.tools);
    if let Some(dir) = resolved.output_dir {
        if !dir.exists() {
            info!("[CLI] Creating output directory: {}", dir.display());
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        exporter = exporter.output_dir(dir);
    }

    let result = exporter.export();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    let path = result.into_result().context("Export failed")?;
    if !args.json {
        println!("{}", path.display());
    }

    Ok(())
}

/// Reports the version of both tools; fails if either cannot be run.
pub fn check(args: &CheckArgs, file_config: &ExportConfig) -> Result<()> {
    let tools = args.resolve(file_config);

    let pg_dump = PgDump::new(&tools.pg_dump).check_availability(&SystemRunner)?;
    println!("pg_dump: {pg_dump}");

    let tar = Tar::new(&tools.tar).check_availability(&SystemRunner)?;
    println!("tar: {tar}");

    Ok(())
}
