mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pgexport",
    about = "Exports PostgreSQL databases into gzip-compressed tarballs",
    version
)]
struct Cli {
    /// Configuration file, replaces the default search path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump a database with pg_dump and archive it with tar
    Export(postgres::cli::ExportArgs),

    /// Check that pg_dump and tar are available
    Check(postgres::cli::CheckArgs),

    /// Manage the pgexport configuration
    #[clap(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,

    /// Write the resolved configuration to a file
    Init {
        /// Destination, defaults to ~/.config/pgexport/pgexport.toml
        #[clap(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_level(true)
        .format_module_path(false)
        .format_indent(Some(4))
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()?;

    let cli = Cli::parse();

    let file_config = common::config::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Export(args) => postgres::cli::commands::export(&args, &file_config)?,
        Commands::Check(args) => postgres::cli::commands::check(&args, &file_config)?,
        Commands::Config(config_command) => match config_command {
            ConfigCommands::Show => config::show(&file_config)?,
            ConfigCommands::Init { path } => config::init(&file_config, path.as_deref())?,
        },
    }

    Ok(())
}
