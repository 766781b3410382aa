mod file;

pub use file::{
    load_config, load_config_with_env, update_config, write_config, ConfigFileError,
    ExportConfig, PostgresSection, ToolsSection, CONFIG_PATHS,
};
