//! Local configuration commands.

use std::path::{Path, PathBuf};

use govee_lan_core::config::default_config_path;
use govee_lan_core::DiscoveryConfig;

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the config command
pub fn run_config(args: ConfigArgs, config_path: Option<&Path>, json: bool) -> Result<(), CliError> {
    let formatter = get_formatter(json);

    match args.command {
        ConfigCommands::Show => {
            let config = DiscoveryConfig::load_or_default(config_path)?;
            println!("{}", formatter.format_config(&config));
        }
        ConfigCommands::Path => {
            let path = resolve_path(None, config_path)?;
            println!("{}", formatter.format_message(&path.display().to_string()));
        }
        ConfigCommands::Init { output, force } => {
            let path = resolve_path(output, config_path)?;
            init_config(&path, force)?;
            println!(
                "{}",
                formatter.format_message(&format!("Wrote default config to {}", path.display()))
            );
        }
    }

    Ok(())
}

fn resolve_path(explicit: Option<PathBuf>, config_path: Option<&Path>) -> Result<PathBuf, CliError> {
    explicit
        .or_else(|| config_path.map(Path::to_path_buf))
        .or_else(default_config_path)
        .ok_or_else(|| CliError::Other("Could not determine a config directory".to_string()))
}

fn init_config(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    DiscoveryConfig::default().save(path)?;
    Ok(())
}
