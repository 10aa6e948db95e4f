//! Device control commands.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use govee_lan_core::error::DeviceError;
use govee_lan_core::normalize_identity;

use crate::cli::{CmdArgs, DeviceCommands};
use crate::error::CliError;
use crate::output::get_formatter;
use crate::session::Session;

/// Run the cmd command
pub async fn run_cmd(
    args: CmdArgs,
    config_path: Option<&Path>,
    timeout: Option<u64>,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let session = Session::open(config_path, timeout)?;

    let target = args.command.target().to_string();
    let description = args.command.describe();

    let result = match target.parse::<IpAddr>() {
        Ok(ip) => send_to_address(&session, ip, &args.command).await,
        Err(_) => {
            send_to_identity(
                &session,
                &target,
                &args.command,
                Duration::from_secs(args.discovery_duration),
            )
            .await
        }
    };

    session.close().await;

    println!(
        "{}",
        formatter.format_command_result(&target, &description, result.is_ok())
    );
    result
}

async fn send_to_address(
    session: &Session,
    ip: IpAddr,
    command: &DeviceCommands,
) -> Result<(), CliError> {
    let controller = &session.controller;

    match command {
        DeviceCommands::Turn { state, .. } => controller.turn_at(ip, state.is_on()).await?,
        DeviceCommands::Brightness { percent, .. } => {
            controller.set_brightness_at(ip, *percent).await?
        }
        DeviceCommands::ColorTemp { kelvin, .. } => {
            controller.set_color_temp_at(ip, *kelvin).await?
        }
    }

    Ok(())
}

/// Resolve the identity with a discovery run, then command the record.
async fn send_to_identity(
    session: &Session,
    identity: &str,
    command: &DeviceCommands,
    discovery: Duration,
) -> Result<(), CliError> {
    if normalize_identity(identity).is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "'{}' is neither an IP address nor a device identity",
            identity
        )));
    }

    session.discover(discovery).await?;
    if session.registry.lookup_device(identity).is_none() {
        return Err(DeviceError::NotFound(identity.to_string()).into());
    }

    let controller = &session.controller;
    match command {
        DeviceCommands::Turn { state, .. } => controller.turn(identity, state.is_on()).await?,
        DeviceCommands::Brightness { percent, .. } => {
            controller.set_brightness(identity, *percent).await?
        }
        DeviceCommands::ColorTemp { kelvin, .. } => {
            controller.set_color_temp(identity, *kelvin).await?
        }
    };

    Ok(())
}
