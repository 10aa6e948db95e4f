//! Status command implementation.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output::get_formatter;
use crate::session::Session;

/// Run the status command
pub async fn run_status(
    args: StatusArgs,
    config_path: Option<&Path>,
    timeout: Option<u64>,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let target = parse_target(&args.target)?;
    let session = Session::open(config_path, timeout)?;

    let result = match target {
        None => show_all(&session, Duration::from_secs(args.discovery_duration), json).await,
        Some(ip) => match session.controller.query_status(ip).await {
            Ok(Some(status)) => {
                println!("{}", formatter.format_status_reply(&args.target, &status));
                Ok(())
            }
            Ok(None) => Err(CliError::Timeout(format!("no status reply from {}", ip))),
            Err(e) => Err(e.into()),
        },
    };

    session.close().await;
    result
}

/// `all` selects every discovered device; anything else must be an IP address.
fn parse_target(target: &str) -> Result<Option<IpAddr>, CliError> {
    if target.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    target
        .parse()
        .map(Some)
        .map_err(|_| CliError::InvalidArgument(format!("'{}' is not an IP address", target)))
}

async fn show_all(session: &Session, duration: Duration, json: bool) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let devices = session.discover(duration).await?;

    if devices.is_empty() {
        return Err(CliError::NoDevicesFound);
    }

    if json {
        println!("{}", formatter.format_devices(&devices));
    } else {
        for device in &devices {
            println!("{}\n", formatter.format_device_status(device));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("all").unwrap(), None);
        assert_eq!(parse_target("ALL").unwrap(), None);
        assert_eq!(
            parse_target("192.168.1.20").unwrap(),
            Some(IpAddr::from([192, 168, 1, 20]))
        );
        assert!(matches!(
            parse_target("kitchen"),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
