//! Discover command implementation.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use colored::*;
use govee_lan_core::PollKind;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::warn;

use crate::cli::DiscoverArgs;
use crate::error::CliError;
use crate::output::{get_formatter, OutputFormatter};
use crate::session::Session;

/// Run the discover command
pub async fn run_discover(
    args: DiscoverArgs,
    config_path: Option<&Path>,
    timeout: Option<u64>,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let session = Session::open(config_path, timeout)?;

    let result = if args.watch {
        run_watch_mode(&session, formatter.as_ref(), json).await
    } else {
        run_oneshot_mode(&session, Duration::from_secs(args.duration), formatter.as_ref()).await
    };

    session.close().await;
    result
}

async fn run_oneshot_mode(
    session: &Session,
    duration: Duration,
    formatter: &dyn OutputFormatter,
) -> Result<(), CliError> {
    eprintln!("Discovering devices for {} seconds...", duration.as_secs());

    let devices = session.discover(duration).await?;

    println!("{}", formatter.format_devices(&devices));

    if devices.is_empty() {
        return Err(CliError::NoDevicesFound);
    }

    Ok(())
}

/// Status query on the short cadence, full scan on the long one, until Ctrl+C.
async fn run_watch_mode(
    session: &Session,
    formatter: &dyn OutputFormatter,
    json: bool,
) -> Result<(), CliError> {
    let config = session.orchestrator.config();
    let short_every = config.short_poll_interval();
    let long_every = config.long_poll_interval();

    eprintln!("Watching for devices (press Ctrl+C to stop)...");
    session.orchestrator.start().await?;

    // start() already scanned; the first poll of each cadence is one period away
    let mut short_poll = interval_at(Instant::now() + short_every, short_every);
    let mut long_poll = interval_at(Instant::now() + long_every, long_every);
    let mut redraw = interval(Duration::from_secs(1));
    short_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    long_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    render(session, formatter, json);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = short_poll.tick() => {
                if let Err(e) = session.orchestrator.poll(PollKind::Short).await {
                    warn!("Status poll failed: {}", e);
                }
            }
            _ = long_poll.tick() => {
                if let Err(e) = session.orchestrator.poll(PollKind::Long).await {
                    warn!("Scan poll failed: {}", e);
                }
            }
            _ = redraw.tick() => {
                if session.host.take_changed() {
                    render(session, formatter, json);
                }
            }
        }
    }

    Ok(())
}

fn render(session: &Session, formatter: &dyn OutputFormatter, json: bool) {
    let devices = session.registry.devices();

    if json {
        // One document per update so the stream can be piped
        println!("{}", formatter.format_devices(&devices));
    } else {
        // Clear screen and print header
        print!("\x1B[2J\x1B[1;1H");
        println!("{}", "Govee LAN Device Watch".bold());
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();
        println!("{}", formatter.format_devices(&devices));
    }

    io::stdout().flush().ok();
}
