//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Govee LAN CLI - discover and control Govee lights on the local network
#[derive(Parser, Debug)]
#[command(name = "govee-lan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Reply timeout for unicast requests in milliseconds (overrides the config file)
    #[arg(long, global = true, env = "GOVEE_LAN_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: platform config directory)
    #[arg(long, global = true, env = "GOVEE_LAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover devices on the network
    Discover(DiscoverArgs),

    /// Query device status
    Status(StatusArgs),

    /// Send control commands to devices
    Cmd(CmdArgs),

    /// Local configuration management
    Config(ConfigArgs),
}

// ==================== Discover ====================

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Watch mode - keep polling until Ctrl+C
    #[arg(short, long)]
    pub watch: bool,

    /// Discovery duration in seconds (ignored in watch mode)
    #[arg(short, long, default_value = "5")]
    pub duration: u64,
}

// ==================== Status ====================

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Device IP address or "all" for all discovered devices
    pub target: String,

    /// Discovery duration when using "all" (seconds)
    #[arg(long, default_value = "5")]
    pub discovery_duration: u64,
}

// ==================== Cmd ====================

#[derive(Args, Debug)]
pub struct CmdArgs {
    #[command(subcommand)]
    pub command: DeviceCommands,

    /// Discovery duration used to resolve a device identity (seconds)
    #[arg(long, default_value = "3")]
    pub discovery_duration: u64,
}

#[derive(Subcommand, Debug)]
pub enum DeviceCommands {
    /// Switch a device on or off
    Turn {
        /// Device IP address or identity
        target: String,
        #[arg(value_enum)]
        state: PowerState,
    },

    /// Set brightness in percent
    Brightness {
        /// Device IP address or identity
        target: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Set color temperature in Kelvin
    ColorTemp {
        /// Device IP address or identity
        target: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1000..=10000))]
        kelvin: u32,
    },
}

impl DeviceCommands {
    pub fn target(&self) -> &str {
        match self {
            DeviceCommands::Turn { target, .. }
            | DeviceCommands::Brightness { target, .. }
            | DeviceCommands::ColorTemp { target, .. } => target,
        }
    }

    /// Short human-readable description used in command results.
    pub fn describe(&self) -> String {
        match self {
            DeviceCommands::Turn { state, .. } => format!("turn {}", state.as_str()),
            DeviceCommands::Brightness { percent, .. } => format!("brightness {}%", percent),
            DeviceCommands::ColorTemp { kelvin, .. } => format!("color-temp {}K", kelvin),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        self == PowerState::On
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerState::On => "on",
            PowerState::Off => "off",
        }
    }
}

// ==================== Config ====================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration to a file
    Init {
        /// Output file (default: --config or the platform config path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
