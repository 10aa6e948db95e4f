//! Error types for Govee LAN CLI.
//!
//! CliError wraps CoreError from the shared library and adds CLI-specific variants.

use govee_lan_core::error::CoreError;
use thiserror::Error;

pub use govee_lan_core::error::{ConfigError, DeviceError, DiscoveryError, TransportError};

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const DEVICE_ERROR: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No devices found")]
    NoDevicesFound,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Transport(_) | CoreError::Discovery(_) => exit_codes::NETWORK_ERROR,
                CoreError::Device(_) | CoreError::Protocol(_) => exit_codes::DEVICE_ERROR,
                CoreError::Config(_) => exit_codes::GENERAL_ERROR,
                CoreError::Io(_) => exit_codes::GENERAL_ERROR,
                CoreError::Other(_) => exit_codes::GENERAL_ERROR,
            },
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::NoDevicesFound => exit_codes::GENERAL_ERROR,
            CliError::Timeout(_) => exit_codes::NETWORK_ERROR,
            CliError::Other(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

// Conversions from core error subtypes to CliError
impl From<DeviceError> for CliError {
    fn from(e: DeviceError) -> Self {
        CliError::Core(CoreError::Device(e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Core(CoreError::Config(e))
    }
}

impl From<DiscoveryError> for CliError {
    fn from(e: DiscoveryError) -> Self {
        CliError::Core(CoreError::Discovery(e))
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Core(CoreError::Transport(e))
    }
}
