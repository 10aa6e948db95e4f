//! Outbound message builders for the Govee LAN protocol.
//!
//! Discovery queries go to the multicast group on port 4001; control commands
//! go unicast to a device on port 4003.

use serde::Serialize;

use super::Envelope;

/// Value the devices expect in the `scan` request body.
pub const SCAN_ACCOUNT_TOPIC: &str = "reserve";

/// Lowest color temperature accepted by [`Commands::set_color_temp_kelvin`].
pub const MIN_KELVIN: u32 = 1000;

/// Outbound command, serialized as `{"cmd": <tag>, "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", content = "data")]
pub enum Command {
    #[serde(rename = "scan")]
    Scan { account_topic: String },

    #[serde(rename = "devStatus")]
    DevStatus {},

    #[serde(rename = "turn")]
    Turn { value: u8 },

    #[serde(rename = "brightness")]
    Brightness { value: u8 },

    #[serde(rename = "set_color_temp")]
    SetColorTemp { mired: u32 },
}

impl Command {
    /// Wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Scan { .. } => "scan",
            Command::DevStatus {} => "devStatus",
            Command::Turn { .. } => "turn",
            Command::Brightness { .. } => "brightness",
            Command::SetColorTemp { .. } => "set_color_temp",
        }
    }

    pub fn into_envelope(self) -> Envelope<Command> {
        Envelope::new(self)
    }
}

/// Command builders for device protocol
pub struct Commands;

impl Commands {
    // ==================== Discovery ====================

    /// Full discovery query: devices answer with identity, address and model.
    pub fn scan() -> Envelope<Command> {
        Command::Scan {
            account_topic: SCAN_ACCOUNT_TOPIC.to_string(),
        }
        .into_envelope()
    }

    /// Status query: devices answer with power, brightness and color temperature.
    pub fn dev_status() -> Envelope<Command> {
        Command::DevStatus {}.into_envelope()
    }

    // ==================== Control ====================

    pub fn turn(on: bool) -> Envelope<Command> {
        Command::Turn { value: u8::from(on) }.into_envelope()
    }

    /// Set brightness. Values above 100 are clamped.
    pub fn brightness(percent: u8) -> Envelope<Command> {
        Command::Brightness {
            value: percent.min(100),
        }
        .into_envelope()
    }

    pub fn set_color_temp(mired: u32) -> Envelope<Command> {
        Command::SetColorTemp { mired }.into_envelope()
    }

    pub fn set_color_temp_kelvin(kelvin: u32) -> Envelope<Command> {
        Self::set_color_temp(kelvin_to_mired(kelvin))
    }
}

/// Convert a color temperature in Kelvin to mired (micro reciprocal degrees).
pub fn kelvin_to_mired(kelvin: u32) -> u32 {
    1_000_000 / kelvin.max(MIN_KELVIN)
}
