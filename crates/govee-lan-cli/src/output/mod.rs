//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use govee_lan_core::protocol::StatusReply;
use govee_lan_core::{DeviceRecord, DiscoveryConfig};

/// Output formatter trait
pub trait OutputFormatter {
    /// Format device list
    fn format_devices(&self, devices: &[DeviceRecord]) -> String;

    /// Format a single registry record
    fn format_device_status(&self, device: &DeviceRecord) -> String;

    /// Format a status reply received directly from `ip`
    fn format_status_reply(&self, ip: &str, status: &StatusReply) -> String;

    /// Format command result
    fn format_command_result(&self, target: &str, command: &str, success: bool) -> String;

    /// Format the effective configuration
    fn format_config(&self, config: &DiscoveryConfig) -> String;

    /// Format a generic message
    fn format_message(&self, message: &str) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}
