//! JSON-formatted output for CLI.

use serde::Serialize;
use serde_json::json;

use govee_lan_core::protocol::StatusReply;
use govee_lan_core::{DeviceRecord, DeviceState, DiscoveryConfig};

use super::OutputFormatter;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_devices(&self, devices: &[DeviceRecord]) -> String {
        let output = json!({
            "devices": devices,
            "count": devices.len()
        });
        Self::to_json(&output)
    }

    fn format_device_status(&self, device: &DeviceRecord) -> String {
        Self::to_json(device)
    }

    fn format_status_reply(&self, ip: &str, status: &StatusReply) -> String {
        Self::to_json(&json!({
            "ip": ip,
            "state": DeviceState::from(status)
        }))
    }

    fn format_command_result(&self, target: &str, command: &str, success: bool) -> String {
        Self::to_json(&json!({
            "target": target,
            "command": command,
            "success": success
        }))
    }

    fn format_config(&self, config: &DiscoveryConfig) -> String {
        Self::to_json(config)
    }

    fn format_message(&self, message: &str) -> String {
        Self::to_json(&json!({ "message": message }))
    }
}
