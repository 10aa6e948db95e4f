//! Table-formatted output for CLI.

use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use govee_lan_core::protocol::StatusReply;
use govee_lan_core::{DeviceRecord, DeviceState, DiscoveryConfig};

use super::OutputFormatter;

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }

    fn power_cell(state: &DeviceState) -> Cell {
        if state.power {
            Cell::new("On").fg(Color::Green)
        } else {
            Cell::new("Off").fg(Color::DarkGrey)
        }
    }

    fn last_seen(device: &DeviceRecord) -> String {
        device
            .last_seen
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableOutput {
    fn format_devices(&self, devices: &[DeviceRecord]) -> String {
        if devices.is_empty() {
            return "No devices found.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            "IP", "ID", "Name", "SKU", "Power", "Brightness", "Color Temp", "Last Seen",
        ]);

        for device in devices {
            table.add_row(vec![
                Cell::new(&device.ip_address),
                Cell::new(device.identity()),
                Cell::new(&device.display_name),
                Cell::new(&device.sku),
                Self::power_cell(&device.state),
                Cell::new(format!("{}%", device.state.brightness_percent)),
                Cell::new(format!("{}K", device.state.color_temperature_kelvin)),
                Cell::new(Self::last_seen(device)),
            ]);
        }

        format!("{}\n\nFound {} device(s)", table, devices.len())
    }

    fn format_device_status(&self, device: &DeviceRecord) -> String {
        let power = if device.state.power {
            "On".green()
        } else {
            "Off".dimmed()
        };

        [
            format!("Device: {} ({})", device.ip_address, device.identity()),
            format!("  Name:        {}", device.display_name),
            format!("  SKU:         {}", device.sku),
            format!("  Power:       {}", power),
            format!("  Brightness:  {}%", device.state.brightness_percent),
            format!("  Color Temp:  {}K", device.state.color_temperature_kelvin),
            format!("  Last Seen:   {}", Self::last_seen(device)),
        ]
        .join("\n")
    }

    fn format_status_reply(&self, ip: &str, status: &StatusReply) -> String {
        let state = DeviceState::from(status);
        let power = if state.power { "On".green() } else { "Off".dimmed() };

        [
            format!("Device: {}", ip),
            format!("  Power:       {}", power),
            format!("  Brightness:  {}%", state.brightness_percent),
            format!("  Color Temp:  {}K", state.color_temperature_kelvin),
        ]
        .join("\n")
    }

    fn format_command_result(&self, target: &str, command: &str, success: bool) -> String {
        let status = if success {
            "[OK]".green()
        } else {
            "[FAIL]".red()
        };

        format!("{} {} '{}'", status, target, command)
    }

    fn format_config(&self, config: &DiscoveryConfig) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Setting", "Value"]);

        let rows = [
            ("Multicast group", config.multicast_group.to_string()),
            ("Scan port", config.scan_port.to_string()),
            ("Listen port", config.listen_port.to_string()),
            ("Control port", config.control_port.to_string()),
            ("Multicast TTL", config.multicast_ttl.to_string()),
            ("Join multicast", config.join_multicast.to_string()),
            ("Reuse send socket", config.reuse_socket.to_string()),
            ("Status window", format!("{}s", config.status_window_secs)),
            ("Scan window", format!("{}s", config.scan_window_secs)),
            ("Reply timeout", format!("{}ms", config.reply_timeout_ms)),
            ("Receive poll", format!("{}ms", config.receive_poll_ms)),
            ("Watchdog tick", format!("{}ms", config.watchdog_tick_ms)),
            ("Stop wait", format!("{}ms", config.stop_wait_ms)),
            ("Max datagram", format!("{} bytes", config.max_datagram_size)),
            ("Short poll", format!("{}s", config.short_poll_secs)),
            ("Long poll", format!("{}s", config.long_poll_secs)),
        ];

        for (name, value) in rows {
            table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }

        table.to_string()
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_device_list() {
        assert_eq!(TableOutput::new().format_devices(&[]), "No devices found.");
    }

    #[test]
    fn test_device_table_lists_every_device() {
        let devices = vec![
            DeviceRecord::new("aabbccddeeff", "AA:BB:CC:DD:EE:FF").with_address("10.0.0.5"),
            DeviceRecord::new("112233445566", "11:22:33:44:55:66").with_address("10.0.0.6"),
        ];

        let output = TableOutput::new().format_devices(&devices);
        assert!(output.contains("10.0.0.5"));
        assert!(output.contains("112233445566"));
        assert!(output.ends_with("Found 2 device(s)"));
    }

    #[test]
    fn test_status_reply_clamps_brightness() {
        let status = StatusReply {
            on_off: 0,
            brightness: 250,
            color_tem_in_kelvin: 6500,
        };
        let output = TableOutput::new().format_status_reply("10.0.0.5", &status);
        assert!(output.contains("100%"));
        assert!(output.contains("6500K"));
    }
}
