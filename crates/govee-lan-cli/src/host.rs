//! Host side of discovery for a terminal session.

use std::sync::atomic::{AtomicBool, Ordering};

use govee_lan_core::{DeviceHost, DeviceRecord, DeviceState};
use tracing::{debug, info};

/// Logs registry changes and flags them for redraw in watch mode.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    changed: AtomicBool,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything changed since the last call.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

impl DeviceHost for ConsoleHost {
    fn register_device(&self, record: &DeviceRecord) {
        info!(
            "Found {} ({}) at {}",
            record.display_name, record.sku, record.ip_address
        );
        self.changed.store(true, Ordering::Release);
    }

    fn report_state(&self, identity: &str, state: &DeviceState) {
        debug!(
            "{}: power={} brightness={}% color_temp={}K",
            identity, state.power, state.brightness_percent, state.color_temperature_kelvin
        );
        self.changed.store(true, Ordering::Release);
    }
}
