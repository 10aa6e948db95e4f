//! Shared type definitions for discovered devices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a device identity.
pub const IDENTITY_LEN: usize = 14;

/// Placeholder for string fields a device reply left out.
pub const UNKNOWN: &str = "unknown";

/// Derive a registry identity from a raw hardware address.
///
/// Delimiters are dropped, letters are lowercased and the result is cut to
/// [`IDENTITY_LEN`], so `AA:BB:CC:DD:EE:FF` and `aa-bb-cc-dd-ee-ff` map to the
/// same key.
pub fn normalize_identity(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(IDENTITY_LEN)
        .collect()
}

/// Last-known or last-commanded light state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub power: bool,
    /// 0-100
    pub brightness_percent: u8,
    pub color_temperature_kelvin: u32,
}

/// A device known to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    identity: String,
    /// Human-readable label
    pub display_name: String,
    /// Last address the device replied from or reported
    pub ip_address: String,
    /// Device model tag (e.g. "H6008")
    pub sku: String,
    pub state: DeviceState,
    /// Last time a scan or status reply touched this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            ip_address: UNKNOWN.to_string(),
            sku: UNKNOWN.to_string(),
            state: DeviceState::default(),
            last_seen: None,
        }
    }

    pub fn with_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = ip_address.into();
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Registry key. Fixed for the lifetime of the record.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn touch(&mut self) {
        self.last_seen = Some(Utc::now());
    }
}
