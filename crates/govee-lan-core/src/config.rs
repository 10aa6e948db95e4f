//! Discovery and transport configuration.
//!
//! Stored as camelCase JSON. Every field has a default, so a partial file
//! (or no file at all) yields a working configuration.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::listener::ListenerConfig;
use crate::discovery::window::WindowConfig;
use crate::error::ConfigError;
use crate::transport::client::ClientOptions;

/// Multicast group the devices listen on for scan/status queries.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port devices receive multicast queries on.
pub const SCAN_PORT: u16 = 4001;

/// Port replies are delivered to.
pub const LISTEN_PORT: u16 = 4002;

/// Port devices accept unicast control commands on.
pub const CONTROL_PORT: u16 = 4003;

/// Multicast hop limit for outbound queries.
pub const MULTICAST_TTL: u32 = 2;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveryConfig {
    pub multicast_group: Ipv4Addr,
    pub scan_port: u16,
    pub listen_port: u16,
    pub control_port: u16,
    pub multicast_ttl: u32,
    /// Join the multicast group on the receive socket.
    pub join_multicast: bool,
    /// Keep one long-lived socket for fire-and-forget sends.
    pub reuse_socket: bool,
    /// Listening time requested by a status query.
    pub status_window_secs: u64,
    /// Listening time requested by a full scan.
    pub scan_window_secs: u64,
    pub reply_timeout_ms: u64,
    pub receive_poll_ms: u64,
    pub watchdog_tick_ms: u64,
    pub stop_wait_ms: u64,
    pub max_datagram_size: usize,
    pub short_poll_secs: u64,
    pub long_poll_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            multicast_group: MULTICAST_GROUP,
            scan_port: SCAN_PORT,
            listen_port: LISTEN_PORT,
            control_port: CONTROL_PORT,
            multicast_ttl: MULTICAST_TTL,
            join_multicast: true,
            reuse_socket: true,
            status_window_secs: 5,
            scan_window_secs: 10,
            reply_timeout_ms: 2000,
            receive_poll_ms: 1000,
            watchdog_tick_ms: 500,
            stop_wait_ms: 2000,
            max_datagram_size: 4096,
            short_poll_secs: 30,
            long_poll_secs: 300,
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise from the platform config path.
    ///
    /// A missing file at the platform path falls back to defaults; a missing
    /// file at an explicit path is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::load(p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Write this configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn status_window(&self) -> Duration {
        Duration::from_secs(self.status_window_secs)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_secs(self.scan_window_secs)
    }

    pub fn short_poll_interval(&self) -> Duration {
        Duration::from_secs(self.short_poll_secs.max(1))
    }

    pub fn long_poll_interval(&self) -> Duration {
        Duration::from_secs(self.long_poll_secs.max(1))
    }

    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            bind_addr: Ipv4Addr::UNSPECIFIED,
            port: self.listen_port,
            multicast_group: self.join_multicast.then_some(self.multicast_group),
            poll_timeout: Duration::from_millis(self.receive_poll_ms.max(1)),
            stop_timeout: Duration::from_millis(self.stop_wait_ms),
            max_datagram_size: self.max_datagram_size,
        }
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            listener: self.listener_config(),
            watchdog_tick: Duration::from_millis(self.watchdog_tick_ms.max(1)),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            default_port: self.control_port,
            reuse_socket: self.reuse_socket,
            reply_timeout: Duration::from_millis(self.reply_timeout_ms),
            max_datagram_size: self.max_datagram_size,
        }
    }
}

/// Get the default configuration directory for Govee LAN tools.
pub fn default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "govee-lan", "govee-lan")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the default configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
