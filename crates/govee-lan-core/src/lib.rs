//! Shared core library for Govee LAN device discovery and control.
//!
//! Devices are found by multicasting queries and listening for their replies in
//! a timed window; replies are merged into a [`DeviceRegistry`] keyed by device
//! identity and surfaced to the host through [`DeviceHost`].

pub mod config;
pub mod control;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod transport;
pub mod types;

pub use config::DiscoveryConfig;
pub use control::DeviceController;
pub use discovery::{DiscoveryOrchestrator, ListeningWindow, PollKind};
pub use error::{CoreError, Result};
pub use registry::{DeviceHost, DeviceRegistry};
pub use transport::TransportClient;
pub use types::{normalize_identity, DeviceRecord, DeviceState};
