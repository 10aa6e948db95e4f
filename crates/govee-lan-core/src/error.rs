//! Error types for Govee LAN core.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Send/receive failures on the unicast or multicast send path.
///
/// These are transient: callers log them and treat the request as "no result".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Send to {target} failed: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Receive from {target} failed: {source}")]
    Receive {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Socket setup failed: {0}")]
    Socket(#[source] std::io::Error),
}

/// Receive-socket setup failures. The listener cannot run without its socket,
/// so these propagate to whoever started it.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to bind discovery socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to join multicast group {group}: {source}")]
    JoinMulticast {
        group: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },

    #[error("Discovery socket error: {0}")]
    Socket(#[source] std::io::Error),
}

/// Malformed or unexpected wire input.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Datagram is not valid UTF-8: {0}")]
    NotUtf8(#[source] std::str::Utf8Error),

    #[error("Datagram is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Message has no 'msg' envelope")]
    MissingEnvelope,

    #[error("Invalid data for '{cmd}': {source}")]
    InvalidData {
        cmd: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config not found: {0}")]
    NotFound(String),
}

/// Device command errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Device {identity} has no usable address: {address}")]
    InvalidAddress { identity: String, address: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
