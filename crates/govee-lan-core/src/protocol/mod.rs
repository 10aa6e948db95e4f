//! Protocol layer for device communication.
//!
//! Every datagram is a JSON object of the form `{"msg": {"cmd": ..., "data": {...}}}`.
//! `commands` builds outbound messages, `response` decodes inbound ones.

pub mod commands;
pub mod response;

use serde::{Deserialize, Serialize};

pub use commands::{Command, Commands};
pub use response::{decode_datagram, InboundMessage, ScanReply, StatusReply};

/// Outer `{"msg": ...}` wrapper shared by both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub msg: T,
}

impl<T> Envelope<T> {
    pub fn new(msg: T) -> Self {
        Self { msg }
    }
}
