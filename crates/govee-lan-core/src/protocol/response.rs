//! Decoding of inbound datagrams.
//!
//! Decoding happens in two steps: the listener turns raw bytes into a JSON value
//! ([`decode_datagram`]), then the orchestrator turns that value into a typed
//! [`InboundMessage`]. Missing fields in `data` fall back to defaults instead of
//! failing; a field of the wrong type is a protocol error.

use serde::Deserialize;
use serde_json::Value;

use super::Envelope;
use crate::error::ProtocolError;
use crate::types::{DeviceState, UNKNOWN};

/// Decode a datagram as UTF-8 JSON.
pub fn decode_datagram(data: &[u8]) -> Result<Value, ProtocolError> {
    let text = std::str::from_utf8(data).map_err(ProtocolError::NotUtf8)?;
    serde_json::from_str(text).map_err(ProtocolError::InvalidJson)
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// `data` of a `scan` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanReply {
    /// Raw hardware address, e.g. `"AA:BB:CC:DD:EE:FF"`
    #[serde(default = "unknown")]
    pub device: String,
    #[serde(default = "unknown")]
    pub ip: String,
    #[serde(default = "unknown")]
    pub sku: String,
}

impl Default for ScanReply {
    fn default() -> Self {
        Self {
            device: unknown(),
            ip: unknown(),
            sku: unknown(),
        }
    }
}

/// `data` of a `devStatus` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusReply {
    pub on_off: u32,
    pub brightness: u32,
    pub color_tem_in_kelvin: u32,
}

impl From<&StatusReply> for DeviceState {
    fn from(reply: &StatusReply) -> Self {
        Self {
            power: reply.on_off != 0,
            brightness_percent: reply.brightness.min(100) as u8,
            color_temperature_kelvin: reply.color_tem_in_kelvin,
        }
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Scan(ScanReply),
    DevStatus(StatusReply),
    /// Any command this side does not handle; kept so callers can log it.
    Unknown { cmd: String },
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    cmd: String,
    #[serde(default)]
    data: Value,
}

impl InboundMessage {
    /// Interpret a decoded datagram.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let envelope: Envelope<RawMessage> =
            serde_json::from_value(value).map_err(|_| ProtocolError::MissingEnvelope)?;
        let RawMessage { cmd, data } = envelope.msg;

        // A reply without a body still gets the documented defaults.
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };

        match cmd.as_str() {
            "scan" => serde_json::from_value(data)
                .map(InboundMessage::Scan)
                .map_err(|source| ProtocolError::InvalidData { cmd, source }),
            "devStatus" => serde_json::from_value(data)
                .map(InboundMessage::DevStatus)
                .map_err(|source| ProtocolError::InvalidData { cmd, source }),
            _ => Ok(InboundMessage::Unknown { cmd }),
        }
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_value(decode_datagram(data)?)
    }

    pub fn cmd(&self) -> &str {
        match self {
            InboundMessage::Scan(_) => "scan",
            InboundMessage::DevStatus(_) => "devStatus",
            InboundMessage::Unknown { cmd } => cmd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_scan_reply() {
        let data = br#"{"msg":{"cmd":"scan","data":{"device":"AA:BB:CC:DD:EE:FF","ip":"10.0.0.5","sku":"H6008","bleVersionHard":"3.01.01"}}}"#;
        let message = InboundMessage::from_slice(data).unwrap();
        assert_eq!(
            message,
            InboundMessage::Scan(ScanReply {
                device: "AA:BB:CC:DD:EE:FF".to_string(),
                ip: "10.0.0.5".to_string(),
                sku: "H6008".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_status_reply() {
        let value = json!({"msg": {"cmd": "devStatus", "data": {
            "onOff": 1, "brightness": 80, "colorTemInKelvin": 3000,
            "color": {"r": 255, "g": 0, "b": 0}
        }}});
        let message = InboundMessage::from_value(value).unwrap();
        let InboundMessage::DevStatus(reply) = message else {
            panic!("expected devStatus");
        };
        let state = DeviceState::from(&reply);
        assert!(state.power);
        assert_eq!(state.brightness_percent, 80);
        assert_eq!(state.color_temperature_kelvin, 3000);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let scan = InboundMessage::from_value(json!({"msg": {"cmd": "scan", "data": {}}})).unwrap();
        assert_eq!(scan, InboundMessage::Scan(ScanReply::default()));

        let status = InboundMessage::from_value(json!({"msg": {"cmd": "devStatus"}})).unwrap();
        assert_eq!(status, InboundMessage::DevStatus(StatusReply::default()));
    }

    #[test]
    fn test_unknown_command_is_kept() {
        let message =
            InboundMessage::from_value(json!({"msg": {"cmd": "colorwc", "data": {}}})).unwrap();
        assert_eq!(message.cmd(), "colorwc");
        assert!(matches!(message, InboundMessage::Unknown { .. }));
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        let result = InboundMessage::from_value(
            json!({"msg": {"cmd": "devStatus", "data": {"brightness": "bright"}}}),
        );
        assert!(matches!(result, Err(ProtocolError::InvalidData { .. })));
    }

    #[test]
    fn test_missing_envelope() {
        let result = InboundMessage::from_value(json!({"cmd": "scan"}));
        assert!(matches!(result, Err(ProtocolError::MissingEnvelope)));
    }

    #[test]
    fn test_decode_datagram_rejects_garbage() {
        assert!(matches!(
            decode_datagram(b"not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_datagram(&[0xff, 0xfe, 0x7b]),
            Err(ProtocolError::NotUtf8(_))
        ));
    }

    #[test]
    fn test_brightness_clamped_into_state() {
        let reply = StatusReply {
            on_off: 0,
            brightness: 250,
            color_tem_in_kelvin: 0,
        };
        let state = DeviceState::from(&reply);
        assert!(!state.power);
        assert_eq!(state.brightness_percent, 100);
    }
}
