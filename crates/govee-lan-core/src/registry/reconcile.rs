//! Merging of discovery replies into the registry.
//!
//! Identity equality is the only de-duplication key: a scan reply for a known
//! identity always updates that record in place. Status replies carry no
//! identity and are matched on the address they came from.

use std::net::IpAddr;

use tracing::{debug, info};

use super::DeviceRegistry;
use crate::protocol::{ScanReply, StatusReply};
use crate::types::{normalize_identity, DeviceRecord, DeviceState, UNKNOWN};

/// Result of merging a `scan` reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// First reply for this identity; the record has been inserted.
    Created(DeviceRecord),
    /// Known identity; address and model were refreshed.
    Updated(DeviceRecord),
}

impl ScanOutcome {
    pub fn record(&self) -> &DeviceRecord {
        match self {
            ScanOutcome::Created(record) | ScanOutcome::Updated(record) => record,
        }
    }
}

/// Result of routing a `devStatus` reply.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    Updated { identity: String, state: DeviceState },
    /// No record is known at the source address.
    Unmatched,
}

impl DeviceRegistry {
    /// Merge a `scan` reply. Check and insert happen under one write lock, so
    /// concurrent replies for the same identity never produce two records.
    pub fn on_scan_reply(&self, reply: &ScanReply) -> ScanOutcome {
        let mut identity = normalize_identity(&reply.device);
        if identity.is_empty() {
            identity = UNKNOWN.to_string();
        }

        let mut devices = self.devices.write();

        if let Some(record) = devices.get_mut(&identity) {
            record.ip_address = reply.ip.clone();
            record.sku = reply.sku.clone();
            record.touch();
            info!("Updated existing device {} at {}", identity, record.ip_address);
            return ScanOutcome::Updated(record.clone());
        }

        let mut record = DeviceRecord::new(identity.clone(), reply.device.clone())
            .with_address(reply.ip.clone())
            .with_sku(reply.sku.clone());
        record.touch();

        info!(
            "Adding device {} ({}) at {}",
            identity, record.sku, record.ip_address
        );
        devices.insert(identity, record.clone());
        ScanOutcome::Created(record)
    }

    /// Route a `devStatus` reply to the record whose address matches `source`.
    pub fn on_status_reply(&self, source: IpAddr, reply: &StatusReply) -> StatusOutcome {
        let source = source.to_string();
        let state = DeviceState::from(reply);

        let mut devices = self.devices.write();
        let Some(record) = devices.values_mut().find(|d| d.ip_address == source) else {
            debug!("Status reply from {} matches no known device", source);
            return StatusOutcome::Unmatched;
        };

        record.state = state;
        record.touch();
        debug!("Updated status for {} at {}: {:?}", record.identity(), source, state);

        StatusOutcome::Updated {
            identity: record.identity().to_string(),
            state,
        }
    }
}
