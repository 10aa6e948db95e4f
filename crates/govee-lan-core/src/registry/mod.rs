//! Device registry.
//!
//! The registry is the authoritative identity -> record map. Discovery replies are
//! merged into it by the reconciliation methods in [`reconcile`]; the host reads
//! it through the lookup and iteration methods here and is told about changes
//! through [`DeviceHost`].

pub mod reconcile;

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::{normalize_identity, DeviceRecord, DeviceState};

pub use reconcile::{ScanOutcome, StatusOutcome};

/// The surrounding application that owns device presentation.
///
/// Called from the discovery receive loop; implementations must not block.
pub trait DeviceHost: Send + Sync {
    /// A scan reply produced a device that was not known before.
    fn register_device(&self, record: &DeviceRecord);

    /// A device's state changed (status reply or accepted command).
    fn report_state(&self, identity: &str, state: &DeviceState);
}

/// Thread-safe map of identity -> device record.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. An existing record with the same identity is kept and `false` returned.
    pub fn register_device(&self, record: DeviceRecord) -> bool {
        let mut devices = self.devices.write();
        if devices.contains_key(record.identity()) {
            return false;
        }
        devices.insert(record.identity().to_string(), record);
        true
    }

    /// Look up by identity. The key is normalized, so a raw hardware address works too.
    pub fn lookup_device(&self, identity: &str) -> Option<DeviceRecord> {
        self.devices
            .read()
            .get(&normalize_identity(identity))
            .cloned()
    }

    /// Find the record currently reachable at `ip_address`.
    pub fn find_by_address(&self, ip_address: &str) -> Option<DeviceRecord> {
        self.devices
            .read()
            .values()
            .find(|d| d.ip_address == ip_address)
            .cloned()
    }

    /// Visit every record under the read lock.
    pub fn for_each_device<F>(&self, mut f: F)
    where
        F: FnMut(&DeviceRecord),
    {
        for record in self.devices.read().values() {
            f(record);
        }
    }

    /// Snapshot of all records, sorted by identity.
    pub fn devices(&self) -> Vec<DeviceRecord> {
        let mut list: Vec<DeviceRecord> = self.devices.read().values().cloned().collect();
        list.sort_by(|a, b| a.identity().cmp(b.identity()));
        list
    }

    /// Overwrite a record's state, returning the updated record.
    pub fn update_state(&self, identity: &str, state: DeviceState) -> Option<DeviceRecord> {
        let mut devices = self.devices.write();
        let record = devices.get_mut(identity)?;
        record.state = state;
        Some(record.clone())
    }

    /// Explicit removal by the host.
    pub fn remove_device(&self, identity: &str) -> Option<DeviceRecord> {
        self.devices.write().remove(&normalize_identity(identity))
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}
