//! Unicast device control.
//!
//! Commands are fire-and-forget: the devices do not acknowledge them, so a
//! successful send is taken as the new state and reported to the host.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{DeviceError, Result};
use crate::protocol::commands::MIN_KELVIN;
use crate::protocol::{Command, Commands, Envelope, InboundMessage, StatusReply};
use crate::registry::{DeviceHost, DeviceRegistry};
use crate::types::{DeviceRecord, DeviceState};
use crate::transport::TransportClient;

pub struct DeviceController<H: DeviceHost + ?Sized> {
    client: Arc<TransportClient>,
    registry: Arc<DeviceRegistry>,
    host: Arc<H>,
}

impl<H: DeviceHost + ?Sized> DeviceController<H> {
    pub fn new(client: Arc<TransportClient>, registry: Arc<DeviceRegistry>, host: Arc<H>) -> Self {
        Self {
            client,
            registry,
            host,
        }
    }

    // ==================== By identity ====================

    pub async fn turn(&self, identity: &str, on: bool) -> Result<DeviceRecord> {
        self.command(identity, Commands::turn(on), |state| state.power = on)
            .await
    }

    /// Set brightness in percent; values above 100 are clamped.
    pub async fn set_brightness(&self, identity: &str, percent: u8) -> Result<DeviceRecord> {
        let percent = percent.min(100);
        self.command(identity, Commands::brightness(percent), |state| {
            state.brightness_percent = percent
        })
        .await
    }

    pub async fn set_color_temp(&self, identity: &str, kelvin: u32) -> Result<DeviceRecord> {
        validate_kelvin(kelvin)?;
        self.command(identity, Commands::set_color_temp_kelvin(kelvin), |state| {
            state.color_temperature_kelvin = kelvin
        })
        .await
    }

    // ==================== By address ====================

    pub async fn turn_at(&self, ip: IpAddr, on: bool) -> Result<()> {
        self.send(ip, &Commands::turn(on)).await
    }

    pub async fn set_brightness_at(&self, ip: IpAddr, percent: u8) -> Result<()> {
        self.send(ip, &Commands::brightness(percent)).await
    }

    pub async fn set_color_temp_at(&self, ip: IpAddr, kelvin: u32) -> Result<()> {
        validate_kelvin(kelvin)?;
        self.send(ip, &Commands::set_color_temp_kelvin(kelvin)).await
    }

    /// Ask one device for its status and wait for the reply.
    ///
    /// `None` when the device does not answer in time or answers with something
    /// other than a status reply.
    pub async fn query_status(&self, ip: IpAddr) -> Result<Option<StatusReply>> {
        let reply = self
            .client
            .send_unicast(ip, &Commands::dev_status(), None, true)
            .await?;

        let Some(value) = reply else {
            return Ok(None);
        };

        match InboundMessage::from_value(value) {
            Ok(InboundMessage::DevStatus(status)) => Ok(Some(status)),
            Ok(other) => {
                debug!("Expected devStatus from {}, got '{}'", ip, other.cmd());
                Ok(None)
            }
            Err(e) => {
                debug!("Invalid status reply from {}: {}", ip, e);
                Ok(None)
            }
        }
    }

    async fn command<F>(
        &self,
        identity: &str,
        command: Envelope<Command>,
        apply: F,
    ) -> Result<DeviceRecord>
    where
        F: FnOnce(&mut DeviceState),
    {
        let record = self
            .registry
            .lookup_device(identity)
            .ok_or_else(|| DeviceError::NotFound(identity.to_string()))?;

        let ip: IpAddr = record
            .ip_address
            .parse()
            .map_err(|_| DeviceError::InvalidAddress {
                identity: record.identity().to_string(),
                address: record.ip_address.clone(),
            })?;

        self.send(ip, &command).await?;

        let mut state = record.state;
        apply(&mut state);
        let updated = self
            .registry
            .update_state(record.identity(), state)
            .ok_or_else(|| DeviceError::NotFound(record.identity().to_string()))?;

        self.host.report_state(updated.identity(), &updated.state);
        info!("Sent '{}' to {} ({})", command.msg.name(), updated.identity(), ip);

        Ok(updated)
    }

    async fn send(&self, ip: IpAddr, command: &Envelope<Command>) -> Result<()> {
        self.client.send_unicast(ip, command, None, false).await?;
        Ok(())
    }
}

fn validate_kelvin(kelvin: u32) -> Result<()> {
    if kelvin < MIN_KELVIN {
        return Err(DeviceError::InvalidValue {
            field: "colorTemperatureKelvin".to_string(),
            message: format!("{} K is below the minimum of {} K", kelvin, MIN_KELVIN),
        }
        .into());
    }
    Ok(())
}
