//! Per-command wiring of config, client, registry and orchestrator.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use govee_lan_core::{
    DeviceController, DeviceRecord, DeviceRegistry, DiscoveryConfig, DiscoveryOrchestrator,
    TransportClient,
};

use crate::error::CliError;
use crate::host::ConsoleHost;

pub struct Session {
    pub orchestrator: DiscoveryOrchestrator<ConsoleHost>,
    pub controller: DeviceController<ConsoleHost>,
    pub registry: Arc<DeviceRegistry>,
    pub host: Arc<ConsoleHost>,
}

impl Session {
    /// Load the config (with `timeout_ms` overriding the reply timeout) and build a session.
    pub fn open(config_path: Option<&Path>, timeout_ms: Option<u64>) -> Result<Self, CliError> {
        let mut config = DiscoveryConfig::load_or_default(config_path)?;
        if let Some(timeout_ms) = timeout_ms {
            config.reply_timeout_ms = timeout_ms;
        }
        Ok(Self::new(config))
    }

    pub fn new(config: DiscoveryConfig) -> Self {
        let client = Arc::new(TransportClient::new(config.client_options()));
        let registry = Arc::new(DeviceRegistry::new());
        let host = Arc::new(ConsoleHost::new());

        let controller = DeviceController::new(client.clone(), registry.clone(), host.clone());
        let orchestrator = DiscoveryOrchestrator::new(config, client, registry.clone(), host.clone());

        Self {
            orchestrator,
            controller,
            registry,
            host,
        }
    }

    /// Scan, then ask for status halfway through, and collect what answered.
    pub async fn discover(&self, duration: Duration) -> Result<Vec<DeviceRecord>, CliError> {
        self.orchestrator.start().await?;
        tokio::time::sleep(duration / 2).await;

        self.orchestrator.trigger_status_query().await?;
        tokio::time::sleep(duration - duration / 2).await;

        Ok(self.registry.devices())
    }

    pub async fn close(&self) {
        self.orchestrator.shutdown().await;
    }
}
