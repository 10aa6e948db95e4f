//! Discovery orchestration: triggers multicast queries and routes replies.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use super::listener::MessageHandler;
use super::window::ListeningWindow;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::protocol::{Command, Commands, Envelope, InboundMessage};
use crate::registry::{DeviceHost, DeviceRegistry, ScanOutcome, StatusOutcome};
use crate::transport::TransportClient;

/// Polling cadence requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// Frequent status refresh
    Short,
    /// Infrequent full scan
    Long,
}

/// Owns the listening window and sends discovery queries.
///
/// Replies received while the window is open are merged into the registry; new
/// devices and state changes are forwarded to the host.
pub struct DiscoveryOrchestrator<H: DeviceHost + 'static> {
    config: DiscoveryConfig,
    client: Arc<TransportClient>,
    registry: Arc<DeviceRegistry>,
    host: Arc<H>,
    window: ListeningWindow,
}

impl<H: DeviceHost + 'static> DiscoveryOrchestrator<H> {
    pub fn new(
        config: DiscoveryConfig,
        client: Arc<TransportClient>,
        registry: Arc<DeviceRegistry>,
        host: Arc<H>,
    ) -> Self {
        let handler: MessageHandler = {
            let registry = registry.clone();
            let host = host.clone();
            Arc::new(move |payload: Value, source: SocketAddr| {
                handle_message(&registry, host.as_ref(), payload, source);
                Ok(())
            })
        };

        let window = ListeningWindow::new(config.window_config(), handler);

        Self {
            config,
            client,
            registry,
            host,
            window,
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn window(&self) -> &ListeningWindow {
        &self.window
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Initial discovery when the host starts.
    pub async fn start(&self) -> Result<(), DiscoveryError> {
        info!("Starting discovery");
        self.trigger_full_scan().await
    }

    pub async fn poll(&self, kind: PollKind) -> Result<(), DiscoveryError> {
        match kind {
            PollKind::Short => self.trigger_status_query().await,
            PollKind::Long => self.trigger_full_scan().await,
        }
    }

    /// Listen for the status window and multicast a `devStatus` query.
    pub async fn trigger_status_query(&self) -> Result<(), DiscoveryError> {
        self.trigger(self.config.status_window(), Commands::dev_status())
            .await
    }

    /// Listen for the scan window and multicast a `scan` query.
    pub async fn trigger_full_scan(&self) -> Result<(), DiscoveryError> {
        self.trigger(self.config.scan_window(), Commands::scan()).await
    }

    /// Close the window and release the client's send socket.
    pub async fn shutdown(&self) {
        self.window.stop().await;
        self.client.close().await;
        info!("Discovery stopped");
    }

    async fn trigger(
        &self,
        duration: Duration,
        query: Envelope<Command>,
    ) -> Result<(), DiscoveryError> {
        self.window.ensure_active(duration).await?;

        let name = query.msg.name();
        // A lost query only means fewer replies; the window keeps listening.
        if let Err(e) = self
            .client
            .send_multicast(
                &query,
                self.config.multicast_group,
                self.config.scan_port,
                self.config.multicast_ttl,
            )
            .await
        {
            debug!("Failed to send '{}' query: {}", name, e);
        } else {
            debug!(
                "Sent '{}' query to {}:{}",
                name, self.config.multicast_group, self.config.scan_port
            );
        }

        Ok(())
    }
}

/// Route one decoded datagram to the registry and host.
pub fn handle_message<H: DeviceHost + ?Sized>(
    registry: &DeviceRegistry,
    host: &H,
    payload: Value,
    source: SocketAddr,
) {
    let message = match InboundMessage::from_value(payload) {
        Ok(message) => message,
        Err(e) => {
            debug!("Ignoring message from {}: {}", source, e);
            return;
        }
    };

    match message {
        InboundMessage::Scan(reply) => {
            if let ScanOutcome::Created(record) = registry.on_scan_reply(&reply) {
                host.register_device(&record);
            }
        }
        InboundMessage::DevStatus(reply) => {
            if let StatusOutcome::Updated { identity, state } =
                registry.on_status_reply(source.ip(), &reply)
            {
                host.report_state(&identity, &state);
            }
        }
        InboundMessage::Unknown { cmd } => {
            debug!("Ignoring '{}' message from {}", cmd, source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceRecord, DeviceState};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::net::Ipv4Addr;

    #[derive(Default)]
    struct RecordingHost {
        registered: Mutex<Vec<String>>,
        reported: Mutex<Vec<(String, DeviceState)>>,
    }

    impl DeviceHost for RecordingHost {
        fn register_device(&self, record: &DeviceRecord) {
            self.registered.lock().push(record.identity().to_string());
        }

        fn report_state(&self, identity: &str, state: &DeviceState) {
            self.reported.lock().push((identity.to_string(), *state));
        }
    }

    fn source(ip: [u8; 4]) -> SocketAddr {
        SocketAddr::from((ip, 4003))
    }

    fn scan_payload(device: &str, ip: &str) -> Value {
        json!({"msg": {"cmd": "scan", "data": {"device": device, "ip": ip, "sku": "H6008"}}})
    }

    fn loopback_config() -> DiscoveryConfig {
        DiscoveryConfig {
            listen_port: 0,
            join_multicast: false,
            receive_poll_ms: 50,
            watchdog_tick_ms: 50,
            stop_wait_ms: 500,
            ..Default::default()
        }
    }

    #[test]
    fn test_scan_reply_registers_once() {
        let registry = DeviceRegistry::new();
        let host = RecordingHost::default();

        let first = scan_payload("AA:BB:CC:DD:EE:FF", "10.0.0.5");
        let second = scan_payload("aa:bb:cc:dd:ee:ff", "10.0.0.6");
        handle_message(&registry, &host, first, source([10, 0, 0, 5]));
        handle_message(&registry, &host, second, source([10, 0, 0, 6]));

        assert_eq!(registry.len(), 1);
        assert_eq!(*host.registered.lock(), vec!["aabbccddeeff".to_string()]);
        assert_eq!(
            registry.lookup_device("aabbccddeeff").unwrap().ip_address,
            "10.0.0.6"
        );
    }

    #[test]
    fn test_status_reply_reported_for_matching_source() {
        let registry = DeviceRegistry::new();
        let host = RecordingHost::default();
        let scan = scan_payload("AA:BB:CC:DD:EE:FF", "10.0.0.5");
        handle_message(&registry, &host, scan, source([10, 0, 0, 5]));

        let status = json!({"msg": {"cmd": "devStatus", "data": {
            "onOff": 1, "brightness": 80, "colorTemInKelvin": 3000
        }}});
        handle_message(&registry, &host, status.clone(), source([10, 0, 0, 5]));
        handle_message(&registry, &host, status, source([10, 0, 0, 9]));

        let reported = host.reported.lock();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].0, "aabbccddeeff");
        assert_eq!(
            reported[0].1,
            DeviceState {
                power: true,
                brightness_percent: 80,
                color_temperature_kelvin: 3000,
            }
        );
    }

    #[test]
    fn test_unknown_and_malformed_messages_ignored() {
        let registry = DeviceRegistry::new();
        let host = RecordingHost::default();

        let payloads = [
            json!({"msg": {"cmd": "colorwc", "data": {}}}),
            json!({"hello": "world"}),
            json!({"msg": {"cmd": "devStatus", "data": {"onOff": "yes"}}}),
        ];
        for payload in payloads {
            handle_message(&registry, &host, payload, source([10, 0, 0, 5]));
        }

        assert!(registry.is_empty());
        assert!(host.registered.lock().is_empty());
        assert!(host.reported.lock().is_empty());
    }

    #[tokio::test]
    async fn test_triggers_share_one_window() {
        let orchestrator = DiscoveryOrchestrator::new(
            loopback_config(),
            Arc::new(TransportClient::default()),
            Arc::new(DeviceRegistry::new()),
            Arc::new(RecordingHost::default()),
        );

        orchestrator.poll(PollKind::Short).await.unwrap();
        let addr = orchestrator.window().local_addr().await;
        let first = orchestrator.window().deadline().unwrap();

        orchestrator.poll(PollKind::Long).await.unwrap();
        let second = orchestrator.window().deadline().unwrap();

        assert_eq!(orchestrator.window().local_addr().await, addr);
        assert_eq!(second - first, Duration::from_secs(10));

        orchestrator.shutdown().await;
        assert!(!orchestrator.window().is_active());
    }

    #[tokio::test]
    async fn test_failed_query_send_keeps_window_listening() {
        // Broadcast without SO_BROADCAST is refused by the send socket.
        let config = DiscoveryConfig {
            multicast_group: Ipv4Addr::BROADCAST,
            ..loopback_config()
        };
        let orchestrator = DiscoveryOrchestrator::new(
            config,
            Arc::new(TransportClient::default()),
            Arc::new(DeviceRegistry::new()),
            Arc::new(RecordingHost::default()),
        );

        orchestrator.trigger_status_query().await.unwrap();
        assert!(orchestrator.window().is_active());

        let port = orchestrator.window().local_addr().await.unwrap().port();
        let socket = tokio::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let reply = scan_payload("AA:BB:CC:DD:EE:FF", "127.0.0.1").to_string();
        socket
            .send_to(reply.as_bytes(), (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let mut waited = Duration::ZERO;
        while orchestrator.registry().is_empty() && waited < Duration::from_secs(2) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            waited += Duration::from_millis(50);
        }
        assert_eq!(orchestrator.registry().len(), 1);
        assert_eq!(
            *orchestrator.host().registered.lock(),
            vec!["aabbccddeeff".to_string()]
        );
        assert!(orchestrator.window().is_active());

        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_bind_failure_propagates() {
        let taken = std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = DiscoveryConfig {
            listen_port: port,
            ..loopback_config()
        };
        let orchestrator = DiscoveryOrchestrator::new(
            config,
            Arc::new(TransportClient::default()),
            Arc::new(DeviceRegistry::new()),
            Arc::new(RecordingHost::default()),
        );

        // Held without SO_REUSEADDR, so the reusable bind is refused.
        assert!(orchestrator.trigger_status_query().await.is_err());
        assert!(!orchestrator.window().is_active());
    }
}
