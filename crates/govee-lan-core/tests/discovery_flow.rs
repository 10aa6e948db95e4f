use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use govee_lan_core::{
    DeviceHost, DeviceRecord, DeviceRegistry, DeviceState, DiscoveryConfig, DiscoveryOrchestrator,
    TransportClient,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::UdpSocket;

#[derive(Default)]
struct RecordingHost {
    registered: Mutex<Vec<DeviceRecord>>,
    reported: Mutex<Vec<(String, DeviceState)>>,
}

impl DeviceHost for RecordingHost {
    fn register_device(&self, record: &DeviceRecord) {
        self.registered.lock().push(record.clone());
    }

    fn report_state(&self, identity: &str, state: &DeviceState) {
        self.reported.lock().push((identity.to_string(), *state));
    }
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

async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..40 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn scan_then_status_updates_registry() {
    let registry = Arc::new(DeviceRegistry::new());
    let host = Arc::new(RecordingHost::default());
    let orchestrator = DiscoveryOrchestrator::new(
        loopback_config(),
        Arc::new(TransportClient::default()),
        registry.clone(),
        host.clone(),
    );

    orchestrator.start().await.unwrap();
    assert!(orchestrator.window().is_active());

    let port = orchestrator.window().local_addr().await.unwrap().port();
    let target = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let device = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();

    let scan = json!({"msg": {"cmd": "scan", "data": {
        "device": "AA:BB:CC:DD:EE:FF", "ip": "127.0.0.1", "sku": "H6008"
    }}});
    device.send_to(scan.to_string().as_bytes(), target).await.unwrap();
    assert!(wait_for(|| registry.len() == 1).await);

    // A repeat reply with different formatting must not add a second record
    let repeat = json!({"msg": {"cmd": "scan", "data": {
        "device": "aa-bb-cc-dd-ee-ff", "ip": "127.0.0.1", "sku": "H6008"
    }}});
    device.send_to(repeat.to_string().as_bytes(), target).await.unwrap();

    orchestrator.trigger_status_query().await.unwrap();
    let status = json!({"msg": {"cmd": "devStatus", "data": {
        "onOff": 1, "brightness": 80, "colorTemInKelvin": 3000
    }}});
    device.send_to(status.to_string().as_bytes(), target).await.unwrap();
    assert!(wait_for(|| !host.reported.lock().is_empty()).await);

    let expected = DeviceState {
        power: true,
        brightness_percent: 80,
        color_temperature_kelvin: 3000,
    };
    let record = registry.lookup_device("aabbccddeeff").unwrap();
    assert_eq!(record.ip_address, "127.0.0.1");
    assert_eq!(record.sku, "H6008");
    assert_eq!(record.state, expected);

    assert_eq!(registry.len(), 1);
    assert_eq!(host.registered.lock().len(), 1);
    assert_eq!(host.reported.lock()[0], ("aabbccddeeff".to_string(), expected));

    orchestrator.shutdown().await;
    assert!(!orchestrator.window().is_active());
}

#[tokio::test]
async fn status_from_unknown_address_is_ignored() {
    let registry = Arc::new(DeviceRegistry::new());
    let host = Arc::new(RecordingHost::default());
    let orchestrator = DiscoveryOrchestrator::new(
        loopback_config(),
        Arc::new(TransportClient::default()),
        registry.clone(),
        host.clone(),
    );
    registry.register_device(DeviceRecord::new("aabbccddeeff", "lamp").with_address("10.0.0.5"));

    orchestrator.trigger_status_query().await.unwrap();
    let port = orchestrator.window().local_addr().await.unwrap().port();
    let device = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();

    let status = json!({"msg": {"cmd": "devStatus", "data": {"onOff": 1, "brightness": 50}}});
    device
        .send_to(status.to_string().as_bytes(), (Ipv4Addr::LOCALHOST, port))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(host.reported.lock().is_empty());
    assert_eq!(
        registry.lookup_device("aabbccddeeff").unwrap().state,
        DeviceState::default()
    );

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn window_closes_after_status_window() {
    let config = DiscoveryConfig {
        status_window_secs: 1,
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

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!orchestrator.window().is_active());
    assert!(orchestrator.window().local_addr().await.is_none());
}
