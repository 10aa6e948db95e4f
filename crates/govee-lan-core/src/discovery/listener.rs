//! Multicast receive loop for discovery replies.
//!
//! The listener owns exactly one receive socket. A background task polls it with
//! a short timeout so a stop request is observed within one poll interval.
//! Each datagram is decoded as JSON and handed to the caller's handler together
//! with its source address.

use std::net::{Ipv4Addr, SocketAddr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{LISTEN_PORT, MULTICAST_GROUP};
use crate::error::{DiscoveryError, Result};
use crate::protocol::decode_datagram;
use crate::transport::bind_receiver;

/// Callback for decoded datagrams: `(payload, source)`.
///
/// Errors and panics raised here are logged and never stop the receive loop.
pub type MessageHandler = Arc<dyn Fn(Value, SocketAddr) -> Result<()> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub bind_addr: Ipv4Addr,
    /// Receive port (0 picks an ephemeral port)
    pub port: u16,
    /// Group to join; `None` receives unicast only
    pub multicast_group: Option<Ipv4Addr>,
    /// Granularity of a single receive attempt
    pub poll_timeout: Duration,
    /// How long `stop()` waits for the loop before aborting it
    pub stop_timeout: Duration,
    pub max_datagram_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Ipv4Addr::UNSPECIFIED,
            port: LISTEN_PORT,
            multicast_group: Some(MULTICAST_GROUP),
            poll_timeout: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(2),
            max_datagram_size: 4096,
        }
    }
}

/// A running receive loop. Dropping it aborts the loop and releases the socket.
pub struct DiscoveryListener {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl DiscoveryListener {
    /// Bind the receive socket, join the multicast group and spawn the receive loop.
    ///
    /// Bind and join failures are returned; the listener is useless without its socket.
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &ListenerConfig,
        handler: MessageHandler,
    ) -> std::result::Result<Self, DiscoveryError> {
        let socket = bind_receiver(config.bind_addr, config.port, config.multicast_group)?;
        let local_addr = socket.local_addr().map_err(DiscoveryError::Socket)?;

        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(receive_loop(
            socket,
            running.clone(),
            handler,
            config.poll_timeout,
            config.max_datagram_size,
        ));

        match config.multicast_group {
            Some(group) => info!("Discovery listener on {} joined {}", local_addr, group),
            None => info!("Discovery listener on {}", local_addr),
        }

        Ok(Self {
            local_addr,
            running,
            handle: Some(handle),
            stop_timeout: config.stop_timeout,
        })
    }

    /// Address the receive socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop to exit and wait (bounded) for it. Idempotent.
    ///
    /// If the loop does not exit in time it is aborted; the socket and its
    /// group membership are released either way.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(mut handle) = self.handle.take() else {
            return;
        };

        if timeout(self.stop_timeout, &mut handle).await.is_err() {
            warn!(
                "Listener on {} did not stop within {:?}, aborting",
                self.local_addr, self.stop_timeout
            );
            handle.abort();
        }

        debug!("Discovery listener on {} stopped", self.local_addr);
    }
}

impl Drop for DiscoveryListener {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    running: Arc<AtomicBool>,
    handler: MessageHandler,
    poll_timeout: Duration,
    max_datagram_size: usize,
) {
    let mut buf = vec![0u8; max_datagram_size];

    while running.load(Ordering::Acquire) {
        match timeout(poll_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, addr))) => dispatch(&buf[..len], addr, &handler),
            Ok(Err(e)) => {
                debug!("Discovery receive error: {}", e);
                // Back off so a persistent socket error does not spin.
                tokio::time::sleep(poll_timeout).await;
            }
            Err(_) => {
                // Poll timeout - re-check the running flag
            }
        }
    }
}

fn dispatch(data: &[u8], addr: SocketAddr, handler: &MessageHandler) {
    let payload = match decode_datagram(data) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Dropping datagram from {}: {}", addr, e);
            return;
        }
    };

    match catch_unwind(AssertUnwindSafe(|| handler(payload, addr))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Handler failed for datagram from {}: {}", addr, e),
        Err(_) => error!("Handler panicked on datagram from {}", addr),
    }
}
