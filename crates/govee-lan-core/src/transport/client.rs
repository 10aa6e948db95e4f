//! Request/response client for unicast and multicast sends.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use super::socket::bind_sender;
use crate::config::CONTROL_PORT;
use crate::error::TransportError;
use crate::protocol::decode_datagram;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Port used when a unicast send does not name one.
    pub default_port: u16,
    /// Keep one socket for all fire-and-forget sends instead of one per send.
    pub reuse_socket: bool,
    /// How long a request waits for its reply.
    pub reply_timeout: Duration,
    pub max_datagram_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            default_port: CONTROL_PORT,
            reuse_socket: true,
            reply_timeout: Duration::from_secs(2),
            max_datagram_size: 4096,
        }
    }
}

/// UDP client for device requests.
///
/// Requests that wait for a reply always use their own short-lived socket, so a
/// reply can only come back to the caller that asked for it. Fire-and-forget
/// sends share one long-lived socket when `reuse_socket` is set; sends on it are
/// serialized by a lock.
pub struct TransportClient {
    options: ClientOptions,
    shared: Mutex<Option<UdpSocket>>,
}

impl TransportClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            shared: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Send `payload` as one JSON datagram to `ip:port`.
    ///
    /// With `wait_for_reply`, blocks up to the reply timeout for a single
    /// datagram and returns it decoded. A timeout is `Ok(None)`, not an error.
    pub async fn send_unicast<T: Serialize>(
        &self,
        ip: IpAddr,
        payload: &T,
        port: Option<u16>,
        wait_for_reply: bool,
    ) -> Result<Option<Value>, TransportError> {
        let target = SocketAddr::new(ip, port.unwrap_or(self.options.default_port));
        let message = serde_json::to_vec(payload).map_err(TransportError::Encode)?;

        if wait_for_reply {
            return self.request(target, &message).await;
        }

        if self.options.reuse_socket {
            let mut guard = self.shared.lock().await;
            let socket = Self::ensure_socket(&mut guard).await?;
            socket
                .send_to(&message, target)
                .await
                .map_err(|source| send_failed(target, source))?;
        } else {
            let socket = bind_sender().await.map_err(TransportError::Socket)?;
            socket
                .send_to(&message, target)
                .await
                .map_err(|source| send_failed(target, source))?;
        }

        Ok(None)
    }

    /// Send `payload` as one JSON datagram to a multicast group. Never waits for replies.
    pub async fn send_multicast<T: Serialize>(
        &self,
        payload: &T,
        group: Ipv4Addr,
        port: u16,
        ttl: u32,
    ) -> Result<(), TransportError> {
        let target = SocketAddr::V4(SocketAddrV4::new(group, port));
        let message = serde_json::to_vec(payload).map_err(TransportError::Encode)?;

        if self.options.reuse_socket {
            let mut guard = self.shared.lock().await;
            let socket = Self::ensure_socket(&mut guard).await?;
            if let Err(e) = socket.set_multicast_ttl_v4(ttl) {
                debug!("Could not set multicast TTL {}: {}", ttl, e);
            }
            socket
                .send_to(&message, target)
                .await
                .map_err(|source| send_failed(target, source))?;
        } else {
            let socket = bind_sender().await.map_err(TransportError::Socket)?;
            if let Err(e) = socket.set_multicast_ttl_v4(ttl) {
                debug!("Could not set multicast TTL {}: {}", ttl, e);
            }
            socket
                .send_to(&message, target)
                .await
                .map_err(|source| send_failed(target, source))?;
        }

        Ok(())
    }

    /// Release the long-lived socket. The next send reopens it.
    pub async fn close(&self) {
        if self.shared.lock().await.take().is_some() {
            debug!("Closed shared send socket");
        }
    }

    async fn request(
        &self,
        target: SocketAddr,
        message: &[u8],
    ) -> Result<Option<Value>, TransportError> {
        let socket = bind_sender().await.map_err(TransportError::Socket)?;
        socket
            .send_to(message, target)
            .await
            .map_err(|source| send_failed(target, source))?;

        let mut buf = vec![0u8; self.options.max_datagram_size];
        match timeout(self.options.reply_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => match decode_datagram(&buf[..len]) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    debug!("Discarding undecodable reply from {}: {}", from, e);
                    Ok(None)
                }
            },
            Ok(Err(source)) => {
                debug!("Error receiving reply from {}: {}", target, source);
                Err(TransportError::Receive { target, source })
            }
            Err(_) => {
                debug!("No reply from {} within {:?}", target, self.options.reply_timeout);
                Ok(None)
            }
        }
    }

    async fn ensure_socket(
        slot: &mut Option<UdpSocket>,
    ) -> Result<&UdpSocket, TransportError> {
        if slot.is_none() {
            let socket = bind_sender().await.map_err(TransportError::Socket)?;
            *slot = Some(socket);
        }
        slot.as_ref()
            .ok_or_else(|| TransportError::Socket(std::io::ErrorKind::NotConnected.into()))
    }
}

impl Default for TransportClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

fn send_failed(target: SocketAddr, source: std::io::Error) -> TransportError {
    debug!("Error sending to {}: {}", target, source);
    TransportError::Send { target, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Commands;
    use serde_json::json;

    fn options(reuse_socket: bool) -> ClientOptions {
        ClientOptions {
            reply_timeout: Duration::from_millis(300),
            reuse_socket,
            ..Default::default()
        }
    }

    async fn loopback_peer() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    #[tokio::test]
    async fn test_send_without_reply() {
        let (peer, port) = loopback_peer().await;
        let client = TransportClient::new(options(true));

        let reply = client
            .send_unicast(Ipv4Addr::LOCALHOST.into(), &Commands::turn(true), Some(port), false)
            .await
            .unwrap();
        assert!(reply.is_none());

        let mut buf = [0u8; 256];
        let (len, _) = peer.recv_from(&mut buf).await.unwrap();
        let value: Value = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(value, json!({"msg": {"cmd": "turn", "data": {"value": 1}}}));
    }

    #[tokio::test]
    async fn test_shared_socket_is_reused() {
        let (peer, port) = loopback_peer().await;
        let client = TransportClient::new(options(true));

        for _ in 0..2 {
            client
                .send_unicast(Ipv4Addr::LOCALHOST.into(), &Commands::dev_status(), Some(port), false)
                .await
                .unwrap();
        }

        let mut buf = [0u8; 256];
        let (_, first) = peer.recv_from(&mut buf).await.unwrap();
        let (_, second) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_request_reply() {
        let (peer, port) = loopback_peer().await;
        let client = TransportClient::new(options(false));

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let (_, from) = peer.recv_from(&mut buf).await.unwrap();
            let reply = json!({"msg": {"cmd": "devStatus", "data": {"onOff": 1}}});
            peer.send_to(reply.to_string().as_bytes(), from).await.unwrap();
        });

        let reply = client
            .send_unicast(Ipv4Addr::LOCALHOST.into(), &Commands::dev_status(), Some(port), true)
            .await
            .unwrap();
        responder.await.unwrap();

        assert_eq!(reply.unwrap()["msg"]["data"]["onOff"], 1);
    }

    #[tokio::test]
    async fn test_request_timeout_is_none() {
        let (_peer, port) = loopback_peer().await;
        let client = TransportClient::new(options(true));

        let reply = client
            .send_unicast(Ipv4Addr::LOCALHOST.into(), &Commands::dev_status(), Some(port), true)
            .await
            .unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let client = TransportClient::default();
        client.close().await;
        client.close().await;
    }
}
