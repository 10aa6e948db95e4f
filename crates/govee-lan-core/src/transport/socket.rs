//! UDP socket construction.
//!
//! Uses SO_REUSEADDR (and SO_REUSEPORT on unix) so the receive port can be
//! shared with other listeners on the same host.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::DiscoveryError;

/// Create a non-blocking UDP socket with address reuse, bound to `bind_addr:port`.
pub fn create_reusable_socket(
    bind_addr: Ipv4Addr,
    port: u16,
) -> Result<std::net::UdpSocket, std::io::Error> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_reuse_address(true)?;

    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    let addr = SocketAddr::V4(SocketAddrV4::new(bind_addr, port));
    socket.bind(&addr.into())?;

    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// Create the discovery receive socket, optionally joined to `group` on all interfaces.
///
/// Must be called from within a tokio runtime.
pub fn bind_receiver(
    bind_addr: Ipv4Addr,
    port: u16,
    group: Option<Ipv4Addr>,
) -> Result<UdpSocket, DiscoveryError> {
    let std_socket = create_reusable_socket(bind_addr, port)
        .map_err(|source| DiscoveryError::Bind { port, source })?;

    if let Some(group) = group {
        std_socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(|source| DiscoveryError::JoinMulticast { group, source })?;
    }

    UdpSocket::from_std(std_socket).map_err(DiscoveryError::Socket)
}

/// Bind an ephemeral send socket.
pub async fn bind_sender() -> Result<UdpSocket, std::io::Error> {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await
}
