use crate::error::TransportError;
use socket2::{Domain, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;

/// UDP port neighbors broadcast `DISCOVERY` packets on.
pub const DISCOVERY_PORT: u16 = 5000;
/// UDP port point-to-point application datagrams are exchanged on.
pub const MESSAGE_PORT: u16 = 5001;
/// Largest datagram this node will read or send.
pub const MAX_DATAGRAM_LEN: usize = 2048;

/// Bind the discovery socket: `SO_REUSEADDR` and `SO_BROADCAST` so multiple
/// local nodes (useful for testing) can share the port and this node can
/// both send and receive broadcast traffic on it.
///
/// # Errors
///
/// Returns [`TransportError::Bind`] if the underlying socket creation,
/// option configuration, or bind call fails.
pub fn bind_discovery(port: u16) -> Result<UdpSocket, TransportError> {
    bind_udp(port, true)
}

/// Bind the point-to-point message socket. `SO_REUSEADDR` only; broadcast
/// is not needed for unicast message traffic.
///
/// # Errors
///
/// Returns [`TransportError::Bind`] if the underlying socket creation,
/// option configuration, or bind call fails.
pub fn bind_message(port: u16) -> Result<UdpSocket, TransportError> {
    bind_udp(port, false)
}

fn bind_udp(port: u16, broadcast: bool) -> Result<UdpSocket, TransportError> {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    let to_err = |source: std::io::Error| TransportError::Bind { addr, source };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None).map_err(to_err)?;
    socket.set_reuse_address(true).map_err(to_err)?;
    if broadcast {
        socket.set_broadcast(true).map_err(to_err)?;
    }
    socket.set_nonblocking(true).map_err(to_err)?;
    socket.bind(&addr.into()).map_err(to_err)?;

    UdpSocket::from_std(socket.into()).map_err(to_err)
}

/// Compute the subnet broadcast address for a /24 assumed local network,
/// matching the original firmware's `a.b.c.255` heuristic rather than
/// consulting interface netmasks (embedded Wi-Fi targets are always on a
/// /24 home/office subnet in practice).
#[must_use]
pub fn broadcast_addr_for(local_ip: Ipv4Addr) -> Ipv4Addr {
    let octets = local_ip.octets();
    Ipv4Addr::new(octets[0], octets[1], octets[2], 255)
}

/// Best-effort discovery of this host's own non-loopback IPv4 address, used
/// both to compute the broadcast address and (per `SPEC_FULL.md`) as the
/// "Wi-Fi is ready" readiness check on targets with no `network.WLAN`
/// equivalent.
///
/// # Errors
///
/// Returns [`TransportError::NoInterface`] if no non-loopback IPv4 address
/// can be determined.
pub fn local_ipv4() -> Result<Ipv4Addr, TransportError> {
    // Connecting a UDP socket performs no handshake; it only asks the OS
    // routing table which local address would be used to reach the target,
    // which is the standard portable way to discover "our" address.
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").map_err(|source| TransportError::Bind {
        addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
        source,
    })?;
    socket
        .connect("8.8.8.8:80")
        .map_err(|_| TransportError::NoInterface)?;
    match socket.local_addr() {
        Ok(SocketAddr::V4(addr)) if !addr.ip().is_loopback() => Ok(*addr.ip()),
        _ => Err(TransportError::NoInterface),
    }
}

/// Send `bytes` to the subnet broadcast address on `port`.
///
/// # Errors
///
/// Returns [`TransportError::Send`] if the underlying send fails.
pub async fn send_broadcast(
    socket: &UdpSocket,
    broadcast_ip: Ipv4Addr,
    port: u16,
    bytes: &[u8],
) -> Result<(), TransportError> {
    let addr = SocketAddr::V4(SocketAddrV4::new(broadcast_ip, port));
    socket
        .send_to(bytes, addr)
        .await
        .map(|_| ())
        .map_err(|source| TransportError::Send { addr, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_addr_assumes_slash_24() {
        let ip = Ipv4Addr::new(192, 168, 1, 42);
        assert_eq!(broadcast_addr_for(ip), Ipv4Addr::new(192, 168, 1, 255));
    }
}
