use thiserror::Error;
use std::net::SocketAddr;

/// Errors raised by the UDP and dashboard-HTTP transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Binding or configuring a UDP socket failed.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        /// The address bind was attempted on.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Sending a datagram failed.
    #[error("send to {addr} failed: {source}")]
    Send {
        /// Destination address.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No non-loopback IPv4 interface could be found to derive a broadcast
    /// address from.
    #[error("no usable network interface found")]
    NoInterface,

    /// The dashboard POST could not be delivered. Never fatal to the node:
    /// callers log and continue.
    #[error("dashboard post to {host}:{port} failed: {source}")]
    DashboardUnreachable {
        /// Dashboard host.
        host: String,
        /// Dashboard port.
        port: u16,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
