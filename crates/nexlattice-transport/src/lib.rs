//! # NexLattice Transport Listener
//!
//! The two non-blocking UDP sockets a node listens on (`DISCOVERY` on port
//! 5000, point-to-point messages on port 5001), broadcast/unicast send
//! helpers, and the raw-HTTP dashboard status sink. Each socket is read by
//! its own task via [`spawn_listener`]; shutdown is cooperative through a
//! `tokio_util::sync::CancellationToken`.

#![warn(missing_docs)]

mod dashboard;
mod error;
mod listener;
mod sockets;

pub use dashboard::post_json;
pub use error::TransportError;
pub use listener::{spawn_listener, send_unicast, Inbound};
pub use sockets::{
    bind_discovery, bind_message, broadcast_addr_for, local_ipv4, send_broadcast,
    DISCOVERY_PORT, MAX_DATAGRAM_LEN, MESSAGE_PORT,
};
