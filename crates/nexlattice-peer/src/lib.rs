//! # NexLattice Peer Table
//!
//! Bookkeeping for the neighbors a NexLattice node has discovered, sessioned
//! with, and is tracking liveness for. Owned by the node orchestrator behind
//! a single async lock; this crate itself does no locking or I/O.

#![warn(missing_docs)]

mod error;
mod peer;
mod table;

pub use error::PeerError;
pub use peer::Peer;
pub use table::{PeerTable, LIVENESS_TIMEOUT};
