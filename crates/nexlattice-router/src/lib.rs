//! # NexLattice Message Router
//!
//! Decides what to do with a `DATA` message: deliver it locally, forward it
//! to a known direct peer or learned route, or flood it to every connected
//! peer except the one it arrived from. Performs no I/O and owns no peer
//! state itself — it is handed a narrow [`PeerDirectory`] view by the node
//! orchestrator and returns a [`RouteOutcome`] describing what the caller
//! should do next.

#![warn(missing_docs)]

mod cache;
mod capability;
mod error;
mod route_table;
mod router;

pub use cache::{MessageCache, CACHE_TTL};
pub use capability::{PeerDirectory, PeerEndpoint};
pub use error::RouterError;
pub use route_table::{RouteEntry, RouteTable};
pub use router::{DropReason, RouteOutcome, Router, MAX_HOPS};
