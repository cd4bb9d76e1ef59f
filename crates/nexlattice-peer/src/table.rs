use crate::error::PeerError;
use crate::peer::Peer;
use nexlattice_proto::PeerSummary;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a peer may go unheard-from before `sweep_liveness` marks it
/// disconnected.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(60);

/// All peers this node currently knows about.
///
/// Not internally synchronized: the orchestrator owns one `PeerTable` behind
/// a lock, consistent with the fixed lock order (peers, then routes, then
/// cache, then stats) used across the mesh node.
#[derive(Default)]
pub struct PeerTable {
    own_id: String,
    peers: HashMap<String, Peer>,
}

impl PeerTable {
    /// Construct an empty table for the node identified by `own_id`.
    #[must_use]
    pub fn new(own_id: impl Into<String>) -> Self {
        Self {
            own_id: own_id.into(),
            peers: HashMap::new(),
        }
    }

    /// Insert a newly-discovered peer, or refresh bookkeeping for an
    /// already-known one.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::SelfReference`] if `peer.id` equals this node's
    /// own id.
    pub fn upsert(&mut self, peer: Peer) -> Result<(), PeerError> {
        if peer.id == self.own_id {
            return Err(PeerError::SelfReference(peer.id));
        }
        let ip = peer.ip.clone();
        let port = peer.port;
        if let Some(existing) = self.peers.get_mut(&peer.id) {
            existing.mark_seen(ip, port);
            existing.name = peer.name;
            existing.public_key = peer.public_key;
        } else {
            self.peers.insert(peer.id.clone(), peer);
        }
        Ok(())
    }

    /// Look up a peer by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Peer> {
        self.peers.get(id)
    }

    /// Mutably look up a peer by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Peer> {
        self.peers.get_mut(id)
    }

    /// Remove a peer entirely.
    pub fn remove(&mut self, id: &str) -> Option<Peer> {
        self.peers.remove(id)
    }

    /// Iterate all known peers.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Number of known peers, connected or not.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Number of peers currently considered live.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.peers.values().filter(|p| p.connected).count()
    }

    /// Mark any peer not heard from within [`LIVENESS_TIMEOUT`] as
    /// disconnected. Returns the ids that changed state in this call.
    pub fn sweep_liveness(&mut self) -> Vec<String> {
        let now = Instant::now();
        let mut newly_dead = Vec::new();
        for peer in self.peers.values_mut() {
            if peer.connected && now.duration_since(peer.last_seen) > LIVENESS_TIMEOUT {
                peer.connected = false;
                newly_dead.push(peer.id.clone());
            }
        }
        newly_dead
    }

    /// Render a `STATS`-ready snapshot of every known peer.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerSummary> {
        let now = Instant::now();
        self.peers
            .values()
            .map(|p| PeerSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                ip: p.ip.clone(),
                last_seen: now.duration_since(p.last_seen).as_secs_f64(),
                latency: p.latency_ms,
                connected: p.connected,
            })
            .collect()
    }
}
