use nexlattice_crypto::SessionContext;
use std::time::Instant;

/// A known neighbor on the mesh.
pub struct Peer {
    /// The peer's `node_id`.
    pub id: String,
    /// The peer's human-readable name, as advertised in `DISCOVERY`.
    pub name: String,
    /// The peer's public fingerprint, as advertised in `DISCOVERY`.
    pub public_key: String,
    /// Source address the peer last sent from.
    pub ip: String,
    /// UDP port the peer last sent from.
    pub port: u16,
    /// When this node last heard from the peer, for liveness sweeps.
    pub last_seen: Instant,
    /// Last measured round-trip latency, if a `PING`/`PONG` exchange has
    /// completed.
    pub latency_ms: Option<f64>,
    /// Routing distance in hops, updated from routing-table relaxation.
    pub hop_distance: u32,
    /// Whether the peer is currently considered live.
    pub connected: bool,
    /// Established session key material, if `KEY_EXCHANGE` has completed.
    pub session: Option<SessionContext>,
}

impl Peer {
    /// Register a freshly-discovered peer with no session yet established.
    #[must_use]
    pub fn new(id: String, name: String, public_key: String, ip: String, port: u16) -> Self {
        Self {
            id,
            name,
            public_key,
            ip,
            port,
            last_seen: Instant::now(),
            latency_ms: None,
            hop_distance: 1,
            connected: true,
            session: None,
        }
    }

    /// Update last-seen / address bookkeeping for an inbound packet.
    pub fn mark_seen(&mut self, ip: String, port: u16) {
        self.ip = ip;
        self.port = port;
        self.last_seen = Instant::now();
        self.connected = true;
    }

    /// Record a completed round-trip latency measurement.
    pub fn set_latency(&mut self, latency_ms: f64) {
        self.latency_ms = Some(latency_ms);
    }

    /// Update the routing distance learned for this peer.
    pub fn set_hop_distance(&mut self, hop_distance: u32) {
        self.hop_distance = hop_distance;
    }

    /// Attach or replace the session established via `KEY_EXCHANGE`.
    pub fn set_session(&mut self, session: SessionContext) {
        self.session = Some(session);
    }
}
