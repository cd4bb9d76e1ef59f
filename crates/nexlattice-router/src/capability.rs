/// A peer's UDP endpoint, as the router needs it to plan a forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEndpoint {
    /// Peer's `node_id`.
    pub id: String,
    /// Peer's last-known IP address.
    pub ip: String,
    /// Peer's UDP port.
    pub port: u16,
}

/// A narrow, read-only view of the peer table that the router needs to
/// plan forwards and floods, without giving it access to the full peer
/// table (and therefore no ability to mutate peer state or perform I/O
/// itself).
pub trait PeerDirectory {
    /// Endpoint for a specific peer, if known.
    fn endpoint(&self, peer_id: &str) -> Option<PeerEndpoint>;

    /// Endpoints for every currently-connected peer.
    fn connected_endpoints(&self) -> Vec<PeerEndpoint>;
}
