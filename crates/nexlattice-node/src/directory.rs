use nexlattice_peer::PeerTable;
use nexlattice_router::{PeerDirectory, PeerEndpoint};

/// Adapts a borrowed [`PeerTable`] to the narrow [`PeerDirectory`] view the
/// router needs, without giving the router any other access to peer state.
pub struct PeerTableView<'a> {
    table: &'a PeerTable,
}

impl<'a> PeerTableView<'a> {
    /// Borrow `table` for the duration of one routing decision.
    #[must_use]
    pub fn new(table: &'a PeerTable) -> Self {
        Self { table }
    }
}

impl PeerDirectory for PeerTableView<'_> {
    fn endpoint(&self, peer_id: &str) -> Option<PeerEndpoint> {
        self.table
            .get(peer_id)
            .filter(|p| p.connected)
            .map(|p| PeerEndpoint {
                id: p.id.clone(),
                ip: p.ip.clone(),
                port: p.port,
            })
    }

    fn connected_endpoints(&self) -> Vec<PeerEndpoint> {
        self.table
            .iter()
            .filter(|p| p.connected)
            .map(|p| PeerEndpoint {
                id: p.id.clone(),
                ip: p.ip.clone(),
                port: p.port,
            })
            .collect()
    }
}
