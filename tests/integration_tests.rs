//! End-to-end scenarios for a simulated five-node line topology
//! (A-B-C-D-E, one-hop range only), driving `nexlattice-peer` and
//! `nexlattice-router` together the way the node orchestrator does,
//! without any real sockets involved.

use nexlattice_peer::{Peer, PeerTable};
use nexlattice_proto::DataPayload;
use nexlattice_router::{DropReason, PeerDirectory, PeerEndpoint, RouteOutcome, Router};

/// Adapts a `PeerTable` to the router's narrow `PeerDirectory` view, mirroring
/// `nexlattice-node`'s own adapter of the same name and shape.
struct PeerTableView<'a> {
    table: &'a PeerTable,
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

/// One simulated mesh node: its own peer table and router, plus the line
/// neighbors it was provisioned to know about at startup.
struct SimNode {
    id: String,
    peers: PeerTable,
    router: Router,
}

impl SimNode {
    fn new(id: &str, neighbor_ids: &[&str]) -> Self {
        let mut peers = PeerTable::new(id);
        for (i, neighbor) in neighbor_ids.iter().enumerate() {
            let _ = peers.upsert(Peer::new(
                (*neighbor).to_string(),
                format!("Node {neighbor}"),
                "pubkey".to_string(),
                "10.0.0.1".to_string(),
                5001 + i as u16,
            ));
        }
        Self {
            id: id.to_string(),
            peers,
            router: Router::new(id),
        }
    }

    fn route(&mut self, message: DataPayload, received_from: &str) -> RouteOutcome {
        let view = PeerTableView { table: &self.peers };
        self.router.route(message, received_from, &view)
    }

    fn set_connected(&mut self, peer_id: &str, connected: bool) {
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.connected = connected;
        }
    }
}

fn line_of_five() -> (SimNode, SimNode, SimNode, SimNode, SimNode) {
    (
        SimNode::new("node-a", &["node-b"]),
        SimNode::new("node-b", &["node-a", "node-c"]),
        SimNode::new("node-c", &["node-b", "node-d"]),
        SimNode::new("node-d", &["node-c", "node-e"]),
        SimNode::new("node-e", &["node-d"]),
    )
}

fn data_from_a(destination: &str) -> DataPayload {
    DataPayload {
        node_id: "node-a".to_string(),
        source: "node-a".to_string(),
        destination: destination.to_string(),
        payload: "hi".to_string(),
        encrypted: false,
        hop_count: 0,
        msg_id: None,
        path: vec![],
        flooded: false,
        timestamp: 1000.0,
    }
}

/// Scenario 1: direct delivery. A sends DATA{dest=B}; B should deliver
/// locally on the first hop, with no forwarding anywhere.
#[test]
fn direct_delivery_reaches_the_immediate_neighbor() {
    let (_a, mut b, _c, _d, _e) = line_of_five();
    let outcome = b.route(data_from_a("node-b"), "node-a");
    assert!(matches!(outcome, RouteOutcome::DeliverLocally(_)));
}

/// Scenario 2: multi-hop via flood. A sends DATA{dest=E}; each of B, C, D
/// forwards exactly once (via flood, since no routes are known yet and E is
/// never a direct peer until it reaches D), and the hop count at E is 4.
#[test]
fn multi_hop_delivery_accumulates_one_hop_per_relay() {
    let (_a, mut b, mut c, mut d, mut e) = line_of_five();

    let at_b = b.route(data_from_a("node-e"), "node-a");
    let msg_at_c = match at_b {
        RouteOutcome::Flood { message, to } => {
            assert_eq!(to.len(), 1);
            assert_eq!(to[0].id, "node-c");
            message
        }
        other => panic!("expected node-b to flood toward node-c, got {other:?}"),
    };

    let at_c = c.route(msg_at_c, "node-b");
    let msg_at_d = match at_c {
        RouteOutcome::Flood { message, to } => {
            assert_eq!(to.len(), 1);
            assert_eq!(to[0].id, "node-d");
            message
        }
        other => panic!("expected node-c to flood toward node-d, got {other:?}"),
    };

    let at_d = d.route(msg_at_d, "node-c");
    let msg_at_e = match at_d {
        RouteOutcome::Forward { message, to } => {
            assert_eq!(to.id, "node-e");
            message
        }
        other => panic!("expected node-d to forward directly to node-e, got {other:?}"),
    };

    let at_e = e.route(msg_at_e, "node-d");
    match at_e {
        RouteOutcome::DeliverLocally(message) => assert_eq!(message.hop_count, 4),
        other => panic!("expected node-e to deliver locally, got {other:?}"),
    }
}

/// Scenario 3: failure + no crash. With node-c marked offline at D, a flood
/// fallback at D must never target node-c, and no node panics; the overall
/// delivery simply has no path, which the router reports as a drop rather
/// than a crash.
#[test]
fn an_offline_relay_is_excluded_from_flood_targets() {
    let (_a, _b, _c, mut d, _e) = line_of_five();
    d.set_connected("node-c", false);

    // Destination unknown to D by any route or direct peer, so D must fall
    // back to flooding; its only other neighbor is node-e.
    let msg = data_from_a("node-z");
    let outcome = d.route(msg, "node-a");

    match outcome {
        RouteOutcome::Flood { to, .. } => {
            assert_eq!(to.len(), 1);
            assert_eq!(to[0].id, "node-e");
        }
        RouteOutcome::Dropped(DropReason::NoPeersAvailable) => {}
        other => panic!("unexpected outcome with node-c offline: {other:?}"),
    }
    assert_eq!(d.id, "node-d");
}

/// Scenario 5: replay suppression. Injecting the same DATA datagram twice
/// at one node forwards it only once; the message cache grows by exactly
/// one entry.
#[test]
fn replayed_datagram_is_suppressed_on_second_delivery() {
    let (_a, mut b, _c, _d, _e) = line_of_five();
    let msg = data_from_a("node-e");

    let first = b.route(msg.clone(), "node-a");
    assert!(!matches!(first, RouteOutcome::Dropped(_)));

    let second = b.route(msg, "node-a");
    assert!(matches!(
        second,
        RouteOutcome::Dropped(DropReason::Duplicate)
    ));
}
