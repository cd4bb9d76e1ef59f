use crate::cache::MessageCache;
use crate::capability::{PeerDirectory, PeerEndpoint};
use crate::route_table::RouteTable;
use nexlattice_proto::DataPayload;

/// Hop budget before a message is dropped rather than forwarded further.
pub const MAX_HOPS: u32 = 5;

/// Why a message was dropped instead of delivered or forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// This `msg_id` was already processed within the cache TTL.
    Duplicate,
    /// The message has already traversed `MAX_HOPS` hops.
    MaxHopsExceeded,
    /// No route, direct peer, or any connected peer was available to flood to.
    NoPeersAvailable,
}

/// What the caller should do with a message after routing it.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// This node is the final destination; hand the payload to the
    /// application layer.
    DeliverLocally(DataPayload),
    /// Forward the message directly to one known peer.
    Forward {
        /// The (possibly mutated) message to send on.
        message: DataPayload,
        /// Where to send it.
        to: PeerEndpoint,
    },
    /// No direct or routed path is known; flood to every connected peer
    /// except the one this message arrived from.
    Flood {
        /// The (possibly mutated) message to send on.
        message: DataPayload,
        /// Every endpoint to send it to.
        to: Vec<PeerEndpoint>,
    },
    /// The message was dropped without being delivered or forwarded.
    Dropped(DropReason),
}

/// Routes and forwards `DATA` messages without performing any I/O itself:
/// given a message and a [`PeerDirectory`], it decides what should happen
/// and returns a [`RouteOutcome`] for the caller (the node orchestrator) to
/// carry out.
pub struct Router {
    own_id: String,
    routes: RouteTable,
    cache: MessageCache,
}

impl Router {
    /// Construct a router for the node identified by `own_id`.
    #[must_use]
    pub fn new(own_id: impl Into<String>) -> Self {
        let own_id = own_id.into();
        Self {
            routes: RouteTable::new(own_id.clone()),
            cache: MessageCache::new(),
            own_id,
        }
    }

    /// Route an inbound or locally-originated message.
    ///
    /// `received_from` is the peer this message arrived from, or this
    /// node's own id for messages it originates itself (which excludes no
    /// peer from a flood).
    pub fn route(
        &mut self,
        mut message: DataPayload,
        received_from: &str,
        peers: &dyn PeerDirectory,
    ) -> RouteOutcome {
        self.cache.purge_expired();
        let msg_id = message.message_id();
        if message.msg_id.is_none() {
            message.msg_id = Some(msg_id.clone());
        }
        if self.cache.contains(&msg_id) {
            return RouteOutcome::Dropped(DropReason::Duplicate);
        }
        message.path.push(self.own_id.clone());

        let _ = self
            .routes
            .relax(&message.source, received_from, message.hop_count + 1);

        if message.destination == self.own_id {
            self.cache.record(msg_id);
            return RouteOutcome::DeliverLocally(message);
        }

        if message.hop_count >= MAX_HOPS {
            return RouteOutcome::Dropped(DropReason::MaxHopsExceeded);
        }
        self.cache.record(msg_id);
        message.hop_count += 1;
        message.node_id = self.own_id.clone();

        if let Some(endpoint) = peers.endpoint(&message.destination) {
            return RouteOutcome::Forward {
                message,
                to: endpoint,
            };
        }

        if let Some(route) = self.routes.route_to(&message.destination) {
            if let Some(endpoint) = peers.endpoint(&route.next_hop) {
                return RouteOutcome::Forward {
                    message,
                    to: endpoint,
                };
            }
        }

        message.flooded = true;
        let targets: Vec<PeerEndpoint> = peers
            .connected_endpoints()
            .into_iter()
            .filter(|ep| ep.id != received_from)
            .collect();
        if targets.is_empty() {
            return RouteOutcome::Dropped(DropReason::NoPeersAvailable);
        }
        RouteOutcome::Flood {
            message,
            to: targets,
        }
    }

    /// Opportunistically purge the duplicate-suppression cache.
    pub fn purge_cache(&mut self) {
        self.cache.purge_expired();
    }

    /// Current learned hop distance to `destination`, if any.
    #[must_use]
    pub fn route_metric(&self, destination: &str) -> Option<u32> {
        self.routes.route_to(destination).map(|r| r.metric)
    }

    /// Forget any routes that went via a peer that is no longer live.
    pub fn drop_routes_via(&mut self, dead_peer: &str) {
        self.routes.drop_routes_via(dead_peer);
    }

    /// Number of known routes (not counting direct peers).
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDirectory {
        direct: Vec<PeerEndpoint>,
        connected: Vec<PeerEndpoint>,
    }

    impl PeerDirectory for FakeDirectory {
        fn endpoint(&self, peer_id: &str) -> Option<PeerEndpoint> {
            self.direct.iter().find(|e| e.id == peer_id).cloned()
        }

        fn connected_endpoints(&self) -> Vec<PeerEndpoint> {
            self.connected.clone()
        }
    }

    fn data(source: &str, destination: &str, hop_count: u32) -> DataPayload {
        DataPayload {
            node_id: source.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            payload: "hi".to_string(),
            encrypted: false,
            hop_count,
            msg_id: None,
            path: vec![],
            flooded: false,
            timestamp: 1000.0,
        }
    }

    fn ep(id: &str) -> PeerEndpoint {
        PeerEndpoint {
            id: id.to_string(),
            ip: "10.0.0.2".to_string(),
            port: 5001,
        }
    }

    #[test]
    fn delivers_locally_when_destination_is_self() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![],
        };
        let outcome = router.route(data("node-b", "node-a", 0), "node-b", &dir);
        assert!(matches!(outcome, RouteOutcome::DeliverLocally(_)));
    }

    #[test]
    fn forwards_directly_to_a_known_peer() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![ep("node-c")],
            connected: vec![ep("node-c")],
        };
        let outcome = router.route(data("node-b", "node-c", 0), "node-b", &dir);
        match outcome {
            RouteOutcome::Forward { to, message } => {
                assert_eq!(to.id, "node-c");
                assert_eq!(message.hop_count, 1);
            }
            other => panic!("expected Forward, got {other:?}"),
        }
    }

    #[test]
    fn floods_when_no_direct_peer_or_route_exists() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![ep("node-c"), ep("node-d")],
        };
        let outcome = router.route(data("node-b", "node-z", 0), "node-b", &dir);
        match outcome {
            RouteOutcome::Flood { to, message } => {
                assert_eq!(to.len(), 2);
                assert!(message.flooded);
            }
            other => panic!("expected Flood, got {other:?}"),
        }
    }

    #[test]
    fn flood_excludes_the_sending_peer() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![ep("node-b"), ep("node-c")],
        };
        let outcome = router.route(data("node-x", "node-z", 0), "node-b", &dir);
        match outcome {
            RouteOutcome::Flood { to, .. } => {
                assert_eq!(to.len(), 1);
                assert_eq!(to[0].id, "node-c");
            }
            other => panic!("expected Flood, got {other:?}"),
        }
    }

    #[test]
    fn drops_duplicates_by_msg_id() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![ep("node-c")],
        };
        let msg = data("node-b", "node-z", 0);
        let first = router.route(msg.clone(), "node-b", &dir);
        assert!(!matches!(first, RouteOutcome::Dropped(_)));
        let second = router.route(msg, "node-b", &dir);
        assert!(matches!(
            second,
            RouteOutcome::Dropped(DropReason::Duplicate)
        ));
    }

    #[test]
    fn drops_when_hop_budget_is_exhausted() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![ep("node-c")],
        };
        let outcome = router.route(data("node-b", "node-z", MAX_HOPS), "node-b", &dir);
        assert!(matches!(
            outcome,
            RouteOutcome::Dropped(DropReason::MaxHopsExceeded)
        ));
    }

    #[test]
    fn hop_limit_drop_does_not_populate_the_cache() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![ep("node-c")],
        };
        let msg = data("node-b", "node-z", MAX_HOPS);
        let first = router.route(msg.clone(), "node-b", &dir);
        assert!(matches!(
            first,
            RouteOutcome::Dropped(DropReason::MaxHopsExceeded)
        ));

        // A retry of the same msg_id arriving via a shorter path must not be
        // treated as a duplicate just because the first copy was dropped.
        let retry = data("node-b", "node-z", 0);
        let second = router.route(retry, "node-b", &dir);
        assert!(!matches!(second, RouteOutcome::Dropped(_)));
    }

    #[test]
    fn drops_flood_with_no_peers_available() {
        let mut router = Router::new("node-a");
        let dir = FakeDirectory {
            direct: vec![],
            connected: vec![],
        };
        let outcome = router.route(data("node-b", "node-z", 0), "node-b", &dir);
        assert!(matches!(
            outcome,
            RouteOutcome::Dropped(DropReason::NoPeersAvailable)
        ));
    }

    #[test]
    fn prefers_learned_route_over_flood() {
        let mut router = Router::new("node-a");
        // First message from node-b teaches a route to node-b (the source).
        let dir = FakeDirectory {
            direct: vec![ep("node-b")],
            connected: vec![ep("node-b")],
        };
        router.route(data("node-b", "node-a", 3), "node-b", &dir);
        assert_eq!(router.route_count(), 1);
    }
}
