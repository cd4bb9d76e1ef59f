use crate::error::RouterError;
use std::collections::HashMap;

/// One known path to a destination: the peer to hand the datagram to next,
/// and the hop-count cost of that path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// `node_id` of the next-hop peer.
    pub next_hop: String,
    /// Total hops from here to the destination via `next_hop`.
    pub metric: u32,
}

/// Destination-to-next-hop table, relaxed only by strictly shorter paths.
///
/// Mirrors the original firmware's `routing_table`: a destination's entry
/// is replaced only when a newly observed path is strictly cheaper, so a
/// single flapping link can't cause routes to oscillate between two
/// equal-cost paths.
#[derive(Default)]
pub struct RouteTable {
    own_id: String,
    routes: HashMap<String, RouteEntry>,
}

impl RouteTable {
    /// Construct an empty table for the node identified by `own_id`.
    #[must_use]
    pub fn new(own_id: impl Into<String>) -> Self {
        Self {
            own_id: own_id.into(),
            routes: HashMap::new(),
        }
    }

    /// Look up the best known route to `destination`.
    #[must_use]
    pub fn route_to(&self, destination: &str) -> Option<&RouteEntry> {
        self.routes.get(destination)
    }

    /// Offer a candidate path to `destination` via `next_hop` at `metric`
    /// hops. Installs it only if no route exists yet or the candidate is
    /// strictly cheaper than the current one. Returns whether the table
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::SelfRoute`] if `next_hop` is this node's own
    /// id, or if `destination` is this node's own id (we never need a route
    /// to ourselves).
    pub fn relax(
        &mut self,
        destination: &str,
        next_hop: &str,
        metric: u32,
    ) -> Result<bool, RouterError> {
        if next_hop == self.own_id || destination == self.own_id {
            return Err(RouterError::SelfRoute(destination.to_string()));
        }
        let better = match self.routes.get(destination) {
            Some(existing) => metric < existing.metric,
            None => true,
        };
        if better {
            self.routes.insert(
                destination.to_string(),
                RouteEntry {
                    next_hop: next_hop.to_string(),
                    metric,
                },
            );
        }
        Ok(better)
    }

    /// Drop any route whose next hop is no longer a live peer.
    pub fn drop_routes_via(&mut self, dead_peer: &str) {
        self.routes.retain(|_, entry| entry.next_hop != dead_peer);
    }

    /// Number of known routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_first_route_seen() {
        let mut table = RouteTable::new("node-a");
        let changed = table.relax("node-c", "node-b", 2).unwrap();
        assert!(changed);
        assert_eq!(table.route_to("node-c").unwrap().metric, 2);
    }

    #[test]
    fn only_relaxes_on_strictly_shorter_path() {
        let mut table = RouteTable::new("node-a");
        table.relax("node-c", "node-b", 3).unwrap();
        let changed_equal = table.relax("node-c", "node-d", 3).unwrap();
        assert!(!changed_equal);
        assert_eq!(table.route_to("node-c").unwrap().next_hop, "node-b");

        let changed_worse = table.relax("node-c", "node-d", 4).unwrap();
        assert!(!changed_worse);

        let changed_better = table.relax("node-c", "node-d", 1).unwrap();
        assert!(changed_better);
        assert_eq!(table.route_to("node-c").unwrap().next_hop, "node-d");
    }

    #[test]
    fn rejects_self_referential_routes() {
        let mut table = RouteTable::new("node-a");
        assert!(table.relax("node-c", "node-a", 1).is_err());
        assert!(table.relax("node-a", "node-b", 1).is_err());
    }

    #[test]
    fn drop_routes_via_removes_affected_entries_only() {
        let mut table = RouteTable::new("node-a");
        table.relax("node-c", "node-b", 2).unwrap();
        table.relax("node-d", "node-e", 2).unwrap();
        table.drop_routes_via("node-b");
        assert!(table.route_to("node-c").is_none());
        assert!(table.route_to("node-d").is_some());
    }
}
