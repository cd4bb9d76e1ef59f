use nexlattice_crypto::{ChallengeCache, NodeIdentity};
use nexlattice_peer::PeerTable;
use nexlattice_proto::StatsCounters;
use nexlattice_router::Router;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;

/// Lock-free running counters, snapshotted into [`StatsCounters`] on demand
/// for `STATS` reports.
#[derive(Default)]
pub struct Stats {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_forwarded: AtomicU64,
    decode_errors: AtomicU64,
    verify_errors: AtomicU64,
    unknown_type_count: AtomicU64,
}

impl Stats {
    /// Record that this node originated a message.
    pub fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a message reached this node as its final destination.
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that this node forwarded a message on behalf of another node.
    pub fn record_forwarded(&self) {
        self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram that failed to parse as JSON, or lacked a `type`.
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram whose signature failed verification.
    pub fn record_verify_error(&self) {
        self.verify_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram with an unrecognized `type`.
    pub fn record_unknown_type(&self) {
        self.unknown_type_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Render a point-in-time snapshot for a `STATS` report.
    #[must_use]
    pub fn snapshot(&self, uptime_seconds: u64) -> StatsCounters {
        StatsCounters {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            verify_errors: self.verify_errors.load(Ordering::Relaxed),
            unknown_type_count: self.unknown_type_count.load(Ordering::Relaxed),
            uptime_seconds,
        }
    }
}

/// All mutable state shared across the node's tasks.
///
/// Lock acquisition order, when more than one lock is needed at once, is
/// always `peers`, then `router`, then `challenges`; `stats` uses
/// lock-free atomics and may be touched at any point. Following a fixed
/// order across tasks rules out lock-order-inversion deadlocks.
pub struct NodeState {
    /// This node's own key material.
    pub identity: NodeIdentity,
    /// Known neighbors.
    pub peers: Mutex<PeerTable>,
    /// Routing and forwarding decisions, plus duplicate suppression.
    pub router: Mutex<Router>,
    /// Outstanding authentication challenges this node has issued.
    pub challenges: Mutex<ChallengeCache>,
    /// Running counters.
    pub stats: Stats,
    /// When this node process started, for uptime reporting.
    pub started_at: Instant,
}

impl NodeState {
    /// Construct fresh, empty state for a node with the given `identity`.
    #[must_use]
    pub fn new(identity: NodeIdentity) -> Self {
        let node_id = identity.node_id().to_string();
        Self {
            identity,
            peers: Mutex::new(PeerTable::new(node_id.clone())),
            router: Mutex::new(Router::new(node_id)),
            challenges: Mutex::new(ChallengeCache::new()),
            stats: Stats::default(),
            started_at: Instant::now(),
        }
    }

    /// Seconds since this node process started.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
