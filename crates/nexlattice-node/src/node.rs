use crate::config::Config;
use crate::dispatch::{handle_inbound, route_and_send, send_to};
use crate::error::NodeError;
use crate::state::NodeState;
use crate::time::unix_timestamp;
use nexlattice_crypto::{derive_key, NodeIdentity};
use nexlattice_proto::{
    DataPayload, DiscoveryPayload, NexMessage, PingPongPayload, StatsPayload,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// How long to wait for a non-loopback IPv4 address to appear at startup
/// before giving up with [`NodeError::WifiUnavailable`].
const WIFI_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// A running NexLattice mesh node.
pub struct Node {
    config: Config,
    state: Arc<NodeState>,
    discovery_socket: Arc<UdpSocket>,
    message_socket: Arc<UdpSocket>,
    shutdown: CancellationToken,
}

impl Node {
    /// Load configuration, wait for the network to become ready, bind both
    /// sockets, and construct a node ready to [`Node::run`].
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Config`] if the config fails to load or
    /// validate, [`NodeError::WifiUnavailable`] if no usable network
    /// interface appears within [`WIFI_READY_TIMEOUT`], or
    /// [`NodeError::Transport`] if either socket fails to bind.
    pub async fn bootstrap(config: Config) -> Result<Self, NodeError> {
        config.validate()?;

        tokio::time::timeout(WIFI_READY_TIMEOUT, wait_for_network())
            .await
            .map_err(|_| NodeError::WifiUnavailable)??;

        let identity =
            NodeIdentity::from_private_key(config.node_id.clone(), config.shared_key.clone().into_bytes());
        let state = Arc::new(NodeState::new(identity));

        let discovery_socket = Arc::new(nexlattice_transport::bind_discovery(config.discovery_port)?);
        let message_socket = Arc::new(nexlattice_transport::bind_message(config.message_port)?);

        Ok(Self {
            config,
            state,
            discovery_socket,
            message_socket,
            shutdown: CancellationToken::new(),
        })
    }

    /// Run the node until [`Node::stop`] is called (or the process is
    /// signaled): spawns the two listener tasks and runs the periodic-task
    /// loop to completion on the current task.
    pub async fn run(&self) {
        let discovery_rx = nexlattice_transport::spawn_listener(
            Arc::clone(&self.discovery_socket),
            self.shutdown.clone(),
        );
        let message_rx = nexlattice_transport::spawn_listener(
            Arc::clone(&self.message_socket),
            self.shutdown.clone(),
        );

        tokio::join!(
            self.drain_inbound(discovery_rx),
            self.drain_inbound(message_rx),
            self.run_periodic_tasks(),
        );
    }

    async fn drain_inbound(&self, mut rx: tokio::sync::mpsc::Receiver<nexlattice_transport::Inbound>) {
        while let Some(inbound) = rx.recv().await {
            handle_inbound(
                &inbound.bytes,
                inbound.from,
                &self.state,
                &self.config,
                &self.discovery_socket,
                &self.message_socket,
            )
            .await;
        }
    }

    /// Runs the three periodic tasks described in the concurrency model —
    /// discovery broadcast, liveness sweep + ping, and dashboard report —
    /// each on its own `tokio::time::interval`, rather than the original
    /// firmware's single combined loop with hand-tracked elapsed-time
    /// counters: `tokio::time::interval` already guarantees the same
    /// jitter bound each of those counters was approximating.
    async fn run_periodic_tasks(&self) {
        tokio::join!(
            self.run_on_interval(self.config.discovery_interval_secs, || self.broadcast_discovery()),
            self.run_on_interval(self.config.liveness_interval_secs, || self.sweep_liveness_and_ping()),
            self.run_on_interval(self.config.stats_interval_secs, || self.report_stats()),
        );
    }

    async fn run_on_interval<F, Fut>(&self, period_secs: u64, mut task: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let mut tick = tokio::time::interval(Duration::from_secs(period_secs.max(1)));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => return,
                _ = tick.tick() => task().await,
            }
        }
    }

    async fn broadcast_discovery(&self) {
        let broadcast_ip = match nexlattice_transport::local_ipv4() {
            Ok(local_ip) => nexlattice_transport::broadcast_addr_for(local_ip),
            Err(_) => {
                tracing::warn!("no local interface found, falling back to limited broadcast");
                std::net::Ipv4Addr::BROADCAST
            }
        };
        let message = NexMessage::Discovery(DiscoveryPayload {
            node_id: self.state.identity.node_id().to_string(),
            node_name: self.config.node_name.clone(),
            public_key: self.state.identity.public_key().to_string(),
            timestamp: unix_timestamp(),
        });
        let Ok(bytes) = message.to_bytes() else {
            return;
        };
        if let Err(err) = nexlattice_transport::send_broadcast(
            &self.discovery_socket,
            broadcast_ip,
            self.config.discovery_port,
            &bytes,
        )
        .await
        {
            tracing::warn!(%err, "discovery broadcast failed");
        }
    }

    async fn sweep_liveness_and_ping(&self) {
        let dead = {
            let mut peers = self.state.peers.lock().await;
            peers.sweep_liveness()
        };
        if !dead.is_empty() {
            let mut router = self.state.router.lock().await;
            for peer_id in &dead {
                router.drop_routes_via(peer_id);
            }
            tracing::info!(?dead, "peers timed out");
        }
        self.state.router.lock().await.purge_cache();

        let targets: Vec<(String, SocketAddr)> = {
            let peers = self.state.peers.lock().await;
            peers
                .iter()
                .filter(|p| p.connected)
                .filter_map(|p| {
                    p.ip.parse::<IpAddr>()
                        .ok()
                        .map(|ip| (p.id.clone(), SocketAddr::new(ip, p.port)))
                })
                .collect()
        };
        let ping = NexMessage::Ping(PingPongPayload {
            node_id: self.state.identity.node_id().to_string(),
            timestamp: unix_timestamp(),
        });
        for (_, addr) in targets {
            send_to(&self.message_socket, addr, &ping).await;
        }
    }

    async fn report_stats(&self) {
        let peers_snapshot = { self.state.peers.lock().await.snapshot() };
        let report = StatsPayload {
            node_id: self.state.identity.node_id().to_string(),
            node_name: self.config.node_name.clone(),
            peers: peers_snapshot,
            stats: self.state.stats.snapshot(self.state.uptime_seconds()),
            timestamp: unix_timestamp(),
        };
        let Ok(body) = serde_json::to_vec(&report) else {
            return;
        };
        if let Err(err) = nexlattice_transport::post_json(
            &self.config.dashboard_host,
            self.config.dashboard_port,
            "/api/stats",
            &body,
        )
        .await
        {
            tracing::debug!(%err, "dashboard report failed, continuing");
        }
    }

    /// Originate a new application message addressed to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Crypto`] if `encrypt` is true and envelope
    /// construction fails.
    pub async fn send(
        &self,
        destination: &str,
        payload: &[u8],
        encrypt: bool,
    ) -> Result<(), NodeError> {
        let own_id = self.state.identity.node_id().to_string();
        let wire_payload = if encrypt {
            let key = derive_key(self.config.shared_key.as_bytes());
            nexlattice_crypto::sign_and_encrypt(payload, &key, self.config.shared_key.as_bytes())?
        } else {
            String::from_utf8_lossy(payload).into_owned()
        };

        let message = DataPayload {
            node_id: own_id.clone(),
            source: own_id.clone(),
            destination: destination.to_string(),
            payload: wire_payload,
            encrypted: encrypt,
            hop_count: 0,
            msg_id: None,
            path: vec![],
            flooded: false,
            timestamp: unix_timestamp(),
        };

        self.state.stats.record_sent();
        route_and_send(message, &own_id, &self.state, &self.message_socket, None).await;
        Ok(())
    }

    /// Human-readable status summary, for CLI/operator use.
    #[must_use]
    pub async fn status_line(&self) -> String {
        let peers = self.state.peers.lock().await;
        format!(
            "node={} peers={} connected={} uptime={}s",
            self.state.identity.node_id(),
            peers.peer_count(),
            peers.connected_count(),
            self.state.uptime_seconds(),
        )
    }

    /// Request cooperative shutdown of all tasks started by [`Node::run`].
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

async fn wait_for_network() -> Result<(), NodeError> {
    loop {
        if nexlattice_transport::local_ipv4().is_ok() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
