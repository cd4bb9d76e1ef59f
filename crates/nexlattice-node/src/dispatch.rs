use crate::config::Config;
use crate::directory::PeerTableView;
use crate::state::NodeState;
use crate::time::unix_timestamp;
use nexlattice_crypto::{derive_key, CryptoError, SessionContext};
use nexlattice_peer::Peer;
use nexlattice_proto::{DataPayload, DiscoveryPayload, NexMessage, PingPongPayload, ProtoError};
use nexlattice_router::RouteOutcome;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Parse and dispatch one inbound datagram, sending any reply or forward
/// traffic the handling requires.
pub async fn handle_inbound(
    bytes: &[u8],
    from: SocketAddr,
    state: &Arc<NodeState>,
    config: &Config,
    discovery_socket: &UdpSocket,
    message_socket: &UdpSocket,
) {
    let message = match NexMessage::parse(bytes) {
        Ok(message) => message,
        Err(ProtoError::UnknownType(kind)) => {
            state.stats.record_unknown_type();
            tracing::debug!(%kind, %from, "dropping datagram with unrecognized type");
            return;
        }
        Err(err) => {
            state.stats.record_decode_error();
            tracing::debug!(%err, %from, "dropping undecodable datagram");
            return;
        }
    };

    match message {
        NexMessage::Discovery(payload) => {
            handle_discovery(payload, from, state, config, discovery_socket, true).await;
        }
        NexMessage::DiscoveryResponse(payload) => {
            handle_discovery(payload, from, state, config, discovery_socket, false).await;
        }
        NexMessage::KeyExchange(payload) => {
            let node_id = payload.node_id.clone();
            if node_id == state.identity.node_id() {
                return;
            }
            let key_bytes = hex::decode(&payload.session_key).unwrap_or_else(|_| {
                payload.session_key.clone().into_bytes()
            });
            let session = SessionContext::establish(node_id.clone(), &key_bytes);
            let mut peers = state.peers.lock().await;
            if let Some(peer) = peers.get_mut(&node_id) {
                peer.mark_seen(from.ip().to_string(), from.port());
                peer.set_session(session);
            } else {
                let mut peer = Peer::new(
                    node_id.clone(),
                    node_id.clone(),
                    String::new(),
                    from.ip().to_string(),
                    from.port(),
                );
                peer.set_session(session);
                let _ = peers.upsert(peer);
            }
            // Accepted without a signature check: KEY_EXCHANGE carries no
            // authentication in this protocol. See DESIGN.md.
        }
        NexMessage::Data(payload) => {
            handle_data(payload, from, state, config, message_socket).await;
        }
        NexMessage::Ping(payload) => {
            handle_ping(payload, from, state, message_socket).await;
        }
        NexMessage::Pong(payload) => {
            handle_pong(payload, state).await;
        }
        NexMessage::Stats(_) => {
            tracing::trace!(%from, "ignoring peer-originated STATS message");
        }
    }
}

async fn handle_discovery(
    payload: DiscoveryPayload,
    from: SocketAddr,
    state: &Arc<NodeState>,
    config: &Config,
    discovery_socket: &UdpSocket,
    should_reply: bool,
) {
    if payload.node_id == state.identity.node_id() {
        return;
    }
    let peer = Peer::new(
        payload.node_id.clone(),
        payload.node_name.clone(),
        payload.public_key.clone(),
        from.ip().to_string(),
        from.port(),
    );
    {
        let mut peers = state.peers.lock().await;
        let _ = peers.upsert(peer);
    }

    if should_reply {
        let response = NexMessage::DiscoveryResponse(DiscoveryPayload {
            node_id: state.identity.node_id().to_string(),
            node_name: config.node_name.clone(),
            public_key: state.identity.public_key().to_string(),
            timestamp: unix_timestamp(),
        });
        send_to(discovery_socket, from, &response).await;
    }
}

async fn handle_ping(
    payload: PingPongPayload,
    from: SocketAddr,
    state: &Arc<NodeState>,
    message_socket: &UdpSocket,
) {
    if payload.node_id == state.identity.node_id() {
        return;
    }
    {
        let mut peers = state.peers.lock().await;
        if let Some(peer) = peers.get_mut(&payload.node_id) {
            peer.mark_seen(from.ip().to_string(), from.port());
        }
    }
    let pong = NexMessage::Pong(PingPongPayload {
        node_id: state.identity.node_id().to_string(),
        timestamp: payload.timestamp,
    });
    send_to(message_socket, from, &pong).await;
}

async fn handle_pong(payload: PingPongPayload, state: &Arc<NodeState>) {
    let latency_ms = (unix_timestamp() - payload.timestamp).max(0.0) * 1000.0;
    let mut peers = state.peers.lock().await;
    if let Some(peer) = peers.get_mut(&payload.node_id) {
        peer.set_latency(latency_ms);
    }
}

async fn handle_data(
    mut payload: DataPayload,
    from: SocketAddr,
    state: &Arc<NodeState>,
    config: &Config,
    message_socket: &UdpSocket,
) {
    let is_local_destination = payload.destination == state.identity.node_id();
    if payload.encrypted && is_local_destination {
        let session_key = {
            let peers = state.peers.lock().await;
            peers
                .get(&payload.source)
                .and_then(|p| p.session.as_ref())
                .map(SessionContext::key)
                .copied()
        };
        let key = session_key.unwrap_or_else(|| derive_key(config.shared_key.as_bytes()));
        match nexlattice_crypto::decrypt_and_verify(&payload.payload, &key, config.shared_key.as_bytes())
        {
            Ok(plaintext) => {
                payload.payload = String::from_utf8_lossy(&plaintext).into_owned();
                payload.encrypted = false;
            }
            Err(err @ (CryptoError::VerificationFailed | CryptoError::MissingSignature)) => {
                state.stats.record_verify_error();
                tracing::warn!(%err, source = %payload.source, "dropping DATA with bad signature");
                return;
            }
            Err(err) => {
                state.stats.record_decode_error();
                tracing::debug!(%err, source = %payload.source, "dropping undecryptable DATA");
                return;
            }
        }
    }
    // An encrypted datagram not addressed to this node is relayed untouched:
    // decrypting it here would both break end-to-end confidentiality and,
    // for per-peer session keys this relay doesn't hold, fail outright.

    let received_from = payload.node_id.clone();
    route_and_send(payload, &received_from, state, message_socket, Some(from)).await;
}

/// Route `payload` and carry out whatever the routing decision calls for:
/// deliver-locally bookkeeping, a single forward, or a flood to every
/// connected peer. Shared by inbound forwarding ([`handle_data`]) and
/// locally-originated sends (`Node::send`).
///
/// `inbound_from`, when set, is the UDP address the datagram physically
/// arrived from, used only to refresh the sending peer's liveness entry.
pub async fn route_and_send(
    payload: DataPayload,
    received_from: &str,
    state: &Arc<NodeState>,
    message_socket: &UdpSocket,
    inbound_from: Option<SocketAddr>,
) {
    let message_source = payload.source.clone();
    let outcome = {
        let mut peers = state.peers.lock().await;
        let directory = PeerTableView::new(&peers);
        let mut router = state.router.lock().await;
        let outcome = router.route(payload, received_from, &directory);
        let learned_metric = router.route_metric(&message_source);
        drop(router);
        if let Some(from) = inbound_from {
            if let Some(peer) = peers.get_mut(received_from) {
                peer.mark_seen(from.ip().to_string(), from.port());
            }
        }
        if let Some(metric) = learned_metric {
            if let Some(peer) = peers.get_mut(&message_source) {
                peer.set_hop_distance(metric);
            }
        }
        outcome
    };

    match outcome {
        RouteOutcome::DeliverLocally(message) => {
            state.stats.record_received();
            tracing::info!(
                source = %message.source,
                bytes = message.payload.len(),
                "delivered DATA message locally"
            );
        }
        RouteOutcome::Forward { message, to } => {
            state.stats.record_forwarded();
            if let Ok(ip) = to.ip.parse() {
                let addr = SocketAddr::new(ip, to.port);
                send_to(message_socket, addr, &NexMessage::Data(message)).await;
            }
        }
        RouteOutcome::Flood { message, to } => {
            state.stats.record_forwarded();
            for endpoint in to {
                if let Ok(ip) = endpoint.ip.parse() {
                    let addr = SocketAddr::new(ip, endpoint.port);
                    send_to(message_socket, addr, &NexMessage::Data(message.clone())).await;
                }
            }
        }
        RouteOutcome::Dropped(reason) => {
            tracing::debug!(?reason, "dropped DATA message");
        }
    }
}

/// Serialize `message` and send it to `addr`, logging (not propagating) any
/// send failure: a single failed reply is never worth tearing the node down
/// for.
pub async fn send_to(socket: &UdpSocket, addr: SocketAddr, message: &NexMessage) {
    match message.to_bytes() {
        Ok(bytes) => {
            if let Err(err) = nexlattice_transport::send_unicast(socket, addr, &bytes).await {
                tracing::warn!(%err, %addr, "failed to send message");
            }
        }
        Err(err) => {
            tracing::warn!(%err, "failed to serialize outgoing message");
        }
    }
}
