//! # NexLattice Wire Protocol
//!
//! Message types exchanged between NexLattice mesh nodes over UDP.
//!
//! This crate provides:
//! - The tagged union of datagram kinds (`DISCOVERY`, `DATA`, `PING`, ...)
//! - Two-stage parsing that separates "not JSON" from "JSON but unknown
//!   `type`", so the orchestrator can apply the two different recovery
//!   policies the error model calls for
//! - The `STATS` report body posted to the observability dashboard

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised while parsing a raw datagram into a [`NexMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// The datagram was not valid UTF-8 JSON, or was JSON but missing/had a
    /// non-string `type` field.
    Decode(String),
    /// The datagram had a recognized `type` value but its fields did not
    /// match the shape that type requires.
    MalformedFields(String),
    /// The datagram's `type` value is not one this node recognizes.
    UnknownType(String),
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::MalformedFields(msg) => write!(f, "malformed fields: {msg}"),
            Self::UnknownType(kind) => write!(f, "unknown message type: {kind}"),
        }
    }
}

impl std::error::Error for ProtoError {}

/// `DISCOVERY` / `DISCOVERY_RESPONSE` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryPayload {
    /// Sending node's `node_id`.
    pub node_id: String,
    /// Sending node's human-readable name.
    pub node_name: String,
    /// Sending node's public fingerprint, hex-encoded.
    pub public_key: String,
    /// Unix timestamp (seconds) the packet was sent.
    pub timestamp: f64,
}

/// `KEY_EXCHANGE` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyExchangePayload {
    /// Sending node's `node_id`.
    pub node_id: String,
    /// Opaque session key material, treated as opaque bytes by the receiver.
    pub session_key: String,
    /// Unix timestamp (seconds) the packet was sent.
    pub timestamp: f64,
}

/// `DATA` payload.
///
/// `node_id` identifies whoever last transmitted this datagram (changes at
/// every hop); `source` identifies the node that originated it (constant
/// across the whole journey). Both are required on the wire so a receiving
/// node can update per-hop peer state without losing the original sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPayload {
    /// Immediate sender of this hop.
    pub node_id: String,
    /// Node that originated the message.
    pub source: String,
    /// Final destination `node_id`.
    pub destination: String,
    /// Application payload — plaintext or hex ciphertext depending on `encrypted`.
    pub payload: String,
    /// Whether `payload` is `encrypt()`-produced ciphertext.
    pub encrypted: bool,
    /// Number of forwarding hops traversed so far.
    pub hop_count: u32,
    /// Loop-suppression identifier, assigned on first forward if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    /// Best-effort record of peer ids this message has passed through.
    #[serde(default)]
    pub path: Vec<String>,
    /// Set once the message falls back to flood delivery.
    #[serde(default)]
    pub flooded: bool,
    /// Unix timestamp (seconds) the packet was sent (origin time when
    /// `hop_count == 0`, used verbatim in `msg_id` derivation).
    pub timestamp: f64,
}

impl DataPayload {
    /// `msg_id`, computed from `source` and `timestamp` if not already set.
    #[must_use]
    pub fn message_id(&self) -> String {
        self.msg_id
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.source, self.timestamp))
    }
}

/// `PING` / `PONG` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingPongPayload {
    /// Sending node's `node_id`.
    pub node_id: String,
    /// For `PING`: send time. For `PONG`: the timestamp being echoed back.
    pub timestamp: f64,
}

/// Snapshot of one peer, as reported in a `STATS` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSummary {
    /// Peer's `node_id`.
    pub id: String,
    /// Peer's human-readable name.
    pub name: String,
    /// Peer's last-known IP address.
    pub ip: String,
    /// Unix timestamp (seconds) of the last datagram received from this peer.
    pub last_seen: f64,
    /// Last measured round-trip latency, milliseconds.
    pub latency: Option<f64>,
    /// Whether the peer is currently considered live.
    pub connected: bool,
}

/// Monotonic counters reported in a `STATS` message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCounters {
    /// Messages originated by this node.
    pub messages_sent: u64,
    /// Messages delivered to this node as final destination.
    pub messages_received: u64,
    /// Messages forwarded on behalf of another node.
    pub messages_forwarded: u64,
    /// Datagrams dropped for failing to parse as JSON.
    pub decode_errors: u64,
    /// Datagrams dropped for failing signature verification.
    pub verify_errors: u64,
    /// Datagrams dropped for an unrecognized `type`.
    pub unknown_type_count: u64,
    /// Seconds since the node process started.
    pub uptime_seconds: u64,
}

/// `STATS` payload, POSTed to the observability dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    /// Reporting node's `node_id`.
    pub node_id: String,
    /// Reporting node's human-readable name.
    pub node_name: String,
    /// Snapshot of all known peers.
    pub peers: Vec<PeerSummary>,
    /// Counter snapshot.
    pub stats: StatsCounters,
    /// Unix timestamp (seconds) the report was generated.
    pub timestamp: f64,
}

/// The tagged union of every datagram kind a NexLattice node understands.
#[derive(Debug, Clone, PartialEq)]
pub enum NexMessage {
    /// Neighbor announcing itself on the broadcast domain.
    Discovery(DiscoveryPayload),
    /// Reply to a `DISCOVERY` packet.
    DiscoveryResponse(DiscoveryPayload),
    /// Session-key material for establishing a `SessionContext`.
    KeyExchange(KeyExchangePayload),
    /// Application data, originated or forwarded.
    Data(DataPayload),
    /// Liveness probe.
    Ping(PingPongPayload),
    /// Reply to a `PING`.
    Pong(PingPongPayload),
    /// Periodic status report (dashboard-bound only; never routed).
    Stats(StatsPayload),
}

impl NexMessage {
    /// The `type` tag this message serializes under.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Discovery(_) => "DISCOVERY",
            Self::DiscoveryResponse(_) => "DISCOVERY_RESPONSE",
            Self::KeyExchange(_) => "KEY_EXCHANGE",
            Self::Data(_) => "DATA",
            Self::Ping(_) => "PING",
            Self::Pong(_) => "PONG",
            Self::Stats(_) => "STATS",
        }
    }

    /// Serialize to the UTF-8 JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error only if a payload somehow fails to serialize, which
    /// does not happen for the types defined in this crate.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut value = match self {
            Self::Discovery(p) | Self::DiscoveryResponse(p) => serde_json::to_value(p),
            Self::KeyExchange(p) => serde_json::to_value(p),
            Self::Data(p) => serde_json::to_value(p),
            Self::Ping(p) | Self::Pong(p) => serde_json::to_value(p),
            Self::Stats(p) => serde_json::to_value(p),
        }?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("type".to_string(), serde_json::Value::String(self.kind().to_string()));
        }
        serde_json::to_vec(&value)
    }

    /// Parse a raw datagram, distinguishing "not JSON" from "unrecognized
    /// `type`" so callers can apply `DecodeError` vs the unknown-type
    /// counter policy independently.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decode`] if the bytes are not a JSON object
    /// with a string `type` field, [`ProtoError::UnknownType`] if `type` is
    /// not one of the recognized kinds, or [`ProtoError::MalformedFields`]
    /// if the recognized type's required fields are missing or ill-typed.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtoError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ProtoError::Decode(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ProtoError::Decode("missing 'type' field".to_string()))?
            .to_string();

        let malformed = |e: serde_json::Error| ProtoError::MalformedFields(e.to_string());
        match kind.as_str() {
            "DISCOVERY" => Ok(Self::Discovery(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "DISCOVERY_RESPONSE" => Ok(Self::DiscoveryResponse(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "KEY_EXCHANGE" => Ok(Self::KeyExchange(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "DATA" => Ok(Self::Data(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "PING" => Ok(Self::Ping(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "PONG" => Ok(Self::Pong(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            "STATS" => Ok(Self::Stats(
                serde_json::from_value(value).map_err(malformed)?,
            )),
            other => Err(ProtoError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_discovery() -> NexMessage {
        NexMessage::Discovery(DiscoveryPayload {
            node_id: "node-a".to_string(),
            node_name: "Node A".to_string(),
            public_key: "deadbeef".to_string(),
            timestamp: 100.0,
        })
    }

    #[test]
    fn round_trips_through_wire_form() {
        let msg = sample_discovery();
        let bytes = msg.to_bytes().unwrap();
        let parsed = NexMessage::parse(&bytes).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn rejects_non_json_as_decode_error() {
        let err = NexMessage::parse(b"not json at all").unwrap_err();
        assert!(matches!(err, ProtoError::Decode(_)));
    }

    #[test]
    fn rejects_missing_type_as_decode_error() {
        let err = NexMessage::parse(br#"{"node_id": "x"}"#).unwrap_err();
        assert!(matches!(err, ProtoError::Decode(_)));
    }

    #[test]
    fn rejects_unknown_type_distinctly() {
        let err = NexMessage::parse(br#"{"type": "BOGUS"}"#).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownType(k) if k == "BOGUS"));
    }

    #[test]
    fn rejects_malformed_fields_distinctly() {
        // DATA with a string hop_count instead of an integer.
        let bad = br#"{"type": "DATA", "node_id": "a", "source": "a",
                        "destination": "b", "payload": "", "encrypted": false,
                        "hop_count": "oops", "timestamp": 1.0}"#;
        let err = NexMessage::parse(bad).unwrap_err();
        assert!(matches!(err, ProtoError::MalformedFields(_)));
    }

    #[test]
    fn message_id_derives_from_source_and_timestamp_when_absent() {
        let data = DataPayload {
            node_id: "b".to_string(),
            source: "a".to_string(),
            destination: "c".to_string(),
            payload: "hi".to_string(),
            encrypted: false,
            hop_count: 0,
            msg_id: None,
            path: vec![],
            flooded: false,
            timestamp: 42.0,
        };
        assert_eq!(data.message_id(), "a_42");
    }

    #[test]
    fn message_id_honors_explicit_value() {
        let mut data = DataPayload {
            node_id: "b".to_string(),
            source: "a".to_string(),
            destination: "c".to_string(),
            payload: "hi".to_string(),
            encrypted: false,
            hop_count: 0,
            msg_id: None,
            path: vec![],
            flooded: false,
            timestamp: 42.0,
        };
        data.msg_id = Some("explicit".to_string());
        assert_eq!(data.message_id(), "explicit");
    }
}
