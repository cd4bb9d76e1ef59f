//! Per-peer session key state established via `KEY_EXCHANGE`.

use crate::cipher::{self, CipherMode};

/// Symmetric key material shared with one specific peer, derived from the
/// session key carried in a `KEY_EXCHANGE` packet.
#[derive(Clone)]
pub struct SessionContext {
    peer_id: String,
    key: [u8; 16],
    mode: CipherMode,
}

impl SessionContext {
    /// Derive a session from raw key-exchange material received from (or
    /// sent to) `peer_id`.
    #[must_use]
    pub fn establish(peer_id: impl Into<String>, raw_session_key: &[u8]) -> Self {
        let key = cipher::derive_key(raw_session_key);
        let mode = cipher::select_mode(&key);
        Self {
            peer_id: peer_id.into(),
            key,
            mode,
        }
    }

    /// The peer this session is established with.
    #[must_use]
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// The derived symmetric key for this session.
    #[must_use]
    pub fn key(&self) -> &[u8; 16] {
        &self.key
    }

    /// Which cipher this session uses.
    #[must_use]
    pub fn mode(&self) -> CipherMode {
        self.mode
    }
}
