//! Node key material.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A node's long-lived key material: a private key used only for signing
/// its own messages, and a public fingerprint derived from it that is safe
/// to publish in `DISCOVERY` packets.
#[derive(Clone, ZeroizeOnDrop)]
pub struct NodeIdentity {
    #[zeroize(skip)]
    node_id: String,
    private_key: Vec<u8>,
    #[zeroize(skip)]
    public_key: String,
}

impl NodeIdentity {
    /// Generate a fresh identity with random key material.
    #[must_use]
    pub fn generate(node_id: impl Into<String>) -> Self {
        let mut key = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::from_private_key(node_id, key)
    }

    /// Build an identity from explicit, previously-provisioned key material
    /// (e.g. loaded from config), deriving the public fingerprint from it.
    #[must_use]
    pub fn from_private_key(node_id: impl Into<String>, private_key: Vec<u8>) -> Self {
        let public_key = hex::encode(Sha256::digest(&private_key));
        Self {
            node_id: node_id.into(),
            private_key,
            public_key,
        }
    }

    /// This node's identifier.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// This node's private key material, used to sign outgoing messages.
    #[must_use]
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// This node's public fingerprint, safe to advertise in `DISCOVERY`.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("node_id", &self.node_id)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Drop for NodeIdentity {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_is_stable_for_same_private_key() {
        let a = NodeIdentity::from_private_key("node-a", vec![1, 2, 3]);
        let b = NodeIdentity::from_private_key("node-a", vec![1, 2, 3]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn debug_output_never_includes_private_key_bytes() {
        let id = NodeIdentity::from_private_key("node-a", vec![0xAB; 4]);
        let rendered = format!("{id:?}");
        assert!(!rendered.contains("171")); // 0xAB as decimal, would appear if leaked
        assert!(rendered.contains("redacted"));
    }
}
