use thiserror::Error;

/// Errors raised by [`crate::PeerTable`] operations.
#[derive(Debug, Error)]
pub enum PeerError {
    /// A node tried to register itself as its own peer.
    #[error("refusing to add self (node_id {0:?}) as a peer")]
    SelfReference(String),

    /// The referenced peer is not in the table.
    #[error("unknown peer {0:?}")]
    UnknownPeer(String),
}
