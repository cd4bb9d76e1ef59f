use thiserror::Error;

/// Top-level errors for the node orchestrator.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Config loading or validation failed; the node never starts.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// No usable Wi-Fi-equivalent network interface was found within the
    /// startup timeout; the node never starts.
    #[error("no network interface became ready")]
    WifiUnavailable,

    /// A transport-layer operation failed.
    #[error(transparent)]
    Transport(#[from] nexlattice_transport::TransportError),

    /// A peer-table operation failed.
    #[error(transparent)]
    Peer(#[from] nexlattice_peer::PeerError),

    /// A crypto operation failed.
    #[error(transparent)]
    Crypto(#[from] nexlattice_crypto::CryptoError),
}
