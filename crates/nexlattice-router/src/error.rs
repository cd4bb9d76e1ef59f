use thiserror::Error;

/// Errors raised while building or consulting routing state.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A route update referenced this node as its own next hop.
    #[error("refusing self-referential route to {0:?}")]
    SelfRoute(String),
}
