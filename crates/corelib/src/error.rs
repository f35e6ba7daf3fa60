//! Error types for the ring.

use crate::node::Node;

/// Result type alias for ring operations.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors returned by ring construction, mutation and queries.
///
/// Failed mutations leave the published ring untouched.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// Construction parameters out of range, or no hash function given.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Node already owns virtual nodes (or was listed twice in one insert).
    #[error("node {0} is already in the ring")]
    DuplicateNode(Node),

    /// Node owns no virtual nodes (or was listed twice in one remove).
    #[error("node {0} is not in the ring")]
    NodeNotFound(Node),

    /// Two virtual nodes hashed to the same ring position.
    #[error("virtual node {node}#{sequence} collides with {other}#{other_sequence}")]
    NameCollision {
        node: Node,
        sequence: u16,
        other: Node,
        other_sequence: u16,
    },

    /// The ring has no virtual nodes.
    #[error("the ring is empty")]
    EmptyRing,

    /// The ring has a single distinct node, so no other owner exists.
    #[error("the ring consists of a single distinct node")]
    SingleOwner,

    /// Reading an object to be hashed failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The producer thread of a push iteration could not be started.
    #[error("failed to spawn iteration producer: {0}")]
    Spawn(#[source] std::io::Error),
}

impl RingError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RingError::InvalidConfiguration(msg.into())
    }
}
