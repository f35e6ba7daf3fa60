//! Consistent hash ring implementation.
//!
//! The ring keeps its virtual nodes in an immutable, sorted snapshot and
//! provides lookups, neighbour queries and ordered traversal over it.

pub mod guarded;
pub mod iter;
#[allow(clippy::module_inception)]
pub mod ring;
pub mod state;

pub use guarded::GuardedRing;
pub use iter::VirtualNodes;
pub use ring::{HashRing, RingBuilder, DEFAULT_REPLICATION_FACTOR, DEFAULT_VIRTUAL_NODE_COUNT};
pub use state::{Direction, RingState, RingView, VirtualNodeView, TOO_LARGE};

/// Alias for the main ring type.
pub type Ring = HashRing;
