//! Lock-free consistent hashing ring.
//!
//! This crate provides:
//! - Virtual node placement derived from a caller-chosen hash function
//! - Replica owners precomputed for every ring position
//! - Lock-free snapshot publication for concurrent readers
//! - Ordered traversal, as a cursor or a push-style channel
//!
//! ```
//! use lfring::HashRing;
//!
//! let ring = HashRing::builder()
//!     .with_default_hasher()
//!     .replication_factor(2)
//!     .virtual_node_count(16)
//!     .nodes(["cache-a", "cache-b", "cache-c"])
//!     .build()
//!     .unwrap();
//!
//! let owners = ring.nodes_for_key(b"user:42").unwrap();
//! assert_eq!(owners.len(), 2);
//! ```

pub mod error;
pub mod hasher;
pub mod node;
pub mod ring;
pub mod vnode;

pub use error::{Result, RingError};
pub use hasher::{HasherKind, RingHasher};
pub use node::Node;
pub use ring::{Direction, GuardedRing, HashRing, Ring, RingBuilder, RingState, VirtualNodes};
pub use vnode::VirtualNode;
