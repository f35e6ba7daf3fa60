//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Each distinct [`Node`] is placed on the ring `virtual_node_count` times.
//! The position ("name") of virtual node `i` of node `n` is
//! `hash(n || i)`, where `i` is encoded as two big-endian bytes. Positions
//! are therefore reproducible: removing a node regenerates exactly the names
//! that inserting it produced.
//!
//! More virtual nodes per node means a smoother key distribution, at the cost
//! of memory and of a longer replica-owner recomputation on every update.

use crate::hasher::RingHasher;
use crate::node::Node;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - Within one ring state, every `VirtualNode` has a unique name
/// - Every `VirtualNode` belongs to exactly one distinct node
/// - Never mutated after creation; snapshots share them behind `Arc`
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VirtualNode {
    /// Position on the ring.
    #[serde(serialize_with = "serialize_hex")]
    name: Arc<[u8]>,

    /// The distinct node that owns this virtual node.
    node: Node,

    /// Index of this virtual node among the ones of its owner.
    sequence: u16,
}

impl VirtualNode {
    /// Places virtual node `sequence` of `node` on the ring.
    pub fn generate(hasher: &dyn RingHasher, node: &Node, sequence: u16) -> Self {
        let name = hasher.hash(&Self::placement_key(node, sequence));
        Self {
            name: Arc::from(name),
            node: node.clone(),
            sequence,
        }
    }

    /// The bytes hashed to obtain the position of virtual node `sequence` of
    /// `node`.
    pub fn placement_key(node: &Node, sequence: u16) -> Vec<u8> {
        let id = node.as_bytes();
        let mut key = Vec::with_capacity(id.len() + 2);
        key.extend_from_slice(id);
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }

    /// Position of the virtual node on the ring.
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The distinct node this virtual node belongs to.
    #[inline]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[inline]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub(crate) fn shared_name(&self) -> Arc<[u8]> {
        Arc::clone(&self.name)
    }
}

pub(crate) struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

fn serialize_hex<S: Serializer>(name: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&Hex(name))
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {})", Hex(&self.name), self.node, self.sequence)
    }
}

impl fmt::Debug for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualNode")
            .field("name", &format_args!("{}", Hex(&self.name)))
            .field("node", &self.node)
            .field("sequence", &self.sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::{FnHasher, Xxh3Hasher};

    #[test]
    fn test_vnode_generate() {
        let node = Node::new("node1");
        let vnode0 = VirtualNode::generate(&Xxh3Hasher, &node, 0);
        let vnode1 = VirtualNode::generate(&Xxh3Hasher, &node, 1);

        // Should have different names
        assert_ne!(vnode0.name(), vnode1.name());

        // But same owner
        assert_eq!(vnode0.node(), vnode1.node());
        assert_eq!(vnode1.sequence(), 1);
    }

    #[test]
    fn test_vnode_is_reproducible() {
        let node = Node::new("node1");
        let a = VirtualNode::generate(&Xxh3Hasher, &node, 7);
        let b = VirtualNode::generate(&Xxh3Hasher, &node, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_placement_key_layout() {
        let identity = FnHasher::new(|bytes: &[u8]| bytes.to_vec());
        let vnode = VirtualNode::generate(&identity, &Node::new("ab"), 0x0102);
        assert_eq!(vnode.name(), &[b'a', b'b', 0x01, 0x02]);
    }

    #[test]
    fn test_vnode_display() {
        let identity = FnHasher::new(|bytes: &[u8]| bytes.to_vec());
        let vnode = VirtualNode::generate(&identity, &Node::new("A"), 3);
        assert_eq!(vnode.to_string(), "410003 (\"A\", 3)");
    }
}
