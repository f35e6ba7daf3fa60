//! Multi-writer wrapper.

use super::ring::HashRing;
use crate::error::Result;
use crate::node::Node;
use crate::vnode::VirtualNode;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;

/// A [`HashRing`] whose updates are serialized by a writer-side lock.
///
/// Only writers take the lock. Every read goes straight to the wrapped ring
/// through `Deref` and stays lock-free.
#[derive(Debug)]
pub struct GuardedRing {
    ring: HashRing,
    write_gate: Mutex<()>,
}

impl GuardedRing {
    pub fn new(ring: HashRing) -> Self {
        Self {
            ring,
            write_gate: Mutex::new(()),
        }
    }

    /// See [`HashRing::insert`].
    pub fn insert<I>(&self, nodes: I) -> Result<Vec<Arc<VirtualNode>>>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let _writer = self.write_gate.lock();
        self.ring.insert(nodes)
    }

    /// See [`HashRing::remove`].
    pub fn remove<I>(&self, nodes: I) -> Result<Vec<Arc<VirtualNode>>>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let _writer = self.write_gate.lock();
        self.ring.remove(nodes)
    }

    /// Deep copy of the ring, taken between updates.
    pub fn clone_ring(&self) -> HashRing {
        let _writer = self.write_gate.lock();
        self.ring.clone()
    }

    pub fn into_inner(self) -> HashRing {
        self.ring
    }
}

impl Deref for GuardedRing {
    type Target = HashRing;

    fn deref(&self) -> &Self::Target {
        &self.ring
    }
}

impl From<HashRing> for GuardedRing {
    fn from(ring: HashRing) -> Self {
        Self::new(ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Xxh3Hasher;
    use std::thread;

    #[test]
    fn concurrent_writers_lose_no_updates() {
        let ring = GuardedRing::new(HashRing::new(Arc::new(Xxh3Hasher), 2, 16).unwrap());
        thread::scope(|s| {
            for t in 0..4 {
                let ring = &ring;
                s.spawn(move || {
                    for i in 0..10 {
                        ring.insert([format!("node-{}-{}", t, i)]).unwrap();
                    }
                });
            }
        });
        assert_eq!(ring.size(), 40);
        assert_eq!(ring.len_virtual_nodes(), 640);

        let copy = ring.clone_ring();
        ring.remove(["node-0-0"]).unwrap();
        assert_eq!(copy.size(), 40);
        assert_eq!(ring.size(), 39);
    }
}
