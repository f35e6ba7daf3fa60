//! Lock-free hash ring facade.
//!
//! The ring publishes an immutable [`RingState`] through an [`ArcSwap`].
//! Readers load the current snapshot with a single atomic operation and never
//! block. Updates follow read-copy-update: load the current snapshot, derive
//! a private copy, modify it, then store the copy as the new snapshot.
//! Snapshots already handed out stay valid until their last reader drops
//! them.
//!
//! # Single writer
//!
//! Nothing here serializes writers. Two threads calling [`HashRing::insert`]
//! or [`HashRing::remove`] concurrently may each derive from the same
//! snapshot, and the later store silently discards the earlier update. Use a
//! single writer thread, or wrap the ring in a
//! [`GuardedRing`](super::GuardedRing).

use super::iter::{feed, VirtualNodes};
use super::state::{Direction, RingState};
use crate::error::{Result, RingError};
use crate::hasher::{FnHasher, HasherKind, RingHasher};
use crate::node::Node;
use crate::vnode::VirtualNode;
use arc_swap::ArcSwap;
use crossbeam::channel::Receiver;
use std::fmt;
use std::io::Read;
use std::iter::Rev;
use std::sync::Arc;
use tracing::debug;

/// Default number of virtual nodes per distinct node.
pub const DEFAULT_VIRTUAL_NODE_COUNT: usize = 256;

/// Default replication factor.
pub const DEFAULT_REPLICATION_FACTOR: usize = 3;

/// Lock-free consistent hashing ring, for frequent reads by many readers and
/// infrequent updates by a single writer.
pub struct HashRing {
    state: ArcSwap<RingState>,
    hasher: Arc<dyn RingHasher>,
}

impl HashRing {
    /// Creates an empty ring.
    ///
    /// Fails if the replication factor is not in `[1, 255]` or the virtual
    /// node count is not in `[1, 65535]`.
    pub fn new(
        hasher: Arc<dyn RingHasher>,
        replication_factor: usize,
        virtual_node_count: usize,
    ) -> Result<Self> {
        Self::with_nodes(hasher, replication_factor, virtual_node_count, &[])
    }

    /// Creates a ring already holding `nodes`.
    pub fn with_nodes(
        hasher: Arc<dyn RingHasher>,
        replication_factor: usize,
        virtual_node_count: usize,
        nodes: &[Node],
    ) -> Result<Self> {
        let mut state =
            RingState::new(Arc::clone(&hasher), replication_factor, virtual_node_count)?;
        if !nodes.is_empty() {
            state.insert(nodes)?;
        }
        debug!(
            hasher = hasher.name(),
            replication_factor,
            virtual_node_count,
            nodes = nodes.len(),
            "created hash ring"
        );
        Ok(Self {
            state: ArcSwap::from_pointee(state),
            hasher,
        })
    }

    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    /// The current snapshot. It stays valid, and unchanged, however the ring
    /// is updated afterwards.
    pub fn snapshot(&self) -> Arc<RingState> {
        self.state.load_full()
    }

    pub fn hasher(&self) -> &Arc<dyn RingHasher> {
        &self.hasher
    }

    /// Number of distinct nodes.
    pub fn size(&self) -> usize {
        self.state.load().size()
    }

    pub fn len_virtual_nodes(&self) -> usize {
        self.state.load().len_virtual_nodes()
    }

    pub fn is_empty(&self) -> bool {
        self.state.load().is_empty()
    }

    pub fn replication_factor(&self) -> u8 {
        self.state.load().replication_factor()
    }

    pub fn virtual_node_count(&self) -> u16 {
        self.state.load().virtual_node_count()
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.state.load().contains_node(node)
    }

    /// Inserts distinct nodes (all of their virtual nodes) into the ring.
    ///
    /// If any node is already present, the ring is left untouched and an
    /// error is returned. Otherwise the new virtual nodes are returned, not
    /// sorted. An empty batch publishes nothing.
    pub fn insert<I>(&self, nodes: I) -> Result<Vec<Arc<VirtualNode>>>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let nodes: Vec<Node> = nodes.into_iter().map(Into::into).collect();
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let mut next = self.state.load().derive();
        let created = next.insert(&nodes)?;
        let total = next.len_virtual_nodes();
        self.state.store(Arc::new(next));
        debug!(?nodes, created = created.len(), total, "published snapshot after insert");
        Ok(created)
    }

    /// Removes distinct nodes (all of their virtual nodes) from the ring.
    ///
    /// If any node is missing, the ring is left untouched and an error is
    /// returned. Otherwise the removed virtual nodes are returned, not
    /// sorted. An empty batch publishes nothing.
    pub fn remove<I>(&self, nodes: I) -> Result<Vec<Arc<VirtualNode>>>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let nodes: Vec<Node> = nodes.into_iter().map(Into::into).collect();
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let mut next = self.state.load().derive();
        let removed = next.remove(&nodes)?;
        let total = next.len_virtual_nodes();
        self.state.store(Arc::new(next));
        debug!(?nodes, removed = removed.len(), total, "published snapshot after remove");
        Ok(removed)
    }

    /// The distinct nodes (up to the replication factor, primary first)
    /// responsible for `key`.
    ///
    /// Complexity: O( log(V*N) )
    pub fn nodes_for_key(&self, key: impl AsRef<[u8]>) -> Result<Vec<Node>> {
        Ok(self.state.load().nodes_for_key(key.as_ref())?.to_vec())
    }

    /// Reads `reader` to the end and returns the nodes responsible for its
    /// contents. Read failures are returned unchanged as [`RingError::Io`].
    pub fn nodes_for_object<R: Read>(&self, mut reader: R) -> Result<Vec<Node>> {
        let mut object = Vec::new();
        reader.read_to_end(&mut object)?;
        self.nodes_for_key(&object)
    }

    /// The virtual node `key` is assigned to.
    ///
    /// Complexity: O( log(V*N) )
    pub fn virtual_node_for_key(&self, key: impl AsRef<[u8]>) -> Result<Arc<VirtualNode>> {
        self.state
            .load()
            .virtual_node_for_key(key.as_ref())
            .map(Arc::clone)
    }

    /// Predecessor of the virtual node `key` is assigned to.
    pub fn predecessor(&self, key: impl AsRef<[u8]>) -> Result<Arc<VirtualNode>> {
        self.state.load().predecessor(key.as_ref()).map(Arc::clone)
    }

    /// Successor of the virtual node `key` is assigned to.
    pub fn successor(&self, key: impl AsRef<[u8]>) -> Result<Arc<VirtualNode>> {
        self.state.load().successor(key.as_ref()).map(Arc::clone)
    }

    /// First predecessor of the virtual node `key` is assigned to that
    /// belongs to a different distinct node.
    ///
    /// Complexity: worst case O(V*N), O( log(V*N) ) on average.
    pub fn predecessor_node(&self, key: impl AsRef<[u8]>) -> Result<Arc<VirtualNode>> {
        self.state.load().predecessor_node(key.as_ref()).map(Arc::clone)
    }

    /// First successor of the virtual node `key` is assigned to that belongs
    /// to a different distinct node.
    ///
    /// Complexity: worst case O(V*N), O( log(V*N) ) on average.
    pub fn successor_node(&self, key: impl AsRef<[u8]>) -> Result<Arc<VirtualNode>> {
        self.state.load().successor_node(key.as_ref()).map(Arc::clone)
    }

    /// Whether `key` hashes exactly onto a virtual node.
    pub fn has_virtual_node(&self, key: impl AsRef<[u8]>) -> bool {
        self.state.load().has_virtual_node(key.as_ref())
    }

    /// Cursor over the current snapshot in ascending ring order.
    pub fn iter(&self) -> VirtualNodes {
        VirtualNodes::new(self.snapshot())
    }

    /// Cursor over the current snapshot in descending ring order.
    pub fn iter_rev(&self) -> Rev<VirtualNodes> {
        self.iter().rev()
    }

    /// Streams the virtual nodes of the current snapshot, ascending, from a
    /// background thread.
    ///
    /// The producer stops when the receiver is drained or dropped, or when
    /// `stop` fires. Prefer [`iter`](Self::iter) unless the consumer lives on
    /// another thread.
    pub fn virtual_nodes(&self, stop: Receiver<()>) -> Result<Receiver<Arc<VirtualNode>>> {
        feed(self.snapshot(), Direction::Forward, stop)
    }

    /// Like [`virtual_nodes`](Self::virtual_nodes), in descending order.
    pub fn virtual_nodes_reversed(
        &self,
        stop: Receiver<()>,
    ) -> Result<Receiver<Arc<VirtualNode>>> {
        feed(self.snapshot(), Direction::Backward, stop)
    }
}

impl Clone for HashRing {
    /// Deep copy: the clone publishes its own snapshot and evolves
    /// independently of `self`.
    fn clone(&self) -> Self {
        let mut state = self.state.load().derive();
        state.fix_replica_owners();
        Self {
            state: ArcSwap::from_pointee(state),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl fmt::Display for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self.state.load(), f)
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("state", &**self.state.load())
            .finish()
    }
}

/// Builder for [`HashRing`].
///
/// A hasher must be chosen explicitly, either with [`hasher`](Self::hasher),
/// [`hash_fn`](Self::hash_fn) or [`with_default_hasher`](Self::with_default_hasher).
pub struct RingBuilder {
    hasher: Option<Arc<dyn RingHasher>>,
    replication_factor: usize,
    virtual_node_count: usize,
    nodes: Vec<Node>,
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            hasher: None,
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            virtual_node_count: DEFAULT_VIRTUAL_NODE_COUNT,
            nodes: Vec::new(),
        }
    }

    pub fn hasher(mut self, hasher: Arc<dyn RingHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Uses a plain closure as the hash function.
    pub fn hash_fn<F>(self, f: F) -> Self
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        self.hasher(Arc::new(FnHasher::new(f)))
    }

    /// Uses one of the built-in hashers.
    pub fn hasher_kind(self, kind: HasherKind) -> Self {
        self.hasher(kind.into_hasher())
    }

    /// Uses the default built-in hasher (XXH3-128).
    pub fn with_default_hasher(self) -> Self {
        self.hasher_kind(HasherKind::default())
    }

    pub fn replication_factor(mut self, replication_factor: usize) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    /// Number of virtual nodes per distinct node.
    pub fn virtual_node_count(mut self, virtual_node_count: usize) -> Self {
        self.virtual_node_count = virtual_node_count;
        self
    }

    pub fn node(mut self, node: impl Into<Node>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn nodes<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.nodes.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<HashRing> {
        let hasher = self
            .hasher
            .ok_or_else(|| RingError::invalid("hash function cannot be empty"))?;
        HashRing::with_nodes(
            hasher,
            self.replication_factor,
            self.virtual_node_count,
            &self.nodes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Xxh3Hasher;

    #[test]
    fn test_builder_requires_hasher() {
        let err = RingBuilder::new().build().unwrap_err();
        assert!(matches!(err, RingError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let ring = HashRing::builder()
            .with_default_hasher()
            .nodes(["a", "b"])
            .build()
            .unwrap();
        assert_eq!(ring.replication_factor(), 3);
        assert_eq!(ring.virtual_node_count(), 256);
        assert_eq!(ring.len_virtual_nodes(), 512);
        assert_eq!(ring.hasher().name(), "Xxh3Hasher");
    }

    #[test]
    fn test_builder_rejects_duplicate_initial_nodes() {
        let err = HashRing::builder()
            .with_default_hasher()
            .node("a")
            .node("a")
            .build()
            .unwrap_err();
        assert!(matches!(err, RingError::DuplicateNode(_)));
    }

    #[test]
    fn test_snapshot_is_stable() {
        let ring = HashRing::new(Arc::new(Xxh3Hasher), 2, 8).unwrap();
        ring.insert(["a"]).unwrap();
        let before = ring.snapshot();
        ring.insert(["b"]).unwrap();
        assert_eq!(before.size(), 1);
        assert_eq!(before.len_virtual_nodes(), 8);
        assert_eq!(ring.size(), 2);
        assert!(!Arc::ptr_eq(&before, &ring.snapshot()));
    }

    #[test]
    fn test_failed_update_keeps_snapshot() {
        let ring = HashRing::new(Arc::new(Xxh3Hasher), 2, 8).unwrap();
        ring.insert(["a"]).unwrap();
        let before = ring.snapshot();
        assert!(ring.insert(["a"]).is_err());
        assert!(ring.remove(["z"]).is_err());
        assert!(Arc::ptr_eq(&before, &ring.snapshot()));
    }

    #[test]
    fn test_empty_batch_keeps_snapshot() {
        let ring = HashRing::new(Arc::new(Xxh3Hasher), 2, 8).unwrap();
        ring.insert(["a"]).unwrap();
        let before = ring.snapshot();
        assert!(ring.insert(Vec::<Node>::new()).unwrap().is_empty());
        assert!(ring.remove(Vec::<&str>::new()).unwrap().is_empty());
        assert!(Arc::ptr_eq(&before, &ring.snapshot()));
    }

    #[test]
    fn test_cursor_ignores_later_updates() {
        let ring = HashRing::new(Arc::new(Xxh3Hasher), 1, 4).unwrap();
        ring.insert(["a"]).unwrap();
        let cursor = ring.iter();
        ring.insert(["b"]).unwrap();
        assert_eq!(cursor.count(), 4);
        assert_eq!(ring.iter_rev().count(), 8);
    }
}
