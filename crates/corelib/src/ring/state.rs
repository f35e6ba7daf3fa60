//! Immutable ring snapshots.
//!
//! A [`RingState`] holds the sorted virtual-node sequence, the precomputed
//! replica owners of every virtual node and the ring configuration. Once a
//! state is published by [`HashRing`](super::HashRing) it is never mutated
//! again: every update works on a [`derive`](RingState::derive)d copy.

use crate::error::{Result, RingError};
use crate::hasher::RingHasher;
use crate::node::Node;
use crate::vnode::VirtualNode;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Rendering used when the textual form of a ring cannot be buffered.
pub const TOO_LARGE: &str = "Ring too large to be represented in a string.";

/// Direction of a walk around the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Ascending ring order (clockwise).
    Forward,
    /// Descending ring order.
    Backward,
}

/// Immutable snapshot of a hash ring.
#[derive(Clone)]
pub struct RingState {
    hasher: Arc<dyn RingHasher>,
    virtual_node_count: u16,
    replication_factor: u8,
    /// Sorted ascending by name.
    virtual_nodes: Vec<Arc<VirtualNode>>,
    /// Distinct owners, keyed by virtual node name.
    replica_owners: HashMap<Arc<[u8]>, Vec<Node>>,
    /// Distinct nodes currently owning virtual nodes.
    nodes: HashSet<Node>,
}

impl RingState {
    /// Creates an empty state, validating the configuration.
    ///
    /// The replication factor must fit in `[1, 255]` and the virtual node
    /// count in `[1, 65535]`.
    pub fn new(
        hasher: Arc<dyn RingHasher>,
        replication_factor: usize,
        virtual_node_count: usize,
    ) -> Result<Self> {
        let replication_factor = u8::try_from(replication_factor)
            .ok()
            .filter(|rf| *rf > 0)
            .ok_or_else(|| {
                RingError::invalid(format!(
                    "replication factor {} not in [1, {}]",
                    replication_factor,
                    u8::MAX
                ))
            })?;
        let virtual_node_count = u16::try_from(virtual_node_count)
            .ok()
            .filter(|vnc| *vnc > 0)
            .ok_or_else(|| {
                RingError::invalid(format!(
                    "virtual node count {} not in [1, {}]",
                    virtual_node_count,
                    u16::MAX
                ))
            })?;

        Ok(Self {
            hasher,
            virtual_node_count,
            replication_factor,
            virtual_nodes: Vec::new(),
            replica_owners: HashMap::new(),
            nodes: HashSet::new(),
        })
    }

    /// Returns an independent copy sharing only the immutable configuration
    /// and the (immutable) virtual nodes themselves.
    pub(crate) fn derive(&self) -> Self {
        self.clone()
    }

    pub fn hasher(&self) -> &Arc<dyn RingHasher> {
        &self.hasher
    }

    pub fn replication_factor(&self) -> u8 {
        self.replication_factor
    }

    pub fn virtual_node_count(&self) -> u16 {
        self.virtual_node_count
    }

    /// Number of distinct nodes.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn len_virtual_nodes(&self) -> usize {
        self.virtual_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.virtual_nodes.is_empty()
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    /// Virtual nodes in ascending ring order.
    pub fn virtual_nodes(&self) -> &[Arc<VirtualNode>] {
        &self.virtual_nodes
    }

    /// Replica owners of the given virtual node, if it belongs to this state.
    pub fn replica_owners(&self, vnode: &VirtualNode) -> Option<&[Node]> {
        self.replica_owners.get(vnode.name()).map(Vec::as_slice)
    }

    fn generate(&self, node: &Node) -> impl Iterator<Item = VirtualNode> + '_ {
        let node = node.clone();
        (0..self.virtual_node_count)
            .map(move |seq| VirtualNode::generate(self.hasher.as_ref(), &node, seq))
    }

    fn search(&self, name: &[u8]) -> std::result::Result<usize, usize> {
        self.virtual_nodes
            .binary_search_by(|vn| vn.name().cmp(name))
    }

    /// Adds every virtual node of `nodes` to the state.
    ///
    /// Returns the new virtual nodes in generation order. On error the state
    /// is left as it was.
    pub(crate) fn insert(&mut self, nodes: &[Node]) -> Result<Vec<Arc<VirtualNode>>> {
        let mut batch = HashSet::with_capacity(nodes.len());
        for node in nodes {
            if self.nodes.contains(node) || !batch.insert(node) {
                return Err(RingError::DuplicateNode(node.clone()));
            }
        }

        let created: Vec<Arc<VirtualNode>> = nodes
            .iter()
            .flat_map(|node| self.generate(node))
            .map(Arc::new)
            .collect();

        let mut sorted = created.clone();
        sorted.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        for pair in sorted.windows(2) {
            if pair[0].name() == pair[1].name() {
                return Err(collision(&pair[1], &pair[0]));
            }
        }
        for vn in &sorted {
            if let Ok(idx) = self.search(vn.name()) {
                return Err(collision(vn, &self.virtual_nodes[idx]));
            }
        }

        // Merge the two sorted runs.
        let existing = std::mem::take(&mut self.virtual_nodes);
        let mut merged = Vec::with_capacity(existing.len() + sorted.len());
        let mut existing = existing.into_iter().peekable();
        let mut fresh = sorted.into_iter().peekable();
        loop {
            let take_fresh = match (existing.peek(), fresh.peek()) {
                (Some(old), Some(new)) => new.name() < old.name(),
                (None, Some(_)) => true,
                (Some(_), None) => false,
                (None, None) => break,
            };
            let next = if take_fresh { fresh.next() } else { existing.next() };
            merged.extend(next);
        }
        self.virtual_nodes = merged;
        self.nodes.extend(nodes.iter().cloned());

        self.fix_replica_owners();
        Ok(created)
    }

    /// Removes every virtual node of `nodes` from the state.
    ///
    /// Returns the removed virtual nodes in generation order. On error the
    /// state is left as it was.
    pub(crate) fn remove(&mut self, nodes: &[Node]) -> Result<Vec<Arc<VirtualNode>>> {
        let mut batch = HashSet::with_capacity(nodes.len());
        for node in nodes {
            if !self.nodes.contains(node) || !batch.insert(node) {
                return Err(RingError::NodeNotFound(node.clone()));
            }
        }

        let mut doomed = Vec::with_capacity(nodes.len() * self.virtual_node_count as usize);
        for node in nodes {
            for vn in self.generate(node) {
                match self.search(vn.name()) {
                    Ok(idx) if self.virtual_nodes[idx].node() == node => doomed.push(idx),
                    _ => return Err(RingError::NodeNotFound(node.clone())),
                }
            }
        }

        let removed: Vec<Arc<VirtualNode>> = doomed
            .iter()
            .map(|&idx| Arc::clone(&self.virtual_nodes[idx]))
            .collect();

        doomed.sort_unstable();
        let mut doomed = doomed.into_iter().peekable();
        let kept = std::mem::take(&mut self.virtual_nodes)
            .into_iter()
            .enumerate()
            .filter_map(|(idx, vn)| {
                if doomed.peek() == Some(&idx) {
                    doomed.next();
                    None
                } else {
                    Some(vn)
                }
            })
            .collect();
        self.virtual_nodes = kept;
        for node in nodes {
            self.nodes.remove(node);
        }

        self.fix_replica_owners();
        Ok(removed)
    }

    /// Recomputes the replica owners of every virtual node.
    ///
    /// Starting at each virtual node and walking forward, collects distinct
    /// owners until `replication_factor` of them are found or every distinct
    /// node has been seen. Worst case O(V·N·RF).
    pub(crate) fn fix_replica_owners(&mut self) {
        let len = self.virtual_nodes.len();
        let wanted = usize::from(self.replication_factor).min(self.nodes.len());

        let mut replica_owners = HashMap::with_capacity(len);
        for (idx, vn) in self.virtual_nodes.iter().enumerate() {
            let mut owners: Vec<Node> = Vec::with_capacity(wanted);
            for step in 0..len {
                if owners.len() >= wanted {
                    break;
                }
                let owner = self.virtual_nodes[(idx + step) % len].node();
                if !owners.contains(owner) {
                    owners.push(owner.clone());
                }
            }
            replica_owners.insert(vn.shared_name(), owners);
        }
        self.replica_owners = replica_owners;
    }

    /// Index of the first virtual node whose name is `>= position`, wrapping
    /// around to 0.
    fn index_for_position(&self, position: &[u8]) -> Result<usize> {
        if self.virtual_nodes.is_empty() {
            return Err(RingError::EmptyRing);
        }
        let idx = self.virtual_nodes.partition_point(|vn| vn.name() < position);
        Ok(idx % self.virtual_nodes.len())
    }

    fn index_for_key(&self, key: &[u8]) -> Result<usize> {
        self.index_for_position(&self.hasher.hash(key))
    }

    fn step(&self, idx: usize, direction: Direction) -> usize {
        let len = self.virtual_nodes.len();
        match direction {
            Direction::Forward => (idx + 1) % len,
            Direction::Backward => (idx + len - 1) % len,
        }
    }

    /// The virtual node responsible for `key`: the first one at or after
    /// `hash(key)`, clockwise.
    pub fn virtual_node_for_key(&self, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        let idx = self.index_for_key(key)?;
        Ok(&self.virtual_nodes[idx])
    }

    /// The distinct nodes responsible for `key`, primary first.
    pub fn nodes_for_key(&self, key: &[u8]) -> Result<&[Node]> {
        let vn = self.virtual_node_for_key(key)?;
        Ok(self.replica_owners(vn).unwrap_or_default())
    }

    /// Whether `hash(key)` is exactly the name of a virtual node.
    pub fn has_virtual_node(&self, key: &[u8]) -> bool {
        self.search(&self.hasher.hash(key)).is_ok()
    }

    /// The virtual node next to the one responsible for `key`.
    pub fn adjacent(&self, direction: Direction, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        let idx = self.index_for_key(key)?;
        Ok(&self.virtual_nodes[self.step(idx, direction)])
    }

    pub fn predecessor(&self, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        self.adjacent(Direction::Backward, key)
    }

    pub fn successor(&self, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        self.adjacent(Direction::Forward, key)
    }

    /// The nearest virtual node, in `direction`, owned by a different
    /// distinct node than the one responsible for `key`.
    pub fn adjacent_node(&self, direction: Direction, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        let start = self.index_for_key(key)?;
        if self.nodes.len() < 2 {
            return Err(RingError::SingleOwner);
        }
        let owner = self.virtual_nodes[start].node();
        let mut idx = start;
        for _ in 1..self.virtual_nodes.len() {
            idx = self.step(idx, direction);
            if self.virtual_nodes[idx].node() != owner {
                return Ok(&self.virtual_nodes[idx]);
            }
        }
        // Unreachable while `nodes` mirrors the virtual node owners.
        Err(RingError::SingleOwner)
    }

    pub fn predecessor_node(&self, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        self.adjacent_node(Direction::Backward, key)
    }

    pub fn successor_node(&self, key: &[u8]) -> Result<&Arc<VirtualNode>> {
        self.adjacent_node(Direction::Forward, key)
    }

    /// Serializable view of the snapshot.
    pub fn view(&self) -> RingView<'_> {
        RingView {
            hasher: self.hasher.name(),
            replication_factor: self.replication_factor,
            virtual_node_count: self.virtual_node_count,
            nodes: self.nodes.len(),
            virtual_nodes: self
                .virtual_nodes
                .iter()
                .enumerate()
                .map(|(index, vn)| VirtualNodeView {
                    index,
                    virtual_node: vn,
                    replica_owners: self.replica_owners(vn).unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// Lists every virtual node with its index and replica owners, one per
    /// line. Falls back to [`TOO_LARGE`] if the buffer cannot grow.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut line = String::new();
        for (idx, vn) in self.virtual_nodes.iter().enumerate() {
            line.clear();
            let owners = self.replica_owners(vn).unwrap_or_default();
            if writeln!(line, "{}.  {}  =>  {}", idx, vn, Owners(owners)).is_err()
                || out.try_reserve(line.len()).is_err()
            {
                return TOO_LARGE.to_owned();
            }
            out.push_str(&line);
        }
        out
    }
}

/// Owner list as `["a" "b"]`: quoted ids separated by single spaces.
struct Owners<'a>(&'a [Node]);

impl fmt::Display for Owners<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{:?}", node)?;
        }
        f.write_char(']')
    }
}

fn collision(vn: &VirtualNode, other: &VirtualNode) -> RingError {
    RingError::NameCollision {
        node: vn.node().clone(),
        sequence: vn.sequence(),
        other: other.node().clone(),
        other_sequence: other.sequence(),
    }
}

impl fmt::Display for RingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for RingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingState")
            .field("hasher", &self.hasher.name())
            .field("replication_factor", &self.replication_factor)
            .field("virtual_node_count", &self.virtual_node_count)
            .field("nodes", &self.nodes.len())
            .field("virtual_nodes", &self.virtual_nodes.len())
            .finish()
    }
}

/// Serializable view of a [`RingState`].
#[derive(Debug, Serialize)]
pub struct RingView<'a> {
    pub hasher: &'static str,
    pub replication_factor: u8,
    pub virtual_node_count: u16,
    pub nodes: usize,
    pub virtual_nodes: Vec<VirtualNodeView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct VirtualNodeView<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub virtual_node: &'a VirtualNode,
    pub replica_owners: &'a [Node],
}
