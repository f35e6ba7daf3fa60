//! Core hasher trait definitions.

/// A hash function places virtual nodes and keys on the ring.
///
/// The output is treated as an opaque byte string compared
/// lexicographically; its width is never interpreted. Implementations must
/// be deterministic and stateless so they can be shared by every snapshot
/// and every reader without synchronization.
pub trait RingHasher: Send + Sync + 'static {
    /// Hashes `bytes` into a ring position.
    fn hash(&self, bytes: &[u8]) -> Vec<u8>;

    /// Returns the name of this hasher.
    fn name(&self) -> &'static str;
}

/// Adapts a caller-supplied closure into a [`RingHasher`].
#[derive(Clone)]
pub struct FnHasher<F>(F);

impl<F> FnHasher<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> RingHasher for FnHasher<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
{
    fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        (self.0)(bytes)
    }

    fn name(&self) -> &'static str {
        "FnHasher"
    }
}

impl<F> std::fmt::Debug for FnHasher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnHasher")
    }
}
