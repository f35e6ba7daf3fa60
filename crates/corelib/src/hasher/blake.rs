//! BLAKE3 hasher implementation.

use crate::hasher::traits::RingHasher;

/// BLAKE3 hasher producing the full 32-byte digest.
///
/// Slower than the non-cryptographic hashers, but collisions between virtual
/// node names are out of reach even for adversarially chosen node ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl RingHasher for Blake3Hasher {
    fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        blake3::hash(bytes).as_bytes().to_vec()
    }

    fn name(&self) -> &'static str {
        "Blake3Hasher"
    }
}
