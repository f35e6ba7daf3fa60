//! XXH3 hasher implementation (default).

use crate::hasher::traits::RingHasher;
use xxhash_rust::xxh3::xxh3_128;

/// XXH3-128 hasher producing 16 big-endian bytes.
///
/// Big-endian keeps byte-lexicographic order identical to numeric order of
/// the underlying 128-bit digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hasher;

impl RingHasher for Xxh3Hasher {
    fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        xxh3_128(bytes).to_be_bytes().to_vec()
    }

    fn name(&self) -> &'static str {
        "Xxh3Hasher"
    }
}
