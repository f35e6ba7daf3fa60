//! SipHash-1-3 hasher implementation.

use crate::hasher::traits::RingHasher;
use siphasher::sip128::{Hasher128, SipHasher13};
use std::hash::Hasher;

/// SipHash-1-3 (128-bit output) hasher with fixed zero keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipHasher;

impl RingHasher for SipHasher {
    fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        let mut hasher = SipHasher13::new();
        hasher.write(bytes);
        hasher.finish128().as_u128().to_be_bytes().to_vec()
    }

    fn name(&self) -> &'static str {
        "SipHasher"
    }
}
