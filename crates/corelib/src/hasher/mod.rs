//! Hash functions for placing virtual nodes and keys on the ring.
//!
//! The ring only needs a deterministic `bytes -> bytes` transform. Callers
//! may bring their own through [`FnHasher`] or pick one of the built-ins.

pub mod blake;
pub mod siphash;
pub mod traits;
pub mod xxh3;

pub use blake::Blake3Hasher;
pub use siphash::SipHasher;
pub use traits::{FnHasher, RingHasher};
pub use xxh3::Xxh3Hasher;

use std::sync::Arc;

/// Built-in hashers, selectable by name from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum HasherKind {
    #[default]
    Xxh3,
    Sip,
    Blake3,
}

impl HasherKind {
    /// Instantiates the selected hasher.
    pub fn into_hasher(self) -> Arc<dyn RingHasher> {
        match self {
            HasherKind::Xxh3 => Arc::new(Xxh3Hasher),
            HasherKind::Sip => Arc::new(SipHasher),
            HasherKind::Blake3 => Arc::new(Blake3Hasher),
        }
    }
}
