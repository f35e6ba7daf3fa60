//! Ordered traversal of a ring snapshot.
//!
//! [`VirtualNodes`] is the primary way to walk the ring: a plain cursor over
//! the snapshot captured when it was created. Later inserts and removals are
//! never observed by an existing cursor, and dropping it releases the
//! snapshot.
//!
//! [`feed`] layers a push-style channel on top of the cursor for callers that
//! want to consume virtual nodes from another thread. The producer thread
//! exits once every virtual node has been sent, the receiver is dropped, or
//! the stop channel fires. A receiver kept alive but never drained, with no
//! stop signal, keeps the producer parked forever.

use super::state::{Direction, RingState};
use crate::error::{Result, RingError};
use crate::vnode::VirtualNode;
use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::thread;
use tracing::trace;

/// Cursor over the virtual nodes of one snapshot, in ascending ring order.
///
/// Double-ended: use [`Iterator::rev`] (or `HashRing::iter_rev`) to walk the
/// ring in descending order.
#[derive(Clone, Debug)]
pub struct VirtualNodes {
    state: Arc<RingState>,
    front: usize,
    back: usize,
}

impl VirtualNodes {
    pub(crate) fn new(state: Arc<RingState>) -> Self {
        let back = state.len_virtual_nodes();
        Self {
            state,
            front: 0,
            back,
        }
    }

    /// The snapshot this cursor walks.
    pub fn snapshot(&self) -> &Arc<RingState> {
        &self.state
    }
}

impl Iterator for VirtualNodes {
    type Item = Arc<VirtualNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let vn = Arc::clone(&self.state.virtual_nodes()[self.front]);
        self.front += 1;
        Some(vn)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for VirtualNodes {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(Arc::clone(&self.state.virtual_nodes()[self.back]))
    }
}

impl ExactSizeIterator for VirtualNodes {}

impl FusedIterator for VirtualNodes {}

/// Spawns a producer thread streaming the virtual nodes of `state` in the
/// given direction over a rendezvous channel.
///
/// Sending `()` on, or dropping every sender of, `stop` ends the iteration
/// early. Pass [`channel::never`] when no early stop is needed.
pub fn feed(
    state: Arc<RingState>,
    direction: Direction,
    stop: Receiver<()>,
) -> Result<Receiver<Arc<VirtualNode>>> {
    let (tx, rx) = channel::bounded(0);
    thread::Builder::new()
        .name("lfring-feed".into())
        .spawn(move || {
            let cursor = VirtualNodes::new(state);
            let total = cursor.len();
            trace!(?direction, total, "virtual node feed started");
            let sent = match direction {
                Direction::Forward => produce(cursor, &tx, &stop),
                Direction::Backward => produce(cursor.rev(), &tx, &stop),
            };
            trace!(?direction, sent, total, "virtual node feed finished");
        })
        .map_err(RingError::Spawn)?;
    Ok(rx)
}

fn produce<I>(nodes: I, tx: &Sender<Arc<VirtualNode>>, stop: &Receiver<()>) -> usize
where
    I: Iterator<Item = Arc<VirtualNode>>,
{
    let mut sent = 0;
    for vn in nodes {
        // A pending stop wins over a ready consumer.
        if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }
        select! {
            send(tx, vn) -> res => {
                if res.is_err() {
                    break;
                }
                sent += 1;
            }
            recv(stop) -> _ => break,
        }
    }
    sent
}
