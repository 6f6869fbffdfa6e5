//! Append-only move tree storage
//!
//! The move tree holds `(move, parent)` nodes; workers reconstruct a move
//! sequence by walking parent links, so reads vastly outnumber writes and
//! must not take a lock. Entries are therefore stored in fixed-size chunks
//! that never move once allocated: appending publishes new entries by
//! storing the length with release ordering, and readers that observe an
//! index below the acquired length are guaranteed to see fully written
//! nodes in place.
//!
//! Appends happen in small bursts (one stem plus its branches), each burst
//! under a single mutex acquisition.

use crate::moves::MoveSpec;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

/// Index of a node in the move tree.
pub type NodeIndex = u32;

/// Parent link of a root node.
pub const NO_NODE: NodeIndex = u32::MAX;

/// One node of the move tree: a move and the node it extends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveNode {
    pub mv: MoveSpec,
    pub prev: NodeIndex,
}

impl Default for MoveNode {
    fn default() -> Self {
        MoveNode {
            mv: MoveSpec::DEFAULT,
            prev: NO_NODE,
        }
    }
}

const CHUNK_SHIFT: usize = 14;
/// Nodes per chunk (128 KiB of nodes).
const CHUNK_LEN: usize = 1 << CHUNK_SHIFT;
const CHUNK_MASK: usize = CHUNK_LEN - 1;

/// Address-stable arena of `MoveNode`s.
pub struct MoveArena {
    /// Chunk pointer table, sized at construction. A null entry is a chunk
    /// not yet allocated.
    chunks: Box<[AtomicPtr<MoveNode>]>,
    /// Number of published nodes. Store is the linearisation point for
    /// readers.
    len: AtomicUsize,
    /// Serialises appenders.
    append_lock: Mutex<()>,
}

impl MoveArena {
    /// Create an arena able to hold at least `capacity` nodes, plus slack
    /// for the bursts in flight when the soft limit is crossed.
    pub fn new(capacity: usize) -> Self {
        let slack_chunks = 64; // roughly a million nodes of headroom
        let n_chunks = capacity.div_ceil(CHUNK_LEN) + slack_chunks;
        let chunks = (0..n_chunks)
            .map(|_| AtomicPtr::new(std::ptr::null_mut()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        MoveArena {
            chunks,
            len: AtomicUsize::new(0),
            append_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a chain of moves, each node pointing at the one before it,
    /// starting from `parent`. Returns the index of the last appended node
    /// (or `parent` unchanged if `moves` is empty). One lock acquisition
    /// per call.
    pub fn append_chain(
        &self,
        moves: impl IntoIterator<Item = MoveSpec>,
        parent: NodeIndex,
    ) -> NodeIndex {
        let _guard = self.append_lock.lock();
        let mut len = self.len.load(Ordering::Relaxed);
        let mut parent = parent;
        for mv in moves {
            let chunk_index = len >> CHUNK_SHIFT;
            assert!(chunk_index < self.chunks.len(), "move arena exhausted");
            let mut chunk = self.chunks[chunk_index].load(Ordering::Acquire);
            if chunk.is_null() {
                chunk = Self::allocate_chunk();
                self.chunks[chunk_index].store(chunk, Ordering::Release);
            }
            let node = MoveNode { mv, prev: parent };
            // SAFETY: the slot is not yet published — no reader can
            // observe it until the release store of `len` below, and
            // appenders are serialised by `append_lock`.
            unsafe {
                chunk.add(len & CHUNK_MASK).write(node);
            }
            parent = len as NodeIndex;
            len += 1;
        }
        self.len.store(len, Ordering::Release);
        parent
    }

    /// Read a published node. Lock-free.
    #[inline]
    pub fn get(&self, index: NodeIndex) -> MoveNode {
        let i = index as usize;
        debug_assert!(i < self.len());
        let chunk = self.chunks[i >> CHUNK_SHIFT].load(Ordering::Acquire);
        debug_assert!(!chunk.is_null());
        // SAFETY: `index` is below the published length (caller contract,
        // checked in debug builds), so the chunk exists and the slot was
        // written before the release store that published it.
        unsafe { *chunk.add(i & CHUNK_MASK) }
    }

    fn allocate_chunk() -> *mut MoveNode {
        let chunk = vec![MoveNode::default(); CHUNK_LEN].into_boxed_slice();
        Box::into_raw(chunk) as *mut MoveNode
    }
}

impl Drop for MoveArena {
    fn drop(&mut self) {
        for chunk in self.chunks.iter() {
            let ptr = chunk.load(Ordering::Relaxed);
            if !ptr.is_null() {
                // SAFETY: `ptr` came from `Box::into_raw` of a boxed slice
                // of exactly CHUNK_LEN nodes and is dropped once.
                unsafe {
                    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                        ptr, CHUNK_LEN,
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pile::PileId;

    fn mv(n: usize) -> MoveSpec {
        MoveSpec::non_stock_move(PileId::tableau(n % 7), PileId::WASTE, 1, 1)
    }

    #[test]
    fn append_chain_links_nodes_in_order() {
        let arena = MoveArena::new(1024);
        let end = arena.append_chain([mv(0), mv(1), mv(2)], NO_NODE);
        assert_eq!(end, 2);
        assert_eq!(arena.len(), 3);

        assert_eq!(arena.get(0).prev, NO_NODE);
        assert_eq!(arena.get(1).prev, 0);
        assert_eq!(arena.get(2).prev, 1);
        assert_eq!(arena.get(1).mv, mv(1));
    }

    #[test]
    fn empty_chain_returns_parent_unchanged() {
        let arena = MoveArena::new(16);
        let end = arena.append_chain(std::iter::empty(), 41);
        assert_eq!(end, 41);
        assert!(arena.is_empty());
    }

    #[test]
    fn chains_can_branch_from_earlier_nodes() {
        let arena = MoveArena::new(1024);
        let trunk = arena.append_chain([mv(0), mv(1)], NO_NODE);
        let branch_a = arena.append_chain([mv(2)], trunk);
        let branch_b = arena.append_chain([mv(3)], trunk);

        assert_eq!(arena.get(branch_a).prev, trunk);
        assert_eq!(arena.get(branch_b).prev, trunk);
        assert_ne!(branch_a, branch_b);
    }

    #[test]
    fn growth_crosses_chunk_boundaries() {
        let arena = MoveArena::new(CHUNK_LEN + 8);
        let n = CHUNK_LEN + 5;
        let mut parent = NO_NODE;
        for i in 0..n {
            parent = arena.append_chain([mv(i)], parent);
        }
        assert_eq!(arena.len(), n);
        // Walk the chain back to the root.
        let mut index = parent;
        let mut steps = 0;
        while index != NO_NODE {
            let node = arena.get(index);
            index = node.prev;
            steps += 1;
        }
        assert_eq!(steps, n);
    }

    #[test]
    fn concurrent_append_and_read() {
        use std::sync::atomic::AtomicBool;
        let arena = MoveArena::new(64 * 1024);
        let stop = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    let mut parent = NO_NODE;
                    for i in 0..10_000 {
                        parent = arena.append_chain([mv(i)], parent);
                    }
                });
            }
            scope.spawn(|| {
                while !stop.load(Ordering::Relaxed) {
                    let len = arena.len();
                    if len > 0 {
                        // Any published node must walk back to a root.
                        let mut index = (len - 1) as NodeIndex;
                        let mut hops = 0;
                        while index != NO_NODE && hops <= len {
                            index = arena.get(index).prev;
                            hops += 1;
                        }
                        assert_eq!(index, NO_NODE);
                    }
                }
            });
            scope.spawn(|| {
                // Writers finish first in practice; this is just a stop
                // signal once the scope begins tearing down.
                std::thread::sleep(std::time::Duration::from_millis(50));
                stop.store(true, Ordering::Relaxed);
            });
        });
        assert_eq!(arena.len(), 20_000);
    }
}
