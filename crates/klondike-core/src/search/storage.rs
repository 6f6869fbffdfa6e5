//! Shared move storage and the per-worker view of it
//!
//! The shared side owns the move tree (an append-only arena of
//! `(move, parent)` nodes) and the fringe of open leaves. A worker never
//! materialises full move sequences in the shared structures: a fringe
//! leaf is one move plus a parent index, and the sequence is recovered by
//! walking parent links.
//!
//! Per worker, `MoveStorage` keeps the current sequence in a deque with a
//! cached move count, remembers how much of it came from the tree
//! (`start_size`), and buffers the branches found during one expansion.
//! `share_moves` publishes the stem suffix and the branches together: the
//! stem nodes are appended under one lock acquisition and each branch is
//! pushed onto the fringe pointing at the stem's end. A dead end (no
//! surviving branches) publishes nothing, so its stem is dropped for free.

use super::arena::{MoveArena, MoveNode, NO_NODE};
use super::fringe::Fringe;
use crate::game::Game;
use crate::moves::{MoveSequence, MoveSpec};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};

/// Move tree and fringe shared by every worker of one solve.
pub struct SharedMoveStorage {
    move_tree: MoveArena,
    fringe: Fringe,
    move_tree_limit: usize,
    initial_min_moves: u32,
    first_time: AtomicBool,
}

impl SharedMoveStorage {
    /// `initial_min_moves` is the heuristic value of the root; fringe
    /// offsets are measured from it.
    pub fn new(move_tree_limit: usize, initial_min_moves: u32) -> Self {
        SharedMoveStorage {
            move_tree: MoveArena::new(move_tree_limit),
            fringe: Fringe::new(),
            move_tree_limit,
            initial_min_moves,
            first_time: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn initial_min_moves(&self) -> u32 {
        self.initial_min_moves
    }

    #[inline]
    pub fn over_limit(&self) -> bool {
        self.move_tree.len() > self.move_tree_limit
    }

    #[inline]
    pub fn move_tree_size(&self) -> usize {
        self.move_tree.len()
    }

    #[inline]
    pub fn fringe_size(&self) -> usize {
        self.fringe.len()
    }
}

struct Branch {
    mv: MoveSpec,
    offset: u32,
}

/// A worker's handle on the shared storage plus its private sequence.
pub struct MoveStorage<'a> {
    shared: &'a SharedMoveStorage,
    current_sequence: MoveSequence,
    /// The leaf this sequence was popped from.
    leaf: MoveNode,
    /// How many of the current sequence's moves came from the move tree.
    start_size: usize,
    branches: SmallVec<[Branch; 32]>,
}

impl<'a> MoveStorage<'a> {
    pub fn new(shared: &'a SharedMoveStorage) -> Self {
        MoveStorage {
            shared,
            current_sequence: MoveSequence::new(),
            leaf: MoveNode::default(),
            start_size: 0,
            branches: SmallVec::new(),
        }
    }

    #[inline]
    pub fn shared(&self) -> &SharedMoveStorage {
        self.shared
    }

    /// The sequence currently loaded, including stem moves pushed since.
    #[inline]
    pub fn move_sequence(&self) -> &MoveSequence {
        &self.current_sequence
    }

    /// Append a no-choice move to the current stem.
    pub fn push_stem(&mut self, mv: MoveSpec) {
        self.current_sequence.push_back(mv);
    }

    /// Record a branch move and the f-value (minimum total moves) of the
    /// position it leads to.
    pub fn push_branch(&mut self, mv: MoveSpec, min_moves: u32) {
        debug_assert!(self.shared.initial_min_moves <= min_moves);
        self.branches.push(Branch {
            mv,
            offset: min_moves - self.shared.initial_min_moves,
        });
    }

    /// Publish this expansion: append the stem suffix to the move tree and
    /// queue every recorded branch off its end. Publishes nothing when no
    /// branch survived.
    pub fn share_moves(&mut self) {
        if self.branches.is_empty() {
            return;
        }
        let stem_end = self.shared.move_tree.append_chain(
            self.current_sequence.iter().skip(self.start_size).copied(),
            self.leaf.prev,
        );
        // Highest offsets first, so within each offset the most promising
        // branch surfaces last-in-first-out.
        self.branches.sort_unstable_by(|a, b| b.offset.cmp(&a.offset));
        for branch in self.branches.drain(..) {
            self.shared.fringe.push(
                branch.offset,
                MoveNode {
                    mv: branch.mv,
                    prev: stem_end,
                },
            );
        }
    }

    /// Take the next open leaf and return its f-value. The very first call
    /// across all workers returns the root instead. `None` means the
    /// fringe is drained and the worker should stop.
    pub fn pop_next_move_sequence(&mut self) -> Option<u32> {
        if self.shared.first_time.swap(false, Ordering::AcqRel) {
            self.leaf = MoveNode::default();
            return Some(self.shared.initial_min_moves);
        }
        let (offset, leaf) = self.shared.fringe.pop()?;
        self.leaf = leaf;
        Some(offset + self.shared.initial_min_moves)
    }

    /// Rebuild the popped leaf's move sequence from the move tree.
    pub fn load_move_sequence(&mut self) {
        self.current_sequence.clear();
        let mut index = self.leaf.prev;
        while index != NO_NODE {
            let node = self.shared.move_tree.get(index);
            self.current_sequence.push_front(node.mv);
            index = node.prev;
        }
        self.start_size = self.current_sequence.len();
        if !self.leaf.mv.is_default() {
            self.current_sequence.push_back(self.leaf.mv);
        }
    }

    /// Replay the current sequence onto `game`.
    pub fn make_sequence_moves(&self, game: &mut Game) {
        for &mv in self.current_sequence.iter() {
            game.make_move(mv);
        }
    }
}
