//! The open set of the search
//!
//! An indexed priority queue of unexpanded leaves keyed by their f-value
//! offset from the root's f-value. With a consistent heuristic the offsets
//! stay small, so the queue is a fixed array of stacks indexed by offset.
//! Within one offset the order is LIFO, which drives the search depth-first
//! inside an f-tier and keeps the fringe from ballooning.
//!
//! `pop` is not linearisable: while a popper scans upward, another thread
//! may push to an offset it already passed. Which stack is "first
//! non-empty" can depend on who looks and when; no attempt is made to
//! pin that down. The pop retries a few times with a yield in between,
//! and the closed list and solution bound make a spuriously early "empty"
//! answer harmless for correctness.

use super::arena::MoveNode;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Offsets are bounded by the depth of f-value growth the search can see;
/// a consistent heuristic keeps them far below this.
const MAX_OFFSETS: usize = 512;

/// Bounded retries before `pop` reports the fringe drained.
const POP_RETRIES: usize = 5;

struct Row {
    stack: Mutex<Vec<MoveNode>>,
    /// Mirror of the stack length so scans skip empty rows without
    /// touching their locks.
    len: AtomicUsize,
}

/// Indexed priority queue of `(offset, MoveNode)` pairs.
pub struct Fringe {
    rows: Box<[Row]>,
    /// One past the highest offset ever pushed.
    active_rows: AtomicUsize,
}

impl Default for Fringe {
    fn default() -> Self {
        Self::new()
    }
}

impl Fringe {
    pub fn new() -> Self {
        let rows = (0..MAX_OFFSETS)
            .map(|_| Row {
                stack: Mutex::new(Vec::new()),
                len: AtomicUsize::new(0),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Fringe {
            rows,
            active_rows: AtomicUsize::new(0),
        }
    }

    /// Push a leaf at the given offset.
    pub fn push(&self, offset: u32, node: MoveNode) {
        let index = offset as usize;
        let row = &self.rows[index];
        {
            let mut stack = row.stack.lock();
            stack.push(node);
            row.len.store(stack.len(), Ordering::Release);
        }
        self.active_rows.fetch_max(index + 1, Ordering::AcqRel);
    }

    /// Pop a leaf from the smallest non-empty offset, LIFO within the
    /// offset. `None` after bounded retries means the fringe looks
    /// drained to this thread.
    pub fn pop(&self) -> Option<(u32, MoveNode)> {
        for _ in 0..POP_RETRIES {
            let active = self.active_rows.load(Ordering::Acquire);
            for index in 0..active {
                let row = &self.rows[index];
                if row.len.load(Ordering::Acquire) == 0 {
                    continue;
                }
                let mut stack = row.stack.lock();
                if let Some(node) = stack.pop() {
                    row.len.store(stack.len(), Ordering::Release);
                    return Some((index as u32, node));
                }
            }
            std::thread::yield_now();
        }
        None
    }

    /// Total number of queued leaves. Approximate while other threads are
    /// pushing or popping.
    pub fn len(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.len.load(Ordering::Relaxed))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
