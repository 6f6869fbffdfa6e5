//! Parallel A* driver and worker loop
//!
//! The driver primes the shared storage with the root, starts workers on
//! their own threads (the calling thread runs one too), and classifies the
//! outcome when they drain. Each worker repeatedly pops the open leaf with
//! the lowest f-value, replays its move sequence on a private game, chases
//! the chain of forced moves, and expands the first real branching point.
//! Children are costed with the heuristic, deduplicated against the closed
//! list, and published back as new leaves.

use super::closed_list::ClosedList;
use super::heuristic::minimum_moves_left;
use super::storage::{MoveStorage, SharedMoveStorage};
use crate::game::Game;
use crate::moves::{MoveSequence, MoveSpec, QMoves};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Default soft cap on the move tree.
pub const DEFAULT_MOVE_TREE_LIMIT: usize = 12_000_000;

/// How a solve ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The search was exhausted below the limit; the solution is provably
    /// a minimum.
    SolvedMinimal,
    /// The move tree limit was hit; the best solution found is returned
    /// but may not be minimal.
    Solved,
    /// The search was exhausted without finding a solution: the deal
    /// cannot be won.
    Impossible,
    /// The move tree limit was hit before any solution was found.
    GaveUp,
}

/// Result of [`solve`].
#[derive(Clone, Debug)]
pub struct SolverResult {
    pub outcome: SolveOutcome,
    /// Winning move sequence; empty for `Impossible` and `GaveUp`.
    pub solution: Vec<MoveSpec>,
    /// Number of distinct states in the closed list.
    pub closed_states: usize,
    /// Final size of the shared move tree.
    pub move_tree_size: usize,
    /// Leaves still queued when the search stopped.
    pub final_fringe_size: usize,
}

/// Threads used when the caller passes zero.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// The best solution seen so far, shared across workers.
struct CandidateSolution {
    /// Move count of the stored solution; `u32::MAX` while none exists.
    /// Read without the lock for the cheap double-checked test.
    count: AtomicU32,
    moves: Mutex<Vec<MoveSpec>>,
}

impl CandidateSolution {
    fn new() -> Self {
        CandidateSolution {
            count: AtomicU32::new(u32::MAX),
            moves: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    fn move_count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.move_count() == u32::MAX
    }

    /// Install `sequence` if it is strictly shorter than the current best.
    fn replace_if_shorter(&self, sequence: &MoveSequence, count: u32) {
        if count < self.move_count() {
            let mut moves = self.moves.lock();
            if count < self.count.load(Ordering::Relaxed) {
                moves.clear();
                moves.extend(sequence.iter().copied());
                self.count.store(count, Ordering::Release);
            }
        }
    }

    fn take(&self) -> Vec<MoveSpec> {
        std::mem::take(&mut *self.moves.lock())
    }
}

struct WorkerState<'a> {
    game: Game,
    storage: MoveStorage<'a>,
    closed_list: &'a ClosedList,
    best_solution: &'a CandidateSolution,
}

impl<'a> WorkerState<'a> {
    /// Make moves for as long as there is no choice to make: each call to
    /// `available_moves` that returns exactly one move (a dominant move or
    /// a forced single) extends the stem. Returns the first real set of
    /// alternatives, or an empty set at a dead end or win.
    fn make_auto_moves(&mut self) -> QMoves {
        loop {
            let available = self.game.available_moves(self.storage.move_sequence());
            if available.len() != 1 {
                return available;
            }
            self.storage.push_stem(available[0]);
            self.game.make_move(available[0]);
        }
    }
}

fn worker(
    game: &Game,
    shared: &SharedMoveStorage,
    closed_list: &ClosedList,
    best_solution: &CandidateSolution,
) {
    let mut state = WorkerState {
        game: game.clone(),
        storage: MoveStorage::new(shared),
        closed_list,
        best_solution,
    };

    while !shared.over_limit() {
        // The popped f-value is a lower bound on any solution through this
        // leaf; once it reaches the best solution's length the rest of the
        // fringe cannot improve on it.
        let Some(min_moves_popped) = state.storage.pop_next_move_sequence() else {
            break;
        };
        if min_moves_popped >= state.best_solution.move_count() {
            break;
        }

        // Restore the game to the state the popped sequence leads to.
        state.game.reset();
        state.storage.load_move_sequence();
        state.storage.make_sequence_moves(&mut state.game);

        let available = state.make_auto_moves();
        let moves_made_count = state.storage.move_sequence().move_count();

        if available.is_empty() {
            // A dead end, or a win.
            if state.game.game_over() {
                state
                    .best_solution
                    .replace_if_shorter(state.storage.move_sequence(), moves_made_count);
            }
            continue;
        }

        for &mv in available.iter() {
            state.game.make_move(mv);
            let made = moves_made_count + mv.n_moves();
            // Both the heuristic and the closed-list probe are expensive,
            // and the probe is the dearer of the two. With a solution in
            // hand the heuristic bound can reject the child before the
            // probe; without one, probing first is the cheaper order.
            let mut min_remaining = u32::MAX;
            let mut pass = true;
            if !state.best_solution.is_empty() {
                min_remaining = minimum_moves_left(&state.game);
                pass = made + min_remaining < state.best_solution.move_count();
            }
            if pass && state.closed_list.is_short_path(&state.game, made) {
                if min_remaining == u32::MAX {
                    min_remaining = minimum_moves_left(&state.game);
                }
                let min_moves = made + min_remaining;
                // A child's f-value below its parent's means the heuristic
                // is inconsistent; optimality would be lost silently.
                debug_assert!(
                    min_moves_popped <= min_moves,
                    "inconsistent heuristic: popped f {} > child f {}",
                    min_moves_popped,
                    min_moves
                );
                state.storage.push_branch(mv, min_moves);
            }
            state.game.unmake_move(mv);
        }
        state.storage.share_moves();
    }
}

fn run_workers(
    game: &Game,
    shared: &SharedMoveStorage,
    closed_list: &ClosedList,
    best_solution: &CandidateSolution,
    threads: usize,
) {
    let n_threads = if threads == 0 { default_threads() } else { threads };

    std::thread::scope(|scope| {
        for t in 0..n_threads.saturating_sub(1) {
            std::thread::Builder::new()
                .name(format!("klondike-worker-{}", t + 1))
                .spawn_scoped(scope, move || {
                    worker(game, shared, closed_list, best_solution)
                })
                .expect("spawn klondike worker");
            if t == 0 {
                // Give the first worker a head start so the move tree has
                // its first entries before the others contend for leaves.
                std::thread::sleep(Duration::from_millis(3));
            }
        }
        // The calling thread is a worker too.
        worker(game, shared, closed_list, best_solution);
    });
}

/// Solve `game` for the minimum number of moves.
///
/// `move_tree_limit` caps the shared move tree; when it is exceeded the
/// search stops early with the best solution found so far (outcome
/// `Solved` or `GaveUp`). `threads == 0` uses the hardware parallelism.
pub fn solve(game: &Game, move_tree_limit: usize, threads: usize) -> SolverResult {
    let mut root = game.clone();
    root.reset();
    let initial_min_moves = minimum_moves_left(&root);

    log::debug!(
        "solve: draw {}, recycle limit {}, tree limit {}, initial bound {}",
        root.draw_setting(),
        root.recycle_limit(),
        move_tree_limit,
        initial_min_moves
    );

    let shared = SharedMoveStorage::new(move_tree_limit, initial_min_moves);
    let closed_list = ClosedList::new();
    let best_solution = CandidateSolution::new();

    run_workers(&root, &shared, &closed_list, &best_solution, threads);

    let solution = best_solution.take();
    let outcome = match (solution.is_empty(), shared.over_limit()) {
        (false, false) => SolveOutcome::SolvedMinimal,
        (false, true) => SolveOutcome::Solved,
        (true, false) => SolveOutcome::Impossible,
        (true, true) => SolveOutcome::GaveUp,
    };
    let result = SolverResult {
        outcome,
        solution,
        closed_states: closed_list.len(),
        move_tree_size: shared.move_tree_size(),
        final_fringe_size: shared.fringe_size(),
    };
    log::debug!(
        "solve: {:?}, {} moves, {} closed states, tree {}, fringe {}",
        result.outcome,
        crate::moves::move_count(&result.solution),
        result.closed_states,
        result.move_tree_size,
        result.final_fringe_size
    );
    result
}
