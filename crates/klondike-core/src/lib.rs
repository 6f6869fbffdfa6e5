//! Minimum-move solver for Klondike Solitaire
//!
//! Decides whether a deal is winnable under a given draw setting and
//! recycle limit and, when it is, produces a winning move sequence of
//! provably minimum length (or the shortest found, if the search hits its
//! memory limit first). The solver is a parallel A* over compressed game
//! states: a shared append-only move tree and priority fringe let workers
//! cooperate without materialising move sequences, an admissible and
//! consistent heuristic orders the frontier, and a lock-striped closed
//! list prunes revisited states.
//!
//! ```no_run
//! use klondike_core::{numbered_deal, solve, Game, SolveOutcome, DEFAULT_MOVE_TREE_LIMIT};
//!
//! let deck = numbered_deal(20260802);
//! let game = Game::new(&deck, 1, u32::MAX).expect("full deck");
//! let result = solve(&game, DEFAULT_MOVE_TREE_LIMIT, 0);
//! if result.outcome == SolveOutcome::SolvedMinimal {
//!     println!("winnable in {} moves", klondike_core::move_count(&result.solution));
//! }
//! ```

pub mod cards;
pub mod filter;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod pile;
pub mod search;

pub use cards::{numbered_deal, shuffle, standard_deck, Card, CardDeck, Suit};
pub use game::{validate_solution, DealError, Game};
pub use moves::{expand_moves, move_count, MoveSequence, MoveSpec, XMove};
pub use pile::{Pile, PileId};
pub use search::{
    default_threads, minimum_moves_left, solve, SolveOutcome, SolverResult,
    DEFAULT_MOVE_TREE_LIMIT,
};
