//! The parallel A* search: heuristic, closed list, shared move storage,
//! and the worker loop that ties them together.

pub mod arena;
pub mod closed_list;
pub mod fringe;
pub mod heuristic;
pub mod solver;
pub mod storage;

pub use closed_list::{ClosedList, StateKey};
pub use heuristic::{minimum_moves_left, misorder_count};
pub use solver::{
    default_threads, solve, SolveOutcome, SolverResult, DEFAULT_MOVE_TREE_LIMIT,
};
