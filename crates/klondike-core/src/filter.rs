//! Redundant-move filtering
//!
//! Consider a move at time T0 from pile X to pile Y, and a later candidate
//! move from Y to Z. If no intervening move has touched Y or Z, the
//! candidate achieves in two moves what a direct X-to-Z move at T0 would
//! have achieved in one, so no minimum-length solution contains it. Since
//! nothing says X cannot equal Z, the test also catches moves that exactly
//! reverse an earlier move.
//!
//! The filter walks the current move sequence from newest to oldest looking
//! for the T0 candidate. Moves out of the stock or waste are never filtered;
//! the talon is not eligible as pile Y.

use crate::moves::MoveSpec;
use crate::pile::PileId;
use smallvec::{Array, SmallVec};

enum XyzVerdict {
    Redundant,
    Fresh,
    KeepLooking,
}

fn xyz_test(prev_move: MoveSpec, trial_move: MoveSpec) -> XyzVerdict {
    let y = trial_move.from();
    let z = trial_move.to();
    if prev_move.to() == y {
        // Candidate T0 move. The two moves shift the same card set only if
        // they move the same number of cards. The direct X-to-Z move was
        // possible at T0 unless the T0 move itself changed pile Z, which
        // happens when X == Z and that move flipped a tableau card face-up.
        if prev_move.from() == z && prev_move.flips_top_card() {
            return XyzVerdict::Fresh;
        }
        if prev_move.n_cards() == trial_move.n_cards() {
            XyzVerdict::Redundant
        } else {
            XyzVerdict::Fresh
        }
    } else if prev_move.to() == z || prev_move.from() == z || prev_move.from() == y {
        // An intervening move has changed pile Y or pile Z.
        XyzVerdict::Fresh
    } else {
        XyzVerdict::KeepLooking
    }
}

/// True if `trial_move` provably cannot appear in a minimum solution given
/// the moves already made (newest first is derived internally).
pub fn is_redundant_move<'a, I>(trial_move: MoveSpec, moves_made: I) -> bool
where
    I: IntoIterator<Item = &'a MoveSpec>,
    I::IntoIter: DoubleEndedIterator,
{
    let y = trial_move.from();
    if y == PileId::STOCK || y == PileId::WASTE {
        return false;
    }
    for &prev_move in moves_made.into_iter().rev() {
        if prev_move.is_ladder_move() {
            // A ladder move is two moves in one; test the implied
            // move-to-foundation first, then fall through to the
            // tableau-to-tableau component with the flip stripped (the
            // flip belongs to the foundation step).
            let mut foundation_move = MoveSpec::non_stock_move(
                prev_move.from(),
                prev_move.ladder_pile(),
                1,
                prev_move.from_up_count() - prev_move.n_cards(),
            );
            foundation_move.set_flips_top_card(prev_move.flips_top_card());
            match xyz_test(foundation_move, trial_move) {
                XyzVerdict::Redundant => return true,
                XyzVerdict::Fresh => return false,
                XyzVerdict::KeepLooking => {}
            }
            let mut tableau_move = prev_move;
            tableau_move.set_flips_top_card(false);
            match xyz_test(tableau_move, trial_move) {
                XyzVerdict::Redundant => return true,
                XyzVerdict::Fresh => return false,
                XyzVerdict::KeepLooking => {}
            }
        } else {
            match xyz_test(prev_move, trial_move) {
                XyzVerdict::Redundant => return true,
                XyzVerdict::Fresh => return false,
                XyzVerdict::KeepLooking => {}
            }
        }
    }
    false
}

/// Drop the provably non-minimal candidates from `new_moves`.
pub fn filter_redundant_moves<'a, A, I>(new_moves: &mut SmallVec<A>, moves_made: I)
where
    A: Array<Item = MoveSpec>,
    I: IntoIterator<Item = &'a MoveSpec> + Copy,
    I::IntoIter: DoubleEndedIterator,
{
    new_moves.retain(|&mut mv| !is_redundant_move(mv, moves_made));
}
