//! Lower bound on the moves left to win
//!
//! `minimum_moves_left` must be *admissible* (never exceed the true
//! minimum) and *consistent*: its value may not decrease by more than the
//! cost of any single move. Equivalently, moves-made plus the bound never
//! decreases along a line of play. The worker loop asserts this on every
//! child it expands; an inconsistency would let A* stop on a non-minimal
//! solution.

use crate::cards::{Card, SUITS_PER_DECK};
use crate::game::Game;

/// Number of cards that sit above a lower card of the same suit.
///
/// Iterates front to back tracking the minimum rank seen per suit; each
/// card at or above its suit's running minimum counts once. Such a card is
/// guaranteed to cost an extra move: it must get out of the way before the
/// lower card can reach the foundation.
pub fn misorder_count<'a>(cards: impl IntoIterator<Item = &'a Card>) -> u32 {
    let mut min_ranks = [u8::MAX; SUITS_PER_DECK];
    let mut result = 0;
    for card in cards {
        let suit = card.suit() as usize;
        if card.rank() < min_ranks[suit] {
            min_ranks[suit] = card.rank();
        } else {
            result += 1;
        }
    }
    result
}

/// Admissible, consistent lower bound on the number of elementary moves
/// needed to finish `game`.
///
/// Every talon card must move at least once to leave the talon, and every
/// stock card costs at least one draw to reach play. In draw-1 mode the
/// waste misorder count is also a certain cost; with a higher draw setting
/// that term can break consistency, so it is omitted. Each tableau card
/// must leave its pile, and same-suit inversions among the face-down cards
/// (plus the first face-up card) each force an extra move.
pub fn minimum_moves_left(game: &Game) -> u32 {
    let draw = game.draw_setting();
    let stock_size = game.stock().len();
    let talon_count = (game.waste().len() + stock_size) as u32;

    let mut result = talon_count + stock_size.div_ceil(draw as usize) as u32;

    if draw == 1 {
        result += misorder_count(game.waste().cards());
    }

    for pile in game.tableaus() {
        if !pile.is_empty() {
            let down_count = pile.len() - pile.up_count();
            result += pile.len() as u32 + misorder_count(&pile.cards()[..down_count + 1]);
        }
    }
    result
}
