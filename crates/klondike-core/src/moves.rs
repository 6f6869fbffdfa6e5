//! Move representation
//!
//! `MoveSpec` is the unit the solver plans in. One `MoveSpec` may imply
//! several elementary moves: a stock move bundles any number of draws (and
//! possibly a recycle of the waste pile) with the play of the exposed waste
//! card, and a ladder move bundles a tableau-to-tableau move with the play
//! of the card it uncovers to the foundation. `n_moves` is the number of
//! elementary moves implied, which is what the solver minimises.
//!
//! A ladder move is named for the common endgame tactic of "climbing the
//! ladder": repeatedly parking the top of a run on a neighbouring pile to
//! dislodge the foundation-ready card underneath. For a ladder move,
//! `flips_top_card` refers to the foundation step, not the tableau step;
//! the card a ladder move sends to the foundation is always face-up before
//! the move.
//!
//! `unmake_move` cannot infer the moving pile's face-up count before the
//! move (a flip may have changed it), so every move from a tableau pile
//! records `from_up_count`.

use crate::cards::{Card, Suit};
use crate::pile::PileId;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;

/// Buffer for the moves available from one position. A position offers at
/// most 43 moves, so the inline capacity always suffices.
pub type QMoves = SmallVec<[MoveSpec; 64]>;

/// A worker's current move sequence never grows past this; running out of
/// room means the redundant-move filter is letting cycles through.
pub const WORKER_SEQUENCE_CAPACITY: usize = 500;

/// One planned move, packed into 32 bits.
///
/// Layout:
/// - bits 0-3: from pile id (`0xF` in a default move)
/// - bits 4-7: to pile id
/// - bit 8: flips a face-down card
/// - bits 9-14: number of elementary moves implied (a full draw-1 walk of
///   a 48-card talon plus the play can reach 49)
/// - bits 15-16: ladder suit
/// - bit 17: recycles the waste pile (stock moves only)
/// - bits 18-25: payload — cards to move (4 bits) and prior face-up count
///   (4 bits) for non-stock moves, or a signed draw count for stock moves
///
/// The tag is implicit: `from == STOCK` selects the stock payload, and a
/// tableau move with `n_moves == 2` is a ladder move.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveSpec {
    data: u32,
}

const FLIPS_BIT: u32 = 1 << 8;
const N_MOVES_SHIFT: u32 = 9;
const N_MOVES_MASK: u32 = 0x3F;
const LADDER_SUIT_SHIFT: u32 = 15;
const RECYCLE_BIT: u32 = 1 << 17;
const PAYLOAD_SHIFT: u32 = 18;

impl MoveSpec {
    /// The default move; recognisable by `from == to`.
    pub const DEFAULT: MoveSpec = MoveSpec { data: 0xFF };

    /// A stock move: draw `draw` cards (negative undoes draws), then move
    /// the exposed waste card to `to`. `n_moves` counts the draws plus the
    /// final play; `recycle` marks a pass through the empty stock.
    #[inline]
    pub fn stock_move(to: PileId, n_moves: u32, draw: i32, recycle: bool) -> Self {
        debug_assert!(n_moves <= N_MOVES_MASK);
        debug_assert!((-24..=24).contains(&draw));
        let mut data = PileId::STOCK.index() as u32
            | (to.index() as u32) << 4
            | n_moves << N_MOVES_SHIFT
            | ((draw as i8 as u8) as u32) << PAYLOAD_SHIFT;
        if recycle {
            data |= RECYCLE_BIT;
        }
        MoveSpec { data }
    }

    /// A move of `n` cards that touches neither the stock nor the waste
    /// as its source of draws.
    #[inline]
    pub fn non_stock_move(from: PileId, to: PileId, n: usize, from_up_count: usize) -> Self {
        debug_assert!(from != PileId::STOCK);
        debug_assert!(n < 16 && from_up_count < 16);
        MoveSpec {
            data: from.index() as u32
                | (to.index() as u32) << 4
                | 1 << N_MOVES_SHIFT
                | (n as u32) << PAYLOAD_SHIFT
                | (from_up_count as u32) << (PAYLOAD_SHIFT + 4),
        }
    }

    /// A ladder move: the tableau-to-tableau move of `n` cards followed by
    /// the play of the uncovered `ladder_card` to its foundation.
    #[inline]
    pub fn ladder_move(
        from: PileId,
        to: PileId,
        n: usize,
        from_up_count: usize,
        ladder_card: Card,
    ) -> Self {
        let base = Self::non_stock_move(from, to, n, from_up_count);
        MoveSpec {
            data: (base.data & !(N_MOVES_MASK << N_MOVES_SHIFT))
                | 2 << N_MOVES_SHIFT
                | (ladder_card.suit() as u32) << LADDER_SUIT_SHIFT,
        }
    }

    #[inline]
    pub fn is_default(self) -> bool {
        self.from() == self.to()
    }

    #[inline]
    pub fn is_stock_move(self) -> bool {
        self.from() == PileId::STOCK
    }

    #[inline]
    pub fn is_ladder_move(self) -> bool {
        self.from().is_tableau() && self.n_moves() == 2
    }

    #[inline]
    pub fn from(self) -> PileId {
        PileId::from_index((self.data & 0xF) as u8)
    }

    #[inline]
    pub fn to(self) -> PileId {
        PileId::from_index((self.data >> 4 & 0xF) as u8)
    }

    /// Number of cards the move transfers from its `from` pile.
    #[inline]
    pub fn n_cards(self) -> usize {
        if self.is_stock_move() {
            1
        } else {
            (self.data >> PAYLOAD_SHIFT & 0xF) as usize
        }
    }

    /// Face-up count of the `from` pile before the move.
    #[inline]
    pub fn from_up_count(self) -> usize {
        debug_assert!(!self.is_stock_move());
        (self.data >> (PAYLOAD_SHIFT + 4) & 0xF) as usize
    }

    /// Number of elementary moves this `MoveSpec` implies.
    #[inline]
    pub fn n_moves(self) -> u32 {
        self.data >> N_MOVES_SHIFT & N_MOVES_MASK
    }

    #[inline]
    pub fn ladder_suit(self) -> Suit {
        Suit::from_index((self.data >> LADDER_SUIT_SHIFT & 0x3) as u8)
    }

    /// The foundation pile a ladder move plays to.
    #[inline]
    pub fn ladder_pile(self) -> PileId {
        PileId::foundation(self.ladder_suit())
    }

    #[inline]
    pub fn recycle(self) -> bool {
        self.data & RECYCLE_BIT != 0
    }

    /// Net number of cards drawn from the stock (negative: undone back to
    /// the stock).
    #[inline]
    pub fn draw_count(self) -> i32 {
        debug_assert!(self.is_stock_move());
        (self.data >> PAYLOAD_SHIFT & 0xFF) as u8 as i8 as i32
    }

    #[inline]
    pub fn flips_top_card(self) -> bool {
        self.data & FLIPS_BIT != 0
    }

    #[inline]
    pub fn set_flips_top_card(&mut self, flips: bool) {
        if flips {
            self.data |= FLIPS_BIT;
        } else {
            self.data &= !FLIPS_BIT;
        }
    }
}

impl Default for MoveSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MoveSpec {
    /// Compact rendering for diagnostics: a stock move prints as
    /// `+3d2>t5` (three elementary moves, net draw two, play to tableau 5,
    /// `c` appended when the talon was recycled); other moves print as
    /// `t1>t4x3u5` (three cards, five previously face-up).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stock_move() {
            write!(f, "+{}d{}", self.n_moves(), self.draw_count())?;
            if self.recycle() {
                write!(f, "c")?;
            }
            write!(f, ">{}", self.to())
        } else {
            write!(f, "{}>{}", self.from(), self.to())?;
            if self.n_cards() != 1 {
                write!(f, "x{}", self.n_cards())?;
            }
            if self.from_up_count() != 0 {
                write!(f, "u{}", self.from_up_count())?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for MoveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Total number of elementary moves implied by a sequence of `MoveSpec`s.
pub fn move_count<'a>(moves: impl IntoIterator<Item = &'a MoveSpec>) -> u32 {
    moves.into_iter().map(|m| m.n_moves()).sum()
}

/// A double-ended move sequence that keeps its elementary move count
/// current as moves are pushed and popped.
#[derive(Clone, Debug, Default)]
pub struct MoveSequence {
    moves: VecDeque<MoveSpec>,
    n_moves: u32,
}

impl MoveSequence {
    pub fn new() -> Self {
        MoveSequence {
            moves: VecDeque::with_capacity(WORKER_SEQUENCE_CAPACITY),
            n_moves: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Sum of `n_moves` over the sequence.
    #[inline]
    pub fn move_count(&self) -> u32 {
        self.n_moves
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.n_moves = 0;
    }

    pub fn push_back(&mut self, mv: MoveSpec) {
        debug_assert!(
            self.moves.len() < WORKER_SEQUENCE_CAPACITY,
            "move sequence overflow; the redundancy filter is missing cycles: {:?}",
            self.moves
        );
        self.n_moves += mv.n_moves();
        self.moves.push_back(mv);
    }

    pub fn push_front(&mut self, mv: MoveSpec) {
        debug_assert!(self.moves.len() < WORKER_SEQUENCE_CAPACITY);
        self.n_moves += mv.n_moves();
        self.moves.push_front(mv);
    }

    pub fn pop_back(&mut self) -> Option<MoveSpec> {
        let mv = self.moves.pop_back()?;
        self.n_moves -= mv.n_moves();
        Some(mv)
    }

    pub fn pop_front(&mut self) -> Option<MoveSpec> {
        let mv = self.moves.pop_front()?;
        self.n_moves -= mv.n_moves();
        Some(mv)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MoveSpec> + '_ {
        self.moves.iter()
    }
}

impl<'a> IntoIterator for &'a MoveSequence {
    type Item = &'a MoveSpec;
    type IntoIter = std::collections::vec_deque::Iter<'a, MoveSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl fmt::Display for MoveSequence {
    /// Renders the sequence as `(t1>t2x2u3, +2d1>cb, ...)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", mv)?;
        }
        write!(f, ")")
    }
}

/// An elementary move for display: one physical transfer of cards.
///
/// Move numbers start at 1 and are not consecutive: a stock `MoveSpec`
/// expands to batched draw transfers whose implied single-card draws each
/// consume a number. Tableau flips are not moves; they are flagged on the
/// move that exposes the face-down card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XMove {
    pub move_num: u32,
    pub from: PileId,
    pub to: PileId,
    pub n_cards: usize,
    pub flip: bool,
}

/// Expand a solved game's `MoveSpec` sequence into elementary moves.
pub fn expand_moves(moves: &[MoveSpec], draw_setting: u32) -> Vec<XMove> {
    let mut stock_size = 24usize;
    let mut waste_size = 0usize;
    let mut move_num = 0u32;
    let mut result = Vec::new();

    for &mv in moves {
        let from = mv.from();
        let to = mv.to();

        if !mv.is_stock_move() {
            let n = mv.n_cards();
            move_num += 1;
            result.push(XMove {
                move_num,
                from,
                to,
                n_cards: n,
                flip: mv.flips_top_card() && !mv.is_ladder_move(),
            });
            if from == PileId::WASTE {
                debug_assert!(waste_size >= 1);
                waste_size -= 1;
            }
            if mv.is_ladder_move() {
                move_num += 1;
                result.push(XMove {
                    move_num,
                    from,
                    to: mv.ladder_pile(),
                    n_cards: 1,
                    flip: mv.flips_top_card(),
                });
            }
        } else {
            debug_assert!(stock_size + waste_size > 0);
            let mut n_talon_moves = mv.n_moves() as usize - 1;
            let stock_moves_left = stock_size.div_ceil(draw_setting as usize);
            if n_talon_moves > stock_moves_left && stock_size > 0 {
                // Draw everything left in the stock as one batch.
                move_num += 1;
                result.push(XMove {
                    move_num,
                    from: PileId::STOCK,
                    to: PileId::WASTE,
                    n_cards: stock_size,
                    flip: false,
                });
                move_num += stock_moves_left as u32 - 1;
                waste_size += stock_size;
                stock_size = 0;
                n_talon_moves -= stock_moves_left;
            }
            if n_talon_moves > 0 {
                move_num += 1;
                if stock_size == 0 {
                    result.push(XMove {
                        move_num,
                        from: PileId::WASTE,
                        to: PileId::STOCK,
                        n_cards: waste_size,
                        flip: false,
                    });
                    stock_size = waste_size;
                    waste_size = 0;
                }
                let n_moved = stock_size.min(n_talon_moves * draw_setting as usize);
                result.push(XMove {
                    move_num,
                    from: PileId::STOCK,
                    to: PileId::WASTE,
                    n_cards: n_moved,
                    flip: false,
                });
                debug_assert!(waste_size + n_moved <= 24);
                stock_size -= n_moved;
                waste_size += n_moved;
                move_num += n_talon_moves as u32 - 1;
            }
            move_num += 1;
            result.push(XMove {
                move_num,
                from: PileId::WASTE,
                to,
                n_cards: 1,
                flip: false,
            });
            debug_assert!(waste_size >= 1);
            waste_size -= 1;
        }
    }
    result
}
