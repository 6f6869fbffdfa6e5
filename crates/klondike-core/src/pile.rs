//! Piles and pile identifiers
//!
//! A game consists of thirteen piles in a fixed order: the waste, seven
//! tableau piles, the stock, and four foundation piles (one per suit in
//! suit order). The order is load-bearing: the closed-list state key packs
//! piles by this numbering, and the move representation stores pile ids in
//! four bits.

use crate::cards::{Card, Suit};
use std::fmt;

/// Number of tableau piles.
pub const TABLEAU_SIZE: usize = 7;
/// Number of foundation piles.
pub const FOUNDATION_SIZE: usize = 4;
/// Total number of piles in a game.
pub const PILE_COUNT: usize = 13;
/// No pile ever holds more cards than this after the deal.
pub const MAX_PILE_CARDS: usize = 24;

/// Identifier of one of the thirteen piles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PileId(u8);

const TABLEAU_BASE: u8 = 1;
const FOUNDATION_BASE: u8 = 9;

static PILE_NAMES: [&str; PILE_COUNT] = [
    "wa", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "st", "cb", "di", "sp", "ht",
];

impl PileId {
    pub const WASTE: PileId = PileId(0);
    pub const STOCK: PileId = PileId(8);

    /// Sentinel for "no pile"; used by the default move.
    pub const NONE: PileId = PileId(0xF);

    #[inline]
    pub const fn from_index(index: u8) -> Self {
        debug_assert!(index < PILE_COUNT as u8 || index == 0xF);
        PileId(index)
    }

    /// Tableau pile `i` for `i` in `0..7`.
    #[inline]
    pub const fn tableau(i: usize) -> Self {
        debug_assert!(i < TABLEAU_SIZE);
        PileId(TABLEAU_BASE + i as u8)
    }

    /// The foundation pile for `suit`.
    #[inline]
    pub const fn foundation(suit: Suit) -> Self {
        PileId(FOUNDATION_BASE + suit as u8)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_tableau(self) -> bool {
        TABLEAU_BASE <= self.0 && self.0 < TABLEAU_BASE + TABLEAU_SIZE as u8
    }

    #[inline]
    pub const fn is_foundation(self) -> bool {
        FOUNDATION_BASE <= self.0 && self.0 < FOUNDATION_BASE + FOUNDATION_SIZE as u8
    }

    /// For a foundation pile, the suit it collects.
    #[inline]
    pub const fn foundation_suit(self) -> Suit {
        debug_assert!(self.is_foundation());
        Suit::from_index(self.0 - FOUNDATION_BASE)
    }

    /// Short name for diagnostics: `wa`, `t1`..`t7`, `st`, `cb`, `di`, `sp`, `ht`.
    pub fn name(self) -> &'static str {
        PILE_NAMES[self.0 as usize]
    }
}

impl fmt::Display for PileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bounded, ordered pile of cards.
///
/// Index 0 is the bottom. For tableau piles `up_count` is the number of
/// face-up cards at the top; for other piles it is meaningless. Whether a
/// pile is a tableau or foundation pile is cached so the hot paths branch
/// on a byte instead of a range check.
#[derive(Clone, Copy)]
pub struct Pile {
    cards: [Card; MAX_PILE_CARDS],
    len: u8,
    up_count: u8,
    id: PileId,
    is_tableau: bool,
    is_foundation: bool,
}

impl Pile {
    pub fn new(id: PileId) -> Self {
        Pile {
            cards: [Card::default(); MAX_PILE_CARDS],
            len: 0,
            up_count: 0,
            id,
            is_tableau: id.is_tableau(),
            is_foundation: id.is_foundation(),
        }
    }

    #[inline]
    pub const fn id(&self) -> PileId {
        self.id
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn is_tableau(&self) -> bool {
        self.is_tableau
    }

    #[inline]
    pub const fn is_foundation(&self) -> bool {
        self.is_foundation
    }

    #[inline]
    pub const fn up_count(&self) -> usize {
        self.up_count as usize
    }

    #[inline]
    pub fn set_up_count(&mut self, up: usize) {
        debug_assert!(up <= self.len());
        self.up_count = up as u8;
    }

    #[inline]
    pub fn incr_up_count(&mut self, delta: i32) {
        let up = self.up_count as i32 + delta;
        debug_assert!(0 <= up && up <= self.len as i32);
        self.up_count = up as u8;
    }

    #[inline]
    pub fn cards(&self) -> &[Card] {
        &self.cards[..self.len as usize]
    }

    #[inline]
    pub fn at(&self, i: usize) -> Card {
        debug_assert!(i < self.len());
        self.cards[i]
    }

    /// The topmost card. The pile must be non-empty.
    #[inline]
    pub fn top(&self) -> Card {
        debug_assert!(!self.is_empty());
        self.cards[self.len as usize - 1]
    }

    /// The bottom-most face-up card (the base of the face-up run).
    #[inline]
    pub fn face_up_base(&self) -> Card {
        debug_assert!(self.up_count > 0 && self.up_count <= self.len);
        self.cards[(self.len - self.up_count) as usize]
    }

    #[inline]
    pub fn push(&mut self, card: Card) {
        debug_assert!(self.len() < MAX_PILE_CARDS);
        self.cards[self.len as usize] = card;
        self.len += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Card {
        debug_assert!(!self.is_empty());
        self.len -= 1;
        self.cards[self.len as usize]
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.up_count = 0;
    }

    /// Move the top card of `from` onto this pile.
    #[inline]
    pub fn draw_from(&mut self, from: &mut Pile) {
        let card = from.pop();
        self.push(card);
    }

    /// Take the top `n` cards from `donor`, preserving their order.
    pub fn take(&mut self, donor: &mut Pile, n: usize) {
        debug_assert!(n <= donor.len());
        debug_assert!(self.len() + n <= MAX_PILE_CARDS);
        let start = donor.len() - n;
        for i in start..donor.len() {
            self.cards[self.len as usize] = donor.cards[i];
            self.len += 1;
        }
        donor.len = start as u8;
    }

    /// If `n > 0`, move the top `n` cards of `other` here one at a time,
    /// reversing their order. If `n < 0`, do the opposite.
    pub fn draw_n(&mut self, other: &mut Pile, n: i32) {
        if n < 0 {
            for _ in 0..-n {
                other.draw_from(self);
            }
        } else {
            for _ in 0..n {
                self.draw_from(other);
            }
        }
    }
}

impl fmt::Display for Pile {
    /// Renders like `t3: c4 d9| s8 h7` with `|` marking the face-up boundary.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.id.name())?;
        let boundary = self.len() - self.up_count();
        for (i, card) in self.cards().iter().enumerate() {
            let sep = if self.is_tableau && i == boundary { '|' } else { ' ' };
            write!(f, "{}{}", sep, card)?;
        }
        Ok(())
    }
}
