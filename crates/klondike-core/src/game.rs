//! Game state: the thirteen piles and the moves between them
//!
//! `Game` owns the piles, applies and reverses `MoveSpec`s, and validates
//! candidate moves. `make_move` and `unmake_move` are exact inverses for
//! every legal move; the worker loop relies on this to explore children
//! cheaply by apply/undo on a private game.
//!
//! `king_spaces` counts the tableau piles that are empty or have a king at
//! the bottom. While it is below four, emptying a column is still useful
//! (some king may need the space), which the move generator uses to decide
//! whether clearing a column is productive.

use crate::cards::{Card, CardDeck, Suit, CARDS_PER_DECK, CARDS_PER_SUIT, KING};
use crate::moves::MoveSpec;
use crate::pile::{Pile, PileId, FOUNDATION_SIZE, PILE_COUNT, TABLEAU_SIZE};
use smallvec::SmallVec;
use std::fmt;

/// Cards dealt to the tableau; the rest go to the stock.
const TABLEAU_DEAL: usize = 28;

/// Why a `Game` could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealError {
    /// The deck did not contain exactly 52 cards.
    WrongDeckSize(usize),
    /// A card appeared more than once.
    DuplicateCard(Card),
    /// The draw setting must be at least one.
    InvalidDrawSetting,
    /// A hand-built position violated a structural rule.
    InvalidPosition(&'static str),
}

impl fmt::Display for DealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealError::WrongDeckSize(n) => write!(f, "deck has {} cards, expected 52", n),
            DealError::DuplicateCard(c) => write!(f, "card {} appears more than once", c),
            DealError::InvalidDrawSetting => write!(f, "draw setting must be positive"),
            DealError::InvalidPosition(what) => write!(f, "invalid position: {}", what),
        }
    }
}

impl std::error::Error for DealError {}

/// The state a game returns to when `reset` is called.
#[derive(Clone)]
struct Snapshot {
    piles: [Pile; PILE_COUNT],
    recycle_count: u32,
    king_spaces: u32,
}

/// A game of Klondike Solitaire.
#[derive(Clone)]
pub struct Game {
    piles: [Pile; PILE_COUNT],
    draw_setting: u32,
    recycle_limit: u32,
    recycle_count: u32,
    king_spaces: u32,
    pub(crate) dominant_cache: SmallVec<[MoveSpec; 9]>,
    initial: Snapshot,
}

fn empty_piles() -> [Pile; PILE_COUNT] {
    let mut i = 0;
    [(); PILE_COUNT].map(|_| {
        let pile = Pile::new(PileId::from_index(i));
        i += 1;
        pile
    })
}

fn check_full_deck(cards: impl IntoIterator<Item = Card>) -> Result<(), DealError> {
    let mut seen = [false; CARDS_PER_DECK];
    let mut count = 0usize;
    for card in cards {
        if seen[card.index() as usize] {
            return Err(DealError::DuplicateCard(card));
        }
        seen[card.index() as usize] = true;
        count += 1;
    }
    if count != CARDS_PER_DECK {
        return Err(DealError::WrongDeckSize(count));
    }
    Ok(())
}

impl Game {
    /// Construct a game from a full deck and deal it.
    ///
    /// `recycle_limit` bounds how many times the waste pile may be turned
    /// back into the stock; pass `u32::MAX` for unlimited.
    pub fn new(deck: &CardDeck, draw_setting: u32, recycle_limit: u32) -> Result<Game, DealError> {
        if draw_setting == 0 {
            return Err(DealError::InvalidDrawSetting);
        }
        check_full_deck(deck.iter().copied())?;

        let mut game = Game {
            piles: empty_piles(),
            draw_setting,
            recycle_limit,
            recycle_count: 0,
            king_spaces: 0,
            dominant_cache: SmallVec::new(),
            initial: Snapshot {
                piles: empty_piles(),
                recycle_count: 0,
                king_spaces: 0,
            },
        };
        game.deal(deck);
        game.take_snapshot();
        Ok(game)
    }

    /// Construct a game already in progress.
    ///
    /// `stock` and `waste` list cards bottom to top (the last stock card is
    /// the next one drawn). Each tableau entry gives the pile bottom to top
    /// with its face-up count. Foundations are given by size; their contents
    /// are implied. The cards must partition a full deck.
    pub fn from_parts(
        draw_setting: u32,
        recycle_limit: u32,
        waste: &[Card],
        stock: &[Card],
        tableau: [(&[Card], usize); TABLEAU_SIZE],
        foundations: [usize; FOUNDATION_SIZE],
    ) -> Result<Game, DealError> {
        if draw_setting == 0 {
            return Err(DealError::InvalidDrawSetting);
        }
        if waste.len() > crate::pile::MAX_PILE_CARDS || stock.len() > crate::pile::MAX_PILE_CARDS {
            return Err(DealError::InvalidPosition("pile over capacity"));
        }
        for (cards, up) in &tableau {
            if cards.len() > crate::pile::MAX_PILE_CARDS {
                return Err(DealError::InvalidPosition("pile over capacity"));
            }
            if *up > cards.len() {
                return Err(DealError::InvalidPosition("face-up count exceeds pile size"));
            }
            if *up == 0 && !cards.is_empty() {
                return Err(DealError::InvalidPosition(
                    "non-empty tableau pile with no face-up cards",
                ));
            }
        }

        let foundation_cards = foundations
            .iter()
            .enumerate()
            .flat_map(|(s, &size)| {
                (0..size as u8).map(move |r| Card::new(Suit::from_index(s as u8), r))
            });
        check_full_deck(
            waste
                .iter()
                .chain(stock.iter())
                .chain(tableau.iter().flat_map(|(cards, _)| cards.iter()))
                .copied()
                .chain(foundation_cards),
        )?;

        let mut game = Game {
            piles: empty_piles(),
            draw_setting,
            recycle_limit,
            recycle_count: 0,
            king_spaces: 0,
            dominant_cache: SmallVec::new(),
            initial: Snapshot {
                piles: empty_piles(),
                recycle_count: 0,
                king_spaces: 0,
            },
        };
        for &card in waste {
            game.piles[PileId::WASTE.index()].push(card);
        }
        for &card in stock {
            game.piles[PileId::STOCK.index()].push(card);
        }
        for (i, (cards, up)) in tableau.iter().enumerate() {
            let pile = &mut game.piles[PileId::tableau(i).index()];
            for &card in *cards {
                pile.push(card);
            }
            pile.set_up_count(*up);
        }
        for (s, &size) in foundations.iter().enumerate() {
            let suit = Suit::from_index(s as u8);
            let pile = &mut game.piles[PileId::foundation(suit).index()];
            for r in 0..size as u8 {
                pile.push(Card::new(suit, r));
            }
        }
        game.king_spaces = game.count_king_spaces();
        game.take_snapshot();
        Ok(game)
    }

    /// Deal the standard Klondike layout from `deck`: 28 cards to the
    /// tableau (pile `i` receives `i + 1` cards, top card face-up), the
    /// remaining 24 to the stock in reverse order, so the last stock card
    /// is the first one drawn.
    fn deal(&mut self, deck: &CardDeck) {
        for pile in &mut self.piles {
            pile.clear();
        }
        self.recycle_count = 0;
        self.king_spaces = 0;

        let mut next = 0;
        for i in 0..TABLEAU_SIZE {
            // A round deals one card to every pile from i onward.
            for j in i..TABLEAU_SIZE {
                self.piles[PileId::tableau(j).index()].push(deck[next]);
                next += 1;
            }
            let pile = &mut self.piles[PileId::tableau(i).index()];
            pile.set_up_count(1);
            if pile.at(0).rank() == KING {
                self.king_spaces += 1;
            }
        }
        let stock = &mut self.piles[PileId::STOCK.index()];
        for &card in deck[TABLEAU_DEAL..].iter().rev() {
            stock.push(card);
        }
    }

    fn take_snapshot(&mut self) {
        self.initial = Snapshot {
            piles: self.piles,
            recycle_count: self.recycle_count,
            king_spaces: self.king_spaces,
        };
    }

    /// Restore the position the game was constructed with.
    pub fn reset(&mut self) {
        self.piles = self.initial.piles;
        self.recycle_count = self.initial.recycle_count;
        self.king_spaces = self.initial.king_spaces;
        self.dominant_cache.clear();
    }

    fn count_king_spaces(&self) -> u32 {
        self.tableaus()
            .iter()
            .filter(|pile| pile.is_empty() || pile.at(0).rank() == KING)
            .count() as u32
    }

    #[inline]
    pub fn pile(&self, id: PileId) -> &Pile {
        &self.piles[id.index()]
    }

    #[inline]
    pub fn waste(&self) -> &Pile {
        &self.piles[PileId::WASTE.index()]
    }

    #[inline]
    pub fn stock(&self) -> &Pile {
        &self.piles[PileId::STOCK.index()]
    }

    #[inline]
    pub fn tableaus(&self) -> &[Pile] {
        &self.piles[1..1 + TABLEAU_SIZE]
    }

    #[inline]
    pub fn tableau(&self, i: usize) -> &Pile {
        &self.piles[PileId::tableau(i).index()]
    }

    #[inline]
    pub fn foundations(&self) -> &[Pile] {
        &self.piles[PILE_COUNT - FOUNDATION_SIZE..]
    }

    #[inline]
    pub fn foundation(&self, suit: Suit) -> &Pile {
        &self.piles[PileId::foundation(suit).index()]
    }

    #[inline]
    pub fn all_piles(&self) -> &[Pile; PILE_COUNT] {
        &self.piles
    }

    #[inline]
    pub fn draw_setting(&self) -> u32 {
        self.draw_setting
    }

    #[inline]
    pub fn recycle_limit(&self) -> u32 {
        self.recycle_limit
    }

    #[inline]
    pub fn recycle_count(&self) -> u32 {
        self.recycle_count
    }

    #[inline]
    pub fn king_spaces(&self) -> u32 {
        self.king_spaces
    }

    /// True while some king may still need an empty column.
    #[inline]
    pub(crate) fn need_king_space(&self) -> bool {
        self.king_spaces < FOUNDATION_SIZE as u32
    }

    /// Can `card` be played to its foundation pile right now?
    #[inline]
    pub fn can_move_to_foundation(&self, card: Card) -> bool {
        card.rank() as usize == self.foundation(card.suit()).len()
    }

    /// Height of the shortest foundation pile.
    pub fn min_foundation_size(&self) -> usize {
        self.foundations()
            .iter()
            .map(|pile| pile.len())
            .min()
            .unwrap_or(0)
    }

    /// True when all 52 cards are on the foundations.
    pub fn game_over(&self) -> bool {
        self.foundations().iter().all(|pile| pile.len() == CARDS_PER_SUIT)
    }

    fn pair_mut(&mut self, a: PileId, b: PileId) -> (&mut Pile, &mut Pile) {
        let (ai, bi) = (a.index(), b.index());
        debug_assert!(ai != bi);
        if ai < bi {
            let (lo, hi) = self.piles.split_at_mut(bi);
            (&mut lo[ai], &mut hi[0])
        } else {
            let (lo, hi) = self.piles.split_at_mut(ai);
            (&mut hi[0], &mut lo[bi])
        }
    }

    /// Apply a legal move.
    pub fn make_move(&mut self, mv: MoveSpec) {
        let to = mv.to();
        if mv.is_stock_move() {
            {
                let (waste, stock) = self.pair_mut(PileId::WASTE, PileId::STOCK);
                waste.draw_n(stock, mv.draw_count());
            }
            let (waste, to_pile) = self.pair_mut(PileId::WASTE, to);
            to_pile.draw_from(waste);
            if to_pile.is_tableau() {
                to_pile.incr_up_count(1);
            }
            if mv.recycle() {
                self.recycle_count += 1;
            }
        } else {
            let n = mv.n_cards();
            let from = mv.from();
            let is_ladder = mv.is_ladder_move();
            {
                let (from_pile, to_pile) = self.pair_mut(from, to);
                to_pile.take(from_pile, n);
                debug_assert!(
                    !(from_pile.is_tableau() && from_pile.up_count() != mv.from_up_count()),
                    "stale from_up_count in {:?}",
                    mv
                );
                if to_pile.is_tableau() {
                    to_pile.incr_up_count(n as i32);
                }
            }
            if is_ladder {
                let (from_pile, fnd) = self.pair_mut(from, mv.ladder_pile());
                fnd.draw_from(from_pile);
            }
            let from_pile = &mut self.piles[from.index()];
            if !from_pile.is_empty() {
                if from_pile.is_tableau() {
                    from_pile.incr_up_count(
                        mv.flips_top_card() as i32 - (n as i32 + is_ladder as i32),
                    );
                }
            } else {
                if from_pile.is_tableau() {
                    self.king_spaces += 1; // a column was cleared
                }
                from_pile.set_up_count(0);
            }
        }
    }

    /// Reverse a move made by `make_move`.
    pub fn unmake_move(&mut self, mv: MoveSpec) {
        let to = mv.to();
        if mv.is_stock_move() {
            {
                let (waste, to_pile) = self.pair_mut(PileId::WASTE, to);
                waste.draw_from(to_pile);
                if to_pile.is_tableau() {
                    to_pile.incr_up_count(-1);
                }
            }
            let (stock, waste) = self.pair_mut(PileId::STOCK, PileId::WASTE);
            stock.draw_n(waste, mv.draw_count());
            if mv.recycle() {
                self.recycle_count -= 1;
            }
        } else {
            let n = mv.n_cards();
            let from = mv.from();
            if mv.is_ladder_move() {
                let (from_pile, fnd) = self.pair_mut(from, mv.ladder_pile());
                let was_empty = from_pile.is_empty();
                from_pile.draw_from(fnd);
                if was_empty {
                    self.king_spaces -= 1;
                }
            }
            let mut cleared_king_space = false;
            {
                let (from_pile, to_pile) = self.pair_mut(from, to);
                if from_pile.is_tableau() && from_pile.is_empty() {
                    cleared_king_space = true; // the move had cleared this column
                }
                from_pile.take(to_pile, n);
                if from_pile.is_tableau() {
                    from_pile.set_up_count(mv.from_up_count());
                }
                if to_pile.is_tableau() {
                    to_pile.incr_up_count(-(n as i32));
                }
            }
            if cleared_king_space {
                self.king_spaces -= 1;
            }
        }
    }

    fn valid_transfer(&self, from: PileId, to: PileId, n_cards: usize) -> bool {
        if from.index() >= PILE_COUNT || to.index() >= PILE_COUNT {
            return false;
        }
        if n_cards == 0 || n_cards > 24 {
            return false;
        }
        let from_pile = self.pile(from);
        let to_pile = self.pile(to);
        if n_cards > from_pile.len() {
            return false;
        }
        let cover_card = from_pile.at(from_pile.len() - n_cards);
        if to_pile.is_tableau() {
            if to_pile.is_empty() {
                if cover_card.rank() != KING {
                    return false;
                }
            } else if !cover_card.covers(to_pile.top()) {
                return false;
            }
        } else if to_pile.is_foundation() {
            if cover_card.suit() != to.foundation_suit() {
                return false;
            }
            if cover_card.rank() as usize != to_pile.len() {
                return false;
            }
        }
        true
    }

    /// Check a move against the current position.
    pub fn is_valid(&self, mv: MoveSpec) -> bool {
        if mv.is_stock_move() {
            let draw = mv.draw_count();
            if draw > 0 {
                self.valid_transfer(PileId::STOCK, mv.to(), draw as usize)
            } else {
                self.valid_transfer(PileId::WASTE, mv.to(), (-draw + 1) as usize)
            }
        } else {
            self.valid_transfer(mv.from(), mv.to(), mv.n_cards())
        }
    }
}

impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        self.draw_setting == other.draw_setting
            && self.recycle_limit == other.recycle_limit
            && self.recycle_count == other.recycle_count
            && self.king_spaces == other.king_spaces
            && self
                .piles
                .iter()
                .zip(other.piles.iter())
                .all(|(a, b)| a.cards() == b.cards() && a.up_count() == b.up_count())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pile in &self.piles {
            writeln!(f, "{}", pile)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Replay `moves` on a fresh copy of `game`, checking each move for
/// legality; true only if every move is legal and the game ends won.
pub fn validate_solution(game: &Game, moves: &[MoveSpec]) -> bool {
    let mut replay = game.clone();
    replay.reset();
    for &mv in moves {
        if !replay.is_valid(mv) {
            return false;
        }
        replay.make_move(mv);
    }
    replay.game_over()
}
