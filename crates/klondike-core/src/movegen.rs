//! Move generation
//!
//! `available_moves` returns the children of the current position,
//! partitioned by dominance. A *dominant* move plays a card of rank no
//! greater than one above the shortest foundation pile to its foundation
//! from the waste, a tableau top, or (draw-1 only) the stock top. If the
//! game can be won from a position, no line that delays an available
//! dominant move beats the best line that makes it immediately, so when
//! any dominant move exists the generator returns exactly one move and the
//! caller takes it without considering alternatives. Pending dominant
//! moves are held in a small cache and handed out one per call.
//!
//! Non-dominant generation enumerates tableau-to-foundation and
//! tableau-to-tableau moves (including ladder moves), talon plays reached
//! by simulated draws, and the foundation-to-tableau moves whose reversal
//! would not itself be dominant.

use crate::cards::{Card, KING};
use crate::filter::filter_redundant_moves;
use crate::game::Game;
use crate::moves::{MoveSequence, MoveSpec, QMoves};
use crate::pile::{Pile, PileId};
use smallvec::SmallVec;

/// A playable talon card discovered by the forward walk: how many
/// elementary moves reach it, the net change in waste size, and whether
/// the walk wrapped through a recycle.
struct TalonFuture {
    card: Card,
    n_moves: u32,
    draw_count: i32,
    recycle: bool,
}

/// Simulates draws and recycles over the talon without touching the piles.
struct TalonSim<'a> {
    waste: &'a Pile,
    stock: &'a Pile,
    waste_size: usize,
    stock_size: usize,
}

impl<'a> TalonSim<'a> {
    fn new(game: &'a Game) -> Self {
        TalonSim {
            waste: game.waste(),
            stock: game.stock(),
            waste_size: game.waste().len(),
            stock_size: game.stock().len(),
        }
    }

    fn cycle(&mut self) {
        self.stock_size += self.waste_size;
        self.waste_size = 0;
    }

    fn draw(&mut self, n: usize) {
        let n = n.min(self.stock_size);
        self.waste_size += n;
        self.stock_size -= n;
    }

    /// Top card of the simulated waste pile.
    fn top_card(&self) -> Card {
        if self.waste_size <= self.waste.len() {
            self.waste.at(self.waste_size - 1)
        } else {
            let from_stock = self.waste_size - self.waste.len();
            self.stock.at(self.stock.len() - from_stock)
        }
    }
}

impl Game {
    /// The moves available from this position, already passed through the
    /// redundancy filter. When dominant moves exist the result has exactly
    /// one element; an empty result means a dead end or a won game.
    pub fn available_moves(&mut self, moves_made: &MoveSequence) -> QMoves {
        let mut avail = QMoves::new();
        let min_foundation = self.min_foundation_size();
        if min_foundation == crate::cards::CARDS_PER_SUIT {
            return avail; // game won
        }

        if self.dominant_cache.is_empty() {
            let mut cache = std::mem::take(&mut self.dominant_cache);
            self.dominant_available_moves(&mut cache, min_foundation);
            filter_redundant_moves(&mut cache, moves_made);
            self.dominant_cache = cache;
        }
        if let Some(mv) = self.dominant_cache.pop() {
            avail.push(mv);
            return avail;
        }

        self.non_dominant_available_moves(&mut avail, min_foundation);
        filter_redundant_moves(&mut avail, moves_made);
        avail
    }

    /// Collect every available dominant move.
    fn dominant_available_moves(
        &self,
        cache: &mut SmallVec<[MoveSpec; 9]>,
        min_foundation: usize,
    ) {
        // The waste pile and every tableau pile can source a dominant move.
        for pile in std::iter::once(self.waste()).chain(self.tableaus().iter()) {
            if pile.is_empty() {
                continue;
            }
            let card = pile.top();
            if card.rank() as usize <= min_foundation + 1 && self.can_move_to_foundation(card) {
                let to = PileId::foundation(card.suit());
                let up = if pile.id() == PileId::WASTE { 0 } else { pile.up_count() };
                let mut mv = MoveSpec::non_stock_move(pile.id(), to, 1, up);
                mv.set_flips_top_card(pile.is_tableau() && up == 1 && pile.len() > 1);
                cache.push(mv);
            }
        }
        if self.draw_setting() == 1 && !self.stock().is_empty() {
            let card = self.stock().top();
            if card.rank() as usize <= min_foundation + 1 && self.can_move_to_foundation(card) {
                // Draw one card and play it straight to the foundation.
                let to = PileId::foundation(card.suit());
                cache.push(MoveSpec::stock_move(to, 2, 1, false));
            }
        }
    }

    fn non_dominant_available_moves(&self, moves: &mut QMoves, min_foundation: usize) {
        self.moves_from_tableau(moves);
        self.moves_from_talon(moves, min_foundation);
        self.moves_from_foundation(moves, min_foundation);
    }

    /// Tableau-to-foundation and tableau-to-tableau moves.
    ///
    /// Cards move between tableau piles only to (a) move a whole face-up
    /// run so as to flip a face-down card or clear a column some king still
    /// needs, or (b) uncover a card that can go to its foundation, in which
    /// case the move is emitted as a ladder move that plays it there.
    fn moves_from_tableau(&self, moves: &mut QMoves) {
        for from_pile in self.tableaus() {
            if from_pile.is_empty() {
                continue;
            }
            let from_tip = from_pile.top();
            let from_base = from_pile.face_up_base();
            let up_count = from_pile.up_count();

            if self.can_move_to_foundation(from_tip) {
                let to = PileId::foundation(from_tip.suit());
                let mut mv = MoveSpec::non_stock_move(from_pile.id(), to, 1, up_count);
                mv.set_flips_top_card(up_count == 1 && from_pile.len() > 1);
                moves.push(mv);
            }

            let mut king_moved = false; // one empty column per king is enough
            for to_pile in self.tableaus() {
                if std::ptr::eq(from_pile, to_pile) {
                    continue;
                }
                if to_pile.is_empty() {
                    if !king_moved
                        && from_base.rank() == KING
                        && from_pile.len() > up_count
                    {
                        // A king run covering at least one face-down card
                        // moves to the empty column and flips it.
                        let mut mv = MoveSpec::non_stock_move(
                            from_pile.id(),
                            to_pile.id(),
                            up_count,
                            up_count,
                        );
                        mv.set_flips_top_card(true);
                        moves.push(mv);
                        king_moved = true;
                    }
                    continue;
                }

                let card_to_cover = to_pile.top();
                let to_rank = card_to_cover.rank() as usize;
                if (from_tip.rank() as usize) < to_rank
                    && to_rank <= from_base.rank() as usize + 1
                    && from_tip.odd_red() == card_to_cover.odd_red()
                {
                    // Some face-up card in the from pile covers the top of
                    // the to pile.
                    let move_count = to_rank - from_tip.rank() as usize;
                    debug_assert!(move_count <= up_count);
                    if move_count == up_count
                        && (up_count < from_pile.len() || self.need_king_space())
                    {
                        debug_assert!(from_base.covers(card_to_cover));
                        let mut mv = MoveSpec::non_stock_move(
                            from_pile.id(),
                            to_pile.id(),
                            up_count,
                            up_count,
                        );
                        mv.set_flips_top_card(up_count < from_pile.len());
                        moves.push(mv);
                    } else if move_count < up_count || up_count < from_pile.len() {
                        let uncovered = from_pile.at(from_pile.len() - move_count - 1);
                        if self.can_move_to_foundation(uncovered) {
                            debug_assert!(from_pile
                                .at(from_pile.len() - move_count)
                                .covers(card_to_cover));
                            let mut mv = MoveSpec::ladder_move(
                                from_pile.id(),
                                to_pile.id(),
                                move_count,
                                up_count,
                                uncovered,
                            );
                            mv.set_flips_top_card(up_count == move_count + 1);
                            moves.push(mv);
                        }
                    }
                }
            }
        }
    }

    /// Every distinct playable card reachable by walking the talon forward,
    /// with the cost of reaching it. Allows at most one recycle beyond the
    /// current count and respects the recycle limit.
    fn talon_cards(&self) -> SmallVec<[TalonFuture; 24]> {
        let mut result = SmallVec::new();
        if self.waste().len() + self.stock().len() == 0 {
            return result;
        }

        let mut talon = TalonSim::new(self);
        let original_waste = talon.waste_size;
        let draw_setting = self.draw_setting() as usize;
        let mut n_moves = 0u32;
        let mut n_recycles = 0u32;
        let max_recycles = self
            .recycle_limit()
            .saturating_sub(self.recycle_count())
            .min(1);

        loop {
            if talon.waste_size > 0 {
                result.push(TalonFuture {
                    card: talon.top_card(),
                    n_moves,
                    draw_count: talon.waste_size as i32 - original_waste as i32,
                    recycle: n_recycles > 0,
                });
            }
            if talon.stock_size > 0 {
                n_moves += 1;
                talon.draw(draw_setting);
            } else {
                n_recycles += 1;
                talon.cycle();
            }
            if talon.waste_size == original_waste || n_recycles > max_recycles {
                break;
            }
        }
        result
    }

    /// Moves that play a talon card, including cards only reachable after
    /// one or more draws. In draw-1 mode the scan stops at the first card
    /// whose foundation play is dominant; nothing beyond it can do better.
    fn moves_from_talon(&self, moves: &mut QMoves, min_foundation: usize) {
        for future in self.talon_cards() {
            if self.can_move_to_foundation(future.card) {
                let to = PileId::foundation(future.card.suit());
                moves.push(MoveSpec::stock_move(
                    to,
                    future.n_moves + 1,
                    future.draw_count,
                    future.recycle,
                ));
                if future.card.rank() as usize <= min_foundation + 1 {
                    if self.draw_setting() == 1 {
                        break;
                    }
                    // In draw-N mode a deeper card may enable a better
                    // move, but for this card the foundation is best.
                    continue;
                }
            }

            for to_pile in self.tableaus() {
                if !to_pile.is_empty() {
                    if future.card.covers(to_pile.top()) {
                        moves.push(MoveSpec::stock_move(
                            to_pile.id(),
                            future.n_moves + 1,
                            future.draw_count,
                            future.recycle,
                        ));
                    }
                } else if future.card.rank() == KING {
                    moves.push(MoveSpec::stock_move(
                        to_pile.id(),
                        future.n_moves + 1,
                        future.draw_count,
                        future.recycle,
                    ));
                    break; // one empty column per king
                }
            }
        }
    }

    /// Foundation-to-tableau moves. Only piles more than two cards above
    /// the shortest foundation may give a card back; otherwise the reverse
    /// of the move would be dominant and the pair would oscillate.
    fn moves_from_foundation(&self, moves: &mut QMoves, min_foundation: usize) {
        for f_pile in self.foundations() {
            if f_pile.len() <= min_foundation + 2 {
                continue;
            }
            let top = f_pile.top();
            for t_pile in self.tableaus() {
                if !t_pile.is_empty() {
                    if top.covers(t_pile.top()) {
                        moves.push(MoveSpec::non_stock_move(f_pile.id(), t_pile.id(), 1, 0));
                    }
                } else if top.rank() == KING {
                    moves.push(MoveSpec::non_stock_move(f_pile.id(), t_pile.id(), 1, 0));
                    break; // one empty column per king
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{standard_deck, Suit};
    use crate::pile::{FOUNDATION_SIZE, TABLEAU_SIZE};

    fn card(s: &str) -> Card {
        Card::parse(s).unwrap()
    }

    /// Split every card not in `exclude` between the stock and the waste.
    fn stock_and_waste(exclude: &[Card]) -> (Vec<Card>, Vec<Card>) {
        let rest: Vec<Card> = standard_deck()
            .into_iter()
            .filter(|c| !exclude.contains(c))
            .collect();
        assert!(rest.len() <= 48);
        let stock = rest[..rest.len().min(24)].to_vec();
        let waste = rest[rest.len().min(24)..].to_vec();
        (stock, waste)
    }

    fn no_moves_made() -> MoveSequence {
        MoveSequence::new()
    }

    #[test]
    fn dominant_ace_is_returned_alone() {
        // An ace on a tableau top dominates everything else. The parked
        // high hearts keep the remaining cards within talon capacity
        // without enabling any foundation play.
        let exclude = [card("ca"), card("hk"), card("hq"), card("hj")];
        let (stock, waste) = stock_and_waste(&exclude);
        let mut game = Game::from_parts(
            1,
            u32::MAX,
            &waste,
            &stock,
            [
                (&[card("ca")], 1),
                (&[card("hk")], 1),
                (&[card("hq")], 1),
                (&[card("hj")], 1),
                (&[], 0),
                (&[], 0),
                (&[], 0),
            ],
            [0; FOUNDATION_SIZE],
        )
        .unwrap();

        let avail = game.available_moves(&no_moves_made());
        assert_eq!(avail.len(), 1);
        let mv = avail[0];
        assert_eq!(mv.from(), PileId::tableau(0));
        assert_eq!(mv.to(), PileId::foundation(Suit::Clubs));
        assert_eq!(mv.n_moves(), 1);
    }

    #[test]
    fn multiple_dominant_moves_come_one_at_a_time() {
        let exclude = [card("ca"), card("da"), card("hk"), card("hq")];
        let (stock, waste) = stock_and_waste(&exclude);
        let mut game = Game::from_parts(
            1,
            u32::MAX,
            &waste,
            &stock,
            [
                (&[card("ca")], 1),
                (&[card("da")], 1),
                (&[card("hk")], 1),
                (&[card("hq")], 1),
                (&[], 0),
                (&[], 0),
                (&[], 0),
            ],
            [0; FOUNDATION_SIZE],
        )
        .unwrap();

        let first = game.available_moves(&no_moves_made());
        assert_eq!(first.len(), 1);
        game.make_move(first[0]);
        let second = game.available_moves(&no_moves_made());
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].from(), second[0].from());
        assert!(second[0].to().is_foundation());
    }

    #[test]
    fn draw_one_stock_top_ace_is_dominant() {
        // The spade ace sits on top of the stock; in draw-1 mode drawing
        // and playing it is dominant (two elementary moves). The other
        // aces are already up and hk is parked on a tableau pile so the
        // rest fits in the talon.
        let exclude = [card("ca"), card("da"), card("ha"), card("sa"), card("hk")];
        let rest: Vec<Card> = standard_deck()
            .into_iter()
            .filter(|c| !exclude.contains(c))
            .collect();
        let waste = &rest[23..]; // 24 cards
        let mut stock = rest[..23].to_vec();
        stock.push(card("sa"));
        let hk = [card("hk")];
        let mut game = Game::from_parts(
            1,
            u32::MAX,
            waste,
            &stock,
            [
                (&hk, 1),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
            ],
            [1, 1, 0, 1],
        )
        .unwrap();

        let avail = game.available_moves(&no_moves_made());
        assert_eq!(avail.len(), 1);
        let mv = avail[0];
        assert!(mv.is_stock_move());
        assert_eq!(mv.to(), PileId::foundation(Suit::Spades));
        assert_eq!(mv.n_moves(), 2);
        assert_eq!(mv.draw_count(), 1);
    }

    #[test]
    fn king_to_empty_requires_a_covered_face_down_card() {
        // t1: a bare king (nothing face-down beneath) must not move to the
        // empty column; t2: a king covering a face-down card may. The club
        // ace is already up so the rest fits in the talon.
        let exclude = [card("ck"), card("dk"), card("h7"), card("ca")];
        let (stock, waste) = stock_and_waste(&exclude);
        let mut game = Game::from_parts(
            3,
            u32::MAX,
            &waste,
            &stock,
            [
                (&[card("ck")], 1),
                (&[card("h7"), card("dk")], 1),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
            ],
            [1, 0, 0, 0],
        )
        .unwrap();

        let avail = game.available_moves(&no_moves_made());
        let king_moves: Vec<_> = avail
            .iter()
            .filter(|m| !m.is_stock_move() && m.from().is_tableau() && m.to().is_tableau())
            .collect();
        assert_eq!(king_moves.len(), 1);
        assert_eq!(king_moves[0].from(), PileId::tableau(1));
        assert!(king_moves[0].flips_top_card());
        assert_eq!(king_moves[0].n_cards(), 1);
    }

    #[test]
    fn full_run_move_needs_flip_or_needed_space() {
        // t1 holds its full face-up run h6 s5 with no face-down cards, a
        // landing spot exists on t6 (c7), and king spaces are satisfied
        // (four kings at pile bottoms), so moving the run would achieve
        // nothing and is not emitted.
        let exclude = [
            card("ck"),
            card("dk"),
            card("sk"),
            card("hk"),
            card("s5"),
            card("h6"),
            card("c7"),
        ];
        let (stock, waste) = stock_and_waste(&exclude);
        let mut game = Game::from_parts(
            3,
            u32::MAX,
            &waste,
            &stock,
            [
                (&[card("h6"), card("s5")], 2),
                (&[card("ck")], 1),
                (&[card("dk")], 1),
                (&[card("sk")], 1),
                (&[card("hk")], 1),
                (&[card("c7")], 1),
                (&[], 0),
            ],
            [0; FOUNDATION_SIZE],
        )
        .unwrap();
        assert!(!game.need_king_space());

        let avail = game.available_moves(&no_moves_made());
        assert!(
            avail
                .iter()
                .all(|m| !(m.from() == PileId::tableau(0) && m.to().is_tableau())),
            "unproductive full-run move was emitted: {:?}",
            avail
        );
    }

    #[test]
    fn ladder_move_is_emitted_for_uncoverable_foundation_card() {
        // t1 face-up run: 3h 2s over a face-down c9; t2 top is 3d.
        // Hearts foundation holds ah 2h. Moving 2s onto 3d uncovers 3h,
        // which can go to its foundation: a ladder move.
        let exclude = [
            card("c9"),
            card("h3"),
            card("s2"),
            card("d3"),
            card("ha"),
            card("h2"),
        ];
        let (stock, waste) = stock_and_waste(&exclude);
        let mut game = Game::from_parts(
            3,
            u32::MAX,
            &waste,
            &stock,
            [
                (&[card("c9"), card("h3"), card("s2")], 2),
                (&[card("d3")], 1),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
            ],
            [0, 0, 0, 2],
        )
        .unwrap();

        let avail = game.available_moves(&no_moves_made());
        let ladders: Vec<_> = avail.iter().filter(|m| m.is_ladder_move()).collect();
        assert_eq!(ladders.len(), 1);
        let mv = ladders[0];
        assert_eq!(mv.from(), PileId::tableau(0));
        assert_eq!(mv.to(), PileId::tableau(1));
        assert_eq!(mv.n_cards(), 1);
        assert_eq!(mv.n_moves(), 2);
        assert_eq!(mv.ladder_suit(), Suit::Hearts);
        assert!(mv.flips_top_card());
    }

    #[test]
    fn foundation_gives_back_only_from_deep_piles() {
        // Foundations: clubs 5, diamonds 2, spades 2, hearts 2 (min 2).
        // Only clubs exceeds min + 2, so only the 5c may come down, onto
        // the red six.
        let exclude: Vec<Card> = (0..5)
            .map(|r| Card::new(Suit::Clubs, r))
            .chain((0..2).flat_map(|r| {
                [Suit::Diamonds, Suit::Spades, Suit::Hearts]
                    .into_iter()
                    .map(move |s| Card::new(s, r))
            }))
            .chain([card("d6"), card("h9")])
            .collect();
        let (stock, waste) = stock_and_waste(&exclude);
        let mut game = Game::from_parts(
            3,
            u32::MAX,
            &waste,
            &stock,
            [
                (&[card("d6")], 1),
                (&[card("h9")], 1),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
                (&[], 0),
            ],
            [5, 2, 2, 2],
        )
        .unwrap();

        let avail = game.available_moves(&no_moves_made());
        let give_backs: Vec<_> = avail
            .iter()
            .filter(|m| !m.is_stock_move() && m.from().is_foundation())
            .collect();
        assert_eq!(give_backs.len(), 1);
        assert_eq!(give_backs[0].from(), PileId::foundation(Suit::Clubs));
        assert_eq!(give_backs[0].to(), PileId::tableau(0));
    }

    #[test]
    fn talon_walk_respects_recycle_limit() {
        // A king sits three cards up from the bottom of the waste, so with
        // draw 3 it is only reachable after a recycle. All four aces are up
        // already so the 48 remaining cards fit in the talon.
        let exclude = [card("ca"), card("da"), card("sa"), card("ha"), card("ck")];
        let (stock, waste) = stock_and_waste(&exclude);
        let mut waste = waste;
        waste.insert(2, card("ck"));

        // recycle_limit 0: the walk must not wrap.
        let mut game = Game::from_parts(
            3,
            0,
            &waste,
            &stock,
            [(&[], 0); TABLEAU_SIZE],
            [1; FOUNDATION_SIZE],
        )
        .unwrap();
        let avail = game.available_moves(&no_moves_made());
        assert!(
            avail.iter().all(|m| !m.recycle()),
            "recycle move emitted despite recycle_limit 0: {:?}",
            avail
        );

        // With one recycle allowed the buried king becomes reachable and
        // may move to an empty column.
        let mut game = Game::from_parts(
            3,
            1,
            &waste,
            &stock,
            [(&[], 0); TABLEAU_SIZE],
            [1; FOUNDATION_SIZE],
        )
        .unwrap();
        let avail = game.available_moves(&no_moves_made());
        assert!(avail.iter().any(|m| m.recycle() && m.to().is_tableau()));
    }

    #[test]
    fn draw_three_exposes_every_third_card() {
        // With draw 3 and an empty waste, the reachable cards are the
        // third, sixth, ... stock cards counted from the top.
        let deck = standard_deck();
        let game = Game::new(&deck, 3, u32::MAX).unwrap();
        let futures = game.talon_cards();
        // 24 stock cards: 8 draws expose 8 distinct cards.
        assert_eq!(futures.len(), 8);
        assert_eq!(futures[0].n_moves, 1);
        assert_eq!(futures[0].draw_count, 3);
        // Each draw of three exposes the card three deeper.
        let stock = game.stock();
        assert_eq!(futures[0].card, stock.at(stock.len() - 3));
        assert_eq!(futures[1].card, stock.at(stock.len() - 6));
        assert!(futures.iter().all(|f| !f.recycle));
    }
}
