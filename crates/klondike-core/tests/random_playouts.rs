//! Property tests: random legal playouts preserve the engine invariants.
//!
//! A playout deals a seeded deck and repeatedly picks one of the generated
//! moves, checking at every step that the state stays well-formed, that
//! make/unmake is an exact inverse, that the heuristic is consistent, and
//! that the state key is insensitive to tableau pile order.

use klondike_core::search::StateKey;
use klondike_core::{
    minimum_moves_left, numbered_deal, Card, Game, MoveSequence, Suit,
};
use proptest::prelude::*;

fn assert_invariants(game: &Game) {
    // All 52 cards present exactly once.
    let mut seen = [false; 52];
    for pile in game.all_piles() {
        for &card in pile.cards() {
            assert!(!seen[card.index() as usize], "duplicate card {}", card);
            seen[card.index() as usize] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "missing cards");

    // Foundations hold an ace-rooted run of their own suit.
    for suit in Suit::ALL {
        let pile = game.foundation(suit);
        for (rank, &card) in pile.cards().iter().enumerate() {
            assert_eq!(card, Card::new(suit, rank as u8));
        }
    }

    // Tableau face-up runs descend by one with alternating parity.
    for pile in game.tableaus() {
        assert!(pile.up_count() <= pile.len());
        if !pile.is_empty() {
            assert!(pile.up_count() >= 1);
        }
        let run = &pile.cards()[pile.len() - pile.up_count()..];
        for pair in run.windows(2) {
            assert!(
                pair[1].covers(pair[0]),
                "broken run in {}: {} on {}",
                pile.id(),
                pair[1],
                pair[0]
            );
        }
    }

    assert!(game.recycle_count() <= game.recycle_limit());

    // king_spaces is a pure function of the tableau.
    let expected = game
        .tableaus()
        .iter()
        .filter(|p| p.is_empty() || p.at(0).rank() == 12)
        .count() as u32;
    assert_eq!(game.king_spaces(), expected);
}

/// Rebuild the game with its tableau piles reversed and compare keys.
fn assert_key_is_tableau_order_invariant(game: &Game) {
    let t: Vec<(&[Card], usize)> = (0..7)
        .rev()
        .map(|i| {
            let pile = game.tableau(i);
            (pile.cards(), pile.up_count())
        })
        .collect();
    let foundations = [
        game.foundation(Suit::Clubs).len(),
        game.foundation(Suit::Diamonds).len(),
        game.foundation(Suit::Spades).len(),
        game.foundation(Suit::Hearts).len(),
    ];
    let permuted = Game::from_parts(
        game.draw_setting(),
        game.recycle_limit(),
        game.waste().cards(),
        game.stock().cards(),
        [t[0], t[1], t[2], t[3], t[4], t[5], t[6]],
        foundations,
    )
    .expect("permuted position is well-formed");
    assert_eq!(StateKey::new(game), StateKey::new(&permuted));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn playouts_preserve_invariants(
        seed in any::<u64>(),
        draw_three in any::<bool>(),
        choices in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        let draw = if draw_three { 3 } else { 1 };
        let deck = numbered_deal(seed);
        let mut game = Game::new(&deck, draw, 4).expect("full deck");
        let mut moves_made = MoveSequence::new();

        assert_invariants(&game);

        for &choice in &choices {
            let available = game.available_moves(&moves_made);
            if available.is_empty() {
                break;
            }
            let mv = available[choice as usize % available.len()];

            // The heuristic may not drop faster than the move costs.
            let bound_before = minimum_moves_left(&game);

            // Applying and reversing the move restores every field.
            let before = game.clone();
            game.make_move(mv);
            let bound_after = minimum_moves_left(&game);
            prop_assert!(
                bound_before <= mv.n_moves() + bound_after,
                "inconsistent heuristic across {:?}: {} > {} + {}",
                mv, bound_before, mv.n_moves(), bound_after
            );

            game.unmake_move(mv);
            prop_assert!(game == before, "make/unmake did not round-trip {:?}", mv);

            game.make_move(mv);
            moves_made.push_back(mv);
            assert_invariants(&game);
        }

        assert_key_is_tableau_order_invariant(&game);
    }

    #[test]
    fn state_keys_match_iff_games_replay_identically(
        seed in any::<u64>(),
        choices in proptest::collection::vec(any::<u8>(), 1..32),
    ) {
        // Replaying the same choices on the same deal twice produces the
        // same position and therefore the same key.
        let deck = numbered_deal(seed);
        let build = || {
            let mut game = Game::new(&deck, 1, 4).expect("full deck");
            let mut moves_made = MoveSequence::new();
            for &choice in &choices {
                let available = game.available_moves(&moves_made);
                if available.is_empty() {
                    break;
                }
                let mv = available[choice as usize % available.len()];
                game.make_move(mv);
                moves_made.push_back(mv);
            }
            game
        };
        let a = build();
        let b = build();
        prop_assert!(a == b);
        prop_assert_eq!(StateKey::new(&a), StateKey::new(&b));
    }
}
