//! Card representation and deck construction
//!
//! A card packs its suit and rank into a single byte. The two derived
//! predicates that drive tableau stacking are `odd_red` (rank and suit
//! parities agree) and `covers` (this card may be placed on that one).

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fmt;

/// Number of ranks in a suit (ace through king).
pub const CARDS_PER_SUIT: usize = 13;
/// Number of suits in a deck.
pub const SUITS_PER_DECK: usize = 4;
/// Number of cards in a full deck.
pub const CARDS_PER_DECK: usize = CARDS_PER_SUIT * SUITS_PER_DECK;

/// Rank of an ace (ranks are zero-based).
pub const ACE: u8 = 0;
/// Rank of a king.
pub const KING: u8 = 12;

const SUIT_CHARS: [char; 4] = ['c', 'd', 's', 'h'];
const RANK_CHARS: [char; 13] = ['a', '2', '3', '4', '5', '6', '7', '8', '9', 't', 'j', 'q', 'k'];

/// Card suit. The discriminants are load-bearing: `suit >> 1` selects the
/// major suits (spades and hearts) and `suit & 1` selects the red suits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Spades = 2,
    Hearts = 3,
}

impl Suit {
    /// All four suits in discriminant order.
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Spades, Suit::Hearts];

    #[inline]
    pub const fn from_index(index: u8) -> Self {
        debug_assert!(index < 4);
        match index {
            0 => Suit::Clubs,
            1 => Suit::Diamonds,
            2 => Suit::Spades,
            _ => Suit::Hearts,
        }
    }
}

/// A playing card packed into one byte.
///
/// Encoded as `suit << 4 | rank`: suit in the high nibble, zero-based rank
/// (0 = ace .. 12 = king) in the low nibble.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Card(u8);

impl Card {
    #[inline]
    pub const fn new(suit: Suit, rank: u8) -> Self {
        debug_assert!(rank <= KING);
        Card((suit as u8) << 4 | rank)
    }

    /// Build a card from its deck index (`suit * 13 + rank`, 0..52).
    #[inline]
    pub const fn from_index(index: u8) -> Self {
        debug_assert!((index as usize) < CARDS_PER_DECK);
        Card::new(
            Suit::from_index(index / CARDS_PER_SUIT as u8),
            index % CARDS_PER_SUIT as u8,
        )
    }

    /// Deck index of this card (`suit * 13 + rank`).
    #[inline]
    pub const fn index(self) -> u8 {
        (self.0 >> 4) * CARDS_PER_SUIT as u8 + (self.0 & 0xF)
    }

    #[inline]
    pub const fn suit(self) -> Suit {
        Suit::from_index(self.0 >> 4)
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 & 0xF
    }

    /// True for hearts and spades.
    #[inline]
    pub const fn is_major(self) -> bool {
        (self.0 >> 4) >> 1 != 0
    }

    /// Parity class for tableau stacking: true for cards that sit on stacks
    /// where odd ranks are red. Two cards can be adjacent in a face-up run
    /// only if their `odd_red` values agree.
    #[inline]
    pub const fn odd_red(self) -> bool {
        ((self.0 & 0xF) ^ (self.0 >> 4)) & 1 != 0
    }

    /// Can this card be placed on `other` in a tableau run?
    #[inline]
    pub const fn covers(self, other: Card) -> bool {
        self.rank() + 1 == other.rank() && self.odd_red() == other.odd_red()
    }

    /// Two-character name like `"ca"` (ace of clubs) or `"ht"` (ten of hearts).
    pub fn as_string(self) -> String {
        let mut s = String::with_capacity(2);
        s.push(SUIT_CHARS[(self.0 >> 4) as usize]);
        s.push(RANK_CHARS[(self.0 & 0xF) as usize]);
        s
    }

    /// Parse a card from a string like `"ah"`, `"s8"`, `"D10"` or `"tc"`.
    ///
    /// Characters that cannot appear in a card name are ignored, the suit
    /// may come before or after the rank, and case is insignificant.
    pub fn parse(input: &str) -> Option<Card> {
        let filtered: String = input
            .chars()
            .filter_map(|c| {
                let c = c.to_ascii_lowercase();
                (SUIT_CHARS.contains(&c) || RANK_CHARS.contains(&c) || c == '1' || c == '0')
                    .then_some(c)
            })
            .collect();
        if filtered.len() != 2 && filtered.len() != 3 {
            return None;
        }

        let mut chars = filtered.chars();
        let first = chars.next()?;
        let (suit, rank_str) = if let Some(i) = SUIT_CHARS.iter().position(|&s| s == first) {
            (Suit::from_index(i as u8), &filtered[1..])
        } else {
            let last = filtered.chars().last()?;
            let i = SUIT_CHARS.iter().position(|&s| s == last)?;
            (
                Suit::from_index(i as u8),
                &filtered[..filtered.len() - 1],
            )
        };

        let rank_str = if rank_str == "10" { "t" } else { rank_str };
        if rank_str.len() != 1 {
            return None;
        }
        let rank_ch = rank_str.chars().next()?;
        let rank = RANK_CHARS.iter().position(|&r| r == rank_ch)? as u8;
        Some(Card::new(suit, rank))
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// A full deck in some order.
pub type CardDeck = [Card; CARDS_PER_DECK];

/// The deck in index order: all clubs ace..king, then diamonds, spades, hearts.
pub fn standard_deck() -> CardDeck {
    let mut deck = [Card::default(); CARDS_PER_DECK];
    for (i, card) in deck.iter_mut().enumerate() {
        *card = Card::from_index(i as u8);
    }
    deck
}

/// Reproducibly shuffle a deck with a seeded generator.
pub fn shuffle(deck: &mut [Card], seed: u64) {
    let n = deck.len();
    if n < 2 {
        return;
    }
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    for i in 0..n - 1 {
        let j = rng.gen_range(i..n);
        deck.swap(i, j);
    }
}

/// Generate the shuffled deck for a numbered deal.
pub fn numbered_deal(seed: u64) -> CardDeck {
    let mut deck = standard_deck();
    shuffle(&mut deck, seed);
    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_round_trips_through_index() {
        for i in 0..CARDS_PER_DECK as u8 {
            let card = Card::from_index(i);
            assert_eq!(card.index(), i);
            assert_eq!(Card::new(card.suit(), card.rank()), card);
        }
    }

    #[test]
    fn major_and_parity_predicates() {
        assert!(!Card::new(Suit::Clubs, 0).is_major());
        assert!(!Card::new(Suit::Diamonds, 5).is_major());
        assert!(Card::new(Suit::Spades, 12).is_major());
        assert!(Card::new(Suit::Hearts, 3).is_major());

        // Odd clubs are black, so odd ranks on red stacks come from red suits.
        assert!(Card::new(Suit::Clubs, 1).odd_red());
        assert!(!Card::new(Suit::Clubs, 2).odd_red());
        assert!(!Card::new(Suit::Diamonds, 1).odd_red());
        assert!(Card::new(Suit::Diamonds, 2).odd_red());
    }

    #[test]
    fn covers_requires_adjacent_rank_and_matching_parity() {
        let five_d = Card::parse("d5").unwrap();
        let four_s = Card::parse("s4").unwrap();
        let four_h = Card::parse("h4").unwrap();
        let three_d = Card::parse("d3").unwrap();

        assert!(four_s.covers(five_d));
        assert!(!four_h.covers(five_d)); // red on red
        assert!(!three_d.covers(five_d)); // rank gap
        assert!(!five_d.covers(four_s)); // wrong direction
    }

    #[test]
    fn parse_accepts_both_orders_and_ten_spellings() {
        let tc = Card::new(Suit::Clubs, 9);
        assert_eq!(Card::parse("tc"), Some(tc));
        assert_eq!(Card::parse("ct"), Some(tc));
        assert_eq!(Card::parse("c10"), Some(tc));
        assert_eq!(Card::parse("10C"), Some(tc));
        assert_eq!(Card::parse("Ah"), Some(Card::new(Suit::Hearts, ACE)));
        assert_eq!(Card::parse("s8"), Some(Card::new(Suit::Spades, 7)));
        assert_eq!(Card::parse(""), None);
        assert_eq!(Card::parse("zz"), None);
    }

    #[test]
    fn parse_inverts_as_string() {
        for i in 0..CARDS_PER_DECK as u8 {
            let card = Card::from_index(i);
            assert_eq!(Card::parse(&card.as_string()), Some(card));
        }
    }

    #[test]
    fn numbered_deal_is_a_permutation() {
        let deck = numbered_deal(42);
        let mut seen = [false; CARDS_PER_DECK];
        for card in deck {
            assert!(!seen[card.index() as usize]);
            seen[card.index() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn numbered_deal_is_reproducible() {
        assert_eq!(numbered_deal(7), numbered_deal(7));
        assert_ne!(numbered_deal(7), numbered_deal(8));
    }
}
