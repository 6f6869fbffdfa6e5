//! State key and closed list
//!
//! Two game states are equal if their foundation, stock, and waste piles
//! match and their tableaus match up to pile order. `StateKey` is a perfect
//! hash of a state under that equivalence: seven 21-bit deflated tableau
//! values, sorted because tableau piles are interchangeable, then the stock
//! size and the four foundation sizes, packed into 176 of 192 bits.
//!
//! The deflated tableau encoding works because the stacking rules pin down
//! a face-up run completely once the bottom face-up card is known and each
//! card above it is classified major or minor: rank descends by one per
//! card and the parity rule plus the major bit select the suit. Face-up
//! runs never exceed twelve cards (nothing ever moves onto an ace), so
//! eleven bits of majors suffice.
//!
//! The closed list maps each key to the lowest move count that has reached
//! it. Stored counts only ever decrease, which is what rules out cycling
//! through a state forever. Lock striping keeps contention bounded; the
//! per-shard maps start large because searches routinely visit millions of
//! states and early rehashes are pure waste.

use crate::game::Game;
use crate::pile::Pile;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};

/// Compact, order-insensitive encoding of a game state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StateKey {
    parts: [u64; 3],
}

/// 21-bit summary of one tableau pile: the bottom face-up card, a major/
/// minor bit per card above it, and the face-up count. Zero for a pile
/// with nothing face-up.
fn deflate_tableau(pile: &Pile) -> u32 {
    let up_count = pile.up_count();
    if up_count == 0 {
        return 0;
    }
    let cards = pile.cards();
    let majors = cards[cards.len() - up_count + 1..]
        .iter()
        .fold(0u32, |acc, card| acc << 1 | card.is_major() as u32);
    let base = pile.face_up_base();
    let base_code = (base.suit() as u32) << 4 | base.rank() as u32;
    (base_code << 11 | majors) << 4 | up_count as u32
}

impl StateKey {
    pub fn new(game: &Game) -> Self {
        let mut tableau_state = [0u32; 7];
        for (slot, pile) in tableau_state.iter_mut().zip(game.tableaus()) {
            *slot = deflate_tableau(pile);
        }
        // Tableaus that differ only in pile order are the same state.
        tableau_state.sort_unstable();

        let t = |i: usize| tableau_state[i] as u64;
        let part0 = (t(0) << 21 | t(1)) << 21 | t(2);
        let part1 = (t(3) << 21 | t(4)) << 21 | t(5);
        let foundations = game.foundations();
        let part2 = ((((t(6) << 5 | game.stock().len() as u64) << 4
            | foundations[0].len() as u64)
            << 4
            | foundations[1].len() as u64)
            << 4
            | foundations[2].len() as u64)
            << 4
            | foundations[3].len() as u64;
        debug_assert!(part2 < 1 << 48);

        StateKey {
            parts: [part0, part1, part2],
        }
    }

    #[inline]
    fn mixed(&self) -> u64 {
        self.parts[0] ^ self.parts[1] ^ self.parts[2]
    }
}

impl Hash for StateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.mixed());
    }
}

const SHARD_COUNT: usize = 256;
const INITIAL_CAPACITY: usize = 4096 * 1024;

/// Lock-striped map from state key to the best known move count.
pub struct ClosedList {
    shards: Vec<Mutex<FxHashMap<StateKey, u16>>>,
}

impl Default for ClosedList {
    fn default() -> Self {
        Self::new()
    }
}

impl ClosedList {
    pub fn new() -> Self {
        debug_assert!(SHARD_COUNT.is_power_of_two());
        let shards = (0..SHARD_COUNT)
            .map(|_| {
                Mutex::new(FxHashMap::with_capacity_and_hasher(
                    INITIAL_CAPACITY / SHARD_COUNT,
                    Default::default(),
                ))
            })
            .collect();
        ClosedList { shards }
    }

    #[inline]
    fn shard_index(&self, key: &StateKey) -> usize {
        key.mixed() as usize & (SHARD_COUNT - 1)
    }

    /// Record that `game` was reached in `move_count` moves. Returns true
    /// if this is the first visit or a strictly shorter path than any seen
    /// before; false means an equal or better path already exists and the
    /// caller should prune.
    pub fn is_short_path(&self, game: &Game, move_count: u32) -> bool {
        debug_assert!(move_count < u16::MAX as u32);
        let key = StateKey::new(game);
        let mut shard = self.shards[self.shard_index(&key)].lock();
        match shard.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if *entry.get() as u32 <= move_count {
                    false
                } else {
                    entry.insert(move_count as u16);
                    true
                }
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(move_count as u16);
                true
            }
        }
    }

    /// Number of distinct states recorded. Approximate while other threads
    /// are inserting.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
