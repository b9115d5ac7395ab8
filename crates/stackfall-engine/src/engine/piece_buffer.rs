use std::{collections::VecDeque, fmt, str::FromStr, sync::Arc};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::piece::{Piece, PieceDefinition, PieceRegistry};

/// Supplies pieces using the bag randomizer.
///
/// # Bag system
///
/// 1. A "bag" holds one piece of every configured kind
/// 2. The bag is shuffled (Fisher–Yates) and appended to the queue
/// 3. Pieces are drawn from the front of the queue
/// 4. A new bag is appended whenever fewer pieces than kinds remain
///
/// Every aligned run of `N` draws (`N` = number of kinds) therefore contains
/// each kind exactly once, which rules out long droughts of any kind.
///
/// # Example
///
/// ```
/// use stackfall_engine::{BagQueue, GameConfig, PieceRegistry};
///
/// let registry = PieceRegistry::from_config(&GameConfig::builtin()).unwrap();
/// let mut bag = BagQueue::new(&registry, 10);
///
/// let mut ids: Vec<u8> = (0..7).map(|_| bag.draw().id().get()).collect();
/// ids.sort_unstable();
/// assert_eq!(ids, [1, 2, 3, 4, 5, 6, 7]);
/// ```
#[derive(Debug, Clone)]
pub struct BagQueue {
    rng: Pcg32,
    definitions: Vec<Arc<PieceDefinition>>,
    board_width: usize,
    queue: VecDeque<Piece>,
}

/// Seed for deterministic piece generation.
///
/// A 128-bit (16-byte) seed for the bag's random number generator. The same
/// seed yields the same piece sequence, which makes test runs and headless
/// simulations reproducible. Its text form is 32 hexadecimal digits.
///
/// # Example
///
/// ```
/// use stackfall_engine::{BagQueue, GameConfig, PieceRegistry, PieceSeed};
/// use rand::Rng as _;
///
/// let registry = PieceRegistry::from_config(&GameConfig::builtin()).unwrap();
/// let seed: PieceSeed = rand::rng().random();
///
/// let mut a = BagQueue::with_seed(&registry, 10, seed);
/// let mut b = BagQueue::with_seed(&registry, 10, seed);
/// for _ in 0..20 {
///     assert_eq!(a.draw(), b.draw());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

/// Error returned when parsing a [`PieceSeed`] from text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex: {reason}")]
pub struct ParsePieceSeedError {
    reason: String,
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParsePieceSeedError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() != 32 {
            return Err(ParsePieceSeedError {
                reason: format!("expected 32 characters, got {}", hex_str.len()),
            });
        }
        let num = u128::from_str_radix(hex_str, 16).map_err(|e| ParsePieceSeedError {
            reason: format!("{hex_str} ({e})"),
        })?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl BagQueue {
    /// Creates an empty queue seeded from the thread-local RNG.
    ///
    /// For deterministic piece generation, use [`Self::with_seed`] instead.
    #[must_use]
    pub fn new(registry: &PieceRegistry, board_width: usize) -> Self {
        Self::with_seed(registry, board_width, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    #[must_use]
    pub fn with_seed(registry: &PieceRegistry, board_width: usize, seed: PieceSeed) -> Self {
        let definitions: Vec<_> = registry.iter().cloned().collect();
        Self {
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(definitions.len() * 2),
            definitions,
            board_width,
        }
    }

    /// Number of distinct piece kinds in a bag.
    #[must_use]
    pub fn kind_count(&self) -> usize {
        self.definitions.len()
    }

    /// Appends one shuffled bag containing every piece kind once.
    pub fn refill(&mut self) {
        let mut bag: Vec<Piece> = self
            .definitions
            .iter()
            .map(|def| Piece::spawned(Arc::clone(def), self.board_width))
            .collect();
        for i in (1..bag.len()).rev() {
            let j = self.rng.random_range(0..=i);
            bag.swap(i, j);
        }
        self.queue.extend(bag);
    }

    /// Draws the next piece, positioned at its spawn point in rotation state 0.
    ///
    /// Appends a new bag first if fewer pieces than kinds remain, so at least
    /// one full bag of preview is always available afterwards.
    pub fn draw(&mut self) -> Piece {
        if self.queue.len() < self.definitions.len() {
            self.refill();
        }
        self.queue
            .pop_front()
            .expect("piece queue should never be empty after a refill")
    }

    /// Returns the piece the next [`Self::draw`] yields, if one is queued.
    #[must_use]
    pub fn peek(&self) -> Option<&Piece> {
        self.queue.front()
    }

    /// Returns the pieces waiting in the queue, in draw order.
    pub fn upcoming(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.queue.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{GameConfig, PieceId};

    const SEED: PieceSeed = PieceSeed::from_bytes([
        0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        0x88,
    ]);

    fn registry() -> PieceRegistry {
        PieceRegistry::from_config(&GameConfig::builtin()).unwrap()
    }

    #[test]
    fn test_fresh_queue_draws_each_kind_once() {
        let registry = registry();
        let mut bag = BagQueue::with_seed(&registry, 10, SEED);
        assert!(bag.is_empty());

        let ids: BTreeSet<PieceId> = (0..bag.kind_count()).map(|_| bag.draw().id()).collect();
        assert_eq!(ids.len(), 7);
        assert!(ids.iter().all(|id| registry.contains(*id)));
    }

    #[test]
    fn test_every_aligned_run_is_a_permutation() {
        let registry = registry();
        let mut bag = BagQueue::new(&registry, 10);
        for _ in 0..50 {
            let mut ids: Vec<u8> = (0..7).map(|_| bag.draw().id().get()).collect();
            ids.sort_unstable();
            assert_eq!(ids, [1, 2, 3, 4, 5, 6, 7]);
        }
    }

    #[test]
    fn test_refill_keeps_a_full_bag_of_preview() {
        let registry = registry();
        let mut bag = BagQueue::with_seed(&registry, 10, SEED);
        bag.draw();
        assert_eq!(bag.len(), 6);
        bag.draw();
        // Refilled before the second draw: 6 + 7 - 1
        assert_eq!(bag.len(), 12);
        for _ in 0..100 {
            bag.draw();
            assert!(bag.len() >= bag.kind_count() - 1);
        }
    }

    #[test]
    fn test_peek_matches_draw() {
        let registry = registry();
        let mut bag = BagQueue::with_seed(&registry, 10, SEED);
        assert!(bag.peek().is_none());
        bag.draw();
        for _ in 0..20 {
            let peeked = bag.peek().cloned().unwrap();
            assert_eq!(bag.draw(), peeked);
        }
    }

    #[test]
    fn test_manual_refill_appends_one_bag() {
        let registry = registry();
        let mut bag = BagQueue::with_seed(&registry, 10, SEED);
        bag.refill();
        bag.refill();
        assert_eq!(bag.len(), 14);
        let first: BTreeSet<_> = bag.upcoming().take(7).map(Piece::id).collect();
        let second: BTreeSet<_> = bag.upcoming().skip(7).map(Piece::id).collect();
        assert_eq!(first.len(), 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_drawn_pieces_are_at_spawn() {
        let registry = registry();
        let mut bag = BagQueue::with_seed(&registry, 10, SEED);
        for _ in 0..14 {
            let piece = bag.draw();
            let (dx, dy) = piece.definition().spawn_offset();
            assert_eq!(piece.rotation(), 0);
            assert_eq!(piece.x(), 5 + dx);
            assert_eq!(piece.y(), dy);
        }
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let registry = registry();
        let mut bag1 = BagQueue::with_seed(&registry, 10, SEED);
        let mut bag2 = BagQueue::with_seed(&registry, 10, SEED);
        for _ in 0..30 {
            assert_eq!(bag1.draw(), bag2.draw());
        }
    }

    #[test]
    fn test_single_kind_registry() {
        let mut config = GameConfig::builtin();
        config.tetrominoes.truncate(1);
        let registry = PieceRegistry::from_config(&config).unwrap();
        let mut bag = BagQueue::with_seed(&registry, 10, SEED);
        for _ in 0..5 {
            assert_eq!(bag.draw().id().get(), 1);
        }
    }

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_roundtrip_random_seed() {
            let seed: PieceSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(seed, deserialized);
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = PieceSeed::from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            assert_eq!(seed.to_string(), "0123456789abcdeffedcba9876543210");
            assert_eq!(
                serde_json::to_string(&seed).unwrap(),
                "\"0123456789abcdeffedcba9876543210\""
            );
        }

        #[test]
        fn test_parse_uppercase_hex() {
            let seed: PieceSeed = "0123456789ABCDEFFEDCBA9876543210".parse().unwrap();
            assert_eq!(seed.to_string(), "0123456789abcdeffedcba9876543210");
        }

        #[test]
        fn test_error_cases() {
            for input in [
                "",
                "0123456789abcdef0123456789abcde",
                "0123456789abcdef0123456789abcdef0",
                "ghijklmnopqrstuvwxyzghijklmnopqr",
            ] {
                let err = input.parse::<PieceSeed>().unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{input:?}");
            }
            assert!(serde_json::from_str::<PieceSeed>("\"abc\"").is_err());
        }
    }
}
