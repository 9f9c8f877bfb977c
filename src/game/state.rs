//! Round State Definitions
//!
//! `GameState` is the reproducible part of a round: enough to rebuild the
//! round's words and deck and restore play after a process restart.
//! `GameOptions` holds the table settings chosen by the players.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::rng::fresh_seed;
use crate::game::words::WordPool;

/// Player identifier as sent by the client.
pub type PlayerId = String;

/// Board cell index (`0..board_size²`).
pub type Cell = usize;

/// Default board side length.
pub const DEFAULT_BOARD_SIZE: usize = 4;

/// Default number of cards each player holds.
pub const DEFAULT_HAND_SIZE: usize = 1;

/// Smallest supported board side length.
pub const MIN_BOARD_SIZE: usize = 3;

/// Largest supported board side length.
pub const MAX_BOARD_SIZE: usize = 5;

/// Words needed for one round: one per row and one per column.
#[inline]
pub const fn words_per_game(board_size: usize) -> usize {
    board_size * 2
}

/// Number of cells on the board.
#[inline]
pub const fn total_cells(board_size: usize) -> usize {
    board_size * board_size
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Seed data of a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Source of all randomness for this round and its successors.
    pub seed: i64,

    /// Cursor into the seed-derived permutation of `word_set`.
    pub perm_index: usize,

    /// One flag per cell; set once the cell is guessed.
    pub revealed: Vec<bool>,

    /// Word pool shared by the round lineage.
    pub word_set: WordPool,

    /// Number of deck cards dealt so far.
    pub deck_index: usize,

    /// Cards currently held, keyed by cell.
    #[serde(deserialize_with = "cell_map")]
    pub player_cards: BTreeMap<Cell, PlayerId>,

    /// Discarded cells and who discarded them.
    #[serde(deserialize_with = "cell_map")]
    pub discards: BTreeMap<Cell, PlayerId>,
}

/// Read a cell-keyed map whose keys arrive as strings, as they do when the
/// state is flattened into a persisted round.
fn cell_map<'de, D>(deserializer: D) -> Result<BTreeMap<Cell, PlayerId>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, PlayerId>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, owner)| {
            key.parse::<Cell>()
                .map(|cell| (cell, owner))
                .map_err(|_| serde::de::Error::custom(format!("invalid cell key {key:?}")))
        })
        .collect()
}

impl GameState {
    /// Fresh lineage state with a newly drawn seed.
    pub fn random(words: WordPool, board_size: usize) -> Self {
        Self::with_seed(fresh_seed(), words, board_size)
    }

    /// Fresh lineage state for a known seed.
    pub fn with_seed(seed: i64, words: WordPool, board_size: usize) -> Self {
        Self {
            seed,
            perm_index: 0,
            revealed: vec![false; total_cells(board_size)],
            word_set: words,
            deck_index: 0,
            player_cards: BTreeMap::new(),
            discards: BTreeMap::new(),
        }
    }

    /// State for the round following this one in the same lineage.
    ///
    /// Moves the permutation cursor past this round's words. When the pool
    /// cannot supply another full round after that, the lineage reseeds and
    /// starts from the top of a new permutation. Per-cell state never carries
    /// over.
    pub fn next(&self, board_size: usize) -> Self {
        let needed = words_per_game(board_size);
        let mut seed = self.seed;
        let mut perm_index = self.perm_index + needed;
        if perm_index + needed >= self.word_set.len() {
            seed = fresh_seed();
            perm_index = 0;
        }

        Self {
            seed,
            perm_index,
            revealed: vec![false; total_cells(board_size)],
            word_set: self.word_set.clone(),
            deck_index: 0,
            player_cards: BTreeMap::new(),
            discards: BTreeMap::new(),
        }
    }
}

// =============================================================================
// GAME OPTIONS
// =============================================================================

/// Invalid table settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// Board side length out of range.
    #[error("board size {0} must be between {MIN_BOARD_SIZE} and {MAX_BOARD_SIZE}")]
    BoardSize(usize),
    /// Hand size larger than the board.
    #[error("hand size {hand_size} must be between 1 and {cells}")]
    HandSize {
        /// Requested hand size.
        hand_size: usize,
        /// Cells on the board.
        cells: usize,
    },
    /// Negative timer duration.
    #[error("timer duration {0}ms is negative")]
    NegativeTimer(i64),
    /// Pool cannot fill a single round.
    #[error("word pool has {available} words, a round needs {needed}")]
    PoolTooSmall {
        /// Words in the pool.
        available: usize,
        /// Words one round consumes.
        needed: usize,
    },
}

/// Table settings for a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Turn timer length shown to players.
    pub timer_duration_ms: i64,
    /// Whether the timer ends the round.
    pub enforce_timer: bool,
    /// Maximum cards a player holds at once.
    pub hand_size: usize,
    /// Grid side length.
    pub board_size: usize,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            timer_duration_ms: 0,
            enforce_timer: false,
            hand_size: DEFAULT_HAND_SIZE,
            board_size: DEFAULT_BOARD_SIZE,
        }
    }
}

impl GameOptions {
    /// Replace unset (zero) sizes with defaults.
    pub fn normalized(mut self) -> Self {
        if self.board_size == 0 {
            self.board_size = DEFAULT_BOARD_SIZE;
        }
        if self.hand_size == 0 {
            self.hand_size = DEFAULT_HAND_SIZE;
        }
        self
    }

    /// Check the settings against the pool a round will draw from.
    pub fn validate(&self, pool_len: usize) -> Result<(), OptionsError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(OptionsError::BoardSize(self.board_size));
        }
        let cells = self.total_cells();
        if self.hand_size == 0 || self.hand_size > cells {
            return Err(OptionsError::HandSize { hand_size: self.hand_size, cells });
        }
        if self.timer_duration_ms < 0 {
            return Err(OptionsError::NegativeTimer(self.timer_duration_ms));
        }
        let needed = self.words_per_game();
        if pool_len < needed {
            return Err(OptionsError::PoolTooSmall { available: pool_len, needed });
        }
        Ok(())
    }

    /// Cells on the board.
    #[inline]
    pub fn total_cells(&self) -> usize {
        total_cells(self.board_size)
    }

    /// Words a round with these options consumes.
    #[inline]
    pub fn words_per_game(&self) -> usize {
        words_per_game(self.board_size)
    }
}

// =============================================================================
// TESTS
// =============================================================================
