//! Rounds
//!
//! A [`Game`] is one playthrough: the seed data from [`GameState`], the table
//! settings, and everything derived from them (the round's words and deck).
//! Rounds are generated deterministically from their seed and then mutated
//! only through [`Game::draw`], [`Game::guess`] and [`Game::discard`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::game::state::{Cell, GameOptions, GameState, PlayerId};

/// Round identifier (chosen by clients, usually a short word phrase).
pub type RoundId = String;

/// Rejected round transitions. None of these mutate the round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Cell index outside the board.
    #[error("index {index} is invalid (board has {cells} cells)")]
    InvalidIndex {
        /// Requested cell.
        index: Cell,
        /// Cells on the board.
        cells: usize,
    },

    /// Cell was already guessed.
    #[error("cell {0} has already been revealed")]
    AlreadyRevealed(Cell),

    /// Cell is not in the acting player's hand.
    #[error("index {index} is not owned by player {player_id}")]
    NotOwner {
        /// Requested cell.
        index: Cell,
        /// Acting player.
        player_id: PlayerId,
    },
}

// =============================================================================
// GAME
// =============================================================================

/// A single round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Seed data and per-cell progress.
    #[serde(flatten)]
    pub state: GameState,

    /// Round identifier.
    pub id: RoundId,

    /// When the round was generated.
    pub created_at: DateTime<Utc>,

    /// Last successful mutation.
    pub updated_at: DateTime<Utc>,

    /// This round's words: the first `board_size` label the columns, the rest the rows.
    pub words: Vec<String>,

    /// Deal order of the cells.
    pub deck: Vec<Cell>,

    /// Revealed cell count.
    pub score: usize,

    /// Every cell has been resolved.
    pub won: bool,

    /// Table settings.
    #[serde(flatten)]
    pub options: GameOptions,
}

impl Game {
    /// Build a round from its seed data.
    ///
    /// Words come from a permutation of the pool driven by `state.seed`, so
    /// every round in a lineage walks the same permutation. The deck is
    /// shuffled from `seed * (perm_index + 1)`, giving each round of the
    /// lineage its own deal order without disturbing word selection.
    ///
    /// # Panics
    ///
    /// If `state.perm_index + 2 * options.board_size` exceeds the pool.
    /// [`GameState::next`] and [`GameOptions::validate`] keep callers clear
    /// of that.
    pub fn generate(id: impl Into<RoundId>, state: GameState, options: GameOptions) -> Self {
        let mut word_rng = DeterministicRng::from_seed(state.seed);
        let mut deck_rng = DeterministicRng::from_seed(
            state.seed.wrapping_mul(state.perm_index as i64 + 1),
        );

        let wanted = options.words_per_game();
        let perm = word_rng.permutation(state.word_set.len());
        let words = perm[state.perm_index..state.perm_index + wanted]
            .iter()
            .map(|&i| state.word_set[i].to_string())
            .collect();

        let mut deck: Vec<Cell> = (0..options.total_cells()).collect();
        deck_rng.shuffle(&mut deck);

        let now = Utc::now();
        Self {
            state,
            id: id.into(),
            created_at: now,
            updated_at: now,
            words,
            deck,
            score: 0,
            won: false,
            options,
        }
    }

    /// Change-detection token: `updated_at` in nanoseconds, zero padded so
    /// ids compare the same as strings and as numbers.
    pub fn state_id(&self) -> String {
        format!("{:019}", self.updated_at.timestamp_nanos_opt().unwrap_or_default())
    }

    /// Cells on the board.
    pub fn total_cells(&self) -> usize {
        self.state.revealed.len()
    }

    /// Cards left in the deck.
    pub fn cards_remaining(&self) -> usize {
        self.deck.len().saturating_sub(self.state.deck_index)
    }

    /// Cells currently held by `player_id`.
    pub fn hand(&self, player_id: &str) -> Vec<Cell> {
        self.state
            .player_cards
            .iter()
            .filter(|(_, owner)| owner.as_str() == player_id)
            .map(|(cell, _)| *cell)
            .collect()
    }

    /// Deal cards to `player_id` until their hand is full or the deck runs out.
    ///
    /// Returns whether any card was dealt.
    pub fn draw(&mut self, player_id: &str) -> bool {
        if self.won {
            return false;
        }

        let mut held = self
            .state
            .player_cards
            .values()
            .filter(|owner| owner.as_str() == player_id)
            .count();

        let mut dealt = false;
        while held < self.options.hand_size {
            // Running out of cards is fine
            let Some(&card) = self.deck.get(self.state.deck_index) else {
                break;
            };
            self.state.deck_index += 1;
            self.state.player_cards.insert(card, player_id.to_string());
            held += 1;
            dealt = true;
        }

        if dealt {
            self.touch();
        }
        self.check_completion();
        dealt
    }

    /// Reveal `index`, which `player_id` must hold, then refill their hand.
    pub fn guess(&mut self, index: Cell, player_id: &str) -> Result<bool, GameError> {
        let cells = self.total_cells();
        if index >= cells {
            return Err(GameError::InvalidIndex { index, cells });
        }
        if self.state.revealed[index] {
            return Err(GameError::AlreadyRevealed(index));
        }
        self.check_owner(index, player_id)?;

        self.touch();
        self.state.revealed[index] = true;
        self.state.player_cards.remove(&index);

        // play the card, then draw a replacement
        self.draw(player_id);
        self.check_completion();
        Ok(true)
    }

    /// Give up on `index`, which `player_id` must hold, then refill their hand.
    ///
    /// Returns `Ok(false)` without touching anything once the round is over.
    pub fn discard(&mut self, player_id: &str, index: Cell) -> Result<bool, GameError> {
        if self.won {
            return Ok(false);
        }
        self.check_owner(index, player_id)?;

        self.touch();
        self.state.discards.insert(index, player_id.to_string());
        self.state.player_cards.remove(&index);

        self.draw(player_id);
        self.check_completion();
        Ok(true)
    }

    /// Copy of the round as `player_id` may see it.
    pub fn client_view(&self, player_id: &str) -> PlayerView {
        let owned = |cards: &BTreeMap<Cell, PlayerId>| -> BTreeMap<Cell, PlayerId> {
            cards
                .iter()
                .filter(|(_, owner)| owner.as_str() == player_id)
                .map(|(cell, owner)| (*cell, owner.clone()))
                .collect()
        };

        PlayerView {
            id: self.id.clone(),
            state_id: self.state_id(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            words: self.words.clone(),
            revealed: self.state.revealed.clone(),
            deck_index: self.state.deck_index,
            player_cards: owned(&self.state.player_cards),
            discards: owned(&self.state.discards),
            discard_count: self.state.discards.len(),
            score: self.score,
            won: self.won,
            options: self.options,
        }
    }

    /// Move `updated_at` strictly past `floor`.
    ///
    /// Used when a successor round replaces this one, so the lineage's
    /// state ids keep increasing even within one clock tick.
    pub fn advance_past(&mut self, floor: DateTime<Utc>) {
        if self.updated_at <= floor {
            self.updated_at = floor + chrono::Duration::nanoseconds(1);
        }
    }

    fn check_owner(&self, index: Cell, player_id: &str) -> Result<(), GameError> {
        match self.state.player_cards.get(&index) {
            Some(owner) if owner == player_id => Ok(()),
            _ => Err(GameError::NotOwner { index, player_id: player_id.to_string() }),
        }
    }

    fn touch(&mut self) {
        let floor = self.updated_at;
        self.updated_at = Utc::now();
        self.advance_past(floor);
    }

    fn check_completion(&mut self) {
        self.score = self.state.revealed.iter().filter(|r| **r).count();
        let resolved = self.score + self.state.discards.len();
        self.won = resolved == self.total_cells();
    }
}

// =============================================================================
// PLAYER VIEW
// =============================================================================

/// A round as one player sees it.
///
/// Other players' hands and discards are filtered out. The deck order, seed
/// and word pool never leave the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Round identifier.
    pub id: RoundId,
    /// Change-detection token to send back when polling.
    pub state_id: String,
    /// When the round was generated.
    pub created_at: DateTime<Utc>,
    /// Last mutation.
    pub updated_at: DateTime<Utc>,
    /// Column words then row words.
    pub words: Vec<String>,
    /// Reveal flags for every cell.
    pub revealed: Vec<bool>,
    /// Cards dealt so far.
    pub deck_index: usize,
    /// The viewer's hand.
    pub player_cards: BTreeMap<Cell, PlayerId>,
    /// The viewer's discards.
    pub discards: BTreeMap<Cell, PlayerId>,
    /// Discards across all players.
    pub discard_count: usize,
    /// Revealed cell count.
    pub score: usize,
    /// Round complete.
    pub won: bool,
    /// Table settings.
    #[serde(flatten)]
    pub options: GameOptions,
}

// =============================================================================
// TESTS
// =============================================================================
