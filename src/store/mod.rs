//! Round Persistence
//!
//! The registry keeps every round in memory; a [`Store`] only exists so
//! rounds survive a process restart. Store calls are synchronous and their
//! failures never abort an in-memory transition.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::sync::Mutex;

use thiserror::Error;

use crate::game::round::{Game, RoundId};

/// Persistence failures. Logged by the registry, never propagated to players.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A round could not be encoded or decoded.
    #[error("round serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Crash-recovery persistence for rounds.
pub trait Store: Send + Sync {
    /// Record the current state of a round.
    fn save(&self, game: &Game) -> Result<(), StoreError>;

    /// Forget a round that was replaced or expired.
    fn delete(&self, game: &Game) -> Result<(), StoreError>;

    /// Write every stored round to `sink`.
    fn checkpoint(&self, sink: &mut dyn Write) -> Result<(), StoreError>;
}

/// Store that keeps nothing. Used when no backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardStore;

impl Store for DiscardStore {
    fn save(&self, _game: &Game) -> Result<(), StoreError> {
        Ok(())
    }

    fn delete(&self, _game: &Game) -> Result<(), StoreError> {
        Ok(())
    }

    fn checkpoint(&self, _sink: &mut dyn Write) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process store.
///
/// Checkpoints are newline-delimited JSON, one round per line, and can be
/// fed back through [`read_checkpoint`] to restore a registry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: Mutex<BTreeMap<RoundId, Game>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rounds.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stored copy of a round.
    pub fn get(&self, id: &str) -> Option<Game> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<RoundId, Game>> {
        // a panic mid-insert leaves a valid map behind
        self.games.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    fn save(&self, game: &Game) -> Result<(), StoreError> {
        self.lock().insert(game.id.clone(), game.clone());
        Ok(())
    }

    fn delete(&self, game: &Game) -> Result<(), StoreError> {
        let mut games = self.lock();
        // a successor may already have been saved under the same id
        if games.get(&game.id).is_some_and(|stored| stored.created_at == game.created_at) {
            games.remove(&game.id);
        }
        Ok(())
    }

    fn checkpoint(&self, sink: &mut dyn Write) -> Result<(), StoreError> {
        let games: Vec<Game> = self.lock().values().cloned().collect();
        for game in &games {
            serde_json::to_writer(&mut *sink, game)?;
            sink.write_all(b"\n")?;
        }
        sink.flush()?;
        Ok(())
    }
}

/// Parse a checkpoint written by [`MemoryStore::checkpoint`].
pub fn read_checkpoint<R: BufRead>(reader: R) -> Result<Vec<Game>, StoreError> {
    let mut games = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        games.push(serde_json::from_str(&line)?);
    }
    Ok(games)
}
