//! Concurrent Round Handle
//!
//! Wraps one [`Game`] with the lock that serializes its mutations, a cached
//! serialized snapshot, and the signals long-polls wait on.

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::game::round::{Game, GameError, PlayerView, RoundId};
use crate::registry::signal::{ChangeWatch, Signal};
use crate::store::Store;

/// Mutable part of a handle, guarded by its lock.
struct HandleInner {
    game: Game,
    /// Fires on the next successful update; swapped for a fresh one each time.
    updated: Signal,
    /// Serialized round, cleared on every update.
    marshaled: Option<Arc<[u8]>>,
}

/// What the registry's expiry sweep needs to know about a round.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RoundAge {
    pub created_at: DateTime<Utc>,
    pub won: bool,
}

/// Shared, lockable round.
pub struct RoundHandle {
    id: RoundId,
    store: Arc<dyn Store>,
    inner: Mutex<HandleInner>,
    /// Fired once when a successor takes over this round's id.
    replaced: Signal,
}

impl RoundHandle {
    /// Wrap a round. Nothing is persisted until [`persist`](Self::persist)
    /// or the first update.
    pub fn new(game: Game, store: Arc<dyn Store>) -> Self {
        Self {
            id: game.id.clone(),
            store,
            inner: Mutex::new(HandleInner { game, updated: Signal::new(), marshaled: None }),
            replaced: Signal::new(),
        }
    }

    /// Round identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Save the current round to the store. Failures are logged, and a
    /// retired round is never saved.
    pub async fn persist(&self) {
        let inner = self.inner.lock().await;
        self.save(&inner.game);
    }

    /// Apply `mutator` under the round lock.
    ///
    /// The mutator returns `Ok(true)` when it changed the round; the cache is
    /// then invalidated, the round saved, and waiters on `updated` woken.
    /// Errors pass through untouched.
    pub async fn update<E>(
        &self,
        mutator: impl FnOnce(&mut Game) -> Result<bool, E>,
    ) -> Result<bool, E> {
        let mut inner = self.inner.lock().await;
        let changed = mutator(&mut inner.game)?;
        if !changed {
            return Ok(false);
        }

        inner.marshaled = None;
        let fired = std::mem::replace(&mut inner.updated, Signal::new());
        self.save(&inner.game);
        fired.fire();

        debug!(round = %self.id, state_id = %inner.game.state_id(), "Round updated");
        Ok(true)
    }

    /// Deal `player_id` a full hand.
    pub async fn draw(&self, player_id: &str) -> bool {
        let result = self.update(|game| Ok::<_, Infallible>(game.draw(player_id))).await;
        match result {
            Ok(dealt) => dealt,
            Err(never) => match never {},
        }
    }

    /// Reveal a cell held by `player_id`.
    pub async fn guess(&self, index: usize, player_id: &str) -> Result<bool, GameError> {
        self.update(|game| game.guess(index, player_id)).await
    }

    /// Discard a cell held by `player_id`.
    pub async fn discard(&self, player_id: &str, index: usize) -> Result<bool, GameError> {
        self.update(|game| game.discard(player_id, index)).await
    }

    /// Signals for a caller that last saw `known_state_id`.
    ///
    /// A missing or outdated id yields an already-fired watch so the caller
    /// answers straight away.
    pub async fn await_change(&self, known_state_id: Option<&str>) -> ChangeWatch {
        let Some(known) = known_state_id else {
            return ChangeWatch::stale();
        };

        let inner = self.inner.lock().await;
        if inner.game.state_id() != known {
            return ChangeWatch::stale();
        }
        ChangeWatch { updated: inner.updated.clone(), replaced: self.replaced.clone() }
    }

    /// JSON encoding of the full round plus its `state_id`, cached until the
    /// next update.
    pub async fn serialize(&self) -> Result<Arc<[u8]>, serde_json::Error> {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            #[serde(flatten)]
            game: &'a Game,
            state_id: String,
        }

        let mut inner = self.inner.lock().await;
        if let Some(cached) = &inner.marshaled {
            return Ok(cached.clone());
        }

        let bytes: Arc<[u8]> = serde_json::to_vec(&Snapshot {
            game: &inner.game,
            state_id: inner.game.state_id(),
        })?
        .into();
        inner.marshaled = Some(bytes.clone());
        Ok(bytes)
    }

    /// The round as `player_id` sees it.
    pub async fn view(&self, player_id: &str) -> PlayerView {
        self.inner.lock().await.game.client_view(player_id)
    }

    /// Current change-detection token.
    pub async fn state_id(&self) -> String {
        self.inner.lock().await.game.state_id()
    }

    /// Copy of the wrapped round.
    pub async fn snapshot(&self) -> Game {
        self.inner.lock().await.game.clone()
    }

    /// Has this handle been retired in favor of a successor?
    pub fn is_replaced(&self) -> bool {
        self.replaced.is_fired()
    }

    pub(crate) async fn age(&self) -> RoundAge {
        let inner = self.inner.lock().await;
        RoundAge { created_at: inner.game.created_at, won: inner.game.won }
    }

    /// Wake every waiter so it re-resolves the round id, and stop saving.
    ///
    /// Returns once any update already in flight has finished, so nothing
    /// from this round reaches the store afterwards. The result is the
    /// round's last `updated_at`.
    pub(crate) async fn retire(&self) -> DateTime<Utc> {
        self.replaced.fire();
        self.inner.lock().await.game.updated_at
    }

    /// Move the round's `state_id` strictly past `floor`, waking waiters if
    /// it moved.
    pub(crate) async fn advance_past(&self, floor: DateTime<Utc>) -> bool {
        let result = self
            .update(|game| {
                let before = game.updated_at;
                game.advance_past(floor);
                Ok::<_, Infallible>(game.updated_at != before)
            })
            .await;
        match result {
            Ok(moved) => moved,
            Err(never) => match never {},
        }
    }

    fn save(&self, game: &Game) {
        // the successor owns the store entry now
        if self.is_replaced() {
            return;
        }
        if let Err(e) = self.store.save(game) {
            warn!("Unable to write updated round {:?} to the store: {}", self.id, e);
        }
    }
}

impl std::fmt::Debug for RoundHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundHandle")
            .field("id", &self.id)
            .field("replaced", &self.is_replaced())
            .finish_non_exhaustive()
    }
}
