//! Round Registry
//!
//! Maps round ids to their handles. The map has its own lock, which is only
//! ever held for a lookup, insert or removal: never across a round's lock and
//! never across store I/O, so one busy round cannot stall the others.

use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::RegistryConfig;
use crate::game::round::{Game, PlayerView, RoundId};
use crate::game::state::{GameOptions, GameState, OptionsError};
use crate::game::words::{WordPool, WordPoolError};
use crate::registry::handle::RoundHandle;
use crate::registry::signal::Wake;
use crate::store::{Store, StoreError};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Caller-supplied word pool rejected.
    #[error("invalid word pool: {0}")]
    InvalidWordPool(#[from] WordPoolError),

    /// Table settings rejected.
    #[error("invalid game options: {0}")]
    InvalidOptions(#[from] OptionsError),
}

/// Result of a long-poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The round changed since the caller's state id.
    Changed(PlayerView),
    /// Nothing changed before the timeout; the current view doubles as a heartbeat.
    Heartbeat(PlayerView),
    /// The round was replaced; this is the successor.
    Replaced(PlayerView),
    /// The caller disconnected while waiting.
    Disconnected,
}

impl PollOutcome {
    /// The view to send back, if any.
    pub fn into_view(self) -> Option<PlayerView> {
        match self {
            PollOutcome::Changed(view)
            | PollOutcome::Heartbeat(view)
            | PollOutcome::Replaced(view) => Some(view),
            PollOutcome::Disconnected => None,
        }
    }
}

/// All live rounds in this process.
pub struct RoundRegistry {
    config: RegistryConfig,
    store: Arc<dyn Store>,
    default_words: WordPool,
    rounds: RwLock<BTreeMap<RoundId, Arc<RoundHandle>>>,
}

impl RoundRegistry {
    /// Create an empty registry.
    ///
    /// Fails if `default_words` cannot fill a round with the configured
    /// default options.
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn Store>,
        default_words: WordPool,
    ) -> Result<Self, RegistryError> {
        let mut config = config;
        config.default_options = config.default_options.normalized();
        config.default_options.validate(default_words.len())?;

        Ok(Self {
            config,
            store,
            default_words,
            rounds: RwLock::new(BTreeMap::new()),
        })
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Reinstall rounds recovered from the store after a restart.
    ///
    /// Rounds already present under the same id are left alone.
    pub async fn restore(&self, games: impl IntoIterator<Item = Game>) -> usize {
        let mut restored = Vec::new();
        {
            let mut rounds = self.rounds.write().await;
            for game in games {
                if rounds.contains_key(&game.id) {
                    continue;
                }
                let handle = Arc::new(RoundHandle::new(game, self.store.clone()));
                rounds.insert(handle.id().to_string(), handle.clone());
                restored.push(handle);
            }
        }

        for handle in &restored {
            handle.persist().await;
        }
        info!("Restored {} rounds", restored.len());
        restored.len()
    }

    /// Look up a round without creating it.
    pub async fn get(&self, id: &str) -> Option<Arc<RoundHandle>> {
        self.rounds.read().await.get(id).cloned()
    }

    /// Look up a round, creating a fresh one on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, id: &str) -> Arc<RoundHandle> {
        if let Some(handle) = self.get(id).await {
            return handle;
        }

        let options = self.config.default_options;
        let state = GameState::random(self.default_words.clone(), options.board_size);
        self.install_fresh(id, Game::generate(id, state, options)).await
    }

    /// Start the next round under `id`.
    ///
    /// With no round yet this is a fresh create on `word_pool`, or on the
    /// default pool when the override is empty. Otherwise the successor
    /// continues the current round's lineage on the lineage's own pool,
    /// takes over the id, wakes everyone waiting on the old round and the old
    /// round is dropped from the store. The override is validated either way.
    #[instrument(skip(self, word_pool), fields(override_len = word_pool.len()))]
    pub async fn create_next<S: AsRef<str>>(
        &self,
        id: &str,
        word_pool: &[S],
        options: GameOptions,
    ) -> Result<Arc<RoundHandle>, RegistryError> {
        let override_pool = WordPool::from_override(word_pool)?;
        let options = options.normalized();

        let Some(previous) = self.get(id).await else {
            let words = override_pool.unwrap_or_else(|| self.default_words.clone());
            options.validate(words.len())?;
            let game = Game::generate(id, GameState::random(words, options.board_size), options);
            return Ok(self.install_fresh(id, game).await);
        };

        let prior = previous.snapshot().await;
        options.validate(prior.state.word_set.len())?;
        let mut game = Game::generate(id, prior.state.next(options.board_size), options);
        game.advance_past(prior.updated_at);
        let next_perm = game.state.perm_index;
        let successor = Arc::new(RoundHandle::new(game, self.store.clone()));

        {
            let mut rounds = self.rounds.write().await;
            match rounds.get(id) {
                // another request already replaced `previous`
                Some(current) if !Arc::ptr_eq(current, &previous) => return Ok(current.clone()),
                // present, or expired while we were generating
                _ => {
                    rounds.insert(id.to_string(), successor.clone());
                }
            }
        }

        // waiting long-polls re-resolve the id and find the successor
        let last_update = previous.retire().await;
        // an update may have reached the old round after the snapshot
        successor.advance_past(last_update).await;
        if let Err(e) = self.store.delete(&prior) {
            warn!("Unable to delete old round {:?} from the store: {}", id, e);
        }
        successor.persist().await;

        info!(
            "Replaced round {:?} (perm_index {} -> {})",
            id, prior.state.perm_index, next_perm
        );
        Ok(successor)
    }

    /// Long-poll for `player_id`.
    ///
    /// Deals the player a hand, then waits for the round to move past
    /// `known_state_id`, to be replaced, for the configured timeout, or for
    /// `disconnected` to resolve.
    pub async fn poll<F>(
        &self,
        id: &str,
        player_id: &str,
        known_state_id: Option<&str>,
        disconnected: F,
    ) -> PollOutcome
    where
        F: Future<Output = ()>,
    {
        let handle = self.get_or_create(id).await;
        handle.draw(player_id).await;

        let watch = handle.await_change(known_state_id).await;
        let wake = watch.wait(self.config.long_poll_timeout, disconnected).await;
        debug!(round = %id, player = %player_id, ?wake, "Long-poll woke");

        match wake {
            Wake::Disconnected => PollOutcome::Disconnected,
            Wake::TimedOut => PollOutcome::Heartbeat(handle.view(player_id).await),
            Wake::Updated => PollOutcome::Changed(handle.view(player_id).await),
            Wake::Replaced => {
                let successor = self.get_or_create(id).await;
                PollOutcome::Replaced(successor.view(player_id).await)
            }
        }
    }

    /// Drop rounds that were abandoned or have simply lived too long.
    ///
    /// Unfinished rounds go after `incomplete_ttl`; every round goes after
    /// `max_age`. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn expire(&self) -> usize {
        let now = Utc::now();
        let incomplete_ttl = chrono::Duration::from_std(self.config.incomplete_ttl)
            .unwrap_or(chrono::Duration::MAX);
        let max_age = chrono::Duration::from_std(self.config.max_age)
            .unwrap_or(chrono::Duration::MAX);

        let handles: Vec<Arc<RoundHandle>> = self.rounds.read().await.values().cloned().collect();

        let mut stale = Vec::new();
        for handle in handles {
            let age = handle.age().await;
            let lived = now.signed_duration_since(age.created_at);
            if (!age.won && lived > incomplete_ttl) || lived > max_age {
                stale.push(handle);
            }
        }

        let mut removed = Vec::new();
        {
            let mut rounds = self.rounds.write().await;
            for handle in stale {
                // skip rounds replaced since the scan
                if rounds.get(handle.id()).is_some_and(|h| Arc::ptr_eq(h, &handle)) {
                    rounds.remove(handle.id());
                    removed.push(handle);
                }
            }
        }

        for handle in &removed {
            let game = handle.snapshot().await;
            if let Err(e) = self.store.delete(&game) {
                warn!("Unable to delete expired round {:?} from the store: {}", game.id, e);
            }
            info!("Removed expired round {:?} (won: {})", game.id, game.won);
        }
        removed.len()
    }

    /// Run [`expire`](Self::expire) every `expiry_interval` until the task is aborted.
    pub fn spawn_expiry(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.expiry_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = self.expire().await;
                if removed > 0 {
                    info!("Expiry sweep removed {} rounds, {} live", removed, self.round_count().await);
                }
            }
        })
    }

    /// Write the store's checkpoint to `sink`.
    pub fn checkpoint(&self, sink: &mut dyn Write) -> Result<(), StoreError> {
        self.store.checkpoint(sink).inspect_err(|e| {
            warn!("Write checkpoint failed: {}", e);
        })
    }

    /// Number of live rounds.
    pub async fn round_count(&self) -> usize {
        self.rounds.read().await.len()
    }

    /// Insert a new round unless someone else created `id` first.
    async fn install_fresh(&self, id: &str, game: Game) -> Arc<RoundHandle> {
        let candidate = Arc::new(RoundHandle::new(game, self.store.clone()));
        {
            let mut rounds = self.rounds.write().await;
            if let Some(existing) = rounds.get(id) {
                return existing.clone();
            }
            rounds.insert(id.to_string(), candidate.clone());
        }

        // skipped if a create_next already retired it
        candidate.persist().await;
        info!("Created round {:?}", id);
        candidate
    }
}

impl std::fmt::Debug for RoundRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundRegistry")
            .field("config", &self.config)
            .field("default_words", &self.default_words.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::words::numbered_words;
    use crate::store::MemoryStore;
    use std::future::pending;
    use std::time::Duration;

    const NO_OVERRIDE: &[String] = &[];

    fn create_test_registry(config: RegistryConfig) -> (Arc<RoundRegistry>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let registry =
            RoundRegistry::new(config, store.clone(), WordPool::new(numbered_words(40))).unwrap();
        (Arc::new(registry), store)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (registry, store) = create_test_registry(RegistryConfig::default());
        assert!(registry.get("alpha").await.is_none());

        let first = registry.get_or_create("alpha").await;
        let second = registry.get_or_create("alpha").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.round_count().await, 1);
        assert_eq!(store.get("alpha"), Some(first.snapshot().await));
    }

    #[tokio::test]
    async fn test_registry_rejects_small_default_pool() {
        let result = RoundRegistry::new(
            RegistryConfig::default(),
            Arc::new(MemoryStore::new()),
            WordPool::new(numbered_words(7)),
        );
        assert!(matches!(
            result,
            Err(RegistryError::InvalidOptions(OptionsError::PoolTooSmall { available: 7, needed: 8 }))
        ));
    }

    #[tokio::test]
    async fn test_create_next_continues_lineage() {
        let (registry, store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("alpha").await;
        first.draw("alice").await;
        let before = first.snapshot().await;

        let next = registry.create_next("alpha", NO_OVERRIDE, GameOptions::default()).await.unwrap();
        let after = next.snapshot().await;

        assert!(first.is_replaced());
        assert!(!next.is_replaced());
        assert!(Arc::ptr_eq(&next, &registry.get("alpha").await.unwrap()));

        // the first retirement reaches only the first round's waiters
        let next_stamp = next.state_id().await;
        let successor_watch = next.await_change(Some(&next_stamp)).await;
        assert!(!successor_watch.replaced.is_fired());
        assert!(!successor_watch.updated.is_fired());
        assert_eq!(after.state.seed, before.state.seed);
        assert_eq!(after.state.perm_index, before.state.perm_index + 8);
        assert!(after.state_id() > before.state_id());
        assert_eq!(after.state.deck_index, 0);

        // the store only holds the successor
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("alpha"), Some(after));
    }

    #[tokio::test]
    async fn test_replaced_fires_once_per_round() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("alpha").await;
        let stamp = first.state_id().await;
        let first_watch = first.await_change(Some(&stamp)).await;

        let second = registry.create_next("alpha", NO_OVERRIDE, GameOptions::default()).await.unwrap();
        assert!(first_watch.replaced.is_fired());
        assert!(!first_watch.updated.is_fired());

        let second_stamp = second.state_id().await;
        let second_watch = second.await_change(Some(&second_stamp)).await;
        let waiter =
            tokio::spawn(async move { second_watch.wait(Duration::from_secs(5), pending()).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        // the next replacement touches only the second round
        let third = registry.create_next("alpha", NO_OVERRIDE, GameOptions::default()).await.unwrap();
        assert_eq!(waiter.await.unwrap(), Wake::Replaced);
        assert!(first_watch.replaced.is_fired());
        assert!(!first_watch.updated.is_fired());
        assert_eq!(first.state_id().await, stamp);
        assert!(!third.is_replaced());
    }

    #[tokio::test]
    async fn test_successor_is_newer_than_last_update() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("sigma").await;
        first.draw("alice").await;
        // push the old round into the future, as a late update would
        first.advance_past(Utc::now() + chrono::Duration::seconds(30)).await;
        let last = first.state_id().await;

        let next = registry.create_next("sigma", NO_OVERRIDE, GameOptions::default()).await.unwrap();
        assert!(next.state_id().await > last);
        assert!(next.state_id().await > first.state_id().await);
    }

    #[tokio::test]
    async fn test_retired_round_is_not_saved() {
        let (registry, store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("alpha").await;
        let next = registry.create_next("alpha", NO_OVERRIDE, GameOptions::default()).await.unwrap();

        // a straggler still holding the old handle
        assert!(first.draw("alice").await);
        assert_eq!(store.get("alpha"), Some(next.snapshot().await));
    }

    #[tokio::test]
    async fn test_create_next_without_round_creates_fresh() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let options = GameOptions { board_size: 3, hand_size: 2, ..Default::default() };

        let handle = registry.create_next("beta", NO_OVERRIDE, options).await.unwrap();
        let game = handle.snapshot().await;
        assert_eq!(game.state.perm_index, 0);
        assert_eq!(game.words.len(), 6);
        assert_eq!(game.deck.len(), 9);
        assert_eq!(game.options.hand_size, 2);
    }

    #[tokio::test]
    async fn test_create_next_word_pool_limits() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());

        let result = registry
            .create_next("gamma", numbered_words(24).as_slice(), GameOptions::default())
            .await;
        assert_eq!(result.unwrap_err(), RegistryError::InvalidWordPool(WordPoolError::TooFew(24)));

        let result = registry
            .create_next("gamma", numbered_words(10_001).as_slice(), GameOptions::default())
            .await;
        assert_eq!(
            result.unwrap_err(),
            RegistryError::InvalidWordPool(WordPoolError::TooMany(10_001))
        );
        assert!(registry.get("gamma").await.is_none());

        let handle = registry
            .create_next("gamma", numbered_words(25).as_slice(), GameOptions::default())
            .await
            .unwrap();
        assert_eq!(handle.snapshot().await.state.word_set.len(), 25);
    }

    #[tokio::test]
    async fn test_create_next_keeps_lineage_pool() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("delta").await.snapshot().await;

        let words: Vec<String> = (0..30).map(|i| format!("other{i}")).collect();
        let next = registry
            .create_next("delta", words.as_slice(), GameOptions::default())
            .await
            .unwrap()
            .snapshot()
            .await;

        assert_eq!(next.state.seed, first.state.seed);
        assert_eq!(next.state.perm_index, first.state.perm_index + 8);
        assert_eq!(next.state.word_set, first.state.word_set);
        assert!(next.words.iter().all(|w| w.starts_with("WORD")));

        // still validated even though it goes unused
        let result = registry
            .create_next("delta", numbered_words(24).as_slice(), GameOptions::default())
            .await;
        assert_eq!(result.unwrap_err(), RegistryError::InvalidWordPool(WordPoolError::TooFew(24)));
    }

    #[tokio::test]
    async fn test_lineage_uses_every_word_before_repeating() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("omicron").await.snapshot().await;
        let seed = first.state.seed;

        // 40 words, 8 per round: cursors 0, 8, 16, 24 share one permutation
        let mut seen: std::collections::BTreeSet<String> = first.words.into_iter().collect();
        for _ in 0..3 {
            let game = registry
                .create_next("omicron", NO_OVERRIDE, GameOptions::default())
                .await
                .unwrap()
                .snapshot()
                .await;
            assert_eq!(game.state.seed, seed);
            seen.extend(game.words);
        }
        assert_eq!(seen.len(), 32);
    }

    #[tokio::test]
    async fn test_create_next_rejects_bad_options() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let first = registry.get_or_create("eps").await;

        let options = GameOptions { board_size: 6, ..Default::default() };
        let result = registry.create_next("eps", NO_OVERRIDE, options).await;
        assert_eq!(result.unwrap_err(), RegistryError::InvalidOptions(OptionsError::BoardSize(6)));

        let options = GameOptions { hand_size: 17, ..Default::default() };
        let result = registry.create_next("eps", NO_OVERRIDE, options).await;
        assert!(matches!(result, Err(RegistryError::InvalidOptions(OptionsError::HandSize { .. }))));

        assert!(!first.is_replaced());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_next_keeps_one_round() {
        let (registry, store) = create_test_registry(RegistryConfig::default());
        registry.get_or_create("zeta").await;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let r = registry.clone();
                tokio::spawn(async move {
                    r.create_next("zeta", NO_OVERRIDE, GameOptions::default()).await.unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let current = registry.get("zeta").await.unwrap();
        assert!(!current.is_replaced());
        assert_eq!(registry.round_count().await, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("zeta"), Some(current.snapshot().await));
    }

    #[tokio::test]
    async fn test_poll_unknown_state_answers_immediately() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            registry.poll("eta", "alice", None, pending()),
        )
        .await
        .expect("poll without a state id should not block");

        let PollOutcome::Changed(view) = outcome else {
            panic!("expected Changed, got {outcome:?}");
        };
        assert_eq!(view.player_cards.len(), 1);
        assert!(view.player_cards.values().all(|p| p == "alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_heartbeat_after_timeout() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let handle = registry.get_or_create("theta").await;
        handle.draw("alice").await;
        let stamp = handle.state_id().await;

        let outcome = registry.poll("theta", "alice", Some(&stamp), pending()).await;
        let PollOutcome::Heartbeat(view) = outcome else {
            panic!("expected Heartbeat, got {outcome:?}");
        };
        assert_eq!(view.state_id, stamp);
    }

    #[tokio::test]
    async fn test_poll_wakes_on_guess() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let handle = registry.get_or_create("iota").await;
        handle.draw("alice").await;
        let stamp = handle.state_id().await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.poll("iota", "alice", Some(&stamp), pending()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let cell = handle.snapshot().await.hand("alice")[0];
        assert_eq!(handle.guess(cell, "alice").await, Ok(true));

        let outcome = waiter.await.unwrap();
        let PollOutcome::Changed(view) = outcome else {
            panic!("expected Changed, got {outcome:?}");
        };
        assert_eq!(view.score, 1);
    }

    #[tokio::test]
    async fn test_poll_follows_replacement() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let handle = registry.get_or_create("kappa").await;
        handle.draw("alice").await;
        let stamp = handle.state_id().await;

        let waiter = {
            let registry = registry.clone();
            let stamp = stamp.clone();
            tokio::spawn(async move { registry.poll("kappa", "alice", Some(&stamp), pending()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let next = registry.create_next("kappa", NO_OVERRIDE, GameOptions::default()).await.unwrap();

        let outcome = waiter.await.unwrap();
        let PollOutcome::Replaced(view) = outcome else {
            panic!("expected Replaced, got {outcome:?}");
        };
        assert_eq!(view.state_id, next.state_id().await);
        assert!(view.state_id > stamp);
    }

    #[tokio::test]
    async fn test_poll_disconnect() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let handle = registry.get_or_create("lambda").await;
        handle.draw("alice").await;
        let stamp = handle.state_id().await;

        let outcome = registry.poll("lambda", "alice", Some(&stamp), async {}).await;
        assert_eq!(outcome, PollOutcome::Disconnected);
        assert!(outcome.into_view().is_none());
    }

    #[tokio::test]
    async fn test_expire_removes_old_rounds() {
        let (registry, store) = create_test_registry(RegistryConfig::default());
        let words = WordPool::new(numbered_words(40));
        let now = Utc::now();

        let mut abandoned =
            Game::generate("abandoned", GameState::with_seed(1, words.clone(), 4), GameOptions::default());
        abandoned.created_at = now - chrono::Duration::hours(4);

        let mut finished =
            Game::generate("finished", GameState::with_seed(2, words.clone(), 4), GameOptions::default());
        finished.created_at = now - chrono::Duration::hours(4);
        finished.won = true;

        let mut ancient =
            Game::generate("ancient", GameState::with_seed(3, words.clone(), 4), GameOptions::default());
        ancient.created_at = now - chrono::Duration::hours(73);
        ancient.won = true;

        let fresh = Game::generate("fresh", GameState::with_seed(4, words, 4), GameOptions::default());

        assert_eq!(registry.restore([abandoned, finished, ancient, fresh]).await, 4);
        assert_eq!(store.len(), 4);

        assert_eq!(registry.expire().await, 2);
        assert!(registry.get("abandoned").await.is_none());
        assert!(registry.get("ancient").await.is_none());
        assert!(registry.get("finished").await.is_some());
        assert!(registry.get("fresh").await.is_some());
        assert_eq!(store.len(), 2);
        assert!(store.get("abandoned").is_none());
    }

    #[tokio::test]
    async fn test_restore_keeps_live_rounds() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        let live = registry.get_or_create("mu").await;

        let stale = Game::generate(
            "mu",
            GameState::with_seed(9, WordPool::new(numbered_words(40)), 4),
            GameOptions::default(),
        );
        assert_eq!(registry.restore([stale]).await, 0);
        assert!(Arc::ptr_eq(&live, &registry.get("mu").await.unwrap()));
    }

    #[tokio::test]
    async fn test_checkpoint_roundtrip() {
        let (registry, _store) = create_test_registry(RegistryConfig::default());
        registry.get_or_create("nu").await.draw("alice").await;
        registry.get_or_create("xi").await;

        let mut buf = Vec::new();
        registry.checkpoint(&mut buf).unwrap();
        let games = crate::store::read_checkpoint(buf.as_slice()).unwrap();
        assert_eq!(games.len(), 2);

        let (restored, _store) = create_test_registry(RegistryConfig::default());
        assert_eq!(restored.restore(games).await, 2);
        let nu = restored.get("nu").await.unwrap().snapshot().await;
        assert_eq!(nu, registry.get("nu").await.unwrap().snapshot().await);
        assert_eq!(nu.hand("alice").len(), 1);
    }
}
