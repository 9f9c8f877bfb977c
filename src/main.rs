//! Cross Clues Round Server
//!
//! Runs the round registry against an in-memory store and plays a short
//! demo lineage through it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crossclues::{
    store::read_checkpoint, GameOptions, MemoryStore, PollOutcome, RegistryConfig,
    RoundRegistry, WordPool, VERSION,
};

/// Pool used when a round is created without an override.
const DEFAULT_WORDS: &[&str] = &[
    "anchor", "apple", "bamboo", "bridge", "button", "candle", "castle", "cloud",
    "comet", "desert", "dragon", "engine", "feather", "forest", "garden", "glacier",
    "hammer", "harbor", "island", "jungle", "kettle", "ladder", "lantern", "magnet",
    "meadow", "mirror", "needle", "ocean", "orchard", "painter", "pepper", "pillow",
    "planet", "pocket", "puzzle", "rabbit", "rocket", "saddle", "shadow", "spider",
    "summit", "thunder", "tunnel", "umbrella", "valley", "violin", "wagon", "whistle",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RegistryConfig::from_env();
    info!("Cross Clues Server v{}", VERSION);
    info!(
        "Long-poll timeout: {:?}, expiry every {:?}",
        config.long_poll_timeout, config.expiry_interval
    );

    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(
        RoundRegistry::new(config, store, WordPool::new(DEFAULT_WORDS.iter().copied()))
            .context("default word pool does not fit the configured board")?,
    );
    let expiry = registry.clone().spawn_expiry();

    demo_lineage(&registry).await?;

    // Checkpoint and make sure it reads back
    let mut checkpoint = Vec::new();
    registry.checkpoint(&mut checkpoint)?;
    let games = read_checkpoint(checkpoint.as_slice())?;
    info!("Checkpoint: {} rounds, {} bytes", games.len(), checkpoint.len());

    expiry.abort();
    Ok(())
}

/// Play one round to completion with two players, then start its successor
/// while a third player is waiting on the old one.
async fn demo_lineage(registry: &Arc<RoundRegistry>) -> anyhow::Result<()> {
    info!("=== Starting Demo Round ===");
    let round_id = "demo-table";
    let players = ["alice", "bob"];

    let handle = registry.get_or_create(round_id).await;
    let game = handle.snapshot().await;
    info!("Seed: {}, words: {}", game.state.seed, game.words.join(" "));

    let mut turns = 0;
    loop {
        for player in players {
            // a poll with no state id deals a hand and answers straight away
            let view = registry
                .poll(round_id, player, None, std::future::pending())
                .await
                .into_view()
                .context("poll ended without a view")?;
            if view.won {
                break;
            }

            let Some(&cell) = view.player_cards.keys().next() else {
                continue;
            };
            turns += 1;
            // every third card is too hard to clue
            if turns % 3 == 0 {
                handle.discard(player, cell).await?;
                info!("{} discarded cell {}", player, cell);
            } else {
                handle.guess(cell, player).await?;
                info!("{} revealed cell {}", player, cell);
            }
        }

        let game = handle.snapshot().await;
        if game.won {
            info!(
                "Round complete after {} turns: score {}, discards {}",
                turns,
                game.score,
                game.state.discards.len()
            );
            break;
        }
    }

    info!("=== Starting Next Round ===");
    handle.draw("carol").await;
    let known = handle.state_id().await;
    let waiter = {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry.poll(round_id, "carol", Some(&known), std::future::pending()).await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let next = registry
        .create_next(round_id, &[] as &[&str], GameOptions::default())
        .await?;
    let next_game = next.snapshot().await;
    info!(
        "Next round: perm_index {}, words: {}",
        next_game.state.perm_index,
        next_game.words.join(" ")
    );

    match waiter.await? {
        PollOutcome::Replaced(view) => {
            info!("Waiting player moved to state {}", view.state_id)
        }
        other => bail!("waiting player was not told about the new round: {other:?}"),
    }
    Ok(())
}
