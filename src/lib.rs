//! # Cross Clues Round Server
//!
//! Round engine for Cross Clues, the cooperative word-guessing game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CROSS CLUES SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG, shuffles        │
//! │                                                              │
//! │  game/           - Round logic (deterministic)               │
//! │  ├── words.rs    - Word pools                                │
//! │  ├── state.rs    - Seed data, options, continuation          │
//! │  └── round.rs    - Generation, draw/guess/discard, views     │
//! │                                                              │
//! │  registry/       - Concurrency (non-deterministic)           │
//! │  ├── signal.rs   - One-shot change signals                   │
//! │  ├── handle.rs   - Lockable round with cached snapshot       │
//! │  └── manager.rs  - Round map, create-next, expiry, long-poll │
//! │                                                              │
//! │  store/          - Persistence hooks and checkpoints         │
//! │  config.rs       - Registry settings from the environment    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! A round's words and deal order are a pure function of its seed, its
//! position in the lineage and its board size. Every round of a lineage
//! walks the same permutation of the word pool, so consecutive rounds never
//! repeat words until the pool is exhausted and the lineage is reseeded.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use config::RegistryConfig;
pub use core::rng::DeterministicRng;
pub use game::round::{Game, GameError, PlayerView, RoundId};
pub use game::state::{GameOptions, GameState, PlayerId};
pub use game::words::WordPool;
pub use registry::{PollOutcome, RegistryError, RoundHandle, RoundRegistry};
pub use store::{MemoryStore, Store, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
