//! Game Logic Module
//!
//! Round generation and turn resolution. Everything here is synchronous and
//! deterministic given a round's seed; locking and notification live in
//! `registry/`.
//!
//! ## Module Structure
//!
//! - `words`: Normalized word pools and override validation
//! - `state`: Reproducible round seed data, table options, continuation
//! - `round`: Round generation, draw/guess/discard, per-player views

pub mod words;
pub mod state;
pub mod round;

// Re-export key types
pub use words::{WordPool, WordPoolError};
pub use state::{GameOptions, GameState, OptionsError, PlayerId, Cell};
pub use round::{Game, GameError, PlayerView, RoundId};
