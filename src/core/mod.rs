//! Core deterministic primitives.
//!
//! Everything a round derives from its seed goes through this module.

pub mod rng;

pub use rng::{fresh_seed, DeterministicRng};
