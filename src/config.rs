//! Registry configuration.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::game::state::GameOptions;

/// Settings for a [`RoundRegistry`](crate::registry::RoundRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a long-poll waits for a change before answering anyway.
    pub long_poll_timeout: Duration,
    /// Unfinished rounds older than this are reclaimed.
    pub incomplete_ttl: Duration,
    /// Any round older than this is reclaimed.
    pub max_age: Duration,
    /// Period of the background expiry sweep.
    pub expiry_interval: Duration,
    /// Options for rounds created on first access.
    pub default_options: GameOptions,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            long_poll_timeout: Duration::from_secs(15),
            incomplete_ttl: Duration::from_secs(3 * 60 * 60),
            max_age: Duration::from_secs(72 * 60 * 60),
            expiry_interval: Duration::from_secs(10 * 60),
            default_options: GameOptions::default(),
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// - `CROSSCLUES_LONG_POLL_SECS`
    /// - `CROSSCLUES_INCOMPLETE_TTL_SECS`
    /// - `CROSSCLUES_MAX_AGE_SECS`
    /// - `CROSSCLUES_EXPIRY_INTERVAL_SECS`
    /// - `CROSSCLUES_BOARD_SIZE`
    /// - `CROSSCLUES_HAND_SIZE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            parse_or(&lookup, key, default.as_secs()).map_or(default, Duration::from_secs)
        };

        let default_options = GameOptions {
            board_size: parse_or(&lookup, "CROSSCLUES_BOARD_SIZE", defaults.default_options.board_size)
                .unwrap_or(defaults.default_options.board_size),
            hand_size: parse_or(&lookup, "CROSSCLUES_HAND_SIZE", defaults.default_options.hand_size)
                .unwrap_or(defaults.default_options.hand_size),
            ..defaults.default_options
        };

        Self {
            long_poll_timeout: secs("CROSSCLUES_LONG_POLL_SECS", defaults.long_poll_timeout),
            incomplete_ttl: secs("CROSSCLUES_INCOMPLETE_TTL_SECS", defaults.incomplete_ttl),
            max_age: secs("CROSSCLUES_MAX_AGE_SECS", defaults.max_age),
            expiry_interval: secs("CROSSCLUES_EXPIRY_INTERVAL_SECS", defaults.expiry_interval),
            default_options,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Option<T>
where
    T: FromStr + std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}, using {}", key, raw, default);
            None
        }
    }
}
