//! Round Registry Module
//!
//! The concurrent layer over `game/`: one lock per round, a map of live
//! rounds keyed by id, and the signals long-polls wait on.
//!
//! ## Module Structure
//!
//! - `signal`: One-shot broadcast signals and the long-poll wait
//! - `handle`: A single lockable round with cached serialization
//! - `manager`: Id → round map, continuation, expiry, long-poll

pub mod signal;
pub mod handle;
pub mod manager;

pub use signal::{ChangeWatch, Signal, Wake};
pub use handle::RoundHandle;
pub use manager::{PollOutcome, RegistryError, RoundRegistry};
