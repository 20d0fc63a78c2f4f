//! Authoritative round, bomb and combat simulation for a bomb-defusal
//! tactical shooter.
//!
//! [`game::MatchState`] is the deterministic core: feed it commands and
//! `advance(dt)` calls and observe the events it dispatches.
//! [`game::GameMatch`] runs one on a tokio tick loop behind a
//! [`game::MatchHandle`].

pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod util;
