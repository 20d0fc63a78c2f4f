//! Round, bomb and combat simulation

pub mod assist;
pub mod bomb;
pub mod combat;
pub mod damage;
pub mod economy;
pub mod map;
pub mod r#match;
pub mod physics;
pub mod player;
pub mod round;
pub mod runner;
pub mod snapshot;

pub use player::{Item, Player, PlayerId, Team};
pub use r#match::{HitReport, MatchState};
pub use round::{RoundEndReason, RoundPhase, RoundWinner, Scores};
pub use runner::{GameMatch, HandleError, MatchCommand, MatchHandle};
