//! Declined-command results.
//!
//! Everything here is an expected outcome of normal play: the input layer
//! shows the reason to the player and carries on. Broken simulation
//! invariants are not represented here; they panic at the point of detection.

use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// Why a command was declined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Refusal {
    #[error("Unknown player {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("Player is already in the match")]
    AlreadyJoined,

    #[error("Team is full")]
    TeamFull,

    #[error("Match is over")]
    MatchOver,

    #[error("Round is not live")]
    RoundNotLive,

    #[error("Player is not alive")]
    PlayerDead,

    #[error("Players cannot move during freeze time")]
    Frozen,

    #[error("Target is not alive")]
    TargetDead,

    #[error("Players cannot damage themselves")]
    SelfHit,

    #[error("Friendly fire is disabled")]
    FriendlyFire,

    #[error("Only terrorists can plant the bomb")]
    NotTerrorist,

    #[error("Player does not have the bomb")]
    NoBombCarried,

    #[error("Bomb is already planted")]
    BombAlreadyPlanted,

    #[error("Must be in bomb site to plant")]
    NotInBombSite,

    #[error("Only CTs can defuse the bomb")]
    NotCounterTerrorist,

    #[error("No bomb is planted")]
    NoBombPlanted,

    #[error("Must be closer to the bomb")]
    TooFarFromBomb,

    #[error("Bomb cannot be defused")]
    BombInactive,

    #[error("Someone is already defusing")]
    AlreadyDefusing,

    #[error("Player is not defusing")]
    NotDefusing,

    #[error("Buy time is over")]
    NotBuyTime,

    #[error("Item is not for sale")]
    NotForSale,

    #[error("Item is not available to this team")]
    WrongTeamItem,

    #[error("Not enough money: costs {price}, have {money}")]
    InsufficientFunds { price: u32, money: u32 },

    #[error("Cannot carry any more of that")]
    CannotCarry,
}

/// Result type for inbound commands
pub type CommandResult<T> = Result<T, Refusal>;
