//! Domain event definitions.
//! These are the payloads observers (HUD, network layer, stats) receive.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::Weapon;
use crate::game::economy::Purchase;
use crate::game::physics::Vec2;
use crate::game::player::{PlayerId, Team};
use crate::game::round::{RoundEndReason, RoundWinner, Scores};

/// Why a defuse attempt ended without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefuseStopReason {
    /// The defuser (or the input layer on their behalf) let go
    Interrupted,
    /// Defuser left the defuse radius
    OutOfRange,
    /// Defuser was killed
    Died,
    /// Defuser left the match
    Disconnected,
}

/// Game events, in the order they were generated within a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        display_name: String,
        team: Team,
    },

    PlayerLeft {
        player_id: PlayerId,
        reason: String,
    },

    /// New round initialised, freeze time running
    RoundFreeze {
        round_number: u32,
        freeze_time: f32,
    },

    /// Freeze time over, round is live
    RoundStart {
        round_number: u32,
    },

    ItemPurchased {
        player_id: PlayerId,
        item: Purchase,
        price: u32,
        money_left: u32,
    },

    BombPlanted {
        player_id: PlayerId,
        position: Vec2,
        site_id: String,
    },

    DefuseStarted {
        player_id: PlayerId,
        /// Seconds the defuse takes
        duration: f32,
        has_kit: bool,
    },

    DefuseStopped {
        player_id: PlayerId,
        reason: DefuseStopReason,
    },

    BombDefused {
        player_id: PlayerId,
    },

    BombExploded {
        position: Vec2,
        planter_id: PlayerId,
    },

    /// Damage that did not kill
    PlayerDamage {
        player_id: PlayerId,
        source_id: Option<PlayerId>,
        /// Health removed, after armor
        amount: u32,
        headshot: bool,
        /// Armor left after the hit
        armor: u32,
    },

    PlayerDeath {
        /// None for the bomb or self-inflicted damage
        killer_id: Option<PlayerId>,
        victim_id: PlayerId,
        weapon: Weapon,
        headshot: bool,
        assists: Vec<PlayerId>,
    },

    /// Projectile stopped by map geometry
    ProjectileImpact {
        projectile_id: Uuid,
        position: Vec2,
    },

    RoundEnd {
        round_number: u32,
        reason: RoundEndReason,
        winner: RoundWinner,
        scores: Scores,
        mvp: Option<PlayerId>,
    },

    /// Teams and scores swapped
    Halftime {
        round_number: u32,
        scores: Scores,
    },

    MatchEnd {
        winner: RoundWinner,
        final_score: Scores,
    },
}

impl GameEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::PlayerJoined { .. } => "player_joined",
            GameEvent::PlayerLeft { .. } => "player_left",
            GameEvent::RoundFreeze { .. } => "round_freeze",
            GameEvent::RoundStart { .. } => "round_start",
            GameEvent::ItemPurchased { .. } => "item_purchased",
            GameEvent::BombPlanted { .. } => "bomb_planted",
            GameEvent::DefuseStarted { .. } => "defuse_started",
            GameEvent::DefuseStopped { .. } => "defuse_stopped",
            GameEvent::BombDefused { .. } => "bomb_defused",
            GameEvent::BombExploded { .. } => "bomb_exploded",
            GameEvent::PlayerDamage { .. } => "player_damage",
            GameEvent::PlayerDeath { .. } => "player_death",
            GameEvent::ProjectileImpact { .. } => "projectile_impact",
            GameEvent::RoundEnd { .. } => "round_end",
            GameEvent::Halftime { .. } => "halftime",
            GameEvent::MatchEnd { .. } => "match_end",
        }
    }
}

/// Event plus when it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Simulation tick that generated the event
    pub tick: u64,
    /// Match time in seconds
    pub time: f32,
    /// Round in progress, kept apart from the event's own `round_number`
    #[serde(rename = "round")]
    pub round_number: u32,
    #[serde(flatten)]
    pub event: GameEvent,
}
