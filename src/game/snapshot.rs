//! Periodic state snapshots for spectators and HUD collaborators

use serde::{Deserialize, Serialize};

use super::combat::Weapon;
use super::physics::Vec2;
use super::player::{Item, PlayerId, PlayerStats, Team};
use super::r#match::MatchState;
use super::round::{RoundPhase, Scores};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub display_name: String,
    pub team: Team,
    pub health: u32,
    pub armor: u32,
    pub has_helmet: bool,
    pub alive: bool,
    pub money: u32,
    pub position: Vec2,
    pub current_weapon: Weapon,
    pub has_bomb: bool,
    pub has_defuse_kit: bool,
    pub in_pain: bool,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombSnapshot {
    pub position: Vec2,
    pub site_id: String,
    pub fuse_remaining: f32,
    pub defuser_id: Option<PlayerId>,
    pub defuse_progress: f32,
    pub exploded: bool,
    pub defused: bool,
}

/// Full match state at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub time: f32,
    pub round_number: u32,
    pub phase: RoundPhase,
    pub scores: Scores,
    pub round_time_remaining: f32,
    pub bomb: Option<BombSnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

/// Decides when a snapshot is due and builds it
pub struct SnapshotBuilder {
    /// Ticks since the last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    pub fn build(state: &MatchState) -> MatchSnapshot {
        let players = state
            .players()
            .map(|p| PlayerSnapshot {
                id: p.id,
                display_name: p.display_name.clone(),
                team: p.team,
                health: p.health,
                armor: p.armor,
                has_helmet: p.has_helmet,
                alive: p.alive,
                money: p.money,
                position: p.position,
                current_weapon: p.current_weapon,
                has_bomb: p.has_item(Item::Bomb),
                has_defuse_kit: p.has_defuse_kit(),
                in_pain: p.in_pain,
                stats: p.stats,
            })
            .collect();

        let bomb = state.bomb().bomb().map(|b| BombSnapshot {
            position: b.position,
            site_id: b.site_id.clone(),
            fuse_remaining: b.fuse.remaining(),
            defuser_id: b.defuser_id,
            defuse_progress: state.defuse_progress(),
            exploded: b.exploded,
            defused: b.defused,
        });

        MatchSnapshot {
            tick: state.tick(),
            time: state.time(),
            round_number: state.round_number(),
            phase: state.phase(),
            scores: state.scores(),
            round_time_remaining: state.round_time_remaining(),
            bomb,
            players,
        }
    }
}
