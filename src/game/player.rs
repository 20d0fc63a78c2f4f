//! Player state (authoritative)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::combat::Weapon;
use super::physics::Vec2;

pub type PlayerId = Uuid;

pub const MAX_HEALTH: u32 = 100;
pub const MAX_ARMOR: u32 = 100;

/// Team assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    #[serde(rename = "ct")]
    CounterTerrorist,
    #[serde(rename = "t")]
    Terrorist,
}

impl Team {
    pub fn opposite(self) -> Team {
        match self {
            Team::CounterTerrorist => Team::Terrorist,
            Team::Terrorist => Team::CounterTerrorist,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::CounterTerrorist => write!(f, "ct"),
            Team::Terrorist => write!(f, "t"),
        }
    }
}

/// Inventory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "item", content = "weapon", rename_all = "snake_case")]
pub enum Item {
    Weapon(Weapon),
    Bomb,
    DefuseKit,
}

/// Per-match counters consumed by the stats collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    /// Kills in the current round, used for the round MVP
    pub round_kills: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub team: Team,

    pub health: u32,
    pub armor: u32,
    pub has_helmet: bool,
    pub alive: bool,
    pub money: u32,

    pub position: Vec2,
    pub velocity: Vec2,

    pub current_weapon: Weapon,
    pub inventory: BTreeSet<Item>,

    /// Match time of the last damage taken
    pub last_damage_time: Option<f32>,
    pub in_pain: bool,

    pub stats: PlayerStats,
}

impl Player {
    pub fn new(id: PlayerId, display_name: String, team: Team, money: u32) -> Self {
        let sidearm = match team {
            Team::CounterTerrorist => Weapon::Usp,
            Team::Terrorist => Weapon::Glock,
        };
        let inventory = [Item::Weapon(Weapon::Knife), Item::Weapon(sidearm)]
            .into_iter()
            .collect();

        Self {
            id,
            display_name,
            team,
            health: MAX_HEALTH,
            armor: 0,
            has_helmet: false,
            alive: true,
            money,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            current_weapon: sidearm,
            inventory,
            last_damage_time: None,
            in_pain: false,
            stats: PlayerStats::default(),
        }
    }

    pub fn has_item(&self, item: Item) -> bool {
        self.inventory.contains(&item)
    }

    pub fn give_item(&mut self, item: Item) {
        self.inventory.insert(item);
    }

    /// Returns false if the item was not carried
    pub fn take_item(&mut self, item: Item) -> bool {
        self.inventory.remove(&item)
    }

    pub fn has_defuse_kit(&self) -> bool {
        self.has_item(Item::DefuseKit)
    }

    /// Add money, clamped to `max_money`
    pub fn credit(&mut self, amount: u32, max_money: u32) {
        self.money = self.money.saturating_add(amount).min(max_money);
    }

    /// Remove money, floored at zero
    pub fn debit(&mut self, amount: u32) {
        self.money = self.money.saturating_sub(amount);
    }

    /// Recently damaged
    pub fn is_in_pain(&self, now: f32, pain_duration: f32) -> bool {
        self.in_pain
            && self
                .last_damage_time
                .is_some_and(|at| now - at < pain_duration)
    }

    /// Round start: full health, alive, at spawn. Armor, money and inventory persist.
    pub fn reset_for_round(&mut self, spawn: Vec2) {
        self.health = MAX_HEALTH;
        self.alive = true;
        self.position = spawn;
        self.velocity = Vec2::ZERO;
        self.in_pain = false;
        self.last_damage_time = None;
        self.stats.round_kills = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(team: Team) -> Player {
        Player::new(Uuid::new_v4(), "tester".to_string(), team, 800)
    }

    #[test]
    fn new_player_gets_team_sidearm() {
        let ct = player(Team::CounterTerrorist);
        assert_eq!(ct.current_weapon, Weapon::Usp);
        assert!(ct.has_item(Item::Weapon(Weapon::Knife)));
        let t = player(Team::Terrorist);
        assert_eq!(t.current_weapon, Weapon::Glock);
    }

    #[test]
    fn credit_clamps_to_max() {
        let mut p = player(Team::Terrorist);
        p.money = 15_900;
        p.credit(3_250, 16_000);
        assert_eq!(p.money, 16_000);
        p.debit(20_000);
        assert_eq!(p.money, 0);
    }

    #[test]
    fn round_reset_keeps_armor_and_money() {
        let mut p = player(Team::CounterTerrorist);
        p.health = 12;
        p.armor = 40;
        p.alive = false;
        p.money = 4_200;
        p.velocity = Vec2::new(3.0, 1.0);
        p.reset_for_round(Vec2::new(100.0, 100.0));
        assert_eq!(p.health, MAX_HEALTH);
        assert_eq!(p.armor, 40);
        assert_eq!(p.money, 4_200);
        assert!(p.alive);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn pain_expires() {
        let mut p = player(Team::Terrorist);
        p.in_pain = true;
        p.last_damage_time = Some(10.0);
        assert!(p.is_in_pain(11.0, 2.0));
        assert!(!p.is_in_pain(12.5, 2.0));
    }

    #[test]
    fn team_serializes_as_short_code() {
        assert_eq!(serde_json::to_string(&Team::CounterTerrorist).unwrap(), "\"ct\"");
        assert_eq!(serde_json::to_string(&Team::Terrorist).unwrap(), "\"t\"");
    }
}
