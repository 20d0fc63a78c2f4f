//! Damage resolution: armor absorption, headshots, death and kill credit.
//!
//! Rounding rule: every fractional intermediate is floored (integer
//! division), both for the share sent to armor and for the health reduction
//! armor buys.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{EventDispatcher, GameEvent};

use super::assist::AssistTracker;
use super::combat::Weapon;
use super::economy::EconomySettings;
use super::physics::Vec2;
use super::player::{Player, PlayerId, MAX_ARMOR, MAX_HEALTH};

/// Headshots double the health damage that got past armor
pub const HEADSHOT_MULTIPLIER: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Damage,
    Death,
    Heal,
    ArmorDamage,
}

/// Entry in a player's damage history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub kind: DamageKind,
    pub target_id: PlayerId,
    /// Health removed after armor (health restored for heals, armor lost for armor damage)
    pub amount: u32,
    pub source_id: Option<PlayerId>,
    pub position: Vec2,
    pub headshot: bool,
    /// Match time
    pub timestamp: f32,
}

/// Raw damage to resolve against one player
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRequest {
    pub amount: u32,
    /// Attacking player; None for the bomb and other world damage
    pub source: Option<PlayerId>,
    pub weapon: Weapon,
    pub headshot: bool,
    pub armor_piercing: bool,
    pub position: Vec2,
}

/// Pure result of the armor and headshot math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub armor_absorbed: u32,
    pub health_damage: u32,
}

/// Split raw damage between armor and health.
///
/// Armor takes half the raw damage (capped at what is left) and spares
/// health half of what it took. The headshot multiplier applies afterwards.
pub fn resolve_damage(
    armor: u32,
    raw: u32,
    headshot: bool,
    armor_piercing: bool,
) -> DamageOutcome {
    let armor_absorbed = if armor > 0 && !armor_piercing {
        (raw / 2).min(armor)
    } else {
        0
    };

    let mut health_damage = raw - armor_absorbed / 2;
    if headshot {
        health_damage = health_damage.saturating_mul(HEADSHOT_MULTIPLIER);
    }

    DamageOutcome {
        armor_absorbed,
        health_damage,
    }
}

/// What one `apply_damage` call did
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDamage {
    pub target_id: PlayerId,
    pub outcome: DamageOutcome,
    pub killed: bool,
    pub assists: Vec<PlayerId>,
    pub event: DamageEvent,
}

/// Owns damage histories and the assist window
#[derive(Debug, Clone)]
pub struct DamageSystem {
    history_cap: usize,
    histories: HashMap<PlayerId, VecDeque<DamageEvent>>,
    assists: AssistTracker,
}

impl DamageSystem {
    pub fn new(history_cap: usize, assist_window: f32) -> Self {
        Self {
            history_cap,
            histories: HashMap::new(),
            assists: AssistTracker::new(assist_window),
        }
    }

    /// Resolve one hit against `target_id`.
    ///
    /// Panics if the target does not exist or is already dead: callers
    /// screen hits before they get here.
    pub fn apply_damage(
        &mut self,
        players: &mut BTreeMap<PlayerId, Player>,
        target_id: PlayerId,
        request: &DamageRequest,
        now: f32,
        economy: &EconomySettings,
        events: &mut EventDispatcher,
    ) -> AppliedDamage {
        let Some(target) = players.get_mut(&target_id) else {
            panic!("damage applied to unknown player {target_id}");
        };
        assert!(target.alive, "damage applied to dead player {target_id}");

        let outcome = resolve_damage(
            target.armor,
            request.amount,
            request.headshot,
            request.armor_piercing,
        );
        target.armor -= outcome.armor_absorbed;
        let removed = outcome.health_damage.min(target.health);
        target.health -= removed;
        target.in_pain = true;
        target.last_damage_time = Some(now);
        target.stats.damage_taken += removed;

        let killed = target.health == 0;
        let remaining_armor = target.armor;
        let target_team = target.team;

        if outcome.armor_absorbed > 0 {
            self.record(DamageEvent {
                kind: DamageKind::ArmorDamage,
                target_id,
                amount: outcome.armor_absorbed,
                source_id: request.source,
                position: request.position,
                headshot: request.headshot,
                timestamp: now,
            });
        }
        let event = DamageEvent {
            kind: if killed {
                DamageKind::Death
            } else {
                DamageKind::Damage
            },
            target_id,
            amount: outcome.health_damage,
            source_id: request.source,
            position: request.position,
            headshot: request.headshot,
            timestamp: now,
        };
        self.record(event.clone());

        // Attributed damage from another player
        let attacker = request.source.filter(|source| *source != target_id);
        if let Some(attacker_id) = attacker {
            if outcome.health_damage > 0 {
                self.assists.record(target_id, attacker_id, now);
            }
            if let Some(attacker) = players.get_mut(&attacker_id) {
                attacker.stats.damage_dealt += removed;
            }
        }

        if !killed {
            events.emit(GameEvent::PlayerDamage {
                player_id: target_id,
                source_id: request.source,
                amount: outcome.health_damage,
                headshot: request.headshot,
                armor: remaining_armor,
            });
            return AppliedDamage {
                target_id,
                outcome,
                killed,
                assists: Vec::new(),
                event,
            };
        }

        // Death finalisation
        if let Some(victim) = players.get_mut(&target_id) {
            victim.alive = false;
            victim.in_pain = false;
            victim.stats.deaths += 1;
        }

        let assists = self.assists.take_assists(target_id, attacker, now);
        for assist_id in &assists {
            if let Some(helper) = players.get_mut(assist_id) {
                helper.stats.assists += 1;
            }
        }

        if let Some(killer) = attacker.and_then(|id| players.get_mut(&id)) {
            if killer.team == target_team {
                killer.debit(economy.team_kill_penalty);
                info!(killer_id = %killer.id, victim_id = %target_id, "Team kill");
            } else {
                let reward = economy.kill_reward(request.weapon.category());
                killer.credit(reward, economy.max_money);
                killer.stats.kills += 1;
                killer.stats.round_kills += 1;
            }
        }

        debug!(
            victim_id = %target_id,
            killer_id = ?attacker,
            weapon = ?request.weapon,
            headshot = request.headshot,
            assists = assists.len(),
            "Player killed"
        );

        events.emit(GameEvent::PlayerDeath {
            killer_id: attacker,
            victim_id: target_id,
            weapon: request.weapon,
            headshot: request.headshot,
            assists: assists.clone(),
        });

        AppliedDamage {
            target_id,
            outcome,
            killed,
            assists,
            event,
        }
    }

    /// Restore health up to the cap; records a heal with the amount restored
    pub fn heal(&mut self, player: &mut Player, amount: u32, now: f32) -> DamageEvent {
        let before = player.health;
        player.health = player.health.saturating_add(amount).min(MAX_HEALTH);
        let event = DamageEvent {
            kind: DamageKind::Heal,
            target_id: player.id,
            amount: player.health - before,
            source_id: None,
            position: player.position,
            headshot: false,
            timestamp: now,
        };
        self.record(event.clone());
        event
    }

    /// Add armor up to the cap
    pub fn give_armor(player: &mut Player, amount: u32, helmet: bool) {
        player.armor = player.armor.saturating_add(amount).min(MAX_ARMOR);
        player.has_helmet |= helmet;
    }

    fn record(&mut self, event: DamageEvent) {
        let history = self.histories.entry(event.target_id).or_default();
        history.push_back(event);
        while history.len() > self.history_cap {
            history.pop_front();
        }
    }

    /// Oldest first
    pub fn history(&self, player_id: PlayerId) -> impl Iterator<Item = &DamageEvent> {
        self.histories.get(&player_id).into_iter().flatten()
    }

    /// Health damage `player_id` dealt to others within the last `window` seconds
    pub fn damage_dealt(&self, player_id: PlayerId, now: f32, window: f32) -> u32 {
        self.histories
            .values()
            .flatten()
            .filter(|e| e.source_id == Some(player_id) && e.target_id != player_id)
            .filter(|e| matches!(e.kind, DamageKind::Damage | DamageKind::Death))
            .filter(|e| now - e.timestamp <= window)
            .map(|e| e.amount)
            .sum()
    }

    /// Health damage `player_id` received within the last `window` seconds
    pub fn damage_received(&self, player_id: PlayerId, now: f32, window: f32) -> u32 {
        self.history(player_id)
            .filter(|e| matches!(e.kind, DamageKind::Damage | DamageKind::Death))
            .filter(|e| now - e.timestamp <= window)
            .map(|e| e.amount)
            .sum()
    }

    /// Expire old assist entries
    pub fn prune(&mut self, now: f32) {
        self.assists.prune(now);
    }

    pub fn assists(&self) -> &AssistTracker {
        &self.assists
    }

    /// Round reset for one player
    pub fn reset_player(&mut self, player_id: PlayerId) {
        self.histories.remove(&player_id);
        self.assists.clear_victim(player_id);
    }

    /// Player left the match
    pub fn forget(&mut self, player_id: PlayerId) {
        self.histories.remove(&player_id);
        self.assists.forget(player_id);
    }
}
