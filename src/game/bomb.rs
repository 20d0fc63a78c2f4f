//! Bomb lifecycle: carried, planted, defusing, then exploded or defused

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::error::{CommandResult, Refusal};
use crate::events::{DefuseStopReason, EventDispatcher, GameEvent};
use crate::util::time::Countdown;

use super::combat::Weapon;
use super::damage::{DamageRequest, DamageSystem};
use super::economy::EconomySettings;
use super::map::{BombSite, MapLayout};
use super::physics::{PhysicsSystem, Vec2};
use super::player::{Item, Player, PlayerId, Team};

/// Bomb timings and blast parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BombRules {
    pub bomb_timer: f32,
    pub defuse_time_no_kit: f32,
    pub defuse_time_with_kit: f32,
    pub defuse_radius: f32,
    pub explosion_radius: f32,
    pub explosion_damage: u32,
}

impl From<&MatchConfig> for BombRules {
    fn from(config: &MatchConfig) -> Self {
        Self {
            bomb_timer: config.bomb_timer,
            defuse_time_no_kit: config.defuse_time_no_kit,
            defuse_time_with_kit: config.defuse_time_with_kit,
            defuse_radius: config.defuse_radius,
            explosion_radius: config.explosion_radius,
            explosion_damage: config.explosion_damage,
        }
    }
}

/// The planted bomb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub position: Vec2,
    pub site_id: String,
    pub planter_id: PlayerId,
    /// Match time of the plant
    pub plant_time: f32,
    pub fuse: Countdown,
    pub defuser_id: Option<PlayerId>,
    pub defuse_start_time: Option<f32>,
    pub exploded: bool,
    pub defused: bool,
    pub defused_by: Option<PlayerId>,
}

impl Bomb {
    /// Exploded or defused; nothing more can happen to it
    pub fn is_terminal(&self) -> bool {
        self.exploded || self.defused
    }

    pub fn is_defusing(&self) -> bool {
        self.defuser_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefuseAttempt {
    pub player_id: PlayerId,
    pub start_time: f32,
    /// Seconds needed
    pub duration: f32,
    pub has_kit: bool,
    /// Seconds of defusing done so far
    pub elapsed: f32,
    pub was_interrupted: bool,
    pub is_complete: bool,
}

impl DefuseAttempt {
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

/// What the bomb did during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BombTick {
    #[default]
    Idle,
    Exploded,
    Defused,
}

#[derive(Debug, Clone)]
pub struct BombController {
    rules: BombRules,
    bomb: Option<Bomb>,
    defuse: Option<DefuseAttempt>,
    /// Most recent attempt that ended this round
    last_defuse: Option<DefuseAttempt>,
}

impl BombController {
    pub fn new(rules: BombRules) -> Self {
        Self {
            rules,
            bomb: None,
            defuse: None,
            last_defuse: None,
        }
    }

    pub fn bomb(&self) -> Option<&Bomb> {
        self.bomb.as_ref()
    }

    pub fn defuse_attempt(&self) -> Option<&DefuseAttempt> {
        self.defuse.as_ref()
    }

    /// Last finished attempt this round, with its interrupted/complete flags
    pub fn last_defuse(&self) -> Option<&DefuseAttempt> {
        self.last_defuse.as_ref()
    }

    /// A bomb exists this round, whatever its state
    pub fn is_planted(&self) -> bool {
        self.bomb.is_some()
    }

    pub fn is_exploded(&self) -> bool {
        self.bomb.as_ref().is_some_and(|b| b.exploded)
    }

    pub fn is_defused(&self) -> bool {
        self.bomb.as_ref().is_some_and(|b| b.defused)
    }

    /// Fraction of the current defuse done, 0 when nobody is defusing
    pub fn defuse_progress(&self) -> f32 {
        self.defuse.as_ref().map_or(0.0, DefuseAttempt::progress)
    }

    /// Round initialisation
    pub fn reset(&mut self) {
        self.bomb = None;
        self.defuse = None;
        self.last_defuse = None;
    }

    /// Site `player` would plant at
    pub fn can_plant<'a>(&self, player: &Player, layout: &'a MapLayout) -> CommandResult<&'a BombSite> {
        if player.team != Team::Terrorist {
            return Err(Refusal::NotTerrorist);
        }
        if !player.alive {
            return Err(Refusal::PlayerDead);
        }
        if !player.has_item(Item::Bomb) {
            return Err(Refusal::NoBombCarried);
        }
        if self.bomb.is_some() {
            return Err(Refusal::BombAlreadyPlanted);
        }
        layout
            .nearest_site(player.position)
            .filter(|site| site.contains(player.position))
            .ok_or(Refusal::NotInBombSite)
    }

    /// Plant at the player's position. Returns the site id.
    pub fn plant(
        &mut self,
        player: &mut Player,
        layout: &MapLayout,
        now: f32,
        economy: &EconomySettings,
        events: &mut EventDispatcher,
    ) -> CommandResult<String> {
        let site_id = self.can_plant(player, layout)?.id.clone();

        player.take_item(Item::Bomb);
        player.credit(economy.bomb_plant_bonus, economy.max_money);

        self.bomb = Some(Bomb {
            position: player.position,
            site_id: site_id.clone(),
            planter_id: player.id,
            plant_time: now,
            fuse: Countdown::new(self.rules.bomb_timer),
            defuser_id: None,
            defuse_start_time: None,
            exploded: false,
            defused: false,
            defused_by: None,
        });

        info!(player_id = %player.id, site = %site_id, "Bomb planted");
        events.emit(GameEvent::BombPlanted {
            player_id: player.id,
            position: player.position,
            site_id: site_id.clone(),
        });

        Ok(site_id)
    }

    pub fn can_defuse(&self, player: &Player) -> CommandResult<()> {
        if player.team != Team::CounterTerrorist {
            return Err(Refusal::NotCounterTerrorist);
        }
        if !player.alive {
            return Err(Refusal::PlayerDead);
        }
        let Some(bomb) = &self.bomb else {
            return Err(Refusal::NoBombPlanted);
        };
        if !PhysicsSystem::within_radius(player.position, bomb.position, self.rules.defuse_radius) {
            return Err(Refusal::TooFarFromBomb);
        }
        if bomb.is_terminal() {
            return Err(Refusal::BombInactive);
        }
        if bomb.is_defusing() {
            return Err(Refusal::AlreadyDefusing);
        }
        Ok(())
    }

    /// Start defusing. Returns the defuse duration.
    pub fn start_defuse(
        &mut self,
        player: &Player,
        now: f32,
        events: &mut EventDispatcher,
    ) -> CommandResult<f32> {
        self.can_defuse(player)?;
        let Some(bomb) = self.bomb.as_mut() else {
            return Err(Refusal::NoBombPlanted);
        };

        let has_kit = player.has_defuse_kit();
        let duration = if has_kit {
            self.rules.defuse_time_with_kit
        } else {
            self.rules.defuse_time_no_kit
        };

        bomb.defuser_id = Some(player.id);
        bomb.defuse_start_time = Some(now);
        self.defuse = Some(DefuseAttempt {
            player_id: player.id,
            start_time: now,
            duration,
            has_kit,
            elapsed: 0.0,
            was_interrupted: false,
            is_complete: false,
        });

        info!(player_id = %player.id, duration, has_kit, "Defuse started");
        events.emit(GameEvent::DefuseStarted {
            player_id: player.id,
            duration,
            has_kit,
        });
        Ok(duration)
    }

    pub fn stop_defuse(
        &mut self,
        player_id: PlayerId,
        reason: DefuseStopReason,
        events: &mut EventDispatcher,
    ) -> CommandResult<()> {
        match &self.defuse {
            Some(attempt) if attempt.player_id == player_id => {}
            _ => return Err(Refusal::NotDefusing),
        }

        if let Some(mut attempt) = self.defuse.take() {
            attempt.was_interrupted = true;
            debug!(%player_id, progress = attempt.progress(), ?reason, "Defuse stopped");
            self.last_defuse = Some(attempt);
        }
        if let Some(bomb) = self.bomb.as_mut() {
            bomb.defuser_id = None;
            bomb.defuse_start_time = None;
        }

        events.emit(GameEvent::DefuseStopped { player_id, reason });
        Ok(())
    }

    /// Stop a defuse whose defuser died, left or walked out of range
    pub fn enforce_defuser(
        &mut self,
        players: &BTreeMap<PlayerId, Player>,
        events: &mut EventDispatcher,
    ) {
        let (Some(attempt), Some(bomb)) = (&self.defuse, &self.bomb) else {
            return;
        };
        let defuser_id = attempt.player_id;
        let reason = match players.get(&defuser_id) {
            None => Some(DefuseStopReason::Disconnected),
            Some(p) if !p.alive => Some(DefuseStopReason::Died),
            Some(p)
                if !PhysicsSystem::within_radius(p.position, bomb.position, self.rules.defuse_radius) =>
            {
                Some(DefuseStopReason::OutOfRange)
            }
            Some(_) => None,
        };
        if let Some(reason) = reason {
            // Cannot fail: the attempt belongs to this defuser
            let _ = self.stop_defuse(defuser_id, reason, events);
        }
    }

    /// Advance the fuse, then the defuse. An explosion on this tick drops the
    /// defuse before it can progress.
    pub fn tick(
        &mut self,
        dt: f32,
        now: f32,
        players: &mut BTreeMap<PlayerId, Player>,
        damage: &mut DamageSystem,
        economy: &EconomySettings,
        events: &mut EventDispatcher,
    ) -> BombTick {
        let Some(bomb) = self.bomb.as_mut() else {
            return BombTick::Idle;
        };
        if bomb.is_terminal() {
            return BombTick::Idle;
        }

        if bomb.fuse.tick(dt) {
            self.explode(now, players, damage, economy, events);
            return BombTick::Exploded;
        }

        if let Some(attempt) = self.defuse.as_mut() {
            attempt.elapsed += dt;
        }
        if self.complete_defuse(players, economy, events) {
            return BombTick::Defused;
        }
        BombTick::Idle
    }

    /// Finish the current defuse if enough time has been spent on it
    pub fn complete_defuse(
        &mut self,
        players: &mut BTreeMap<PlayerId, Player>,
        economy: &EconomySettings,
        events: &mut EventDispatcher,
    ) -> bool {
        let ready = self
            .defuse
            .as_ref()
            .is_some_and(|attempt| attempt.elapsed >= attempt.duration);
        let Some(bomb) = self.bomb.as_mut().filter(|_| ready) else {
            return false;
        };
        let Some(mut attempt) = self.defuse.take() else {
            return false;
        };

        attempt.is_complete = true;
        bomb.defused = true;
        bomb.defused_by = Some(attempt.player_id);
        bomb.defuser_id = None;

        if let Some(defuser) = players.get_mut(&attempt.player_id) {
            defuser.credit(economy.bomb_defuse_bonus, economy.max_money);
        }

        info!(player_id = %attempt.player_id, has_kit = attempt.has_kit, "Bomb defused");
        events.emit(GameEvent::BombDefused {
            player_id: attempt.player_id,
        });
        self.last_defuse = Some(attempt);
        true
    }

    fn explode(
        &mut self,
        now: f32,
        players: &mut BTreeMap<PlayerId, Player>,
        damage: &mut DamageSystem,
        economy: &EconomySettings,
        events: &mut EventDispatcher,
    ) {
        let Some(bomb) = self.bomb.as_mut() else {
            return;
        };
        bomb.exploded = true;
        bomb.defuser_id = None;
        bomb.defuse_start_time = None;
        let (position, planter_id) = (bomb.position, bomb.planter_id);

        if let Some(mut attempt) = self.defuse.take() {
            attempt.was_interrupted = true;
            self.last_defuse = Some(attempt);
        }

        let rules = self.rules;
        let victims: Vec<(PlayerId, u32)> = players
            .values()
            .filter(|p| p.alive)
            .map(|p| {
                let distance = p.position.distance(position);
                let amount = PhysicsSystem::explosion_damage(
                    rules.explosion_damage,
                    rules.explosion_radius,
                    distance,
                );
                (p.id, amount)
            })
            .filter(|(_, amount)| *amount > 0)
            .collect();

        info!(site = %self.bomb.as_ref().map_or("", |b| b.site_id.as_str()), victims = victims.len(), "Bomb exploded");

        for (player_id, amount) in victims {
            let request = DamageRequest {
                amount,
                source: None,
                weapon: Weapon::C4,
                headshot: false,
                armor_piercing: false,
                position,
            };
            damage.apply_damage(players, player_id, &request, now, economy, events);
        }

        events.emit(GameEvent::BombExploded {
            position,
            planter_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct Fixture {
        controller: BombController,
        layout: MapLayout,
        players: BTreeMap<PlayerId, Player>,
        damage: DamageSystem,
        economy: EconomySettings,
        events: EventDispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                controller: BombController::new(BombRules::from(&MatchConfig::default())),
                layout: MapLayout::default(),
                players: BTreeMap::new(),
                damage: DamageSystem::new(50, 5.0),
                economy: EconomySettings::default(),
                events: EventDispatcher::new(),
            }
        }

        fn add(&mut self, team: Team, position: Vec2) -> PlayerId {
            let mut p = Player::new(Uuid::new_v4(), "p".to_string(), team, 800);
            p.position = position;
            let id = p.id;
            self.players.insert(id, p);
            id
        }

        fn plant_at_a(&mut self) -> PlayerId {
            let t = self.add(Team::Terrorist, Vec2::new(200.0, 200.0));
            let planter = self.players.get_mut(&t).unwrap();
            planter.give_item(Item::Bomb);
            self.controller
                .plant(planter, &self.layout, 0.0, &self.economy, &mut self.events)
                .unwrap();
            t
        }

        fn tick(&mut self, dt: f32) -> BombTick {
            self.controller.tick(
                dt,
                0.0,
                &mut self.players,
                &mut self.damage,
                &self.economy,
                &mut self.events,
            )
        }
    }

    #[test]
    fn plant_refusals_follow_check_order() {
        let mut fx = Fixture::new();
        let ct = fx.add(Team::CounterTerrorist, Vec2::new(200.0, 200.0));
        let t = fx.add(Team::Terrorist, Vec2::new(500.0, 400.0));

        let c = &fx.controller;
        assert_eq!(c.can_plant(&fx.players[&ct], &fx.layout), Err(Refusal::NotTerrorist));
        assert_eq!(c.can_plant(&fx.players[&t], &fx.layout), Err(Refusal::NoBombCarried));

        fx.players.get_mut(&t).unwrap().give_item(Item::Bomb);
        assert_eq!(
            fx.controller.can_plant(&fx.players[&t], &fx.layout),
            Err(Refusal::NotInBombSite)
        );

        fx.players.get_mut(&t).unwrap().alive = false;
        assert_eq!(
            fx.controller.can_plant(&fx.players[&t], &fx.layout),
            Err(Refusal::PlayerDead)
        );
    }

    #[test]
    fn plant_consumes_bomb_and_pays_bonus() {
        let mut fx = Fixture::new();
        let t = fx.plant_at_a();

        let planter = &fx.players[&t];
        assert!(!planter.has_item(Item::Bomb));
        assert_eq!(planter.money, 1_600);
        let bomb = fx.controller.bomb().unwrap();
        assert_eq!(bomb.site_id, "A");
        assert_eq!(bomb.fuse.remaining(), 45.0);

        let flushed = fx.events.flush();
        assert!(matches!(&flushed[0].event, GameEvent::BombPlanted { site_id, .. } if site_id == "A"));
    }

    #[test]
    fn second_plant_is_refused() {
        let mut fx = Fixture::new();
        fx.plant_at_a();
        let t2 = fx.add(Team::Terrorist, Vec2::new(800.0, 600.0));
        fx.players.get_mut(&t2).unwrap().give_item(Item::Bomb);
        assert_eq!(
            fx.controller.can_plant(&fx.players[&t2], &fx.layout),
            Err(Refusal::BombAlreadyPlanted)
        );
    }

    #[test]
    fn kit_halves_defuse_time() {
        let mut fx = Fixture::new();
        fx.plant_at_a();
        let ct = fx.add(Team::CounterTerrorist, Vec2::new(250.0, 200.0));
        fx.players.get_mut(&ct).unwrap().give_item(Item::DefuseKit);

        let duration = fx
            .controller
            .start_defuse(&fx.players[&ct], 0.0, &mut fx.events)
            .unwrap();
        assert_eq!(duration, 5.0);

        for _ in 0..9 {
            assert_eq!(fx.tick(0.5), BombTick::Idle);
        }
        assert_eq!(fx.controller.defuse_progress(), 0.9);
        assert_eq!(fx.tick(0.5), BombTick::Defused);
        assert!(fx.controller.is_defused());
        let finished = fx.controller.last_defuse().unwrap();
        assert!(finished.is_complete);
        assert!(!finished.was_interrupted);
        assert_eq!(finished.player_id, ct);
        assert_eq!(fx.players[&ct].money, 800 + 3_500);
    }

    #[test]
    fn defuse_refusals() {
        let mut fx = Fixture::new();
        let ct = fx.add(Team::CounterTerrorist, Vec2::new(250.0, 200.0));
        assert_eq!(fx.controller.can_defuse(&fx.players[&ct]), Err(Refusal::NoBombPlanted));

        fx.plant_at_a();
        let far = fx.add(Team::CounterTerrorist, Vec2::new(301.0, 200.0));
        assert_eq!(fx.controller.can_defuse(&fx.players[&far]), Err(Refusal::TooFarFromBomb));

        fx.controller.start_defuse(&fx.players[&ct], 0.0, &mut fx.events).unwrap();
        let other = fx.add(Team::CounterTerrorist, Vec2::new(200.0, 250.0));
        assert_eq!(fx.controller.can_defuse(&fx.players[&other]), Err(Refusal::AlreadyDefusing));
    }

    #[test]
    fn explosion_wins_a_tie_with_the_defuse() {
        let mut fx = Fixture::new();
        fx.plant_at_a();
        let ct = fx.add(Team::CounterTerrorist, Vec2::new(200.0, 250.0));

        fx.tick(35.0);
        fx.controller.start_defuse(&fx.players[&ct], 35.0, &mut fx.events).unwrap();
        assert_eq!(fx.tick(9.5), BombTick::Idle);
        assert_eq!(fx.tick(0.5), BombTick::Exploded);

        assert!(fx.controller.is_exploded());
        assert!(!fx.controller.is_defused());
        assert!(fx.controller.defuse_attempt().is_none());
        let cut_short = fx.controller.last_defuse().unwrap();
        assert!(cut_short.was_interrupted);
        assert!(!cut_short.is_complete);
        assert!(!fx.players[&ct].alive);
    }

    #[test]
    fn explosion_damage_falls_off_with_distance() {
        let mut fx = Fixture::new();
        let t = fx.plant_at_a();
        let near = fx.add(Team::CounterTerrorist, Vec2::new(500.0, 200.0));
        let far = fx.add(Team::CounterTerrorist, Vec2::new(700.0, 200.0));
        fx.players.get_mut(&t).unwrap().position = Vec2::new(900.0, 700.0);

        assert_eq!(fx.tick(45.0), BombTick::Exploded);

        // 300 units out takes roughly 200
        assert!(!fx.players[&near].alive);
        assert_eq!(fx.players[&far].health, 100);
        assert_eq!(fx.players[&t].health, 100);
        let names: Vec<_> = fx.events.flush().iter().map(|e| e.event.name()).collect();
        assert_eq!(names, vec!["bomb_planted", "player_death", "bomb_exploded"]);
    }

    #[test]
    fn leaving_the_radius_stops_the_defuse() {
        let mut fx = Fixture::new();
        fx.plant_at_a();
        let ct = fx.add(Team::CounterTerrorist, Vec2::new(200.0, 250.0));
        fx.controller.start_defuse(&fx.players[&ct], 0.0, &mut fx.events).unwrap();
        fx.events.flush();

        fx.players.get_mut(&ct).unwrap().position = Vec2::new(200.0, 400.0);
        fx.controller.enforce_defuser(&fx.players, &mut fx.events);

        assert!(fx.controller.defuse_attempt().is_none());
        assert!(!fx.controller.bomb().unwrap().is_defusing());
        let flushed = fx.events.flush();
        assert!(matches!(
            flushed[0].event,
            GameEvent::DefuseStopped { reason: DefuseStopReason::OutOfRange, .. }
        ));
    }

    #[test]
    fn stop_by_someone_else_is_refused() {
        let mut fx = Fixture::new();
        fx.plant_at_a();
        let ct = fx.add(Team::CounterTerrorist, Vec2::new(200.0, 250.0));
        fx.controller.start_defuse(&fx.players[&ct], 0.0, &mut fx.events).unwrap();

        assert_eq!(
            fx.controller.stop_defuse(Uuid::new_v4(), DefuseStopReason::Interrupted, &mut fx.events),
            Err(Refusal::NotDefusing)
        );
        assert!(fx
            .controller
            .stop_defuse(ct, DefuseStopReason::Interrupted, &mut fx.events)
            .is_ok());
        assert_eq!(fx.controller.defuse_progress(), 0.0);
        assert!(fx.controller.last_defuse().is_some_and(|a| a.was_interrupted && !a.is_complete));

        fx.controller.reset();
        assert!(fx.controller.last_defuse().is_none());
    }
}
