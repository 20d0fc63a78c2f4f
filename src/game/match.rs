//! Match state: rounds, players, bomb and combat for one bomb-defusal match.
//!
//! `MatchState` is the only place game state changes. Commands act
//! immediately and return a `Refusal` when declined; `advance` runs one
//! simulation tick in a fixed order:
//!
//! 1. in-flight actions (projectiles, defuser validity), then the alive
//!    counts used by the elimination rules are taken
//! 2. bomb fuse, then defuse progress
//! 3. freeze, round and phase clocks
//! 4. end-of-round precedence
//! 5. event dispatch, in generation order

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::error::{CommandResult, Refusal};
use crate::events::{DefuseStopReason, EventDispatcher, EventEnvelope, EventObserver, GameEvent};
use crate::util::time::Countdown;

use super::bomb::{BombController, BombRules, BombTick};
use super::combat::{HitDetector, HitResult, Projectile, Weapon, WeaponCategory, WeaponStats};
use super::damage::{AppliedDamage, DamageEvent, DamageRequest, DamageSystem};
use super::economy::{self, settle_round, ConsecutiveLosses, Purchase};
use super::map::MapLayout;
use super::physics::{OpenMap, TileMap, Vec2};
use super::player::{Item, Player, PlayerId, Team};
use super::round::{
    evaluate_round_end, AliveCounts, RoundEndInputs, RoundEndReason, RoundPhase, RoundState,
    RoundWinner, Scores,
};

/// Hit reported by the weapon layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    pub shooter_id: PlayerId,
    /// None for a miss
    pub target_id: Option<PlayerId>,
    pub position: Vec2,
    pub weapon: Weapon,
    /// Raw damage; the weapon's base damage when absent
    #[serde(default)]
    pub damage: Option<u32>,
    pub headshot: bool,
    pub armor_piercing: bool,
}

/// Authoritative match state (owned by the match task)
pub struct MatchState {
    pub id: Uuid,
    config: MatchConfig,
    layout: MapLayout,
    map: Box<dyn TileMap>,
    tick: u64,
    /// Match time in seconds, sum of every `dt`
    time: f32,
    round: RoundState,
    players: BTreeMap<PlayerId, Player>,
    projectiles: Vec<Projectile>,
    bomb: BombController,
    damage: DamageSystem,
    events: EventDispatcher,
    rng: ChaCha8Rng,
}

impl MatchState {
    /// Match on the default layout with no obstacles
    pub fn new(id: Uuid, config: MatchConfig) -> Self {
        Self::with_map(id, config, MapLayout::default(), Box::new(OpenMap))
    }

    pub fn with_map(
        id: Uuid,
        config: MatchConfig,
        layout: MapLayout,
        map: Box<dyn TileMap>,
    ) -> Self {
        Self {
            id,
            layout,
            map,
            tick: 0,
            time: 0.0,
            round: RoundState::default(),
            players: BTreeMap::new(),
            projectiles: Vec::new(),
            bomb: BombController::new(BombRules::from(&config)),
            damage: DamageSystem::new(config.damage_history_cap, config.assist_window),
            events: EventDispatcher::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Register an event observer
    pub fn subscribe(&mut self, observer: Box<dyn EventObserver>) {
        self.events.subscribe(observer);
    }

    // ---- queries ----

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round.number
    }

    pub fn rounds_played(&self) -> u32 {
        self.round.rounds_played
    }

    pub fn scores(&self) -> Scores {
        self.round.scores
    }

    pub fn consecutive_losses(&self) -> ConsecutiveLosses {
        self.round.losses
    }

    /// Seconds left on the round clock
    pub fn round_time_remaining(&self) -> f32 {
        self.round.round_clock.remaining()
    }

    /// Seconds since the round went live
    pub fn round_elapsed(&self) -> f32 {
        self.config.round_time - self.round.round_clock.remaining()
    }

    pub fn freeze_time_remaining(&self) -> f32 {
        self.round.freeze_clock.remaining()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    /// Players in id order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Living players right now
    pub fn alive_counts(&self) -> AliveCounts {
        let mut counts = AliveCounts::default();
        for player in self.players.values().filter(|p| p.alive) {
            match player.team {
                Team::CounterTerrorist => counts.ct += 1,
                Team::Terrorist => counts.t += 1,
            }
        }
        counts
    }

    pub fn bomb(&self) -> &BombController {
        &self.bomb
    }

    pub fn defuse_progress(&self) -> f32 {
        self.bomb.defuse_progress()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Damage `player_id` dealt within the last `window` seconds
    pub fn damage_dealt(&self, player_id: PlayerId, window: f32) -> u32 {
        self.damage.damage_dealt(player_id, self.time, window)
    }

    /// Damage `player_id` received within the last `window` seconds
    pub fn damage_received(&self, player_id: PlayerId, window: f32) -> u32 {
        self.damage.damage_received(player_id, self.time, window)
    }

    pub fn damage_history(&self, player_id: PlayerId) -> Vec<DamageEvent> {
        self.damage.history(player_id).cloned().collect()
    }

    pub fn is_in_pain(&self, player_id: PlayerId) -> bool {
        self.players
            .get(&player_id)
            .is_some_and(|p| p.is_in_pain(self.time, self.config.pain_duration))
    }

    // ---- commands ----

    pub fn join(&mut self, player_id: PlayerId, display_name: String, team: Team) -> CommandResult<()> {
        if self.round.phase == RoundPhase::MatchEnd {
            return Err(Refusal::MatchOver);
        }
        if self.players.contains_key(&player_id) {
            return Err(Refusal::AlreadyJoined);
        }
        let team_size = self.team_size(team);
        if team_size >= self.config.max_players_per_team {
            return Err(Refusal::TeamFull);
        }

        let mut player = Player::new(
            player_id,
            display_name.clone(),
            team,
            self.config.economy.start_money,
        );
        player.position = self.layout.spawn_point(team, team_size);
        // Mid-round joiners wait for the next round
        if matches!(self.round.phase, RoundPhase::Live | RoundPhase::PostRound) {
            player.alive = false;
        }
        self.players.insert(player_id, player);

        info!(
            match_id = %self.id,
            player_id = %player_id,
            %team,
            players = self.players.len(),
            "Player joined match"
        );
        self.events.emit(GameEvent::PlayerJoined {
            player_id,
            display_name,
            team,
        });
        Ok(())
    }

    pub fn leave(&mut self, player_id: PlayerId) -> CommandResult<()> {
        let Some(player) = self.players.remove(&player_id) else {
            return Err(Refusal::UnknownPlayer { player_id });
        };

        if self
            .bomb
            .defuse_attempt()
            .is_some_and(|attempt| attempt.player_id == player_id)
        {
            let _ = self
                .bomb
                .stop_defuse(player_id, DefuseStopReason::Disconnected, &mut self.events);
        }
        self.damage.forget(player_id);
        if player.has_item(Item::Bomb) {
            self.pass_bomb();
        }

        info!(
            match_id = %self.id,
            player_id = %player_id,
            players = self.players.len(),
            "Player left match"
        );
        self.events.emit(GameEvent::PlayerLeft {
            player_id,
            reason: "disconnected".to_string(),
        });
        Ok(())
    }

    /// Plant at the player's position. Returns the site id.
    pub fn request_plant(&mut self, player_id: PlayerId) -> CommandResult<String> {
        self.require_live()?;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        self.bomb.plant(
            player,
            &self.layout,
            self.time,
            &self.config.economy,
            &mut self.events,
        )
    }

    /// Start defusing. Returns the defuse duration in seconds.
    pub fn request_defuse_start(&mut self, player_id: PlayerId) -> CommandResult<f32> {
        self.require_live()?;
        let player = self
            .players
            .get(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        self.bomb.start_defuse(player, self.time, &mut self.events)
    }

    pub fn request_defuse_stop(
        &mut self,
        player_id: PlayerId,
        reason: DefuseStopReason,
    ) -> CommandResult<()> {
        self.bomb.stop_defuse(player_id, reason, &mut self.events)
    }

    /// Buy from the menu during freeze time or the opening `buy_time`
    /// seconds of the live round. Returns the price paid.
    pub fn buy(&mut self, player_id: PlayerId, item: Purchase) -> CommandResult<u32> {
        match self.round.phase {
            RoundPhase::MatchEnd => return Err(Refusal::MatchOver),
            RoundPhase::Freeze => {}
            RoundPhase::Live if self.round_elapsed() < self.config.buy_time => {}
            _ => return Err(Refusal::NotBuyTime),
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        if !player.alive {
            return Err(Refusal::PlayerDead);
        }
        let price = economy::buy(player, item, &self.config.economy)?;
        self.events.emit(GameEvent::ItemPurchased {
            player_id,
            item,
            price,
            money_left: player.money,
        });
        Ok(price)
    }

    /// Apply a hit from the weapon layer. `Ok(None)` for a miss.
    pub fn report_hit(&mut self, hit: HitReport) -> CommandResult<Option<AppliedDamage>> {
        self.require_live()?;
        let shooter_id = hit.shooter_id;
        let shooter = self
            .players
            .get(&shooter_id)
            .ok_or(Refusal::UnknownPlayer {
                player_id: shooter_id,
            })?;
        // Grenade and fire damage outlives the thrower and hurts them too
        let thrown = hit.weapon.category() == WeaponCategory::Grenade;
        if !shooter.alive && !thrown {
            return Err(Refusal::PlayerDead);
        }
        let Some(target_id) = hit.target_id else {
            debug!(match_id = %self.id, shooter_id = %shooter_id, "Shot missed");
            return Ok(None);
        };
        let self_hit = target_id == shooter_id;
        if self_hit && !thrown {
            return Err(Refusal::SelfHit);
        }
        let target = self
            .players
            .get(&target_id)
            .ok_or(Refusal::UnknownPlayer {
                player_id: target_id,
            })?;
        if !target.alive {
            return Err(Refusal::TargetDead);
        }
        if !self_hit && target.team == shooter.team && !self.config.friendly_fire {
            return Err(Refusal::FriendlyFire);
        }

        let request = DamageRequest {
            amount: hit
                .damage
                .unwrap_or_else(|| WeaponStats::for_weapon(hit.weapon).damage),
            source: Some(shooter_id),
            weapon: hit.weapon,
            headshot: hit.headshot,
            armor_piercing: hit.armor_piercing,
            position: hit.position,
        };
        let applied = self.damage.apply_damage(
            &mut self.players,
            target_id,
            &request,
            self.time,
            &self.config.economy,
            &mut self.events,
        );
        Ok(Some(applied))
    }

    /// Fire the shooter's current weapon along `direction` (radians).
    /// Returns the projectile id.
    pub fn fire_projectile(&mut self, shooter_id: PlayerId, direction: f32) -> CommandResult<Uuid> {
        self.require_live()?;
        let shooter = self
            .players
            .get(&shooter_id)
            .ok_or(Refusal::UnknownPlayer {
                player_id: shooter_id,
            })?;
        if !shooter.alive {
            return Err(Refusal::PlayerDead);
        }
        let projectile = Projectile::new(shooter_id, shooter.position, direction, shooter.current_weapon);
        let projectile_id = projectile.id;
        self.projectiles.push(projectile);
        Ok(projectile_id)
    }

    pub fn update_position(
        &mut self,
        player_id: PlayerId,
        position: Vec2,
        velocity: Vec2,
    ) -> CommandResult<()> {
        match self.round.phase {
            RoundPhase::MatchEnd => return Err(Refusal::MatchOver),
            RoundPhase::Freeze => return Err(Refusal::Frozen),
            _ => {}
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        if !player.alive {
            return Err(Refusal::PlayerDead);
        }
        player.position = position;
        player.velocity = velocity;
        Ok(())
    }

    /// Hand over an item; weapons are equipped
    pub fn give_item(&mut self, player_id: PlayerId, item: Item) -> CommandResult<()> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        player.give_item(item);
        if let Item::Weapon(weapon) = item {
            player.current_weapon = weapon;
        }
        Ok(())
    }

    pub fn give_armor(&mut self, player_id: PlayerId, amount: u32, helmet: bool) -> CommandResult<()> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        DamageSystem::give_armor(player, amount, helmet);
        Ok(())
    }

    /// Restore health. Returns the amount actually restored.
    pub fn heal(&mut self, player_id: PlayerId, amount: u32) -> CommandResult<u32> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(Refusal::UnknownPlayer { player_id })?;
        if !player.alive {
            return Err(Refusal::PlayerDead);
        }
        Ok(self.damage.heal(player, amount, self.time).amount)
    }

    /// Admin: end the live round as a draw
    pub fn force_round_end(&mut self) -> CommandResult<()> {
        self.require_live()?;
        warn!(match_id = %self.id, round = self.round.number, "Round forced to end");
        self.end_round(RoundWinner::Draw, RoundEndReason::Elimination);
        Ok(())
    }

    // ---- tick ----

    /// Run one simulation tick of `dt` seconds and return the events it
    /// dispatched. Panics on a negative or non-finite `dt`.
    pub fn advance(&mut self, dt: f32) -> Vec<EventEnvelope> {
        assert!(
            dt.is_finite() && dt >= 0.0,
            "advance requires a finite, non-negative dt (got {dt})"
        );
        if self.round.phase == RoundPhase::MatchEnd {
            return self.events.flush();
        }

        self.tick += 1;
        self.time += dt;
        self.stamp_events();

        // 1. In-flight actions
        if self.round.phase == RoundPhase::Live {
            self.step_projectiles(dt);
            self.bomb.enforce_defuser(&self.players, &mut self.events);
            self.round.alive = self.alive_counts();
        }
        self.expire_pain();
        self.damage.prune(self.time);

        // 2. Bomb
        if self.round.phase == RoundPhase::Live {
            let outcome = self.bomb.tick(
                dt,
                self.time,
                &mut self.players,
                &mut self.damage,
                &self.config.economy,
                &mut self.events,
            );
            if outcome != BombTick::Idle {
                debug!(match_id = %self.id, ?outcome, "Bomb resolved");
            }
        }

        // 3. Clocks
        self.advance_clocks(dt);

        // 4. Round end
        if self.round.phase == RoundPhase::Live {
            self.check_round_end();
        }

        // 5. Dispatch
        self.events.flush()
    }

    fn stamp_events(&mut self) {
        self.events.set_clock(self.tick, self.time, self.round.number);
    }

    fn require_live(&self) -> CommandResult<()> {
        match self.round.phase {
            RoundPhase::Live => Ok(()),
            RoundPhase::MatchEnd => Err(Refusal::MatchOver),
            _ => Err(Refusal::RoundNotLive),
        }
    }

    fn team_size(&self, team: Team) -> usize {
        self.players.values().filter(|p| p.team == team).count()
    }

    fn teams_ready(&self) -> bool {
        let needed = self.config.min_players_per_team;
        self.team_size(Team::CounterTerrorist) >= needed && self.team_size(Team::Terrorist) >= needed
    }

    fn step_projectiles(&mut self, dt: f32) {
        if self.projectiles.is_empty() {
            return;
        }
        let hits = HitDetector::step(
            &mut self.projectiles,
            &self.players,
            &*self.map,
            self.config.hit_radius,
            self.config.headshot_chance,
            &mut self.rng,
            dt,
        );

        for hit in hits {
            match hit {
                HitResult::Player {
                    shooter_id,
                    target_id,
                    weapon,
                    damage,
                    headshot,
                    armor_piercing,
                    position,
                    ..
                } => {
                    let Some(target) = self.players.get(&target_id) else {
                        continue;
                    };
                    // Killed earlier this tick
                    if !target.alive {
                        continue;
                    }
                    let teammate = self
                        .players
                        .get(&shooter_id)
                        .is_some_and(|shooter| shooter.team == target.team);
                    if teammate && !self.config.friendly_fire {
                        continue;
                    }
                    let request = DamageRequest {
                        amount: damage,
                        source: Some(shooter_id),
                        weapon,
                        headshot,
                        armor_piercing,
                        position,
                    };
                    self.damage.apply_damage(
                        &mut self.players,
                        target_id,
                        &request,
                        self.time,
                        &self.config.economy,
                        &mut self.events,
                    );
                }
                HitResult::Wall {
                    projectile_id,
                    position,
                } => {
                    self.events.emit(GameEvent::ProjectileImpact {
                        projectile_id,
                        position,
                    });
                }
            }
        }
    }

    fn expire_pain(&mut self) {
        let (now, duration) = (self.time, self.config.pain_duration);
        for player in self.players.values_mut() {
            if player.in_pain && !player.is_in_pain(now, duration) {
                player.in_pain = false;
            }
        }
    }

    fn advance_clocks(&mut self, dt: f32) {
        match self.round.phase {
            RoundPhase::Warmup => {
                if self.teams_ready() {
                    self.start_round(1);
                }
            }
            RoundPhase::Freeze => {
                self.round.freeze_clock.tick(dt);
                if self.round.freeze_clock.is_expired() {
                    self.enter_live();
                }
            }
            RoundPhase::Live => {
                self.round.round_clock.tick(dt);
            }
            RoundPhase::PostRound => {
                self.round.phase_clock.tick(dt);
                if self.round.phase_clock.is_expired() {
                    let next = self.round.number + 1;
                    if RoundState::is_halftime_round(next, self.config.max_rounds) {
                        self.enter_halftime();
                    } else {
                        self.start_round(next);
                    }
                }
            }
            RoundPhase::Halftime => {
                self.round.phase_clock.tick(dt);
                if self.round.phase_clock.is_expired() {
                    self.start_round(self.round.number + 1);
                }
            }
            RoundPhase::MatchEnd => {}
        }
    }

    fn check_round_end(&mut self) {
        let inputs = RoundEndInputs {
            alive: self.round.alive,
            bomb_planted: self.bomb.is_planted(),
            bomb_exploded: self.bomb.is_exploded(),
            bomb_defused: self.bomb.is_defused(),
            round_time_remaining: self.round.round_clock.remaining(),
        };
        if let Some((winner, reason)) = evaluate_round_end(&inputs) {
            self.end_round(winner, reason);
        }
    }

    /// Round initialisation, entering freeze time
    fn start_round(&mut self, number: u32) {
        self.round.number = number;
        self.round.phase = RoundPhase::Freeze;
        self.round.freeze_clock = Countdown::new(self.config.freeze_time);
        self.round.round_clock = Countdown::new(self.config.round_time);
        self.stamp_events();

        self.bomb.reset();
        self.projectiles.clear();

        let (mut ct_slot, mut t_slot) = (0, 0);
        for player in self.players.values_mut() {
            let slot = match player.team {
                Team::CounterTerrorist => &mut ct_slot,
                Team::Terrorist => &mut t_slot,
            };
            let spawn = self.layout.spawn_point(player.team, *slot);
            *slot += 1;

            player.take_item(Item::Bomb);
            player.reset_for_round(spawn);
            self.damage.reset_player(player.id);
        }
        self.assign_bomb();
        self.round.alive = self.alive_counts();

        info!(
            match_id = %self.id,
            round = number,
            ct_score = self.round.scores.ct,
            t_score = self.round.scores.t,
            "Round initialised"
        );
        self.events.emit(GameEvent::RoundFreeze {
            round_number: number,
            freeze_time: self.config.freeze_time,
        });
    }

    /// Give the bomb to a random terrorist
    fn assign_bomb(&mut self) {
        let terrorists: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.team == Team::Terrorist)
            .map(|p| p.id)
            .collect();
        if terrorists.is_empty() {
            warn!(match_id = %self.id, "No terrorist to carry the bomb");
            return;
        }
        let carrier = terrorists[self.rng.gen_range(0..terrorists.len())];
        if let Some(player) = self.players.get_mut(&carrier) {
            player.give_item(Item::Bomb);
        }
        debug!(match_id = %self.id, player_id = %carrier, "Bomb assigned");
    }

    /// Carrier left mid-round: first living terrorist picks the bomb up
    fn pass_bomb(&mut self) {
        if self.bomb.is_planted() {
            return;
        }
        if let Some(player) = self
            .players
            .values_mut()
            .find(|p| p.alive && p.team == Team::Terrorist)
        {
            player.give_item(Item::Bomb);
            debug!(match_id = %self.id, player_id = %player.id, "Bomb passed on");
        }
    }

    fn enter_live(&mut self) {
        self.round.phase = RoundPhase::Live;
        self.round.alive = self.alive_counts();
        info!(
            match_id = %self.id,
            round = self.round.number,
            ct_alive = self.round.alive.ct,
            t_alive = self.round.alive.t,
            "Round live"
        );
        self.events.emit(GameEvent::RoundStart {
            round_number: self.round.number,
        });
    }

    fn end_round(&mut self, winner: RoundWinner, reason: RoundEndReason) {
        if let Some(defuser_id) = self.bomb.defuse_attempt().map(|a| a.player_id) {
            let _ = self
                .bomb
                .stop_defuse(defuser_id, DefuseStopReason::Interrupted, &mut self.events);
        }
        self.projectiles.clear();

        self.round.scores.record(winner);
        self.round.rounds_played += 1;
        let mvp = self.round_mvp(winner, reason);
        let payouts = settle_round(
            self.players.values_mut(),
            winner,
            reason,
            &mut self.round.losses,
            &self.config.economy,
        );

        info!(
            match_id = %self.id,
            round = self.round.number,
            ?winner,
            ?reason,
            ct_score = self.round.scores.ct,
            t_score = self.round.scores.t,
            payouts = payouts.len(),
            "Round ended"
        );
        self.events.emit(GameEvent::RoundEnd {
            round_number: self.round.number,
            reason,
            winner,
            scores: self.round.scores,
            mvp,
        });

        if self.round.is_match_complete(self.config.max_rounds) {
            self.end_match();
        } else {
            self.round.phase = RoundPhase::PostRound;
            self.round.phase_clock = Countdown::new(self.config.post_round_delay);
        }
    }

    /// Planter on an explosion, defuser on a defuse, otherwise the winning
    /// side's top fragger of the round
    fn round_mvp(&self, winner: RoundWinner, reason: RoundEndReason) -> Option<PlayerId> {
        match reason {
            RoundEndReason::BombExploded => return self.bomb.bomb().map(|b| b.planter_id),
            RoundEndReason::BombDefused => return self.bomb.bomb().and_then(|b| b.defused_by),
            RoundEndReason::Elimination | RoundEndReason::Time => {}
        }
        let team = winner.team();
        self.players
            .values()
            .filter(|p| team.map_or(true, |t| p.team == t))
            .filter(|p| p.stats.round_kills > 0)
            .max_by(|a, b| {
                a.stats
                    .round_kills
                    .cmp(&b.stats.round_kills)
                    .then(b.id.cmp(&a.id))
            })
            .map(|p| p.id)
    }

    fn enter_halftime(&mut self) {
        for player in self.players.values_mut() {
            player.team = player.team.opposite();
            player.take_item(Item::Bomb);
            player.take_item(Item::DefuseKit);
        }
        self.round.swap_sides();
        self.round.phase = RoundPhase::Halftime;
        self.round.phase_clock = Countdown::new(self.config.halftime_delay);

        info!(
            match_id = %self.id,
            round = self.round.number,
            ct_score = self.round.scores.ct,
            t_score = self.round.scores.t,
            "Halftime, teams swapped"
        );
        self.events.emit(GameEvent::Halftime {
            round_number: self.round.number,
            scores: self.round.scores,
        });
    }

    fn end_match(&mut self) {
        self.round.phase = RoundPhase::MatchEnd;
        let winner = self.round.scores.leader();
        info!(
            match_id = %self.id,
            ?winner,
            ct_score = self.round.scores.ct,
            t_score = self.round.scores.t,
            rounds = self.round.rounds_played,
            "Match ended"
        );
        self.events.emit(GameEvent::MatchEnd {
            winner,
            final_score: self.round.scores,
        });
    }
}
