//! Shared setup for match-level integration tests.

#![allow(dead_code)]

use defusal_core::config::MatchConfig;
use defusal_core::events::{EventEnvelope, GameEvent};
use defusal_core::game::physics::Vec2;
use defusal_core::game::{
    HitReport, Item, MatchState, PlayerId, RoundEndReason, RoundPhase, RoundWinner, Team,
};
use defusal_core::game::combat::Weapon;
use uuid::Uuid;

/// Center of bomb site A on the default layout
pub const SITE_A: Vec2 = Vec2 { x: 200.0, y: 200.0 };
/// Well outside the explosion radius of site A
pub const T_HIDEOUT: Vec2 = Vec2 { x: 900.0, y: 700.0 };

/// Default rules with one-second freeze, post-round and halftime breaks
pub fn quick_rules() -> MatchConfig {
    MatchConfig {
        freeze_time: 1.0,
        post_round_delay: 1.0,
        halftime_delay: 1.0,
        ..MatchConfig::default()
    }
}

pub struct Lobby {
    pub state: MatchState,
    pub cts: Vec<PlayerId>,
    pub ts: Vec<PlayerId>,
}

/// A match in warmup with `per_team` players on each side
pub fn lobby(config: MatchConfig, per_team: usize) -> Lobby {
    let mut state = MatchState::new(Uuid::new_v4(), config);
    let mut cts = Vec::new();
    let mut ts = Vec::new();
    for slot in 0..per_team {
        let ct = Uuid::new_v4();
        state
            .join(ct, format!("ct-{slot}"), Team::CounterTerrorist)
            .unwrap();
        cts.push(ct);

        let t = Uuid::new_v4();
        state.join(t, format!("t-{slot}"), Team::Terrorist).unwrap();
        ts.push(t);
    }
    Lobby { state, cts, ts }
}

/// Advance in `dt` steps until `done` holds, returning every event seen.
/// Panics after `max_ticks` steps.
pub fn advance_until(
    state: &mut MatchState,
    dt: f32,
    max_ticks: usize,
    done: impl Fn(&MatchState) -> bool,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    for _ in 0..max_ticks {
        if done(state) {
            return events;
        }
        events.extend(state.advance(dt));
    }
    assert!(done(state), "condition not reached in {max_ticks} ticks");
    events
}

/// Leave warmup (or the breaks between rounds) and run freeze time out
pub fn go_live(state: &mut MatchState) -> Vec<EventEnvelope> {
    advance_until(state, 0.5, 200, |s| s.phase() == RoundPhase::Live)
}

/// Run `ticks` whole seconds of simulation
pub fn run_seconds(state: &mut MatchState, ticks: usize) -> Vec<EventEnvelope> {
    (0..ticks).flat_map(|_| state.advance(1.0)).collect()
}

pub fn names(events: &[EventEnvelope]) -> Vec<&'static str> {
    events.iter().map(|e| e.event.name()).collect()
}

/// Terrorist holding the bomb
pub fn carrier(state: &MatchState) -> PlayerId {
    state
        .players()
        .find(|p| p.has_item(Item::Bomb))
        .map(|p| p.id)
        .unwrap()
}

/// Walk the carrier onto site A, plant, then send them out of blast range
pub fn plant_at_a(state: &mut MatchState) -> PlayerId {
    let planter = carrier(state);
    state.update_position(planter, SITE_A, Vec2::ZERO).unwrap();
    assert_eq!(state.request_plant(planter).unwrap(), "A");
    state.update_position(planter, T_HIDEOUT, Vec2::ZERO).unwrap();
    planter
}

/// Lethal knife hit
pub fn knife(shooter_id: PlayerId, target_id: PlayerId) -> HitReport {
    HitReport {
        shooter_id,
        target_id: Some(target_id),
        position: Vec2::ZERO,
        weapon: Weapon::Knife,
        damage: Some(200),
        headshot: false,
        armor_piercing: false,
    }
}

/// Winner, reason and MVP of the round that ended in `events`
pub fn round_result(
    events: &[EventEnvelope],
) -> Option<(RoundWinner, RoundEndReason, Option<PlayerId>)> {
    events.iter().find_map(|e| match &e.event {
        GameEvent::RoundEnd {
            winner, reason, mvp, ..
        } => Some((*winner, *reason, *mvp)),
        _ => None,
    })
}
