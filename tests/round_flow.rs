//! End-to-end round scenarios driven through `MatchState`.
//!
//! Every test uses whole or half second steps so clocks land exactly on
//! their deadlines.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use defusal_core::config::MatchConfig;
use defusal_core::error::Refusal;
use defusal_core::events::{DefuseStopReason, GameEvent};
use defusal_core::game::combat::Weapon;
use defusal_core::game::economy::{ConsecutiveLosses, Purchase};
use defusal_core::game::physics::Vec2;
use defusal_core::game::{
    HitReport, Item, RoundEndReason, RoundPhase, RoundWinner, Scores, Team,
};
use uuid::Uuid;

#[test]
fn bomb_explosion_wins_even_when_it_wipes_out_ct() {
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(quick_rules(), 5);
    go_live(&mut state);

    assert!(run_seconds(&mut state, 20).is_empty());
    let planter = plant_at_a(&mut state);
    // Every CT stacks on the bomb
    for &ct in &cts {
        state
            .update_position(ct, Vec2::new(200.0, 220.0), Vec2::ZERO)
            .unwrap();
    }

    let quiet = run_seconds(&mut state, 44);
    assert_eq!(names(&quiet), vec!["bomb_planted"]);
    assert_eq!(state.phase(), RoundPhase::Live);

    let events = state.advance(1.0);
    assert_eq!(state.round_elapsed(), 65.0);
    let deaths = names(&events)
        .iter()
        .filter(|name| **name == "player_death")
        .count();
    assert_eq!(deaths, 5);
    assert_eq!(names(&events)[5..], ["bomb_exploded", "round_end"]);
    assert_eq!(
        round_result(&events),
        Some((RoundWinner::Terrorist, RoundEndReason::BombExploded, Some(planter)))
    );
    assert_eq!(state.scores(), Scores { ct: 0, t: 1 });
    assert_eq!(state.phase(), RoundPhase::PostRound);

    // 800 start + 800 plant + 3250 win
    assert_eq!(state.player(planter).unwrap().money, 4_850);
    for &t in ts.iter().filter(|&&t| t != planter) {
        assert_eq!(state.player(t).unwrap().money, 4_050);
    }
    for &ct in &cts {
        let player = state.player(ct).unwrap();
        assert!(!player.alive);
        assert_eq!(player.money, 2_200);
    }

    let json = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(json["event_type"], "round_end");
    assert_eq!(json["winner"], "t");
    assert_eq!(json["reason"], "bomb_exploded");
    assert_eq!(json["round_number"], 1);
}

#[test]
fn kit_defuse_finishes_in_five_seconds() {
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(quick_rules(), 5);
    go_live(&mut state);
    run_seconds(&mut state, 20);
    let planter = plant_at_a(&mut state);
    run_seconds(&mut state, 20);

    let defuser = cts[0];
    state.give_item(defuser, Item::DefuseKit).unwrap();
    state
        .update_position(defuser, Vec2::new(200.0, 210.0), Vec2::ZERO)
        .unwrap();
    assert_eq!(state.request_defuse_start(defuser), Ok(5.0));
    state
        .update_position(cts[1], Vec2::new(600.0, 600.0), Vec2::ZERO)
        .unwrap();
    assert_eq!(
        state.request_defuse_start(cts[1]),
        Err(Refusal::TooFarFromBomb)
    );

    run_seconds(&mut state, 4);
    assert_eq!(state.phase(), RoundPhase::Live);
    assert!((state.defuse_progress() - 0.8).abs() < 1e-6);

    let events = state.advance(1.0);
    assert_eq!(state.round_elapsed(), 45.0);
    assert_eq!(names(&events), vec!["bomb_defused", "round_end"]);
    assert_eq!(
        round_result(&events),
        Some((RoundWinner::CounterTerrorist, RoundEndReason::BombDefused, Some(defuser)))
    );
    assert!(state.bomb().is_defused());

    // 800 start + 3500 defuse + 3250 win
    assert_eq!(state.player(defuser).unwrap().money, 7_550);
    assert_eq!(state.player(cts[1]).unwrap().money, 4_050);
    // 800 start + 800 plant + 1400 loss
    assert_eq!(state.player(planter).unwrap().money, 3_000);
    for &t in ts.iter().filter(|&&t| t != planter) {
        assert_eq!(state.player(t).unwrap().money, 2_200);
    }
}

#[test]
fn explosion_beats_a_defuse_finishing_on_the_same_tick() {
    let Lobby {
        mut state, cts, ..
    } = lobby(quick_rules(), 1);
    go_live(&mut state);
    run_seconds(&mut state, 20);
    plant_at_a(&mut state);
    run_seconds(&mut state, 35);

    let ct = cts[0];
    state
        .update_position(ct, Vec2::new(200.0, 210.0), Vec2::ZERO)
        .unwrap();
    // No kit: ten seconds, exactly what is left on the fuse
    assert_eq!(state.request_defuse_start(ct), Ok(10.0));
    run_seconds(&mut state, 9);
    assert_eq!(state.phase(), RoundPhase::Live);

    let events = state.advance(1.0);
    assert!(!names(&events).contains(&"bomb_defused"));
    assert!(names(&events).contains(&"bomb_exploded"));
    assert_eq!(
        round_result(&events).map(|(winner, reason, _)| (winner, reason)),
        Some((RoundWinner::Terrorist, RoundEndReason::BombExploded))
    );
    assert!(state.bomb().defuse_attempt().is_none());
    assert!(!state.bomb().is_defused());
}

#[test]
fn planted_bomb_outlasts_the_round_clock() {
    let config = MatchConfig {
        round_time: 10.0,
        ..quick_rules()
    };
    let Lobby { mut state, .. } = lobby(config, 1);
    go_live(&mut state);
    run_seconds(&mut state, 5);
    plant_at_a(&mut state);

    let events = run_seconds(&mut state, 5);
    assert_eq!(state.round_time_remaining(), 0.0);
    assert_eq!(round_result(&events), None);
    assert_eq!(state.phase(), RoundPhase::Live);

    run_seconds(&mut state, 39);
    assert_eq!(state.phase(), RoundPhase::Live);
    let events = state.advance(1.0);
    assert_eq!(
        round_result(&events).map(|(winner, reason, _)| (winner, reason)),
        Some((RoundWinner::Terrorist, RoundEndReason::BombExploded))
    );
}

#[test]
fn terrorists_dead_after_plant_leaves_the_bomb_to_decide() {
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(quick_rules(), 1);
    let (ct, t) = (cts[0], ts[0]);
    go_live(&mut state);
    plant_at_a(&mut state);

    state.report_hit(knife(ct, t)).unwrap();
    let events = state.advance(1.0);
    assert_eq!(names(&events), vec!["bomb_planted", "player_death"]);
    assert_eq!(state.alive_counts().t, 0);
    assert_eq!(state.phase(), RoundPhase::Live);

    state
        .update_position(ct, Vec2::new(200.0, 210.0), Vec2::ZERO)
        .unwrap();
    state.request_defuse_start(ct).unwrap();
    run_seconds(&mut state, 9);
    assert_eq!(state.phase(), RoundPhase::Live);

    let events = state.advance(1.0);
    assert_eq!(
        round_result(&events),
        Some((RoundWinner::CounterTerrorist, RoundEndReason::BombDefused, Some(ct)))
    );
}

#[test]
fn both_sides_wiped_out_is_a_draw() {
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(quick_rules(), 1);
    let (ct, t) = (cts[0], ts[0]);
    go_live(&mut state);

    state.report_hit(knife(ct, t)).unwrap();
    state.leave(ct).unwrap();
    let events = state.advance(0.5);

    assert_eq!(
        round_result(&events).map(|(winner, reason, _)| (winner, reason)),
        Some((RoundWinner::Draw, RoundEndReason::Elimination))
    );
    assert_eq!(state.scores(), Scores::default());
    assert_eq!(state.rounds_played(), 1);
    // A draw pays the current loss bonus and keeps streaks as they were
    assert_eq!(state.player(t).unwrap().money, 2_200);
    assert_eq!(state.consecutive_losses(), ConsecutiveLosses::default());
}

#[test]
fn walking_away_stops_the_defuse() {
    let Lobby {
        mut state, cts, ..
    } = lobby(quick_rules(), 1);
    let ct = cts[0];
    go_live(&mut state);
    plant_at_a(&mut state);
    state
        .update_position(ct, Vec2::new(200.0, 210.0), Vec2::ZERO)
        .unwrap();
    state.request_defuse_start(ct).unwrap();
    state.advance(1.0);
    assert!((state.defuse_progress() - 0.1).abs() < 1e-6);

    state
        .update_position(ct, Vec2::new(600.0, 600.0), Vec2::ZERO)
        .unwrap();
    let events = state.advance(1.0);

    assert!(events.iter().any(|e| matches!(
        e.event,
        GameEvent::DefuseStopped {
            reason: DefuseStopReason::OutOfRange,
            ..
        }
    )));
    assert_eq!(state.defuse_progress(), 0.0);
    assert_eq!(
        state.request_defuse_stop(ct, DefuseStopReason::Interrupted),
        Err(Refusal::NotDefusing)
    );
}

#[test]
fn mid_round_joiner_waits_for_the_next_round() {
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(quick_rules(), 1);
    go_live(&mut state);

    let late = Uuid::new_v4();
    state
        .join(late, "late".to_string(), Team::CounterTerrorist)
        .unwrap();
    assert!(!state.player(late).unwrap().alive);
    assert_eq!(state.alive_counts().ct, 1);
    assert_eq!(
        state.update_position(late, Vec2::ZERO, Vec2::ZERO),
        Err(Refusal::PlayerDead)
    );

    state.report_hit(knife(cts[0], ts[0])).unwrap();
    state.advance(0.5);
    assert_eq!(state.phase(), RoundPhase::PostRound);

    advance_until(&mut state, 0.5, 10, |s| s.phase() == RoundPhase::Freeze);
    assert_eq!(state.round_number(), 2);
    assert!(state.player(late).unwrap().alive);
}

#[test]
fn buying_is_open_in_freeze_and_the_opening_seconds() {
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(quick_rules(), 1);
    let (ct, t) = (cts[0], ts[0]);
    assert_eq!(state.buy(ct, Purchase::Kevlar), Err(Refusal::NotBuyTime));

    advance_until(&mut state, 0.5, 10, |s| s.phase() == RoundPhase::Freeze);
    assert_eq!(state.buy(ct, Purchase::Kevlar), Ok(650));
    assert_eq!(
        state.buy(ct, Purchase::DefuseKit),
        Err(Refusal::InsufficientFunds { price: 200, money: 150 })
    );
    assert_eq!(
        state.buy(t, Purchase::Weapon(Weapon::Usp)),
        Err(Refusal::WrongTeamItem)
    );
    assert_eq!(state.buy(t, Purchase::Weapon(Weapon::Glock)), Ok(200));

    let events = go_live(&mut state);
    let purchases: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.event {
            GameEvent::ItemPurchased {
                player_id,
                price,
                money_left,
                ..
            } => Some((*player_id, *price, *money_left)),
            _ => None,
        })
        .collect();
    assert_eq!(purchases, vec![(ct, 650, 150), (t, 200, 600)]);

    // Late joiners sit the round out and cannot shop
    let late = Uuid::new_v4();
    state
        .join(late, "late".to_string(), Team::Terrorist)
        .unwrap();
    assert_eq!(state.buy(late, Purchase::Kevlar), Err(Refusal::PlayerDead));

    run_seconds(&mut state, 14);
    assert_eq!(state.buy(t, Purchase::Weapon(Weapon::HeGrenade)), Ok(300));
    run_seconds(&mut state, 1);
    assert_eq!(state.round_elapsed(), 15.0);
    assert_eq!(
        state.buy(t, Purchase::Weapon(Weapon::HeGrenade)),
        Err(Refusal::NotBuyTime)
    );
    assert_eq!(state.player(t).unwrap().money, 300);

    // Bought armor soaks half of a 30 damage shot: 15 absorbed, 7 spared
    let hit = HitReport {
        shooter_id: t,
        target_id: Some(ct),
        position: Vec2::ZERO,
        weapon: Weapon::Glock,
        damage: Some(30),
        headshot: false,
        armor_piercing: false,
    };
    state.report_hit(hit).unwrap();
    let wounded = state.player(ct).unwrap();
    assert_eq!((wounded.health, wounded.armor), (77, 85));
}

#[test]
fn bomb_passes_on_when_the_carrier_leaves() {
    let Lobby { mut state, ts, .. } = lobby(quick_rules(), 2);
    go_live(&mut state);

    let first = carrier(&state);
    state.leave(first).unwrap();
    let other = ts.iter().copied().find(|&t| t != first).unwrap();
    assert!(state.player(other).unwrap().has_item(Item::Bomb));
}

#[test]
fn halftime_swaps_sides_and_the_match_ends_on_a_majority() {
    let config = MatchConfig {
        max_rounds: 4,
        round_time: 2.0,
        ..quick_rules()
    };
    let Lobby {
        mut state, cts, ts, ..
    } = lobby(config, 1);
    let (first_ct, first_t) = (cts[0], ts[0]);

    // Two rounds run out the clock: CT wins both on time
    for _ in 0..2 {
        go_live(&mut state);
        let events = advance_until(&mut state, 0.5, 10, |s| s.phase() != RoundPhase::Live);
        assert_eq!(
            round_result(&events).map(|(winner, reason, _)| (winner, reason)),
            Some((RoundWinner::CounterTerrorist, RoundEndReason::Time))
        );
    }
    assert_eq!(state.scores(), Scores { ct: 2, t: 0 });

    let events = advance_until(&mut state, 0.5, 10, |s| s.phase() == RoundPhase::Halftime);
    assert!(events.iter().any(|e| matches!(
        e.event,
        GameEvent::Halftime {
            round_number: 2,
            scores: Scores { ct: 0, t: 2 },
        }
    )));
    assert_eq!(state.player(first_ct).unwrap().team, Team::Terrorist);
    assert_eq!(state.player(first_t).unwrap().team, Team::CounterTerrorist);
    assert_eq!(state.consecutive_losses(), ConsecutiveLosses { ct: 2, t: 0 });
    // 800 start + 1400 + 1900 for two straight losses
    assert_eq!(state.player(first_t).unwrap().money, 4_100);
    // 800 start + two 3250 wins
    assert_eq!(state.player(first_ct).unwrap().money, 7_300);

    go_live(&mut state);
    assert_eq!(state.round_number(), 3);
    assert!(state.player(first_ct).unwrap().has_item(Item::Bomb));

    state.report_hit(knife(first_ct, first_t)).unwrap();
    let events = state.advance(0.5);
    assert_eq!(names(&events), vec!["player_death", "round_end", "match_end"]);
    assert!(matches!(
        events[2].event,
        GameEvent::MatchEnd {
            winner: RoundWinner::Terrorist,
            final_score: Scores { ct: 0, t: 3 },
        }
    ));
    assert_eq!(state.phase(), RoundPhase::MatchEnd);
    // 7300 + 1500 knife kill + 3250 win
    assert_eq!(state.player(first_ct).unwrap().money, 12_050);
    // Third straight loss pays 2400
    assert_eq!(state.player(first_t).unwrap().money, 6_500);

    // Terminal: time stops and every command is refused
    let tick = state.tick();
    assert!(state.advance(1.0).is_empty());
    assert_eq!(state.tick(), tick);
    assert_eq!(
        state.join(Uuid::new_v4(), "late".to_string(), Team::Terrorist),
        Err(Refusal::MatchOver)
    );
    assert_eq!(
        state.update_position(first_ct, Vec2::ZERO, Vec2::ZERO),
        Err(Refusal::MatchOver)
    );
    assert_eq!(state.report_hit(knife(first_ct, first_t)), Err(Refusal::MatchOver));
    assert_eq!(state.force_round_end(), Err(Refusal::MatchOver));
}
