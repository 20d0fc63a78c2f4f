//! Defusal simulation - runs one bot match on the authoritative core
//!
//! Starts a match task, fills both teams with scripted bots and prints every
//! game event as a JSON line on stdout. Logs go to stderr.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use defusal_core::config::Config;
use defusal_core::game::combat::Weapon;
use defusal_core::game::economy::Purchase;
use defusal_core::game::physics::Vec2;
use defusal_core::game::snapshot::MatchSnapshot;
use defusal_core::game::{GameMatch, HandleError, HitReport, MatchHandle, RoundPhase, Team};

/// How often the bots act
const BOT_THINK_INTERVAL: Duration = Duration::from_millis(250);
/// Distance a bot covers per think step
const BOT_STEP: f32 = 60.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        seed = config.rules.seed,
        max_rounds = config.rules.max_rounds,
        players_per_team = config.players_per_team,
        "Starting defusal simulation"
    );

    let (game_match, handle) = GameMatch::new(Uuid::new_v4(), config.rules.clone())?;
    let mut events = handle.subscribe_events();
    let match_task = tokio::spawn(game_match.run());

    let mut bots = Vec::new();
    for team in [Team::CounterTerrorist, Team::Terrorist] {
        for slot in 0..config.players_per_team {
            let id = Uuid::new_v4();
            handle.join(id, &format!("{team}-bot-{slot}"), team).await?;
            bots.push((id, team));
        }
    }

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => match serde_json::to_string(&envelope) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "Failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let driver = drive_bots(handle.clone(), bots, config.rules.seed);

    tokio::select! {
        result = driver => {
            if let Err(e) = result {
                warn!(error = %e, "Bot driver stopped");
            }
        }
        _ = shutdown_signal() => {}
    }

    // Dropping the last handle stops the match task
    drop(handle);
    let final_state = match_task.await?;
    let (rounds, scores) = (final_state.rounds_played(), final_state.scores());
    // Last event sender goes with the state; the printer drains and exits
    drop(final_state);
    let _ = printer.await;

    info!(
        rounds,
        ct_score = scores.ct,
        t_score = scores.t,
        "Simulation complete"
    );
    Ok(())
}

/// Scripted bots: terrorists walk the carrier to site A and plant, CTs
/// walk to the bomb and defuse, everyone shoots at the nearest enemy.
async fn drive_bots(
    handle: MatchHandle,
    bots: Vec<(Uuid, Team)>,
    seed: u64,
) -> Result<(), HandleError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut think = tokio::time::interval(BOT_THINK_INTERVAL);

    loop {
        think.tick().await;
        let snapshot = match handle.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(HandleError::Closed) => return Ok(()),
            Err(e) => return Err(e),
        };
        match snapshot.phase {
            RoundPhase::MatchEnd => return Ok(()),
            RoundPhase::Live => {}
            RoundPhase::Freeze => {
                buy_loadouts(&handle, &snapshot, &bots).await?;
                continue;
            }
            _ => continue,
        }

        for &(bot_id, _) in &bots {
            let Some(me) = snapshot.players.iter().find(|p| p.id == bot_id && p.alive) else {
                continue;
            };

            let goal = bot_goal(&snapshot, me.team, me.has_bomb);
            let position = step_towards(me.position, goal);
            ignore_refusal(handle.move_to(bot_id, position, Vec2::ZERO).await)?;

            if me.has_bomb && position == goal {
                ignore_refusal(handle.plant(bot_id).await.map(|_| ()))?;
            }
            let defusing = snapshot.bomb.as_ref().is_some_and(|b| b.defuser_id.is_some());
            if me.team == Team::CounterTerrorist && snapshot.bomb.is_some() && !defusing {
                ignore_refusal(handle.start_defuse(bot_id).await.map(|_| ()))?;
            }

            // Occasional pot shot at the nearest enemy
            if rng.gen_bool(0.3) {
                let target = snapshot
                    .players
                    .iter()
                    .filter(|p| p.alive && p.team != me.team)
                    .min_by(|a, b| {
                        a.position
                            .distance_sq(position)
                            .total_cmp(&b.position.distance_sq(position))
                    });
                if let Some(target) = target {
                    let hit = HitReport {
                        shooter_id: bot_id,
                        target_id: rng.gen_bool(0.5).then_some(target.id),
                        position: target.position,
                        weapon: me.current_weapon,
                        damage: None,
                        headshot: rng.gen_bool(0.2),
                        armor_piercing: false,
                    };
                    ignore_refusal(handle.report_hit(hit).await.map(|_| ()))?;
                }
            }
        }
    }
}

/// Side rifle when affordable, then armor with whatever is left
async fn buy_loadouts(
    handle: &MatchHandle,
    snapshot: &MatchSnapshot,
    bots: &[(Uuid, Team)],
) -> Result<(), HandleError> {
    for &(bot_id, team) in bots {
        let Some(me) = snapshot.players.iter().find(|p| p.id == bot_id && p.alive) else {
            continue;
        };
        let rifle = match team {
            Team::CounterTerrorist => Weapon::M4a4,
            Team::Terrorist => Weapon::Ak47,
        };
        if me.current_weapon != rifle {
            ignore_refusal(handle.buy(bot_id, Purchase::Weapon(rifle)).await.map(|_| ()))?;
        }
        ignore_refusal(handle.buy(bot_id, Purchase::Kevlar).await.map(|_| ()))?;
    }
    Ok(())
}

/// Where a bot wants to be this round
fn bot_goal(snapshot: &MatchSnapshot, team: Team, has_bomb: bool) -> Vec2 {
    match (team, &snapshot.bomb) {
        (Team::CounterTerrorist, Some(bomb)) => bomb.position,
        // Site A center
        (Team::Terrorist, None) if has_bomb => Vec2::new(200.0, 200.0),
        (_, _) => Vec2::new(500.0, 400.0),
    }
}

fn step_towards(from: Vec2, to: Vec2) -> Vec2 {
    let distance = from.distance(to);
    if distance <= BOT_STEP {
        return to;
    }
    let direction = (to.y - from.y).atan2(to.x - from.x);
    from.offset(direction, BOT_STEP)
}

/// Bots act on slightly stale snapshots, so refusals are expected
fn ignore_refusal(result: Result<(), HandleError>) -> Result<(), HandleError> {
    match result {
        Err(HandleError::Refused(refusal)) => {
            debug!(%refusal, "Bot command refused");
            Ok(())
        }
        other => other,
    }
}

/// Initialize tracing/logging. Logs go to stderr so stdout stays pure event JSON.
fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping simulation");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping simulation");
        }
    }
}
