//! Authoritative tick loop around a `MatchState`

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ConfigError, MatchConfig};
use crate::error::{CommandResult, Refusal};
use crate::events::{DefuseStopReason, EventEnvelope, LogObserver};
use crate::util::time::{tick_delta, Timer, SIMULATION_TPS, SLOW_TICK_MICROS, SNAPSHOT_TPS, TICK_DURATION_MICROS};

use super::economy::Purchase;
use super::physics::Vec2;
use super::player::{Item, PlayerId, Team};
use super::r#match::{HitReport, MatchState};
use super::round::RoundPhase;
use super::snapshot::{MatchSnapshot, SnapshotBuilder};

type Reply<T> = oneshot::Sender<CommandResult<T>>;

/// Command sent to the match task
#[derive(Debug)]
pub enum MatchCommand {
    Join {
        player_id: PlayerId,
        display_name: String,
        team: Team,
        reply: Reply<()>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    Plant {
        player_id: PlayerId,
        reply: Reply<String>,
    },
    StartDefuse {
        player_id: PlayerId,
        reply: Reply<f32>,
    },
    StopDefuse {
        player_id: PlayerId,
        reason: DefuseStopReason,
        reply: Reply<()>,
    },
    Buy {
        player_id: PlayerId,
        item: Purchase,
        /// Price paid
        reply: Reply<u32>,
    },
    ReportHit {
        hit: HitReport,
        /// Whether the hit killed the target
        reply: Reply<bool>,
    },
    Fire {
        player_id: PlayerId,
        direction: f32,
        reply: Reply<Uuid>,
    },
    Move {
        player_id: PlayerId,
        position: Vec2,
        velocity: Vec2,
        reply: Reply<()>,
    },
    GiveItem {
        player_id: PlayerId,
        item: Item,
        reply: Reply<()>,
    },
    GiveArmor {
        player_id: PlayerId,
        amount: u32,
        helmet: bool,
        reply: Reply<()>,
    },
    Heal {
        player_id: PlayerId,
        amount: u32,
        reply: Reply<u32>,
    },
    ForceRoundEnd {
        reply: Reply<()>,
    },
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },
}

/// Errors returned by `MatchHandle`
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("Match is no longer running")]
    Closed,

    #[error(transparent)]
    Refused(#[from] Refusal),
}

/// Handle to a running match
#[derive(Clone, Debug)]
pub struct MatchHandle {
    pub id: Uuid,
    command_tx: mpsc::Sender<MatchCommand>,
    event_tx: broadcast::Sender<EventEnvelope>,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
}

impl MatchHandle {
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }

    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<MatchSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> MatchCommand,
    ) -> Result<T, HandleError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .await
            .map_err(|_| HandleError::Closed)?;
        Ok(response.await.map_err(|_| HandleError::Closed)??)
    }

    pub async fn join(&self, player_id: PlayerId, display_name: &str, team: Team) -> Result<(), HandleError> {
        let display_name = display_name.to_string();
        self.request(|reply| MatchCommand::Join {
            player_id,
            display_name,
            team,
            reply,
        })
        .await
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<(), HandleError> {
        self.request(|reply| MatchCommand::Leave { player_id, reply })
            .await
    }

    pub async fn plant(&self, player_id: PlayerId) -> Result<String, HandleError> {
        self.request(|reply| MatchCommand::Plant { player_id, reply })
            .await
    }

    pub async fn start_defuse(&self, player_id: PlayerId) -> Result<f32, HandleError> {
        self.request(|reply| MatchCommand::StartDefuse { player_id, reply })
            .await
    }

    pub async fn stop_defuse(&self, player_id: PlayerId, reason: DefuseStopReason) -> Result<(), HandleError> {
        self.request(|reply| MatchCommand::StopDefuse {
            player_id,
            reason,
            reply,
        })
        .await
    }

    /// Returns the price paid
    pub async fn buy(&self, player_id: PlayerId, item: Purchase) -> Result<u32, HandleError> {
        self.request(|reply| MatchCommand::Buy {
            player_id,
            item,
            reply,
        })
        .await
    }

    /// Returns true when the hit killed its target
    pub async fn report_hit(&self, hit: HitReport) -> Result<bool, HandleError> {
        self.request(|reply| MatchCommand::ReportHit { hit, reply })
            .await
    }

    pub async fn fire(&self, player_id: PlayerId, direction: f32) -> Result<Uuid, HandleError> {
        self.request(|reply| MatchCommand::Fire {
            player_id,
            direction,
            reply,
        })
        .await
    }

    pub async fn move_to(&self, player_id: PlayerId, position: Vec2, velocity: Vec2) -> Result<(), HandleError> {
        self.request(|reply| MatchCommand::Move {
            player_id,
            position,
            velocity,
            reply,
        })
        .await
    }

    pub async fn give_item(&self, player_id: PlayerId, item: Item) -> Result<(), HandleError> {
        self.request(|reply| MatchCommand::GiveItem {
            player_id,
            item,
            reply,
        })
        .await
    }

    pub async fn give_armor(&self, player_id: PlayerId, amount: u32, helmet: bool) -> Result<(), HandleError> {
        self.request(|reply| MatchCommand::GiveArmor {
            player_id,
            amount,
            helmet,
            reply,
        })
        .await
    }

    pub async fn heal(&self, player_id: PlayerId, amount: u32) -> Result<u32, HandleError> {
        self.request(|reply| MatchCommand::Heal {
            player_id,
            amount,
            reply,
        })
        .await
    }

    pub async fn force_round_end(&self) -> Result<(), HandleError> {
        self.request(|reply| MatchCommand::ForceRoundEnd { reply })
            .await
    }

    /// Current state, taken between ticks
    pub async fn snapshot(&self) -> Result<MatchSnapshot, HandleError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(MatchCommand::Snapshot { reply })
            .await
            .map_err(|_| HandleError::Closed)?;
        response.await.map_err(|_| HandleError::Closed)
    }
}

/// The authoritative game match
pub struct GameMatch {
    state: MatchState,
    command_rx: mpsc::Receiver<MatchCommand>,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
    snapshot_builder: SnapshotBuilder,
}

impl GameMatch {
    /// Create a new match
    pub fn new(id: Uuid, config: MatchConfig) -> Result<(Self, MatchHandle), ConfigError> {
        config.validate()?;
        Ok(Self::from_state(MatchState::new(id, config)))
    }

    /// Wrap an already configured state
    pub fn from_state(mut state: MatchState) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(1024);
        let (snapshot_tx, _) = broadcast::channel(64);

        state.subscribe(Box::new(LogObserver));
        state.subscribe(Box::new(event_tx.clone()));

        let handle = MatchHandle {
            id: state.id,
            command_tx,
            event_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let game_match = Self {
            state,
            command_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(SIMULATION_TPS / SNAPSHOT_TPS),
        };

        (game_match, handle)
    }

    /// Run the authoritative tick loop until the match ends or every handle
    /// is dropped. Returns the final state.
    pub async fn run(mut self) -> MatchState {
        info!(match_id = %self.state.id, "Match task started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let dt = tick_delta();

        loop {
            tick_interval.tick().await;

            // Drain command queue
            if !self.process_commands() {
                info!(match_id = %self.state.id, "All handles dropped, stopping match");
                break;
            }

            let timer = Timer::new();
            let events = self.state.advance(dt);
            let elapsed = timer.elapsed_micros();
            if elapsed > SLOW_TICK_MICROS {
                warn!(
                    match_id = %self.state.id,
                    tick = self.state.tick(),
                    elapsed_micros = elapsed,
                    "Slow tick"
                );
            }

            if !events.is_empty() {
                self.snapshot_builder.force_next();
            }
            if self.snapshot_builder.should_send() {
                let _ = self.snapshot_tx.send(SnapshotBuilder::build(&self.state));
            }

            if self.state.phase() == RoundPhase::MatchEnd {
                info!(match_id = %self.state.id, "Match task finished");
                break;
            }
        }

        self.state
    }

    /// Apply every queued command. Returns false once no handle is left.
    fn process_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.handle_command(command),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle_command(&mut self, command: MatchCommand) {
        let state = &mut self.state;
        // A dropped reply receiver just means the caller stopped waiting
        match command {
            MatchCommand::Join {
                player_id,
                display_name,
                team,
                reply,
            } => {
                let _ = reply.send(state.join(player_id, display_name, team));
            }
            MatchCommand::Leave { player_id, reply } => {
                let _ = reply.send(state.leave(player_id));
            }
            MatchCommand::Plant { player_id, reply } => {
                let _ = reply.send(state.request_plant(player_id));
            }
            MatchCommand::StartDefuse { player_id, reply } => {
                let _ = reply.send(state.request_defuse_start(player_id));
            }
            MatchCommand::StopDefuse {
                player_id,
                reason,
                reply,
            } => {
                let _ = reply.send(state.request_defuse_stop(player_id, reason));
            }
            MatchCommand::Buy {
                player_id,
                item,
                reply,
            } => {
                let _ = reply.send(state.buy(player_id, item));
            }
            MatchCommand::ReportHit { hit, reply } => {
                let result = state
                    .report_hit(hit)
                    .map(|applied| applied.is_some_and(|a| a.killed));
                let _ = reply.send(result);
            }
            MatchCommand::Fire {
                player_id,
                direction,
                reply,
            } => {
                let _ = reply.send(state.fire_projectile(player_id, direction));
            }
            MatchCommand::Move {
                player_id,
                position,
                velocity,
                reply,
            } => {
                let _ = reply.send(state.update_position(player_id, position, velocity));
            }
            MatchCommand::GiveItem {
                player_id,
                item,
                reply,
            } => {
                let _ = reply.send(state.give_item(player_id, item));
            }
            MatchCommand::GiveArmor {
                player_id,
                amount,
                helmet,
                reply,
            } => {
                let _ = reply.send(state.give_armor(player_id, amount, helmet));
            }
            MatchCommand::Heal {
                player_id,
                amount,
                reply,
            } => {
                let _ = reply.send(state.heal(player_id, amount));
            }
            MatchCommand::ForceRoundEnd { reply } => {
                let _ = reply.send(state.force_round_end());
            }
            MatchCommand::Snapshot { reply } => {
                let _ = reply.send(SnapshotBuilder::build(state));
            }
        }
    }
}
