//! Round phases, scores and the end-of-round precedence

use serde::{Deserialize, Serialize};

use crate::util::time::Countdown;

use super::economy::ConsecutiveLosses;
use super::player::Team;

/// Round phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Waiting for enough players
    Warmup,
    /// Round initialised, players frozen
    Freeze,
    Live,
    PostRound,
    Halftime,
    /// Terminal
    MatchEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    Elimination,
    BombExploded,
    BombDefused,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundWinner {
    #[serde(rename = "ct")]
    CounterTerrorist,
    #[serde(rename = "t")]
    Terrorist,
    #[serde(rename = "draw")]
    Draw,
}

impl RoundWinner {
    /// Winning team, None for a draw
    pub fn team(self) -> Option<Team> {
        match self {
            RoundWinner::CounterTerrorist => Some(Team::CounterTerrorist),
            RoundWinner::Terrorist => Some(Team::Terrorist),
            RoundWinner::Draw => None,
        }
    }
}

impl From<Team> for RoundWinner {
    fn from(team: Team) -> Self {
        match team {
            Team::CounterTerrorist => RoundWinner::CounterTerrorist,
            Team::Terrorist => RoundWinner::Terrorist,
        }
    }
}

/// Rounds won per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub ct: u32,
    pub t: u32,
}

impl Scores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::CounterTerrorist => self.ct,
            Team::Terrorist => self.t,
        }
    }

    /// Credit a round win; a draw scores nothing
    pub fn record(&mut self, winner: RoundWinner) {
        match winner {
            RoundWinner::CounterTerrorist => self.ct += 1,
            RoundWinner::Terrorist => self.t += 1,
            RoundWinner::Draw => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.ct + self.t
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.ct, &mut self.t);
    }

    /// Leader, or draw when level
    pub fn leader(&self) -> RoundWinner {
        match self.ct.cmp(&self.t) {
            std::cmp::Ordering::Greater => RoundWinner::CounterTerrorist,
            std::cmp::Ordering::Less => RoundWinner::Terrorist,
            std::cmp::Ordering::Equal => RoundWinner::Draw,
        }
    }
}

/// Living players per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveCounts {
    pub ct: usize,
    pub t: usize,
}

/// Everything the end-of-round check looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundEndInputs {
    pub alive: AliveCounts,
    pub bomb_planted: bool,
    pub bomb_exploded: bool,
    pub bomb_defused: bool,
    pub round_time_remaining: f32,
}

/// Decide whether the live round is over. Rules are checked in order and the
/// first that matches wins.
pub fn evaluate_round_end(inputs: &RoundEndInputs) -> Option<(RoundWinner, RoundEndReason)> {
    let AliveCounts { ct, t } = inputs.alive;

    if ct == 0 && t == 0 {
        return Some((RoundWinner::Draw, RoundEndReason::Elimination));
    }
    if ct == 0 {
        return Some((RoundWinner::Terrorist, RoundEndReason::Elimination));
    }
    if t == 0 {
        if !inputs.bomb_planted {
            return Some((RoundWinner::CounterTerrorist, RoundEndReason::Elimination));
        }
        // CT still has to defuse or outlast the bomb
        if !inputs.bomb_exploded && !inputs.bomb_defused {
            return None;
        }
    }
    if inputs.bomb_exploded {
        return Some((RoundWinner::Terrorist, RoundEndReason::BombExploded));
    }
    if inputs.bomb_defused {
        return Some((RoundWinner::CounterTerrorist, RoundEndReason::BombDefused));
    }
    if inputs.round_time_remaining <= 0.0 && !inputs.bomb_planted {
        return Some((RoundWinner::CounterTerrorist, RoundEndReason::Time));
    }
    None
}

/// Round bookkeeping owned by the match
#[derive(Debug, Clone)]
pub struct RoundState {
    /// 0 until the first round is initialised
    pub number: u32,
    pub phase: RoundPhase,
    pub round_clock: Countdown,
    pub freeze_clock: Countdown,
    /// Post-round and halftime delay
    pub phase_clock: Countdown,
    pub scores: Scores,
    pub losses: ConsecutiveLosses,
    pub alive: AliveCounts,
    /// Rounds that reached a result, draws included
    pub rounds_played: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            number: 0,
            phase: RoundPhase::Warmup,
            round_clock: Countdown::new(0.0),
            freeze_clock: Countdown::new(0.0),
            phase_clock: Countdown::new(0.0),
            scores: Scores::default(),
            losses: ConsecutiveLosses::default(),
            alive: AliveCounts::default(),
            rounds_played: 0,
        }
    }
}

impl RoundState {
    /// Match is decided: a majority of rounds won, or every round used up
    pub fn is_match_complete(&self, max_rounds: u32) -> bool {
        let to_win = max_rounds / 2 + 1;
        self.scores.ct >= to_win
            || self.scores.t >= to_win
            || self.scores.total() >= max_rounds
            || self.rounds_played >= max_rounds
    }

    /// First round of the second half
    pub fn is_halftime_round(next_round: u32, max_rounds: u32) -> bool {
        next_round == max_rounds / 2 + 1
    }

    /// Halftime: sides trade scores and loss streaks
    pub fn swap_sides(&mut self) {
        self.scores.swap();
        self.losses.swap();
    }
}
