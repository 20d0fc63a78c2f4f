//! Configuration module - environment variable parsing and match rules

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::economy::EconomySettings;

/// Match rules. Defaults are the reference bomb-defusal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Seed for the match RNG (bomb carrier, projectile headshot rolls)
    pub seed: u64,
    /// Rounds in a full match; halftime falls after `max_rounds / 2`
    pub max_rounds: u32,
    /// Live round length (seconds)
    pub round_time: f32,
    /// Freeze time before each round (seconds)
    pub freeze_time: f32,
    /// Buying stays open this long into the live round (seconds)
    pub buy_time: f32,
    /// Delay between round end and the next round (seconds)
    pub post_round_delay: f32,
    /// Halftime break (seconds)
    pub halftime_delay: f32,
    /// Bomb fuse (seconds)
    pub bomb_timer: f32,
    pub defuse_time_no_kit: f32,
    pub defuse_time_with_kit: f32,
    /// Max distance from the bomb to start or keep defusing
    pub defuse_radius: f32,
    pub explosion_radius: f32,
    /// Damage at the center of the explosion
    pub explosion_damage: u32,
    /// Player hit radius for projectiles
    pub hit_radius: f32,
    /// Seconds a damaging attacker stays eligible for an assist
    pub assist_window: f32,
    /// Damage history entries kept per player
    pub damage_history_cap: usize,
    /// Seconds a damaged player stays "in pain"
    pub pain_duration: f32,
    /// Chance that a projectile hit is a headshot
    pub headshot_chance: f64,
    pub friendly_fire: bool,
    /// Players required on each team before warmup ends
    pub min_players_per_team: usize,
    pub max_players_per_team: usize,
    pub economy: EconomySettings,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_rounds: 30,
            round_time: 115.0,
            freeze_time: 15.0,
            buy_time: 15.0,
            post_round_delay: 5.0,
            halftime_delay: 3.0,
            bomb_timer: 45.0,
            defuse_time_no_kit: 10.0,
            defuse_time_with_kit: 5.0,
            defuse_radius: 100.0,
            explosion_radius: 500.0,
            explosion_damage: 500,
            hit_radius: 16.0,
            assist_window: 5.0,
            damage_history_cap: 50,
            pain_duration: 2.0,
            headshot_chance: 0.2,
            friendly_fire: false,
            min_players_per_team: 1,
            max_players_per_team: 5,
            economy: EconomySettings::default(),
        }
    }
}

impl MatchConfig {
    /// Reject rule sets the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be at least 1"));
        }
        let durations = [
            self.round_time,
            self.freeze_time,
            self.buy_time,
            self.post_round_delay,
            self.halftime_delay,
            self.bomb_timer,
            self.defuse_time_no_kit,
            self.defuse_time_with_kit,
            self.assist_window,
        ];
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ConfigError::Invalid("durations must be finite and non-negative"));
        }
        if self.explosion_radius <= 0.0 || self.hit_radius <= 0.0 {
            return Err(ConfigError::Invalid("radii must be positive"));
        }
        if !(0.0..=1.0).contains(&self.headshot_chance) {
            return Err(ConfigError::Invalid("headshot_chance must be within 0..=1"));
        }
        if self.min_players_per_team > self.max_players_per_team {
            return Err(ConfigError::Invalid(
                "min_players_per_team exceeds max_players_per_team",
            ));
        }
        self.economy.validate()
    }

    /// Rounds needed to win the match outright
    pub fn rounds_to_win(&self) -> u32 {
        self.max_rounds / 2 + 1
    }
}

/// Process configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// `LOG_FORMAT=json` switches to JSON log lines
    pub log_json: bool,
    /// Bots per team in the demo match
    pub players_per_team: usize,
    pub rules: MatchConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut rules = MatchConfig::default();

        rules.seed = parse_var("MATCH_SEED")?.unwrap_or(rules.seed);
        rules.max_rounds = parse_var("MAX_ROUNDS")?.unwrap_or(rules.max_rounds);
        rules.round_time = parse_var("ROUND_TIME_SECS")?.unwrap_or(rules.round_time);
        rules.freeze_time = parse_var("FREEZE_TIME_SECS")?.unwrap_or(rules.freeze_time);
        rules.buy_time = parse_var("BUY_TIME_SECS")?.unwrap_or(rules.buy_time);
        rules.bomb_timer = parse_var("BOMB_TIMER_SECS")?.unwrap_or(rules.bomb_timer);
        rules.friendly_fire = parse_var("FRIENDLY_FIRE")?.unwrap_or(rules.friendly_fire);
        rules.validate()?;

        let players_per_team = parse_var("PLAYERS_PER_TEAM")?.unwrap_or(5);
        if players_per_team == 0 || players_per_team > rules.max_players_per_team {
            return Err(ConfigError::Invalid("PLAYERS_PER_TEAM out of range"));
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")),
            players_per_team,
            rules,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Malformed(name)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed value for environment variable: {0}")]
    Malformed(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn rounds_to_win_is_majority() {
        let config = MatchConfig::default();
        assert_eq!(config.rounds_to_win(), 16);
        let short = MatchConfig {
            max_rounds: 5,
            ..MatchConfig::default()
        };
        assert_eq!(short.rounds_to_win(), 3);
    }

    #[test]
    fn rejects_negative_durations() {
        let config = MatchConfig {
            bomb_timer: -1.0,
            ..MatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_negative_buy_time() {
        let config = MatchConfig {
            buy_time: -0.5,
            ..MatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_decreasing_loss_table() {
        let mut config = MatchConfig::default();
        config.economy.lose_bonus = vec![1900, 1400];
        assert!(config.validate().is_err());
    }
}
