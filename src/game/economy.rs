//! Round economy: loss streaks, win bonus, kill rewards and the buy menu

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::error::{CommandResult, Refusal};

use super::combat::{Weapon, WeaponCategory};
use super::player::{Item, Player, PlayerId, Team, MAX_ARMOR};
use super::round::{RoundEndReason, RoundWinner};

/// Money rules. Configuration only, never mutated during a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomySettings {
    pub start_money: u32,
    pub max_money: u32,
    pub win_bonus: u32,
    /// Indexed by consecutive losses, saturating at the last entry
    pub lose_bonus: Vec<u32>,
    pub bomb_plant_bonus: u32,
    pub bomb_defuse_bonus: u32,
    /// Charged instead of a kill reward for killing a teammate
    pub team_kill_penalty: u32,
    /// Kill reward per weapon family; missing families pay nothing
    pub kill_rewards: BTreeMap<WeaponCategory, u32>,
    /// Buy menu prices; weapons missing here are not for sale
    pub weapon_prices: BTreeMap<Weapon, u32>,
    pub kevlar_price: u32,
    pub kevlar_helmet_price: u32,
    pub defuse_kit_price: u32,
}

impl Default for EconomySettings {
    fn default() -> Self {
        let kill_rewards = [
            (WeaponCategory::Knife, 1_500),
            (WeaponCategory::Shotgun, 900),
            (WeaponCategory::Smg, 600),
            (WeaponCategory::Rifle, 300),
            (WeaponCategory::Pistol, 300),
            (WeaponCategory::Lmg, 300),
            (WeaponCategory::Grenade, 300),
            (WeaponCategory::Sniper, 100),
            (WeaponCategory::Explosive, 0),
        ];
        let weapon_prices = [
            (Weapon::Glock, 200),
            (Weapon::Usp, 200),
            (Weapon::Deagle, 650),
            (Weapon::Mp5sd, 1_500),
            (Weapon::P90, 2_350),
            (Weapon::Nova, 1_700),
            (Weapon::Xm1014, 3_000),
            (Weapon::Ak47, 2_500),
            (Weapon::M4a4, 3_100),
            (Weapon::Negev, 1_700),
            (Weapon::Awp, 4_750),
            (Weapon::HeGrenade, 300),
            (Weapon::Molotov, 400),
        ];
        Self {
            start_money: 800,
            max_money: 16_000,
            win_bonus: 3_250,
            lose_bonus: vec![1_400, 1_900, 2_400, 2_900, 3_400],
            bomb_plant_bonus: 800,
            bomb_defuse_bonus: 3_500,
            team_kill_penalty: 300,
            kill_rewards: kill_rewards.into_iter().collect(),
            weapon_prices: weapon_prices.into_iter().collect(),
            kevlar_price: 650,
            kevlar_helmet_price: 1_000,
            defuse_kit_price: 200,
        }
    }
}

impl EconomySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lose_bonus.is_empty() {
            return Err(ConfigError::Invalid("lose_bonus table must not be empty"));
        }
        if self.lose_bonus.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ConfigError::Invalid("lose_bonus table must be non-decreasing"));
        }
        if self.start_money > self.max_money {
            return Err(ConfigError::Invalid("start_money exceeds max_money"));
        }
        Ok(())
    }

    /// Loss bonus for a team that has lost `consecutive_losses` rounds in a row
    pub fn loss_bonus(&self, consecutive_losses: u32) -> u32 {
        let last = self.lose_bonus.len().saturating_sub(1);
        let index = (consecutive_losses as usize).min(last);
        self.lose_bonus.get(index).copied().unwrap_or(0)
    }

    /// Money for a kill with a weapon of the given category
    pub fn kill_reward(&self, category: WeaponCategory) -> u32 {
        self.kill_rewards.get(&category).copied().unwrap_or(0)
    }

    /// None when the item cannot be bought
    pub fn price(&self, purchase: Purchase) -> Option<u32> {
        match purchase {
            Purchase::Weapon(weapon) => self.weapon_prices.get(&weapon).copied(),
            Purchase::Kevlar => Some(self.kevlar_price),
            Purchase::KevlarHelmet => Some(self.kevlar_helmet_price),
            Purchase::DefuseKit => Some(self.defuse_kit_price),
        }
    }
}

/// Something on the buy menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purchase {
    Weapon(Weapon),
    Kevlar,
    KevlarHelmet,
    DefuseKit,
}

impl Purchase {
    /// Side-locked items
    pub fn team(self) -> Option<Team> {
        match self {
            Purchase::Weapon(Weapon::Glock | Weapon::Ak47) => Some(Team::Terrorist),
            Purchase::Weapon(Weapon::Usp | Weapon::M4a4) | Purchase::DefuseKit => {
                Some(Team::CounterTerrorist)
            }
            Purchase::Weapon(_) | Purchase::Kevlar | Purchase::KevlarHelmet => None,
        }
    }
}

/// Sell `purchase` to `player`: side, money then carry limits are checked in
/// that order. Returns the price paid.
pub fn buy(player: &mut Player, purchase: Purchase, settings: &EconomySettings) -> CommandResult<u32> {
    let price = settings.price(purchase).ok_or(Refusal::NotForSale)?;
    if purchase.team().is_some_and(|team| team != player.team) {
        return Err(Refusal::WrongTeamItem);
    }
    if player.money < price {
        return Err(Refusal::InsufficientFunds {
            price,
            money: player.money,
        });
    }
    let full = match purchase {
        Purchase::Kevlar => player.armor >= MAX_ARMOR,
        Purchase::KevlarHelmet => player.armor >= MAX_ARMOR && player.has_helmet,
        Purchase::DefuseKit => player.has_defuse_kit(),
        // One of each grenade; guns replace what is in hand
        Purchase::Weapon(weapon) => {
            weapon.category() == WeaponCategory::Grenade && player.has_item(Item::Weapon(weapon))
        }
    };
    if full {
        return Err(Refusal::CannotCarry);
    }

    player.debit(price);
    match purchase {
        Purchase::Weapon(weapon) => {
            player.give_item(Item::Weapon(weapon));
            if weapon.category() != WeaponCategory::Grenade {
                player.current_weapon = weapon;
            }
        }
        Purchase::Kevlar => player.armor = MAX_ARMOR,
        Purchase::KevlarHelmet => {
            player.armor = MAX_ARMOR;
            player.has_helmet = true;
        }
        Purchase::DefuseKit => player.give_item(Item::DefuseKit),
    }
    debug!(player_id = %player.id, ?purchase, price, money = player.money, "Item bought");
    Ok(price)
}

/// Consecutive rounds lost, per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsecutiveLosses {
    pub ct: u32,
    pub t: u32,
}

impl ConsecutiveLosses {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::CounterTerrorist => self.ct,
            Team::Terrorist => self.t,
        }
    }

    fn get_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::CounterTerrorist => &mut self.ct,
            Team::Terrorist => &mut self.t,
        }
    }

    /// Halftime: each streak follows its players to the other side
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.ct, &mut self.t);
    }
}

/// Money credited to one player at settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub amount: u32,
    pub money_after: u32,
}

/// Pay out the end of a round and update loss streaks.
///
/// Winners get the flat win bonus, losers the loss bonus for their current
/// streak. A draw pays both teams their current loss bonus and leaves the
/// streaks untouched. Plant and defuse bonuses are paid when the action
/// happens, never here.
pub fn settle_round<'a>(
    players: impl IntoIterator<Item = &'a mut Player>,
    winner: RoundWinner,
    reason: RoundEndReason,
    losses: &mut ConsecutiveLosses,
    settings: &EconomySettings,
) -> Vec<Payout> {
    let winning_team = winner.team();

    let payouts: Vec<Payout> = players
        .into_iter()
        .map(|player| {
            let amount = if Some(player.team) == winning_team {
                settings.win_bonus
            } else {
                settings.loss_bonus(losses.get(player.team))
            };
            player.credit(amount, settings.max_money);
            Payout {
                player_id: player.id,
                amount,
                money_after: player.money,
            }
        })
        .collect();

    if let Some(team) = winning_team {
        *losses.get_mut(team) = 0;
        *losses.get_mut(team.opposite()) += 1;
    }

    debug!(
        ?winner,
        ?reason,
        ct_losses = losses.ct,
        t_losses = losses.t,
        players = payouts.len(),
        "Round settled"
    );

    payouts
}
