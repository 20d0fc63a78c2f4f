//! Combat system - weapons, projectiles, hit detection

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::physics::{PhysicsSystem, TileMap, Vec2};
use super::player::{Player, PlayerId};

/// Weapons known to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    Glock,
    Usp,
    Deagle,
    Ak47,
    M4a4,
    Awp,
    Mp5sd,
    P90,
    Nova,
    Xm1014,
    Negev,
    Knife,
    HeGrenade,
    Molotov,
    /// The planted bomb, used as the weapon of explosion damage
    C4,
}

/// Weapon family, drives the kill reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    Knife,
    Pistol,
    Smg,
    Rifle,
    Shotgun,
    Lmg,
    Sniper,
    Grenade,
    Explosive,
}

impl Weapon {
    pub fn category(self) -> WeaponCategory {
        match self {
            Weapon::Glock | Weapon::Usp | Weapon::Deagle => WeaponCategory::Pistol,
            Weapon::Ak47 | Weapon::M4a4 => WeaponCategory::Rifle,
            Weapon::Awp => WeaponCategory::Sniper,
            Weapon::Mp5sd | Weapon::P90 => WeaponCategory::Smg,
            Weapon::Nova | Weapon::Xm1014 => WeaponCategory::Shotgun,
            Weapon::Negev => WeaponCategory::Lmg,
            Weapon::Knife => WeaponCategory::Knife,
            Weapon::HeGrenade | Weapon::Molotov => WeaponCategory::Grenade,
            Weapon::C4 => WeaponCategory::Explosive,
        }
    }
}

/// Ballistic stats per weapon
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    /// Raw damage per hit
    pub damage: u32,
    /// Projectile speed (units per second)
    pub projectile_speed: f32,
    /// Projectile lifetime (seconds)
    pub projectile_lifetime: f32,
    /// Ignores armor entirely
    pub armor_piercing: bool,
}

impl WeaponStats {
    pub fn for_weapon(weapon: Weapon) -> Self {
        let (damage, projectile_speed, projectile_lifetime, armor_piercing) = match weapon {
            Weapon::Glock => (28, 1800.0, 1.0, false),
            Weapon::Usp => (35, 1800.0, 1.0, false),
            Weapon::Deagle => (48, 2200.0, 1.0, false),
            Weapon::Ak47 => (36, 2400.0, 1.5, false),
            Weapon::M4a4 => (33, 2400.0, 1.5, false),
            Weapon::Awp => (115, 3600.0, 2.0, true),
            Weapon::Mp5sd => (27, 1600.0, 0.8, false),
            Weapon::P90 => (26, 1600.0, 0.8, false),
            Weapon::Nova => (26, 1400.0, 0.4, false),
            Weapon::Xm1014 => (20, 1400.0, 0.4, false),
            Weapon::Negev => (35, 2000.0, 1.2, false),
            Weapon::Knife => (65, 600.0, 0.05, false),
            Weapon::HeGrenade => (98, 0.0, 0.0, true),
            Weapon::Molotov => (8, 0.0, 0.0, true),
            Weapon::C4 => (0, 0.0, 0.0, false),
        };
        Self {
            damage,
            projectile_speed,
            projectile_lifetime,
            armor_piercing,
        }
    }
}

/// Active projectile in the round
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    pub owner_id: PlayerId,
    pub weapon: Weapon,
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: u32,
    pub armor_piercing: bool,
    pub lifetime_remaining: f32,
}

impl Projectile {
    /// Create a new projectile fired along `direction` (radians)
    pub fn new(owner_id: PlayerId, origin: Vec2, direction: f32, weapon: Weapon) -> Self {
        let stats = WeaponStats::for_weapon(weapon);
        Self {
            id: Uuid::new_v4(),
            owner_id,
            weapon,
            position: origin,
            velocity: Vec2::new(
                direction.cos() * stats.projectile_speed,
                direction.sin() * stats.projectile_speed,
            ),
            damage: stats.damage,
            armor_piercing: stats.armor_piercing,
            lifetime_remaining: stats.projectile_lifetime,
        }
    }

    /// Update projectile position, returns false if expired
    pub fn update(&mut self, dt: f32) -> bool {
        self.position.x += self.velocity.x * dt;
        self.position.y += self.velocity.y * dt;
        self.lifetime_remaining -= dt;
        self.lifetime_remaining > 0.0
    }
}

/// What a projectile reached this tick
#[derive(Debug, Clone, PartialEq)]
pub enum HitResult {
    Player {
        projectile_id: Uuid,
        shooter_id: PlayerId,
        target_id: PlayerId,
        weapon: Weapon,
        damage: u32,
        headshot: bool,
        armor_piercing: bool,
        position: Vec2,
    },
    Wall {
        projectile_id: Uuid,
        position: Vec2,
    },
}

/// Moves projectiles and decides what each one reaches first
pub struct HitDetector;

impl HitDetector {
    /// Advance every projectile by `dt`. Hit, blocked and expired projectiles
    /// are removed; surviving ones stay in flight.
    pub fn step(
        projectiles: &mut Vec<Projectile>,
        players: &BTreeMap<PlayerId, Player>,
        map: &dyn TileMap,
        hit_radius: f32,
        headshot_chance: f64,
        rng: &mut impl Rng,
        dt: f32,
    ) -> Vec<HitResult> {
        let mut hits = Vec::new();

        projectiles.retain_mut(|projectile| {
            if !projectile.update(dt) {
                return false;
            }

            // Players take priority; a consumed projectile never reaches the wall check
            if let Some(target) = Self::nearest_target(projectile, players, hit_radius) {
                hits.push(HitResult::Player {
                    projectile_id: projectile.id,
                    shooter_id: projectile.owner_id,
                    target_id: target,
                    weapon: projectile.weapon,
                    damage: projectile.damage,
                    headshot: rng.gen_bool(headshot_chance),
                    armor_piercing: projectile.armor_piercing,
                    position: projectile.position,
                });
                return false;
            }

            match map.tile_at(projectile.position) {
                Some(tile) if tile.stops_projectiles() => {
                    hits.push(HitResult::Wall {
                        projectile_id: projectile.id,
                        position: projectile.position,
                    });
                    false
                }
                Some(_) => true,
                // Left the map
                None => false,
            }
        });

        hits
    }

    /// Nearest living player other than the shooter inside the hit radius
    fn nearest_target(
        projectile: &Projectile,
        players: &BTreeMap<PlayerId, Player>,
        hit_radius: f32,
    ) -> Option<PlayerId> {
        players
            .values()
            .filter(|p| p.alive && p.id != projectile.owner_id)
            .filter(|p| {
                PhysicsSystem::strictly_within_radius(projectile.position, p.position, hit_radius)
            })
            .min_by(|a, b| {
                let da = a.position.distance_sq(projectile.position);
                let db = b.position.distance_sq(projectile.position);
                da.total_cmp(&db)
            })
            .map(|p| p.id)
    }
}
