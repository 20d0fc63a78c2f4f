//! Bomb sites and spawn points

use serde::{Deserialize, Serialize};

use super::physics::{PhysicsSystem, Vec2};
use super::player::Team;

/// Spacing between spawn slots of one team
const SPAWN_SLOT_SPACING: f32 = 32.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombSite {
    pub id: String,
    pub name: String,
    pub position: Vec2,
    pub radius: f32,
}

impl BombSite {
    pub fn new(id: &str, name: &str, position: Vec2, radius: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            position,
            radius,
        }
    }

    pub fn contains(&self, position: Vec2) -> bool {
        PhysicsSystem::within_radius(position, self.position, self.radius)
    }
}

/// Static map data the round needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    pub bomb_sites: Vec<BombSite>,
    pub ct_spawn: Vec2,
    pub t_spawn: Vec2,
}

impl Default for MapLayout {
    fn default() -> Self {
        Self {
            bomb_sites: vec![
                BombSite::new("A", "Bombsite A", Vec2::new(200.0, 200.0), 100.0),
                BombSite::new("B", "Bombsite B", Vec2::new(800.0, 600.0), 100.0),
            ],
            ct_spawn: Vec2::new(100.0, 100.0),
            t_spawn: Vec2::new(900.0, 700.0),
        }
    }
}

impl MapLayout {
    /// Spawn position for the `slot`-th player of a team, laid out in a row
    pub fn spawn_point(&self, team: Team, slot: usize) -> Vec2 {
        let base = match team {
            Team::CounterTerrorist => self.ct_spawn,
            Team::Terrorist => self.t_spawn,
        };
        let offset = slot as f32 * SPAWN_SLOT_SPACING;
        match team {
            Team::CounterTerrorist => Vec2::new(base.x + offset, base.y),
            Team::Terrorist => Vec2::new(base.x - offset, base.y),
        }
    }

    /// Closest site center to `position`
    pub fn nearest_site(&self, position: Vec2) -> Option<&BombSite> {
        self.bomb_sites.iter().min_by(|a, b| {
            let da = a.position.distance_sq(position);
            let db = b.position.distance_sq(position);
            da.total_cmp(&db)
        })
    }

    pub fn site(&self, id: &str) -> Option<&BombSite> {
        self.bomb_sites.iter().find(|site| site.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_site_is_by_distance() {
        let layout = MapLayout::default();
        assert_eq!(layout.nearest_site(Vec2::new(250.0, 250.0)).unwrap().id, "A");
        assert_eq!(layout.nearest_site(Vec2::new(700.0, 500.0)).unwrap().id, "B");
    }

    #[test]
    fn site_radius_is_inclusive() {
        let layout = MapLayout::default();
        let a = layout.site("A").unwrap();
        assert!(a.contains(Vec2::new(300.0, 200.0)));
        assert!(!a.contains(Vec2::new(300.5, 200.0)));
    }

    #[test]
    fn spawn_slots_do_not_overlap() {
        let layout = MapLayout::default();
        assert_eq!(layout.spawn_point(Team::CounterTerrorist, 0), Vec2::new(100.0, 100.0));
        assert_eq!(layout.spawn_point(Team::CounterTerrorist, 1), Vec2::new(132.0, 100.0));
        assert_eq!(layout.spawn_point(Team::Terrorist, 2), Vec2::new(836.0, 700.0));
    }
}
