//! Positions, distance tests and the map geometry query

use serde::{Deserialize, Serialize};

/// 2D world position or velocity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Point `distance` units away along `direction` (radians)
    pub fn offset(self, direction: f32, distance: f32) -> Vec2 {
        Vec2::new(
            self.x + direction.cos() * distance,
            self.y + direction.sin() * distance,
        )
    }
}

/// Result of a map geometry lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub walkable: bool,
    pub bullet_penetrable: bool,
}

impl Tile {
    pub const FLOOR: Tile = Tile {
        walkable: true,
        bullet_penetrable: true,
    };
    pub const WALL: Tile = Tile {
        walkable: false,
        bullet_penetrable: false,
    };

    /// Solid surface that stops projectiles
    pub fn stops_projectiles(&self) -> bool {
        !self.walkable && !self.bullet_penetrable
    }
}

/// Map geometry query supplied by the map collaborator
pub trait TileMap: Send {
    /// Tile at a world position, `None` outside the map
    fn tile_at(&self, position: Vec2) -> Option<Tile>;
}

/// Map without obstacles
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMap;

impl TileMap for OpenMap {
    fn tile_at(&self, _position: Vec2) -> Option<Tile> {
        Some(Tile::FLOOR)
    }
}

/// Fixed-size tile grid
#[derive(Debug, Clone)]
pub struct GridMap {
    width: usize,
    height: usize,
    cell_size: f32,
    tiles: Vec<Tile>,
}

impl GridMap {
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            width,
            height,
            cell_size,
            tiles: vec![Tile::FLOOR; width * height],
        }
    }

    /// Set a tile by grid coordinate; out-of-range coordinates are ignored
    pub fn set(&mut self, col: usize, row: usize, tile: Tile) {
        if col < self.width && row < self.height {
            self.tiles[row * self.width + col] = tile;
        }
    }
}

impl TileMap for GridMap {
    fn tile_at(&self, position: Vec2) -> Option<Tile> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let col = (position.x / self.cell_size) as usize;
        let row = (position.y / self.cell_size) as usize;
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles.get(row * self.width + col).copied()
    }
}

/// Physics helpers shared by the hit detector and the bomb controller
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Point-circle test (inclusive)
    pub fn within_radius(point: Vec2, center: Vec2, radius: f32) -> bool {
        point.distance_sq(center) <= radius * radius
    }

    /// Point-circle test (exclusive), used for hit detection
    pub fn strictly_within_radius(point: Vec2, center: Vec2, radius: f32) -> bool {
        point.distance_sq(center) < radius * radius
    }

    /// Linear explosion falloff, floored. Zero at or beyond `radius`.
    pub fn explosion_damage(max_damage: u32, radius: f32, distance: f32) -> u32 {
        if distance >= radius {
            return 0;
        }
        let ratio = 1.0 - (distance.max(0.0) / radius);
        (max_damage as f32 * ratio).floor() as u32
    }
}
