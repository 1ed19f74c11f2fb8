use glam::{IVec2, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A cell on the game board. Valid cells lie in `[1, 2 * grid_size]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step along `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let d = direction.vector();
        Self::new(self.x + d.x, self.y + d.y)
    }

    pub fn as_ivec2(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    /// World-space center of the cell. The board spans `[0, 2 * grid_size]`.
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 - 0.5, self.y as f32 - 0.5)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Heading of a segment. North is +Y, East is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit vector for this heading.
    pub fn vector(self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, 1),
            Direction::South => IVec2::new(0, -1),
            Direction::East => IVec2::new(1, 0),
            Direction::West => IVec2::new(-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// True if turning from `self` to `other` would be a 180-degree turn.
    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Counter-clockwise rotation (radians) of a sprite drawn facing north.
    pub fn rotation(self) -> f32 {
        match self {
            Direction::North => 0.0,
            Direction::West => 90.0_f32.to_radians(),
            Direction::South => 180.0_f32.to_radians(),
            Direction::East => 270.0_f32.to_radians(),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction `{0}` (expected N, S, E, W, north, up, ...)")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "u" | "north" | "up" => Ok(Direction::North),
            "s" | "d" | "south" | "down" => Ok(Direction::South),
            "e" | "r" | "east" | "right" => Ok(Direction::East),
            "w" | "l" | "west" | "left" => Ok(Direction::West),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Flat sprite on the XY plane, rotated about Z.
    pub fn sprite(center: Vec2, angle: f32, half_extent: f32) -> Self {
        Self {
            position: center.extend(0.0),
            rotation: Quat::from_rotation_z(angle),
            scale: Vec3::new(half_extent, half_extent, 1.0),
        }
    }

    /// Model matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = (rotation * self.rotation).normalize();
    }

    pub fn rotate_axis(&mut self, axis: Vec3, angle: f32) {
        self.rotate(Quat::from_axis_angle(axis.normalize(), angle));
    }

    pub fn rescale(&mut self, factor: Vec3) {
        self.scale *= factor;
    }
}
