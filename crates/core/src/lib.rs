#![warn(missing_docs)]
//! Core primitives shared across the workspace: lattice geometry, item
//! identifiers, the production-rule catalog and the inventory model.

pub mod catalog;
pub mod inventory;
pub mod item;

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use catalog::{CatalogError, CraftSurface, ItemCatalog, ItemRule, RecipeGrid};
pub use inventory::{Inventory, InventoryError};
pub use item::{BlockId, HarvestLevel, ItemId, ToolKind, ToolSpec};

/// Integer lattice coordinate. `y` grows upward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// East/west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North/south axis.
    pub z: i32,
}

impl Position {
    /// Lattice origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Construct a position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given deltas.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The cell directly above.
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The cell directly below.
    pub const fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Neighbouring cell across `face`.
    pub const fn adjacent(self, face: Face) -> Self {
        let (dx, dy, dz) = face.normal();
        self.offset(dx, dy, dz)
    }

    /// Manhattan distance in the horizontal (x/z) plane.
    pub fn horizontal_manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// Full 3D Manhattan distance.
    pub fn manhattan(self, other: Self) -> u32 {
        self.horizontal_manhattan(other) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance (exact in integer space).
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance.
    pub fn distance(self, other: Self) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Largest horizontal axis delta.
    pub fn horizontal_chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the six faces of a lattice cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    /// +Y
    Up,
    /// -Y
    Down,
    /// -Z
    North,
    /// +Z
    South,
    /// +X
    East,
    /// -X
    West,
}

impl Face {
    /// The four horizontal faces in a fixed order.
    pub const HORIZONTAL: [Face; 4] = [Face::West, Face::East, Face::North, Face::South];

    /// Unit normal `(dx, dy, dz)` of this face.
    pub const fn normal(self) -> (i32, i32, i32) {
        match self {
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
        }
    }
}
