//! The adapter contract through which the agent observes and mutates the world.
//!
//! Reads (`player_position`, `block_at`, the `find_*` lookups) are cheap and
//! synchronous. Primitive actions are `async`: the caller awaits completion
//! and bounds the wait with its own timeout.
//!
//! Every method may fail soft by returning `Ok(false)` / `Ok(None)`; callers
//! treat those as ordinary planning outcomes. `Err` is reserved for the world
//! itself becoming unusable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use voxbot_core::{BlockId, CraftSurface, Face, ItemId, Position, RecipeGrid};

/// Unexpected adapter failures. Expected outcomes never use this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The world or player reference went away.
    #[error("world unavailable: {0}")]
    Unavailable(String),
    /// The adapter misbehaved in some other way.
    #[error("world adapter error: {0}")]
    Adapter(String),
}

/// Opaque handle to a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity found by [`WorldQuery::find_nearest_entity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Where the entity stood when found.
    pub position: Position,
    /// Handle for follow-up actions.
    pub handle: EntityHandle,
}

/// Narrow window onto a live (or simulated) world.
#[async_trait]
pub trait WorldQuery: Send + Sync {
    /// Feet position of the controlled player.
    fn player_position(&self) -> Result<Position, WorldError>;

    /// Block occupying `pos`.
    fn block_at(&self, pos: Position) -> Result<BlockId, WorldError>;

    /// Nearest block of kind `block` within `radius` of the player.
    fn find_nearest_block(
        &self,
        block: &BlockId,
        radius: u32,
    ) -> Result<Option<Position>, WorldError>;

    /// Nearest entity whose name contains `pattern` within `radius` of the player.
    fn find_nearest_entity(
        &self,
        pattern: &str,
        radius: u32,
    ) -> Result<Option<EntityRef>, WorldError>;

    /// Whether the entity is still alive.
    fn entity_alive(&self, handle: EntityHandle) -> Result<bool, WorldError>;

    /// Move the player one step to `pos`. `false` means the move was obstructed.
    async fn move_to(&self, pos: Position) -> Result<bool, WorldError>;

    /// Turn the player to face `pos`.
    async fn look_at(&self, pos: Position) -> Result<(), WorldError>;

    /// Break the block at `pos`.
    async fn break_block(&self, pos: Position) -> Result<bool, WorldError>;

    /// Place the held item against `face` of the block at `against`.
    async fn place_block(&self, against: Position, face: Face) -> Result<bool, WorldError>;

    /// Put `item` in the player's hand.
    async fn select_item(&self, item: &ItemId) -> Result<bool, WorldError>;

    /// Open the personal grid or a nearby station.
    async fn open_craft_surface(&self, surface: CraftSurface) -> Result<bool, WorldError>;

    /// Perform one craft of `grid` on the open surface.
    async fn craft_with_grid(
        &self,
        grid: &RecipeGrid,
        surface: CraftSurface,
    ) -> Result<bool, WorldError>;

    /// Smelt `count` of `input` in the furnace at `station`.
    async fn smelt(
        &self,
        station: Position,
        input: &ItemId,
        count: u32,
        fuel: Option<&ItemId>,
    ) -> Result<bool, WorldError>;

    /// Hit the entity once.
    async fn attack(&self, handle: EntityHandle) -> Result<bool, WorldError>;
}
