//! In-memory voxel world implementing [`WorldQuery`].
//!
//! Used by the headless runner and by tests. Blocks live in a sparse map;
//! everything below `floor_y` reads as bedrock. Every successful action is
//! recorded in a journal so callers can assert on what the agent did.

use crate::query::{EntityHandle, EntityRef, WorldError, WorldQuery};
use crate::solidity::SolidityRules;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use voxbot_core::{BlockId, CraftSurface, Face, ItemId, Position, RecipeGrid};

/// Block reported below the floor. It cannot be broken.
pub const BEDROCK: &str = "bedrock";

/// Tunables for [`SimWorld`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Max distance from the player's feet to an interacted block or entity.
    pub reach: f64,
    /// Health removed per attack.
    pub attack_damage: u32,
    /// Health given to entities spawned without one.
    pub default_health: u32,
    /// Block that counts as a crafting station.
    pub crafting_station: BlockId,
    /// Block that counts as a furnace.
    pub furnace: BlockId,
    /// Passability rules for movement and placement.
    pub solidity: SolidityRules,
    /// Cells with `y` below this read as bedrock. `None` means an endless void.
    pub floor_y: Option<i32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            reach: 5.0,
            attack_damage: 4,
            default_health: 10,
            crafting_station: BlockId::new("crafting_table"),
            furnace: BlockId::new("furnace"),
            solidity: SolidityRules::default(),
            floor_y: Some(0),
        }
    }
}

/// Action categories, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// [`WorldQuery::move_to`].
    Move,
    /// [`WorldQuery::break_block`].
    Break,
    /// [`WorldQuery::place_block`].
    Place,
    /// [`WorldQuery::select_item`].
    Select,
    /// [`WorldQuery::open_craft_surface`].
    OpenSurface,
    /// [`WorldQuery::craft_with_grid`].
    Craft,
    /// [`WorldQuery::smelt`].
    Smelt,
    /// [`WorldQuery::attack`].
    Attack,
}

/// A successful action, as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorldAction {
    /// Player stepped to a cell.
    Move {
        /// Destination.
        to: Position,
    },
    /// A block was removed.
    Break {
        /// Where.
        at: Position,
        /// What was there.
        block: BlockId,
    },
    /// A block was placed.
    Place {
        /// Where.
        at: Position,
        /// What was placed.
        block: BlockId,
    },
    /// An item was put in hand.
    Select {
        /// The item.
        item: ItemId,
    },
    /// A crafting surface was opened.
    OpenSurface {
        /// Which one.
        surface: CraftSurface,
    },
    /// One craft completed.
    Craft {
        /// Surface used.
        surface: CraftSurface,
        /// Grid crafted.
        grid: RecipeGrid,
    },
    /// A smelting batch completed.
    Smelt {
        /// Furnace used.
        station: Position,
        /// Item smelted.
        input: ItemId,
        /// Units smelted.
        count: u32,
        /// Fuel supplied, if any.
        fuel: Option<ItemId>,
    },
    /// An entity was hit.
    Attack {
        /// Target.
        handle: EntityHandle,
        /// Whether the hit killed it.
        killed: bool,
    },
}

impl WorldAction {
    /// Category of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            WorldAction::Move { .. } => ActionKind::Move,
            WorldAction::Break { .. } => ActionKind::Break,
            WorldAction::Place { .. } => ActionKind::Place,
            WorldAction::Select { .. } => ActionKind::Select,
            WorldAction::OpenSurface { .. } => ActionKind::OpenSurface,
            WorldAction::Craft { .. } => ActionKind::Craft,
            WorldAction::Smelt { .. } => ActionKind::Smelt,
            WorldAction::Attack { .. } => ActionKind::Attack,
        }
    }
}

/// One explicitly placed block in a [`WorldLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutBlock {
    /// Cell.
    #[serde(flatten)]
    pub position: Position,
    /// Block name.
    pub block: BlockId,
}

/// An inclusive cuboid of one block kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutFill {
    /// One corner.
    pub from: Position,
    /// The opposite corner.
    pub to: Position,
    /// Block name.
    pub block: BlockId,
}

/// An entity to spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntity {
    /// Entity name, e.g. `cow`.
    pub name: String,
    /// Where it stands.
    pub position: Position,
    /// Starting health. Falls back to [`SimConfig::default_health`].
    #[serde(default)]
    pub health: Option<u32>,
}

/// Serializable description of a starting world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    /// Player feet position.
    pub player: Position,
    /// Simulation tunables.
    pub config: SimConfig,
    /// Cuboids, applied before single blocks.
    pub fills: Vec<LayoutFill>,
    /// Single blocks.
    pub blocks: Vec<LayoutBlock>,
    /// Entities.
    pub entities: Vec<LayoutEntity>,
}

#[derive(Debug, Clone)]
struct SimEntity {
    name: String,
    position: Position,
    health: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Injection {
    Refuse(Option<u32>),
    Stall,
}

enum Gate {
    Proceed,
    Refuse,
    Stall,
}

#[derive(Debug, Default)]
struct SimState {
    blocks: BTreeMap<Position, BlockId>,
    player: Position,
    facing: Option<Position>,
    held: Option<ItemId>,
    open_surface: Option<CraftSurface>,
    entities: BTreeMap<EntityHandle, SimEntity>,
    next_entity: u64,
    injections: BTreeMap<ActionKind, Injection>,
    disconnected: bool,
    journal: Vec<WorldAction>,
}

/// Simulated world.
#[derive(Debug)]
pub struct SimWorld {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimWorld {
    /// Empty world with the player at the origin.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Build a world from a layout.
    pub fn from_layout(layout: WorldLayout) -> Self {
        let mut world = Self::new(layout.config);
        world.set_player(layout.player);
        for fill in &layout.fills {
            world.fill(fill.from, fill.to, fill.block.clone());
        }
        for placed in layout.blocks {
            world.set_block(placed.position, placed.block);
        }
        for entity in layout.entities {
            world.spawn_entity(entity.name, entity.position, entity.health);
        }
        world
    }

    /// Load a layout JSON file.
    pub fn load_layout<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read world layout from {}", path.display()))?;
        let layout: WorldLayout = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse world layout {}", path.display()))?;
        Ok(Self::from_layout(layout))
    }

    /// Simulation tunables.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn state_mut(&mut self) -> &mut SimState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SimState>, WorldError> {
        let state = self
            .state
            .lock()
            .map_err(|_| WorldError::Unavailable("simulation state poisoned".into()))?;
        if state.disconnected {
            return Err(WorldError::Unavailable("simulated world disconnected".into()));
        }
        Ok(state)
    }

    /// Set one cell. Air clears it.
    pub fn set_block(&mut self, pos: Position, block: impl Into<BlockId>) {
        let block = block.into();
        let state = self.state_mut();
        if block.is_air() {
            state.blocks.remove(&pos);
        } else {
            state.blocks.insert(pos, block);
        }
    }

    /// Fill the inclusive cuboid between two corners.
    pub fn fill(&mut self, a: Position, b: Position, block: impl Into<BlockId>) {
        let block = block.into();
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set_block(Position::new(x, y, z), block.clone());
                }
            }
        }
    }

    /// Move the player without going through the action path.
    pub fn set_player(&mut self, pos: Position) {
        self.state_mut().player = pos;
    }

    /// Add an entity and return its handle.
    pub fn spawn_entity(
        &mut self,
        name: impl Into<String>,
        position: Position,
        health: Option<u32>,
    ) -> EntityHandle {
        let health = health.unwrap_or(self.config.default_health).max(1);
        let state = self.state_mut();
        state.next_entity += 1;
        let handle = EntityHandle(state.next_entity);
        state.entities.insert(
            handle,
            SimEntity {
                name: name.into(),
                position,
                health,
            },
        );
        handle
    }

    /// Make every future `kind` action report failure.
    pub fn refuse(&mut self, kind: ActionKind) {
        self.state_mut()
            .injections
            .insert(kind, Injection::Refuse(None));
    }

    /// Make the next `times` actions of `kind` report failure.
    pub fn refuse_times(&mut self, kind: ActionKind, times: u32) {
        if times > 0 {
            self.state_mut()
                .injections
                .insert(kind, Injection::Refuse(Some(times)));
        }
    }

    /// Make every future `kind` action hang forever.
    pub fn stall(&mut self, kind: ActionKind) {
        self.state_mut().injections.insert(kind, Injection::Stall);
    }

    /// Remove any injected failure for `kind`.
    pub fn allow(&mut self, kind: ActionKind) {
        self.state_mut().injections.remove(&kind);
    }

    /// Make every call return [`WorldError::Unavailable`].
    pub fn disconnect(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.disconnected = true;
    }

    /// Copy of the action journal.
    pub fn journal(&self) -> Vec<WorldAction> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .journal
            .clone()
    }

    /// Number of journaled actions of `kind`.
    pub fn count_actions(&self, kind: ActionKind) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .journal
            .iter()
            .filter(|action| action.kind() == kind)
            .count()
    }

    /// Item currently in hand.
    pub fn held_item(&self) -> Option<ItemId> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .held
            .clone()
    }

    /// Cell the player last looked at.
    pub fn facing(&self) -> Option<Position> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .facing
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .len()
    }

    fn gate(&self, kind: ActionKind) -> Result<Gate, WorldError> {
        let mut state = self.lock()?;
        let gate = match state.injections.get(&kind).copied() {
            None => Gate::Proceed,
            Some(Injection::Stall) => Gate::Stall,
            Some(Injection::Refuse(None)) => Gate::Refuse,
            Some(Injection::Refuse(Some(left))) => {
                if left <= 1 {
                    state.injections.remove(&kind);
                } else {
                    state.injections.insert(kind, Injection::Refuse(Some(left - 1)));
                }
                Gate::Refuse
            }
        };
        Ok(gate)
    }

    fn block_in(&self, state: &SimState, pos: Position) -> BlockId {
        if let Some(block) = state.blocks.get(&pos) {
            return block.clone();
        }
        match self.config.floor_y {
            Some(floor) if pos.y < floor => BlockId::new(BEDROCK),
            _ => BlockId::air(),
        }
    }

    fn solid_in(&self, state: &SimState, pos: Position) -> bool {
        self.config.solidity.is_solid(&self.block_in(state, pos))
    }

    fn in_reach(&self, state: &SimState, pos: Position) -> bool {
        state.player.distance(pos) <= self.config.reach
    }
}

macro_rules! gated {
    ($world:expr, $kind:expr) => {
        match $world.gate($kind)? {
            Gate::Proceed => {}
            Gate::Refuse => return Ok(false),
            Gate::Stall => return std::future::pending().await,
        }
    };
}

#[async_trait]
impl WorldQuery for SimWorld {
    fn player_position(&self) -> Result<Position, WorldError> {
        Ok(self.lock()?.player)
    }

    fn block_at(&self, pos: Position) -> Result<BlockId, WorldError> {
        let state = self.lock()?;
        Ok(self.block_in(&state, pos))
    }

    fn find_nearest_block(
        &self,
        block: &BlockId,
        radius: u32,
    ) -> Result<Option<Position>, WorldError> {
        let state = self.lock()?;
        let limit = i64::from(radius) * i64::from(radius);
        Ok(state
            .blocks
            .iter()
            .filter(|(_, b)| *b == block)
            .map(|(pos, _)| (pos.distance_squared(state.player), *pos))
            .filter(|(d, _)| *d <= limit)
            .min()
            .map(|(_, pos)| pos))
    }

    fn find_nearest_entity(
        &self,
        pattern: &str,
        radius: u32,
    ) -> Result<Option<EntityRef>, WorldError> {
        let state = self.lock()?;
        let pattern = pattern.to_ascii_lowercase();
        let limit = i64::from(radius) * i64::from(radius);
        Ok(state
            .entities
            .iter()
            .filter(|(_, e)| e.name.to_ascii_lowercase().contains(&pattern))
            .map(|(handle, e)| (e.position.distance_squared(state.player), *handle, e.position))
            .filter(|(d, _, _)| *d <= limit)
            .min()
            .map(|(_, handle, position)| EntityRef { position, handle }))
    }

    fn entity_alive(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        Ok(self.lock()?.entities.contains_key(&handle))
    }

    async fn move_to(&self, pos: Position) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Move);
        let mut state = self.lock()?;
        let from = state.player;
        let adjacent = from.horizontal_chebyshev(pos) <= 1 && pos.y - from.y <= 1;
        if !adjacent || self.solid_in(&state, pos) || self.solid_in(&state, pos.up()) {
            return Ok(false);
        }
        state.player = pos;
        state.open_surface = None;
        state.journal.push(WorldAction::Move { to: pos });
        Ok(true)
    }

    async fn look_at(&self, pos: Position) -> Result<(), WorldError> {
        self.lock()?.facing = Some(pos);
        Ok(())
    }

    async fn break_block(&self, pos: Position) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Break);
        let mut state = self.lock()?;
        let block = self.block_in(&state, pos);
        if block.is_air() || block.as_str() == BEDROCK || !self.in_reach(&state, pos) {
            return Ok(false);
        }
        state.blocks.remove(&pos);
        state.journal.push(WorldAction::Break { at: pos, block });
        Ok(true)
    }

    async fn place_block(&self, against: Position, face: Face) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Place);
        let mut state = self.lock()?;
        let Some(held) = state.held.clone() else {
            return Ok(false);
        };
        let target = against.adjacent(face);
        let occupied_by_player = target == state.player || target == state.player.up();
        if !self.solid_in(&state, against)
            || self.solid_in(&state, target)
            || occupied_by_player
            || !self.in_reach(&state, target)
        {
            return Ok(false);
        }
        let block = BlockId::from(&held);
        state.blocks.insert(target, block.clone());
        state.journal.push(WorldAction::Place { at: target, block });
        Ok(true)
    }

    async fn select_item(&self, item: &ItemId) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Select);
        let mut state = self.lock()?;
        state.held = Some(item.clone());
        state.journal.push(WorldAction::Select { item: item.clone() });
        Ok(true)
    }

    async fn open_craft_surface(&self, surface: CraftSurface) -> Result<bool, WorldError> {
        gated!(self, ActionKind::OpenSurface);
        let mut state = self.lock()?;
        if surface == CraftSurface::Station {
            let station_near = state
                .blocks
                .iter()
                .any(|(pos, b)| *b == self.config.crafting_station && self.in_reach(&state, *pos));
            if !station_near {
                return Ok(false);
            }
        }
        state.open_surface = Some(surface);
        state.journal.push(WorldAction::OpenSurface { surface });
        Ok(true)
    }

    async fn craft_with_grid(
        &self,
        grid: &RecipeGrid,
        surface: CraftSurface,
    ) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Craft);
        let mut state = self.lock()?;
        let Some(open) = state.open_surface else {
            return Ok(false);
        };
        if grid.is_empty()
            || open.grid_size() < surface.grid_size()
            || open.grid_size() < grid.required_surface().grid_size()
        {
            return Ok(false);
        }
        state.journal.push(WorldAction::Craft {
            surface: open,
            grid: grid.clone(),
        });
        Ok(true)
    }

    async fn smelt(
        &self,
        station: Position,
        input: &ItemId,
        count: u32,
        fuel: Option<&ItemId>,
    ) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Smelt);
        let mut state = self.lock()?;
        if count == 0
            || self.block_in(&state, station) != self.config.furnace
            || !self.in_reach(&state, station)
        {
            return Ok(false);
        }
        state.journal.push(WorldAction::Smelt {
            station,
            input: input.clone(),
            count,
            fuel: fuel.cloned(),
        });
        Ok(true)
    }

    async fn attack(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        gated!(self, ActionKind::Attack);
        let mut state = self.lock()?;
        let player = state.player;
        let damage = self.config.attack_damage;
        let Some(entity) = state.entities.get_mut(&handle) else {
            return Ok(false);
        };
        if player.distance(entity.position) > self.config.reach {
            return Ok(false);
        }
        entity.health = entity.health.saturating_sub(damage);
        let killed = entity.health == 0;
        if killed {
            state.entities.remove(&handle);
        }
        state.journal.push(WorldAction::Attack { handle, killed });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
            .block_on(future)
    }

    #[test]
    fn below_floor_is_bedrock() {
        let world = SimWorld::default();
        assert_eq!(
            world.block_at(Position::new(0, -1, 0)).unwrap().as_str(),
            BEDROCK
        );
        assert!(world.block_at(Position::new(0, 0, 0)).unwrap().is_air());
        let void = SimWorld::new(SimConfig {
            floor_y: None,
            ..SimConfig::default()
        });
        assert!(void.block_at(Position::new(0, -50, 0)).unwrap().is_air());
    }

    #[tokio::test]
    async fn moves_only_to_open_neighbours() {
        let mut world = SimWorld::default();
        world.set_block(Position::new(1, 0, 0), "stone");
        assert!(!world.move_to(Position::new(1, 0, 0)).await.unwrap());
        assert!(!world.move_to(Position::new(3, 0, 0)).await.unwrap());
        assert!(world.move_to(Position::new(0, 0, 1)).await.unwrap());
        assert!(world.move_to(Position::new(1, 1, 0)).await.unwrap());
        assert_eq!(world.player_position().unwrap(), Position::new(1, 1, 0));
        assert_eq!(world.count_actions(ActionKind::Move), 2);
    }

    #[tokio::test]
    async fn breaking_respects_reach_and_bedrock() {
        let mut world = SimWorld::default();
        world.set_block(Position::new(1, 0, 0), "oak_log");
        world.set_block(Position::new(20, 0, 0), "oak_log");
        assert!(world.break_block(Position::new(1, 0, 0)).await.unwrap());
        assert!(world.block_at(Position::new(1, 0, 0)).unwrap().is_air());
        assert!(!world.break_block(Position::new(20, 0, 0)).await.unwrap());
        assert!(!world.break_block(Position::new(0, -1, 0)).await.unwrap());
        assert!(!world.break_block(Position::new(2, 0, 0)).await.unwrap());
        assert_eq!(
            world.journal(),
            vec![WorldAction::Break {
                at: Position::new(1, 0, 0),
                block: BlockId::new("oak_log"),
            }]
        );
    }

    #[tokio::test]
    async fn placing_needs_a_held_item_and_a_support() {
        let world = SimWorld::default();
        let below = Position::new(1, -1, 0);
        assert!(!world.place_block(below, Face::Up).await.unwrap());
        assert!(world.select_item(&ItemId::new("furnace")).await.unwrap());
        assert!(world.place_block(below, Face::Up).await.unwrap());
        assert_eq!(world.block_at(Position::new(1, 0, 0)).unwrap().as_str(), "furnace");
        // Target now occupied.
        assert!(!world.place_block(below, Face::Up).await.unwrap());
        // Would enclose the player.
        assert!(!world.place_block(Position::new(0, -1, 0), Face::Up).await.unwrap());
    }

    #[tokio::test]
    async fn station_crafting_requires_a_nearby_table() {
        let mut world = SimWorld::default();
        let stick = RecipeGrid::from_names([["planks", "", ""], ["planks", "", ""], ["", "", ""]]);
        let furnace_grid = RecipeGrid::from_names([
            ["cobblestone", "cobblestone", "cobblestone"],
            ["cobblestone", "", "cobblestone"],
            ["cobblestone", "cobblestone", "cobblestone"],
        ]);
        assert!(!world.craft_with_grid(&stick, CraftSurface::Personal).await.unwrap());
        assert!(world.open_craft_surface(CraftSurface::Personal).await.unwrap());
        assert!(world.craft_with_grid(&stick, CraftSurface::Personal).await.unwrap());
        assert!(!world
            .craft_with_grid(&furnace_grid, CraftSurface::Station)
            .await
            .unwrap());
        assert!(!world.open_craft_surface(CraftSurface::Station).await.unwrap());

        world.set_block(Position::new(2, 0, 0), "crafting_table");
        assert!(world.open_craft_surface(CraftSurface::Station).await.unwrap());
        assert!(world
            .craft_with_grid(&furnace_grid, CraftSurface::Station)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn smelting_needs_a_furnace_in_reach() {
        let mut world = SimWorld::default();
        let station = Position::new(1, 0, 1);
        let sand = ItemId::new("sand");
        assert!(!world.smelt(station, &sand, 2, None).await.unwrap());
        world.set_block(station, "furnace");
        assert!(world.smelt(station, &sand, 2, None).await.unwrap());
        assert!(!world.smelt(station, &sand, 0, None).await.unwrap());
    }

    #[tokio::test]
    async fn attacks_kill_after_enough_damage() {
        let mut world = SimWorld::default();
        let cow = world.spawn_entity("cow", Position::new(2, 0, 0), Some(10));
        world.spawn_entity("Cow", Position::new(40, 0, 0), None);
        let found = world.find_nearest_entity("cow", 32).unwrap().unwrap();
        assert_eq!(found.handle, cow);
        for _ in 0..2 {
            assert!(world.attack(cow).await.unwrap());
            assert!(world.entity_alive(cow).unwrap());
        }
        assert!(world.attack(cow).await.unwrap());
        assert!(!world.entity_alive(cow).unwrap());
        assert!(!world.attack(cow).await.unwrap());
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn nearest_block_prefers_closest_within_radius() {
        let mut world = SimWorld::default();
        world.set_block(Position::new(5, 0, 0), "oak_log");
        world.set_block(Position::new(-3, 0, 0), "oak_log");
        world.set_block(Position::new(0, 0, 60), "sand");
        let log = BlockId::new("oak_log");
        assert_eq!(
            world.find_nearest_block(&log, 48).unwrap(),
            Some(Position::new(-3, 0, 0))
        );
        assert_eq!(world.find_nearest_block(&BlockId::new("sand"), 48).unwrap(), None);
    }

    #[tokio::test]
    async fn injected_refusals_run_out() {
        let mut world = SimWorld::default();
        world.refuse_times(ActionKind::Move, 2);
        let step = Position::new(1, 0, 0);
        assert!(!world.move_to(step).await.unwrap());
        assert!(!world.move_to(step).await.unwrap());
        assert!(world.move_to(step).await.unwrap());

        world.refuse(ActionKind::Select);
        assert!(!world.select_item(&ItemId::new("dirt")).await.unwrap());
        world.allow(ActionKind::Select);
        assert!(world.select_item(&ItemId::new("dirt")).await.unwrap());
    }

    #[test]
    fn disconnect_surfaces_as_unavailable() {
        let world = SimWorld::default();
        world.disconnect();
        assert!(matches!(
            world.player_position(),
            Err(WorldError::Unavailable(_))
        ));
        assert!(matches!(
            block_on(world.move_to(Position::new(1, 0, 0))),
            Err(WorldError::Unavailable(_))
        ));
    }

    #[test]
    fn layout_json_builds_world() {
        let json = r#"{
            "player": {"x": 1, "y": 0, "z": 1},
            "fills": [{"from": {"x": 4, "y": 0, "z": 0}, "to": {"x": 4, "y": 2, "z": 3}, "block": "stone"}],
            "blocks": [{"x": 0, "y": 0, "z": 5, "block": "oak_log"}],
            "entities": [{"name": "cow", "position": {"x": 3, "y": 0, "z": 3}}]
        }"#;
        let layout: WorldLayout = serde_json::from_str(json).unwrap();
        let world = SimWorld::from_layout(layout);
        assert_eq!(world.player_position().unwrap(), Position::new(1, 0, 1));
        assert_eq!(world.block_at(Position::new(4, 2, 3)).unwrap().as_str(), "stone");
        assert_eq!(world.block_at(Position::new(0, 0, 5)).unwrap().as_str(), "oak_log");
        assert!(world.find_nearest_entity("cow", 10).unwrap().is_some());
    }
}
