//! Tunables for planning and execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use voxbot_core::{BlockId, ItemId};
use voxbot_world::{MoveCosts, PathLimits, SolidityRules};

/// Agent configuration, usually read from `config/agent.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentSettings {
    /// A* expansion budget per search.
    pub max_nodes: usize,
    /// Horizontal Chebyshev bound on explored cells around the start.
    pub search_radius: u32,
    /// Tallest ledge climbed in one step.
    pub step_height: u32,
    /// How long a single block may take to break, in milliseconds.
    pub break_ms: u64,
    /// Upper bound on any one primitive action, in milliseconds.
    pub action_timeout_ms: u64,
    /// Pause between break retries, in milliseconds.
    pub retry_interval_ms: u64,
    /// Radius used when looking for blocks and stations.
    pub block_search_radius: u32,
    /// Radius used when looking for mobs.
    pub entity_search_radius: u32,
    /// Interaction distance from the player's feet.
    pub reach: f64,
    /// Fresh searches allowed after a mid-route obstruction.
    pub max_replans: u32,
    /// Hits per kill before giving up on a mob.
    pub max_attack_attempts: u32,
    /// Step costs and heuristic weight for route planning.
    pub move_costs: MoveCosts,
    /// Blocks that never obstruct movement.
    pub non_solid_blocks: Vec<String>,
    /// Block that serves as a 3x3 crafting station.
    pub crafting_station: String,
    /// Block (and item) used for smelting.
    pub furnace: String,
    /// Preferred smelting fuel.
    pub fuel: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_nodes: 4000,
            search_radius: 64,
            step_height: 1,
            break_ms: 6000,
            action_timeout_ms: 5000,
            retry_interval_ms: 50,
            block_search_radius: 48,
            entity_search_radius: 32,
            reach: 4.5,
            max_replans: 3,
            max_attack_attempts: 20,
            move_costs: MoveCosts::default(),
            non_solid_blocks: voxbot_world::solidity::DEFAULT_NON_SOLID
                .iter()
                .map(|name| name.to_string())
                .collect(),
            crafting_station: "crafting_table".to_string(),
            furnace: "furnace".to_string(),
            fuel: "coal".to_string(),
        }
    }
}

impl AgentSettings {
    /// Search bounds for the path planner.
    pub fn path_limits(&self) -> PathLimits {
        PathLimits {
            max_expansions: self.max_nodes,
            search_radius: self.search_radius,
            step_height: self.step_height.max(1),
        }
    }

    /// Passability rules built from `non_solid_blocks`.
    pub fn solidity(&self) -> SolidityRules {
        SolidityRules::from_names(self.non_solid_blocks.iter().map(String::as_str))
    }

    /// Bound on one primitive action.
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Deadline for breaking one block, retries included.
    pub fn break_timeout(&self) -> Duration {
        Duration::from_millis(self.break_ms)
    }

    /// Pause between break attempts, at least one millisecond.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms.max(1))
    }

    /// Block searched for when a recipe needs the 3x3 grid.
    pub fn station_block(&self) -> BlockId {
        BlockId::new(self.crafting_station.as_str())
    }

    /// Block used for smelting.
    pub fn furnace_block(&self) -> BlockId {
        BlockId::new(self.furnace.as_str())
    }

    /// Item placed to make a furnace.
    pub fn furnace_item(&self) -> ItemId {
        ItemId::new(self.furnace.as_str())
    }

    /// Preferred fuel.
    pub fn fuel_item(&self) -> ItemId {
        ItemId::new(self.fuel.as_str())
    }
}
