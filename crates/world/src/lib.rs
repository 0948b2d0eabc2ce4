#![warn(missing_docs)]
//! World access for the agent: the [`WorldQuery`] adapter contract, block
//! passability, A* route planning and an in-memory [`SimWorld`].

pub mod discovery;
pub mod heap;
pub mod pathfinding;
pub mod query;
pub mod sim;
pub mod solidity;

pub use discovery::{resolve_world, StaticDiscovery, WorldDiscovery};
pub use heap::MinHeap;
pub use pathfinding::{astar_path_3d, MoveCosts, PathError, PathLimits, PathPlanner};
pub use query::{EntityHandle, EntityRef, WorldError, WorldQuery};
pub use sim::{ActionKind, SimConfig, SimWorld, WorldAction, WorldLayout};
pub use solidity::SolidityRules;
