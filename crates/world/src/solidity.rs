//! Which blocks obstruct movement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use voxbot_core::BlockId;

/// Block names that never obstruct, whatever the material.
pub const DEFAULT_NON_SOLID: &[&str] = &[
    "air",
    "cave_air",
    "void_air",
    "water",
    "flowing_water",
    "lava",
    "flowing_lava",
    "short_grass",
    "tall_grass",
    "fern",
    "dead_bush",
    "dandelion",
    "poppy",
    "seagrass",
];

/// Classifies blocks as solid or passable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolidityRules {
    non_solid: BTreeSet<BlockId>,
}

impl Default for SolidityRules {
    fn default() -> Self {
        Self::from_names(DEFAULT_NON_SOLID.iter().copied())
    }
}

impl SolidityRules {
    /// Build from a list of non-solid block names. Air is always included.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut non_solid: BTreeSet<BlockId> = names.into_iter().map(BlockId::new).collect();
        non_solid.insert(BlockId::air());
        Self { non_solid }
    }

    /// Whether `block` obstructs movement.
    pub fn is_solid(&self, block: &BlockId) -> bool {
        !self.non_solid.contains(block)
    }
}
