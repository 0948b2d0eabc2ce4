//! Item and block identifiers, tool kinds and harvest levels.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque item key into the catalog and the inventory (e.g. `oak_log`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap an identifier. Surrounding whitespace is dropped.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        if id.trim().len() == id.len() {
            Self(id)
        } else {
            Self(id.trim().to_string())
        }
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque block identifier reported by the world. `"air"` denotes an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Name of the empty-cell sentinel.
    pub const AIR: &'static str = "air";

    /// Wrap a block name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The empty-cell sentinel.
    pub fn air() -> Self {
        Self(Self::AIR.to_string())
    }

    /// Whether this is the empty-cell sentinel.
    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR
    }

    /// Borrow the block name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The item a player holds to place this block, assuming matching names.
    pub fn as_item(&self) -> ItemId {
        ItemId::new(self.0.clone())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&ItemId> for BlockId {
    fn from(value: &ItemId) -> Self {
        Self::new(value.as_str())
    }
}

impl Borrow<str> for BlockId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Tool kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Pickaxe - mines stone, ores
    Pickaxe,
    /// Axe - chops wood
    Axe,
    /// Shovel - digs dirt, sand, gravel
    Shovel,
    /// Sword - combat weapon
    Sword,
    /// Hoe - tills farmland
    Hoe,
}

impl ToolKind {
    /// Parse a tool kind from its lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickaxe" => Some(ToolKind::Pickaxe),
            "axe" => Some(ToolKind::Axe),
            "shovel" => Some(ToolKind::Shovel),
            "sword" => Some(ToolKind::Sword),
            "hoe" => Some(ToolKind::Hoe),
            _ => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolKind::Pickaxe => "pickaxe",
            ToolKind::Axe => "axe",
            ToolKind::Shovel => "shovel",
            ToolKind::Sword => "sword",
            ToolKind::Hoe => "hoe",
        };
        f.write_str(name)
    }
}

/// Minimum tool tier required to successfully harvest a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestLevel {
    /// Wooden tools or better
    Wood = 0,
    /// Stone tools or better
    Stone = 1,
    /// Iron tools or better
    Iron = 2,
    /// Diamond tools required
    Diamond = 3,
}

impl HarvestLevel {
    /// Parse a harvest level from a string (e.g., "wood", "stone", "iron", "diamond").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wood" => Some(HarvestLevel::Wood),
            "stone" => Some(HarvestLevel::Stone),
            "iron" => Some(HarvestLevel::Iron),
            "diamond" => Some(HarvestLevel::Diamond),
            _ => None,
        }
    }

    /// Get the numeric tier value (0-3).
    pub fn tier(self) -> u8 {
        self as u8
    }
}

/// Marks a catalog item as a tool of a given kind and harvest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolSpec {
    /// What the tool is for.
    pub kind: ToolKind,
    /// Harvest level it satisfies.
    pub level: HarvestLevel,
}

impl ToolSpec {
    /// Whether this tool can harvest a block that needs `kind` at `required` (or any level).
    pub fn satisfies(&self, kind: ToolKind, required: Option<HarvestLevel>) -> bool {
        self.kind == kind && required.map_or(true, |level| self.level >= level)
    }
}
