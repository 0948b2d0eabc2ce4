//! Item catalog: one production rule per item, loaded from JSON.
//!
//! The on-disk shape matches the `items.json` files authored for the original
//! standalone client:
//!
//! ```json
//! {
//!   "oak_log": { "from": "mining", "block": "oak_log", "tool": "axe" },
//!   "planks":  { "craftable": true, "count": 4, "recipe": [["oak_log", null, null]] },
//!   "glass":   { "from": "smelting", "input": "sand" },
//!   "leather": { "from": "hunting", "mob": "cow" }
//! }
//! ```
//!
//! A catalog is loaded once at startup and is read-only afterwards.

use crate::item::{BlockId, HarvestLevel, ItemId, ToolKind, ToolSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors emitted while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Wrap IO errors when reading catalog files.
    #[error("failed to read item catalog {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Wrap serde parsing issues.
    #[error("failed to parse item catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// An entry parsed but describes an impossible rule.
    #[error("invalid catalog entry `{item}`: {reason}")]
    Invalid {
        /// Offending item.
        item: ItemId,
        /// Human-readable explanation.
        reason: String,
    },
}

/// Recipe grid does not fit in 3x3.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("recipe grid must be at most 3x3 (got {rows} rows, widest row {cols})")]
pub struct GridShapeError {
    rows: usize,
    cols: usize,
}

/// Crafting surface a recipe needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CraftSurface {
    /// The 2x2 grid in the player's own inventory.
    Personal,
    /// A placed 3x3 crafting station.
    Station,
}

impl CraftSurface {
    /// Edge length of the grid.
    pub fn grid_size(self) -> usize {
        match self {
            CraftSurface::Personal => 2,
            CraftSurface::Station => 3,
        }
    }
}

type Cells = [[Option<ItemId>; 3]; 3];

/// Fixed 3x3 shaped recipe, indexed `[row][column]` from the top-left.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Option<ItemId>>>", into = "Vec<Vec<Option<ItemId>>>")]
pub struct RecipeGrid {
    cells: Cells,
}

impl RecipeGrid {
    /// Build a grid from explicit cells.
    pub fn new(cells: Cells) -> Self {
        Self { cells }
    }

    /// Build a grid from item names, treating `""` as an empty cell.
    pub fn from_names(rows: [[&str; 3]; 3]) -> Self {
        let cells = rows.map(|row| row.map(|name| (!name.is_empty()).then(|| ItemId::new(name))));
        Self { cells }
    }

    /// Item in a cell, if any. Out-of-range cells are empty.
    pub fn cell(&self, row: usize, col: usize) -> Option<&ItemId> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    /// Occupied cells as `(row, col, item)` in reading order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &ItemId)> {
        self.cells.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.as_ref().map(|item| (row, col, item)))
        })
    }

    /// Whether no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.occupied().next().is_none()
    }

    /// Surface needed: any occupied cell outside the top-left 2x2 requires a station.
    pub fn required_surface(&self) -> CraftSurface {
        if self.occupied().any(|(row, col, _)| row >= 2 || col >= 2) {
            CraftSurface::Station
        } else {
            CraftSurface::Personal
        }
    }

    /// Ingredient units consumed by `crafts` crafts: one unit per occupied cell per craft.
    ///
    /// `None` when a total does not fit in a `u32`.
    pub fn demand(&self, crafts: u32) -> Option<BTreeMap<ItemId, u32>> {
        let mut need: BTreeMap<ItemId, u32> = BTreeMap::new();
        for (_, _, item) in self.occupied() {
            let slot = need.entry(item.clone()).or_insert(0);
            *slot = slot.checked_add(crafts)?;
        }
        Some(need)
    }
}

impl TryFrom<Vec<Vec<Option<ItemId>>>> for RecipeGrid {
    type Error = GridShapeError;

    fn try_from(rows: Vec<Vec<Option<ItemId>>>) -> Result<Self, Self::Error> {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.len() > 3 || widest > 3 {
            return Err(GridShapeError {
                rows: rows.len(),
                cols: widest,
            });
        }
        let mut cells: Cells = Default::default();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                cells[r][c] = cell;
            }
        }
        Ok(Self { cells })
    }
}

impl From<RecipeGrid> for Vec<Vec<Option<ItemId>>> {
    fn from(grid: RecipeGrid) -> Self {
        grid.cells.into_iter().map(Vec::from).collect()
    }
}

/// The single method by which an item is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemRule {
    /// Break `block`; the block drops itself.
    Mined {
        /// Block to break.
        block: BlockId,
        /// Tool that should be held.
        tool: Option<ToolKind>,
        /// Minimum harvest level, when one is required.
        tier: Option<HarvestLevel>,
        /// Items yielded per broken block.
        yield_per_block: u32,
    },
    /// Smelt one `input` into one of this item.
    Smelted {
        /// Item fed into the furnace.
        input: ItemId,
    },
    /// Shaped crafting recipe.
    Crafted {
        /// Shaped recipe.
        recipe: RecipeGrid,
        /// Items produced per craft.
        yield_per_craft: u32,
    },
    /// Defeat entities whose name contains `mob`.
    Hunted {
        /// Case-insensitive entity name pattern.
        mob: String,
        /// Items yielded per defeated entity.
        yield_per_kill: u32,
    },
    /// Break `block`; the item dropped differs from the block.
    Dropped {
        /// Block to break.
        block: BlockId,
        /// Tool that should be held.
        tool: Option<ToolKind>,
        /// Minimum harvest level, when one is required.
        tier: Option<HarvestLevel>,
        /// Items yielded per broken block.
        yield_per_block: u32,
    },
}

/// One catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Production rule; `None` means the item is known but unobtainable.
    pub rule: Option<ItemRule>,
    /// Present when the item works as a tool.
    pub tool: Option<ToolSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    block: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    tier: Option<String>,
    #[serde(default)]
    input: Option<ItemId>,
    #[serde(default)]
    mob: Option<String>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    craftable: bool,
    #[serde(default)]
    recipe: Option<RecipeGrid>,
    #[serde(default)]
    provides: Option<RawTool>,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    tool: String,
    #[serde(default)]
    tier: Option<String>,
}

impl RawEntry {
    fn into_entry(self, id: &ItemId) -> Result<CatalogEntry, CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid {
            item: id.clone(),
            reason,
        };

        let count = self.count.unwrap_or(1);
        if count == 0 {
            return Err(invalid("count must be at least 1".into()));
        }
        let tool = match self.tool.as_deref() {
            None | Some("any") | Some("") => None,
            Some(name) => {
                Some(ToolKind::parse(name).ok_or_else(|| invalid(format!("unknown tool `{name}`")))?)
            }
        };
        let tier = match self.tier.as_deref() {
            None => None,
            Some(name) => Some(
                HarvestLevel::parse(name)
                    .ok_or_else(|| invalid(format!("unknown harvest tier `{name}`")))?,
            ),
        };
        let provides = match self.provides {
            None => None,
            Some(raw) => Some(ToolSpec {
                kind: ToolKind::parse(&raw.tool)
                    .ok_or_else(|| invalid(format!("unknown tool `{}`", raw.tool)))?,
                level: match raw.tier.as_deref() {
                    None => HarvestLevel::Wood,
                    Some(name) => HarvestLevel::parse(name)
                        .ok_or_else(|| invalid(format!("unknown harvest tier `{name}`")))?,
                },
            }),
        };

        let rule = if self.craftable || self.recipe.is_some() {
            let recipe = self
                .recipe
                .ok_or_else(|| invalid("craftable item has no recipe".into()))?;
            if recipe.is_empty() {
                return Err(invalid("recipe has no ingredients".into()));
            }
            Some(ItemRule::Crafted {
                recipe,
                yield_per_craft: count,
            })
        } else {
            match self.from.as_deref() {
                None => None,
                Some("mining") => {
                    let block = self.block.unwrap_or_else(|| id.as_str().to_string());
                    if block == id.as_str() {
                        Some(ItemRule::Mined {
                            block: BlockId::new(block),
                            tool,
                            tier,
                            yield_per_block: count,
                        })
                    } else {
                        Some(ItemRule::Dropped {
                            block: BlockId::new(block),
                            tool,
                            tier,
                            yield_per_block: count,
                        })
                    }
                }
                Some("drop") | Some("dropped") => Some(ItemRule::Dropped {
                    block: BlockId::new(
                        self.block
                            .ok_or_else(|| invalid("drop rule needs a `block`".into()))?,
                    ),
                    tool,
                    tier,
                    yield_per_block: count,
                }),
                Some("smelting") => Some(ItemRule::Smelted {
                    input: self
                        .input
                        .ok_or_else(|| invalid("smelting rule needs an `input`".into()))?,
                }),
                Some("hunting") => {
                    let mob = self
                        .mob
                        .filter(|m| !m.trim().is_empty())
                        .ok_or_else(|| invalid("hunting rule needs a `mob`".into()))?;
                    Some(ItemRule::Hunted {
                        mob,
                        yield_per_kill: count,
                    })
                }
                Some(other) => return Err(invalid(format!("unknown source `{other}`"))),
            }
        };

        Ok(CatalogEntry {
            rule,
            tool: provides,
        })
    }
}

/// Read-only mapping from item to production rule.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    entries: BTreeMap<ItemId, CatalogEntry>,
}

impl ItemCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an item with a rule.
    pub fn with_rule(mut self, id: impl Into<ItemId>, rule: ItemRule) -> Self {
        self.entries.insert(
            id.into(),
            CatalogEntry {
                rule: Some(rule),
                tool: None,
            },
        );
        self
    }

    /// Add (or replace) a tool item with a rule.
    pub fn with_tool(mut self, id: impl Into<ItemId>, rule: ItemRule, tool: ToolSpec) -> Self {
        self.entries.insert(
            id.into(),
            CatalogEntry {
                rule: Some(rule),
                tool: Some(tool),
            },
        );
        self
    }

    /// Load a catalog from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&content)
    }

    /// Load a catalog from a JSON string.
    pub fn load_from_str(content: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<ItemId, RawEntry> = serde_json::from_str(content)?;
        let mut entries = BTreeMap::new();
        for (id, entry) in raw {
            let entry = entry.into_entry(&id)?;
            entries.insert(id, entry);
        }
        Ok(Self { entries })
    }

    /// Load `path`, falling back to [`ItemCatalog::with_defaults`] when it cannot be used.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from_file(path) {
            Ok(catalog) => {
                info!(path = %path.display(), items = catalog.len(), "loaded item catalog");
                catalog
            }
            Err(err) => {
                warn!("{err}; using built-in item catalog");
                Self::with_defaults()
            }
        }
    }

    /// Built-in catalog covering the early wood/stone progression.
    pub fn with_defaults() -> Self {
        let crafted = |rows: [[&str; 3]; 3], yield_per_craft: u32| ItemRule::Crafted {
            recipe: RecipeGrid::from_names(rows),
            yield_per_craft,
        };
        let mined = |block: &str, tool: Option<ToolKind>| ItemRule::Mined {
            block: BlockId::new(block),
            tool,
            tier: None,
            yield_per_block: 1,
        };
        let dropped = |block: &str, tool: ToolKind, tier: Option<HarvestLevel>| ItemRule::Dropped {
            block: BlockId::new(block),
            tool: Some(tool),
            tier,
            yield_per_block: 1,
        };
        let smelted = |input: &str| ItemRule::Smelted {
            input: ItemId::new(input),
        };
        let tool = |kind: ToolKind, level: HarvestLevel| ToolSpec { kind, level };

        Self::new()
            .with_rule("oak_log", mined("oak_log", Some(ToolKind::Axe)))
            .with_rule("sand", mined("sand", Some(ToolKind::Shovel)))
            .with_rule("dirt", mined("dirt", Some(ToolKind::Shovel)))
            .with_rule(
                "cobblestone",
                dropped("stone", ToolKind::Pickaxe, Some(HarvestLevel::Wood)),
            )
            .with_rule(
                "coal",
                dropped("coal_ore", ToolKind::Pickaxe, Some(HarvestLevel::Wood)),
            )
            .with_rule("flint", dropped("gravel", ToolKind::Shovel, None))
            .with_rule("stone", smelted("cobblestone"))
            .with_rule("glass", smelted("sand"))
            .with_rule(
                "leather",
                ItemRule::Hunted {
                    mob: "cow".into(),
                    yield_per_kill: 1,
                },
            )
            .with_rule("planks", crafted([["oak_log", "", ""], ["", "", ""], ["", "", ""]], 4))
            .with_rule("stick", crafted([["planks", "", ""], ["planks", "", ""], ["", "", ""]], 4))
            .with_rule(
                "crafting_table",
                crafted([["planks", "planks", ""], ["planks", "planks", ""], ["", "", ""]], 1),
            )
            .with_rule(
                "furnace",
                crafted(
                    [
                        ["cobblestone", "cobblestone", "cobblestone"],
                        ["cobblestone", "", "cobblestone"],
                        ["cobblestone", "cobblestone", "cobblestone"],
                    ],
                    1,
                ),
            )
            .with_rule("torch", crafted([["coal", "", ""], ["stick", "", ""], ["", "", ""]], 4))
            .with_rule(
                "stone_bricks",
                crafted([["stone", "stone", ""], ["stone", "stone", ""], ["", "", ""]], 4),
            )
            .with_tool(
                "wooden_pickaxe",
                crafted(
                    [["planks", "planks", "planks"], ["", "stick", ""], ["", "stick", ""]],
                    1,
                ),
                tool(ToolKind::Pickaxe, HarvestLevel::Wood),
            )
            .with_tool(
                "stone_pickaxe",
                crafted(
                    [
                        ["cobblestone", "cobblestone", "cobblestone"],
                        ["", "stick", ""],
                        ["", "stick", ""],
                    ],
                    1,
                ),
                tool(ToolKind::Pickaxe, HarvestLevel::Stone),
            )
            .with_tool(
                "wooden_axe",
                crafted([["planks", "planks", ""], ["planks", "stick", ""], ["", "stick", ""]], 1),
                tool(ToolKind::Axe, HarvestLevel::Wood),
            )
            .with_tool(
                "wooden_shovel",
                crafted([["", "planks", ""], ["", "stick", ""], ["", "stick", ""]], 1),
                tool(ToolKind::Shovel, HarvestLevel::Wood),
            )
            .with_tool(
                "wooden_sword",
                crafted([["", "planks", ""], ["", "planks", ""], ["", "stick", ""]], 1),
                tool(ToolKind::Sword, HarvestLevel::Wood),
            )
    }

    /// Full entry for an item.
    pub fn entry(&self, id: &ItemId) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// Production rule for an item; `None` when unknown or unobtainable.
    pub fn rule(&self, id: &ItemId) -> Option<&ItemRule> {
        self.entries.get(id)?.rule.as_ref()
    }

    /// Tool metadata for an item.
    pub fn tool(&self, id: &ItemId) -> Option<ToolSpec> {
        self.entries.get(id)?.tool
    }

    /// Whether the catalog knows the item at all.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    /// Items usable as `kind` at `required` or better, weakest first.
    pub fn tool_providers(&self, kind: ToolKind, required: Option<HarvestLevel>) -> Vec<ItemId> {
        let mut providers: Vec<(HarvestLevel, &ItemId)> = self
            .entries
            .iter()
            .filter_map(|(id, entry)| {
                let tool = entry.tool?;
                tool.satisfies(kind, required).then_some((tool.level, id))
            })
            .collect();
        providers.sort();
        providers.into_iter().map(|(_, id)| id.clone()).collect()
    }

    /// Up to `limit` item ids containing `query` (case-insensitive), sorted.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&ItemId> {
        let query = query.trim().to_ascii_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.entries
            .keys()
            .filter(|id| id.as_str().to_ascii_lowercase().contains(&query))
            .take(limit)
            .collect()
    }

    /// All item ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.entries.keys()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
