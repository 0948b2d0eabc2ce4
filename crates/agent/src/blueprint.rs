//! Block blueprints: generated from pixel art, stored as JSON, built in the
//! world one placement at a time.

use crate::context::AgentContext;
use crate::error::PlanError;
use crate::navigator;
use crate::resources;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use voxbot_core::{BlockId, Face, ItemId, Position};

/// One block to place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Cell the block goes into.
    #[serde(flatten)]
    pub position: Position,
    /// Item placed there.
    pub id: ItemId,
}

/// Ordered list of placements plus the materials they need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Anchor the placements were generated from.
    pub origin: Position,
    /// Placements in build order.
    pub blocks: Vec<Placement>,
    /// Units of each item the placements use.
    #[serde(default)]
    pub counts: BTreeMap<ItemId, u32>,
}

/// A drawn 2D grid, as saved by the canvas editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelArt {
    /// Cell of the top-left pixel.
    #[serde(default)]
    pub origin: Position,
    /// Edge length of one pixel in blocks.
    #[serde(default = "default_pixel_size")]
    pub pixel_size: u32,
    /// Rows of cells, top row first. `null` leaves a gap.
    pub grid: Vec<Vec<Option<ItemId>>>,
}

fn default_pixel_size() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BlueprintFile {
    Blocks(Blueprint),
    Pixels(PixelArt),
}

impl Blueprint {
    /// Build from placements; material counts are derived.
    pub fn new(origin: Position, blocks: Vec<Placement>) -> Self {
        let mut blueprint = Self {
            origin,
            blocks,
            counts: BTreeMap::new(),
        };
        blueprint.recount();
        blueprint
    }

    /// Expand a pixel grid onto the ground plane at `origin`.
    ///
    /// Grid rows run along +z and columns along +x; every pixel becomes a
    /// `pixel_size` by `pixel_size` square of blocks.
    pub fn from_pixels(grid: &[Vec<Option<ItemId>>], pixel_size: u32, origin: Position) -> Self {
        let size = pixel_size.max(1) as i32;
        let mut blocks = Vec::new();
        for (row, cells) in grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let Some(id) = cell else {
                    continue;
                };
                for dz in 0..size {
                    for dx in 0..size {
                        blocks.push(Placement {
                            position: origin.offset(col as i32 * size + dx, 0, row as i32 * size + dz),
                            id: id.clone(),
                        });
                    }
                }
            }
        }
        Self::new(origin, blocks)
    }

    /// Recompute `counts` from `blocks`.
    pub fn recount(&mut self) {
        self.counts.clear();
        for placement in &self.blocks {
            *self.counts.entry(placement.id.clone()).or_insert(0) += 1;
        }
    }

    /// Whether there is nothing to place.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Load a blueprint, or a pixel grid to expand, from JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read blueprint from {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse blueprint {}", path.display()))
    }

    /// Parse either JSON shape. Counts are always recomputed.
    pub fn from_json(content: &str) -> Result<Self> {
        let blueprint = match serde_json::from_str(content)? {
            BlueprintFile::Blocks(mut blueprint) => {
                blueprint.recount();
                blueprint
            }
            BlueprintFile::Pixels(art) => Self::from_pixels(&art.grid, art.pixel_size, art.origin),
        };
        Ok(blueprint)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write blueprint to {}", path.display()))?;
        Ok(())
    }
}

/// Obtain the missing materials, then place every block not already there.
///
/// Each block is placed on top of the cell below it, and one item is
/// consumed per confirmed placement.
pub async fn build(ctx: &mut AgentContext, blueprint: &Blueprint) -> Result<usize, PlanError> {
    let world = std::sync::Arc::clone(&ctx.world);
    let mut pending = Vec::new();
    for placement in &blueprint.blocks {
        if world.block_at(placement.position)? == BlockId::from(&placement.id) {
            continue;
        }
        pending.push(placement);
    }

    let mut demand: BTreeMap<ItemId, u32> = BTreeMap::new();
    for placement in &pending {
        *demand.entry(placement.id.clone()).or_insert(0) += 1;
    }
    for (item, need) in resources::resolution_order(&ctx.catalog, &demand) {
        resources::obtain(ctx, &item, need).await?;
    }
    for (item, need) in &demand {
        if !ctx.inventory.has(item, *need) {
            return Err(PlanError::Planning(format!(
                "{item} was used up while gathering building materials"
            )));
        }
    }
    info!(placements = pending.len(), "Materials ready, building");

    let mut held: Option<&ItemId> = None;
    for (index, placement) in pending.iter().enumerate() {
        ctx.check_stop()?;
        let target = placement.position;
        navigator::approach(ctx, target).await?;
        if held != Some(&placement.id) {
            if !ctx.timed("select", world.select_item(&placement.id)).await? {
                return Err(PlanError::Execution(format!("could not hold {}", placement.id)));
            }
            held = Some(&placement.id);
        }
        ctx.timed("look", world.look_at(target)).await?;
        if !ctx
            .timed("place", world.place_block(target.down(), Face::Up))
            .await?
        {
            return Err(PlanError::Execution(format!(
                "placing {} at {target} failed after {index} of {} blocks",
                placement.id,
                pending.len()
            )));
        }
        ctx.inventory.remove(&placement.id, 1)?;
        debug!(item = %placement.id, at = %target, "Placed");
    }
    info!(placed = pending.len(), "Build complete");
    Ok(pending.len())
}
