//! Recursive resolution of "obtain N of item X" against the catalog and the
//! live inventory.
//!
//! Targets are inventory levels: `obtain(item, n)` succeeds once the
//! inventory holds at least `n`. Crafted ingredients are resolved once each,
//! to their aggregate demand. Progress made before a failure is kept.

use crate::context::AgentContext;
use crate::error::PlanError;
use crate::navigator;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use voxbot_core::{
    BlockId, CraftSurface, Face, HarvestLevel, ItemCatalog, ItemId, ItemRule, Position, RecipeGrid,
    ToolKind,
};

type PlanFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PlanError>> + Send + 'a>>;

/// Obtain `count` of `item` with a fresh cycle guard.
pub async fn obtain(ctx: &mut AgentContext, item: &ItemId, count: u32) -> Result<(), PlanError> {
    ResourcePlanner::new(ctx).obtain(item.clone(), count).await
}

/// Resolver for one top-level request.
pub struct ResourcePlanner<'c> {
    ctx: &'c mut AgentContext,
    in_progress: BTreeSet<ItemId>,
}

impl<'c> ResourcePlanner<'c> {
    /// Planner with an empty cycle guard.
    pub fn new(ctx: &'c mut AgentContext) -> Self {
        Self {
            ctx,
            in_progress: BTreeSet::new(),
        }
    }

    /// Ensure the inventory holds at least `count` of `item`.
    pub fn obtain(&mut self, item: ItemId, count: u32) -> PlanFuture<'_> {
        Box::pin(async move {
            let catalog = Arc::clone(&self.ctx.catalog);
            let Some(entry) = catalog.entry(&item) else {
                return Err(PlanError::UnknownItem(item));
            };
            let have = self.ctx.inventory.count(&item);
            if have >= count {
                return Ok(());
            }
            let Some(rule) = entry.rule.clone() else {
                return Err(PlanError::Planning(format!("{item} cannot be obtained")));
            };
            if !self.in_progress.insert(item.clone()) {
                return Err(PlanError::Cycle(item));
            }

            let shortfall = count - have;
            debug!(item = %item, count, have, "Resolving");
            let result = self.produce(&item, rule, shortfall, count).await;
            self.in_progress.remove(&item);
            result
        })
    }

    async fn produce(
        &mut self,
        item: &ItemId,
        rule: ItemRule,
        shortfall: u32,
        target: u32,
    ) -> Result<(), PlanError> {
        match rule {
            ItemRule::Crafted {
                recipe,
                yield_per_craft,
            } => self.craft(item, &recipe, yield_per_craft, shortfall).await,
            ItemRule::Mined {
                block,
                tool,
                tier,
                yield_per_block,
            }
            | ItemRule::Dropped {
                block,
                tool,
                tier,
                yield_per_block,
            } => {
                if let Some(kind) = tool {
                    self.equip(kind, tier).await?;
                }
                self.gather(item, &block, yield_per_block, target).await
            }
            ItemRule::Smelted { input } => self.smelt(item, &input, shortfall).await,
            ItemRule::Hunted {
                mob,
                yield_per_kill,
            } => self.hunt(item, &mob, yield_per_kill, shortfall).await,
        }
    }

    async fn craft(
        &mut self,
        item: &ItemId,
        recipe: &RecipeGrid,
        yield_per_craft: u32,
        shortfall: u32,
    ) -> Result<(), PlanError> {
        let per_craft = yield_per_craft.max(1);
        let crafts = shortfall.div_ceil(per_craft);
        let too_many = || {
            PlanError::Planning(format!(
                "{shortfall} {item} is more than one request can craft"
            ))
        };
        let made = crafts
            .checked_mul(per_craft)
            .filter(|made| self.ctx.inventory.count(item).checked_add(*made).is_some())
            .ok_or_else(too_many)?;
        let demand = recipe.demand(crafts).ok_or_else(too_many)?;
        let consumed = recipe.demand(1).ok_or_else(too_many)?;
        let surface = recipe.required_surface();
        let station = self.ctx.settings.station_block();
        if surface == CraftSurface::Station && self.find_block(&station)?.is_none() {
            return Err(PlanError::Planning(format!(
                "no {station} within {} blocks to craft {item}",
                self.ctx.settings.block_search_radius
            )));
        }

        for (ingredient, need) in resolution_order(&self.ctx.catalog, &demand) {
            self.obtain(ingredient, need).await?;
        }
        for (ingredient, need) in &demand {
            if !self.ctx.inventory.has(ingredient, *need) {
                return Err(PlanError::Planning(format!(
                    "{ingredient} was used up while gathering ingredients for {item}"
                )));
            }
        }

        if surface == CraftSurface::Station {
            let Some(pos) = self.find_block(&station)? else {
                return Err(PlanError::Planning(format!("{station} disappeared")));
            };
            navigator::approach(&*self.ctx, pos).await?;
        }

        let world = Arc::clone(&self.ctx.world);
        if !self
            .ctx
            .timed("open crafting surface", world.open_craft_surface(surface))
            .await?
        {
            return Err(PlanError::Execution(format!(
                "could not open the {surface:?} crafting grid"
            )));
        }

        for done in 0..crafts {
            self.ctx.check_stop()?;
            if !self
                .ctx
                .timed("craft", world.craft_with_grid(recipe, surface))
                .await?
            {
                return Err(PlanError::Execution(format!(
                    "craft {} of {crafts} for {item} failed",
                    done + 1
                )));
            }
            self.ctx.inventory.remove_all(&consumed)?;
            self.ctx.inventory.add(item, per_craft);
        }
        info!(item = %item, crafts, made, "Crafted");
        Ok(())
    }

    async fn gather(
        &mut self,
        item: &ItemId,
        block: &BlockId,
        yield_per_block: u32,
        target: u32,
    ) -> Result<(), PlanError> {
        let per_block = yield_per_block.max(1);
        let world = Arc::clone(&self.ctx.world);
        let mut broken = 0u32;
        while self.ctx.inventory.count(item) < target {
            self.ctx.check_stop()?;
            let Some(pos) = self.find_block(block)? else {
                return Err(PlanError::Planning(format!(
                    "no {block} within {} blocks",
                    self.ctx.settings.block_search_radius
                )));
            };
            navigator::approach(&*self.ctx, pos).await?;
            self.ctx.timed("look", world.look_at(pos)).await?;
            self.break_until_clear(pos, block).await?;
            self.ctx.inventory.add(item, per_block);
            broken += 1;
            debug!(item = %item, at = %pos, "Block broken");
        }
        info!(item = %item, blocks = broken, "Gathered");
        Ok(())
    }

    /// Break `pos`, retrying until the cell no longer obstructs or the break
    /// deadline passes.
    async fn break_until_clear(&mut self, pos: Position, block: &BlockId) -> Result<(), PlanError> {
        let world = Arc::clone(&self.ctx.world);
        let deadline = Instant::now() + self.ctx.settings.break_timeout();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Ok(result) = tokio::time::timeout(remaining, world.break_block(pos)).await {
                result?;
            }
            if !self.ctx.planner().solidity.is_solid(&world.block_at(pos)?) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PlanError::Execution(format!(
                    "{block} at {pos} still standing after {} ms",
                    self.ctx.settings.break_ms
                )));
            }
            let pause = self
                .ctx
                .settings
                .retry_interval()
                .min(deadline.saturating_duration_since(Instant::now()));
            tokio::time::sleep(pause).await;
        }
    }

    async fn smelt(&mut self, item: &ItemId, input: &ItemId, shortfall: u32) -> Result<(), PlanError> {
        let station = self.ensure_furnace().await?;
        self.obtain(input.clone(), shortfall).await?;
        let fuel = self.try_fuel().await?;

        navigator::approach(&*self.ctx, station).await?;
        let world = Arc::clone(&self.ctx.world);
        if !self
            .ctx
            .timed(
                "smelt",
                world.smelt(station, input, shortfall, fuel.as_ref()),
            )
            .await?
        {
            return Err(PlanError::Execution(format!(
                "smelting {shortfall} {input} at {station} failed"
            )));
        }
        self.ctx.inventory.remove(input, shortfall)?;
        if let Some(fuel) = &fuel {
            self.ctx.inventory.remove(fuel, 1)?;
        }
        self.ctx.inventory.add(item, shortfall);
        info!(item = %item, count = shortfall, fueled = fuel.is_some(), "Smelted");
        Ok(())
    }

    /// Best-effort fuel: failure to find any is tolerated.
    async fn try_fuel(&mut self) -> Result<Option<ItemId>, PlanError> {
        let fuel = self.ctx.settings.fuel_item();
        if self.ctx.inventory.has(&fuel, 1) {
            return Ok(Some(fuel));
        }
        if !self.ctx.catalog.contains(&fuel) {
            return Ok(None);
        }
        match self.obtain(fuel.clone(), 1).await {
            Ok(()) => Ok(Some(fuel)),
            Err(err) if err.is_fatal() || err == PlanError::Cancelled => Err(err),
            Err(err) => {
                warn!(fuel = %fuel, error = %err, "Smelting without fuel");
                Ok(None)
            }
        }
    }

    /// Reuse a furnace in the world, or obtain one and place it.
    async fn ensure_furnace(&mut self) -> Result<Position, PlanError> {
        let block = self.ctx.settings.furnace_block();
        if let Some(pos) = self.find_block(&block)? {
            return Ok(pos);
        }
        let item = self.ctx.settings.furnace_item();
        self.obtain(item.clone(), 1).await?;
        let pos = self.place_beside_player(&item).await?;
        info!(at = %pos, "Placed {item}");
        Ok(pos)
    }

    async fn place_beside_player(&mut self, item: &ItemId) -> Result<Position, PlanError> {
        let world = Arc::clone(&self.ctx.world);
        let here = world.player_position()?;
        for face in Face::HORIZONTAL {
            let cell = here.adjacent(face);
            let solidity = &self.ctx.planner().solidity;
            if solidity.is_solid(&world.block_at(cell)?)
                || !solidity.is_solid(&world.block_at(cell.down())?)
            {
                continue;
            }
            self.select(item).await?;
            if self
                .ctx
                .timed("place", world.place_block(cell.down(), Face::Up))
                .await?
            {
                self.ctx.inventory.remove(item, 1)?;
                return Ok(cell);
            }
        }
        Err(PlanError::Planning(format!(
            "no free cell next to {here} to place {item}"
        )))
    }

    async fn hunt(
        &mut self,
        item: &ItemId,
        mob: &str,
        yield_per_kill: u32,
        shortfall: u32,
    ) -> Result<(), PlanError> {
        let per_kill = yield_per_kill.max(1);
        let kills = shortfall.div_ceil(per_kill);
        let world = Arc::clone(&self.ctx.world);
        let radius = self.ctx.settings.entity_search_radius;
        for _ in 0..kills {
            self.ctx.check_stop()?;
            let Some(target) = world.find_nearest_entity(mob, radius)? else {
                return Err(PlanError::Planning(format!("no {mob} within {radius} blocks")));
            };
            navigator::approach(&*self.ctx, target.position).await?;

            let mut attempts = 0u32;
            while world.entity_alive(target.handle)? {
                if attempts >= self.ctx.settings.max_attack_attempts {
                    return Err(PlanError::Execution(format!(
                        "{mob} {} survived {attempts} attacks",
                        target.handle
                    )));
                }
                self.ctx.check_stop()?;
                self.ctx.timed("look", world.look_at(target.position)).await?;
                if !self.ctx.timed("attack", world.attack(target.handle)).await? {
                    return Err(PlanError::Execution(format!("attack on {mob} failed")));
                }
                attempts += 1;
            }
            self.ctx.inventory.add(item, per_kill);
        }
        info!(item = %item, kills, "Hunted");
        Ok(())
    }

    /// Hold a tool of `kind`. When a level is required and none is owned,
    /// the weakest sufficient tool is obtained first.
    async fn equip(&mut self, kind: ToolKind, tier: Option<HarvestLevel>) -> Result<(), PlanError> {
        let providers = self.ctx.catalog.tool_providers(kind, tier);
        let owned = providers
            .iter()
            .rev()
            .find(|id| self.ctx.inventory.has(id, 1))
            .cloned();
        if let Some(tool) = owned {
            return self.select(&tool).await;
        }
        let Some(level) = tier else {
            debug!(%kind, "No tool held, working bare-handed");
            return Ok(());
        };
        let Some(weakest) = providers.first().cloned() else {
            return Err(PlanError::Planning(format!(
                "no {kind} of level {level:?} or better is known"
            )));
        };
        self.obtain(weakest.clone(), 1).await?;
        self.select(&weakest).await
    }

    async fn select(&mut self, item: &ItemId) -> Result<(), PlanError> {
        let world = Arc::clone(&self.ctx.world);
        if self.ctx.timed("select", world.select_item(item)).await? {
            Ok(())
        } else {
            Err(PlanError::Execution(format!("could not hold {item}")))
        }
    }

    fn find_block(&self, block: &BlockId) -> Result<Option<Position>, PlanError> {
        Ok(self
            .ctx
            .world
            .find_nearest_block(block, self.ctx.settings.block_search_radius)?)
    }
}

/// Items consumed directly by a rule, including the tool a gathering rule
/// would have to craft when none is owned.
fn inputs_of(catalog: &ItemCatalog, rule: &ItemRule) -> Vec<ItemId> {
    match rule {
        ItemRule::Crafted { recipe, .. } => recipe
            .occupied()
            .map(|(_, _, item)| item.clone())
            .collect(),
        ItemRule::Smelted { input } => vec![input.clone()],
        ItemRule::Mined {
            tool: Some(kind),
            tier: Some(level),
            ..
        }
        | ItemRule::Dropped {
            tool: Some(kind),
            tier: Some(level),
            ..
        } => catalog
            .tool_providers(*kind, Some(*level))
            .into_iter()
            .take(1)
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether producing `item` consumes `other`, directly or further down.
fn consumes(catalog: &ItemCatalog, item: &ItemId, other: &ItemId) -> bool {
    let mut seen = BTreeSet::new();
    let mut stack = vec![item.clone()];
    while let Some(current) = stack.pop() {
        let Some(rule) = catalog.rule(&current) else {
            continue;
        };
        if !seen.insert(current.clone()) {
            continue;
        }
        for input in inputs_of(catalog, rule) {
            if &input == other {
                return true;
            }
            stack.push(input);
        }
    }
    false
}

/// Order ingredients so that anything built from a sibling is resolved
/// before that sibling; otherwise the sibling's stock would be eaten.
pub(crate) fn resolution_order(catalog: &ItemCatalog, demand: &BTreeMap<ItemId, u32>) -> Vec<(ItemId, u32)> {
    let mut ranked: Vec<(usize, &ItemId, u32)> = demand
        .iter()
        .map(|(id, need)| {
            let uses = demand
                .keys()
                .filter(|other| *other != id && consumes(catalog, id, other))
                .count();
            (uses, id, *need)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked
        .into_iter()
        .map(|(_, id, need)| (id.clone(), need))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_products_resolve_first() {
        let catalog = ItemCatalog::with_defaults();
        let demand: BTreeMap<ItemId, u32> =
            [(ItemId::new("planks"), 3), (ItemId::new("stick"), 2)].into_iter().collect();
        let order: Vec<ItemId> = resolution_order(&catalog, &demand)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(order, vec![ItemId::new("stick"), ItemId::new("planks")]);
    }

    #[test]
    fn consumption_is_transitive() {
        let catalog = ItemCatalog::with_defaults();
        assert!(consumes(&catalog, &ItemId::new("torch"), &ItemId::new("oak_log")));
        assert!(consumes(&catalog, &ItemId::new("stone_bricks"), &ItemId::new("cobblestone")));
        assert!(!consumes(&catalog, &ItemId::new("planks"), &ItemId::new("stick")));
        assert!(!consumes(&catalog, &ItemId::new("oak_log"), &ItemId::new("planks")));
    }

    #[test]
    fn required_tools_count_as_inputs() {
        let catalog = ItemCatalog::with_defaults();
        // cobblestone needs a wooden pickaxe, which is made from sticks.
        assert!(consumes(&catalog, &ItemId::new("cobblestone"), &ItemId::new("stick")));
        assert!(consumes(&catalog, &ItemId::new("stone"), &ItemId::new("planks")));

        let demand: BTreeMap<ItemId, u32> =
            [(ItemId::new("stick"), 3), (ItemId::new("stone"), 1)].into_iter().collect();
        let order: Vec<ItemId> = resolution_order(&catalog, &demand)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(order, vec![ItemId::new("stone"), ItemId::new("stick")]);
    }
}
