//! Walking planned routes through the world.

use crate::context::AgentContext;
use crate::error::{FailureKind, PlanError};
use tracing::{debug, info, warn};
use voxbot_core::Position;

/// Horizontal and vertical extent searched for a place to stand near a target.
const APPROACH_SPAN: i32 = 2;
/// Stand cells tried before giving up on a target.
const MAX_APPROACH_ATTEMPTS: usize = 8;

/// Walk to `goal`, re-planning from the current position when a step is
/// obstructed.
///
/// Each route is walked waypoint by waypoint; the stop flag is checked before
/// every step. After `max_replans` obstructed routes the call fails.
pub async fn travel_to(ctx: &AgentContext, goal: Position) -> Result<(), PlanError> {
    let world = &*ctx.world;
    let mut replans = 0u32;
    loop {
        ctx.check_stop()?;
        let start = world.player_position()?;
        if start == goal {
            return Ok(());
        }

        let route = ctx
            .planner()
            .find_path(world, start, goal)
            .map_err(|err| PlanError::no_route(goal, err))?;
        debug!(%start, %goal, steps = route.len() - 1, "Route planned");

        let mut obstructed_at = None;
        for step in route.into_iter().skip(1) {
            ctx.check_stop()?;
            ctx.timed("look", world.look_at(step)).await?;
            if !ctx.timed("move", world.move_to(step)).await? {
                obstructed_at = Some(step);
                break;
            }
        }

        let Some(blocked) = obstructed_at else {
            info!(%goal, "Arrived");
            return Ok(());
        };

        replans += 1;
        if replans > ctx.settings.max_replans {
            return Err(PlanError::Execution(format!(
                "route to {goal} obstructed {replans} times"
            )));
        }
        warn!(%blocked, %goal, replans, "Step obstructed, re-planning");
    }
}

/// Walk somewhere within reach of `target` and return where the player stands.
///
/// Candidate cells around the target are tried nearest-first. The target cell
/// and the cell on top of it are never chosen, so a block can still be placed
/// or broken there.
pub async fn approach(ctx: &AgentContext, target: Position) -> Result<Position, PlanError> {
    let world = &*ctx.world;
    let reach = ctx.settings.reach;
    let here = world.player_position()?;
    if here.distance(target) <= reach && here != target && here.up() != target {
        return Ok(here);
    }

    let mut candidates = Vec::new();
    for dx in -APPROACH_SPAN..=APPROACH_SPAN {
        for dy in -APPROACH_SPAN..=APPROACH_SPAN {
            for dz in -APPROACH_SPAN..=APPROACH_SPAN {
                let cell = target.offset(dx, dy, dz);
                if cell == target
                    || cell.up() == target
                    || cell == target.up()
                    || cell.distance(target) > reach
                {
                    continue;
                }
                if ctx.planner().is_standable(world, cell)? {
                    candidates.push(cell);
                }
            }
        }
    }
    candidates.sort_by_key(|cell| (cell.distance_squared(here), *cell));

    let mut last_err = None;
    for cell in candidates.into_iter().take(MAX_APPROACH_ATTEMPTS) {
        match travel_to(ctx, cell).await {
            Ok(()) => return Ok(cell),
            Err(err) if matches!(err.kind(), FailureKind::Planning | FailureKind::SearchExhausted) => {
                debug!(%cell, %target, error = %err, "Stand cell unreachable");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        PlanError::Planning(format!("no place to stand within reach of {target}"))
    }))
}
