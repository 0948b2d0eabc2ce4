//! Route planning over the voxel lattice.

use crate::heap::MinHeap;
use crate::query::{WorldError, WorldQuery};
use crate::solidity::SolidityRules;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use voxbot_core::Position;

/// Edge weights and heuristic weight for route planning.
///
/// The heuristic is horizontal Manhattan distance plus `vertical_weight` per
/// level of height difference. With a vertical weight above the step costs
/// it can overestimate, trading optimality for fewer expansions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveCosts {
    /// Cost of a level move.
    pub lateral: f32,
    /// Cost of a move that gains height (1.0..=1.4).
    pub step_up: f32,
    /// Cost of a move that loses height (1.0..=1.2).
    pub step_down: f32,
    /// Heuristic weight per level of height difference (>= 1.0).
    pub vertical_weight: f32,
}

impl Default for MoveCosts {
    fn default() -> Self {
        Self {
            lateral: 1.0,
            step_up: 1.2,
            step_down: 1.1,
            vertical_weight: 1.0,
        }
    }
}

impl MoveCosts {
    /// Clamp every weight into its supported range.
    pub fn clamped(self) -> Self {
        Self {
            lateral: 1.0,
            step_up: self.step_up.clamp(1.0, 1.4),
            step_down: self.step_down.clamp(1.0, 1.2),
            vertical_weight: self.vertical_weight.max(1.0),
        }
    }

    fn heuristic(&self, from: Position, goal: Position) -> f32 {
        self.lateral * from.horizontal_manhattan(goal) as f32
            + self.vertical_weight * from.y.abs_diff(goal.y) as f32
    }
}

/// Search bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLimits {
    /// Nodes expanded before giving up.
    pub max_expansions: usize,
    /// Horizontal distance from the start beyond which nodes are ignored.
    pub search_radius: u32,
    /// Largest height gain a single move may make.
    pub step_height: u32,
}

impl Default for PathLimits {
    fn default() -> Self {
        Self {
            max_expansions: 4000,
            search_radius: 64,
            step_height: 1,
        }
    }
}

/// Why no route was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The start cell has no clearance.
    #[error("start {0} is obstructed")]
    StartObstructed(Position),
    /// Every reachable cell was explored without meeting the goal.
    #[error("no route to {0}")]
    Unreachable(Position),
    /// The expansion budget ran out first.
    #[error("search exhausted after {expansions} expansions")]
    SearchExhausted {
        /// Expansions performed.
        expansions: usize,
    },
    /// The world could not be read.
    #[error(transparent)]
    World(#[from] WorldError),
}

const LATERAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// A* over the voxel lattice.
///
/// A cell is passable when neither it nor the cell above is solid. From each
/// cell the four lateral neighbours are tried: a level move when the
/// neighbour is passable, otherwise a step up of at most `step_height` when
/// the raised cell is passable and the head room above the current cell is
/// clear. The chosen cell then falls while the cell below is not solid and
/// `y > 0`.
///
/// The returned path starts at `start` and ends at `goal`. No partial path
/// is ever returned. `is_solid` reads the world and may fail.
pub fn astar_path_3d(
    start: Position,
    goal: Position,
    limits: &PathLimits,
    costs: &MoveCosts,
    mut is_solid: impl FnMut(Position) -> Result<bool, WorldError>,
) -> Result<Vec<Position>, PathError> {
    if start == goal {
        return Ok(vec![start]);
    }

    fn passable(
        p: Position,
        is_solid: &mut impl FnMut(Position) -> Result<bool, WorldError>,
    ) -> Result<bool, WorldError> {
        Ok(!is_solid(p)? && !is_solid(p.up())?)
    }

    if !passable(start, &mut is_solid)? {
        return Err(PathError::StartObstructed(start));
    }

    let mut open: MinHeap<(f32, f32), Position> = MinHeap::new();
    let h0 = costs.heuristic(start, goal);
    open.push((h0, h0), start);

    let mut came_from: BTreeMap<Position, Position> = BTreeMap::new();
    let mut g_score: BTreeMap<Position, f32> = BTreeMap::new();
    g_score.insert(start, 0.0);

    let mut closed: BTreeSet<Position> = BTreeSet::new();

    let mut expansions = 0usize;
    while let Some((_, pos)) = open.pop() {
        if !closed.insert(pos) {
            continue;
        }

        if pos == goal {
            let mut path = vec![goal];
            let mut cur = goal;
            while let Some(prev) = came_from.get(&cur).copied() {
                path.push(prev);
                if prev == start {
                    break;
                }
                cur = prev;
            }
            path.reverse();
            return Ok(path);
        }

        expansions += 1;
        if expansions > limits.max_expansions {
            return Err(PathError::SearchExhausted {
                expansions: limits.max_expansions,
            });
        }

        let current_g = g_score.get(&pos).copied().unwrap_or(f32::INFINITY);
        for (dx, dz) in LATERAL {
            let lateral = pos.offset(dx, 0, dz);
            let mut dest = if passable(lateral, &mut is_solid)? {
                lateral
            } else {
                let mut raised = None;
                for h in 1..=limits.step_height as i32 {
                    if is_solid(pos.offset(0, h + 1, 0))? {
                        break;
                    }
                    let candidate = lateral.offset(0, h, 0);
                    if passable(candidate, &mut is_solid)? {
                        raised = Some(candidate);
                        break;
                    }
                }
                match raised {
                    Some(candidate) => candidate,
                    None => continue,
                }
            };

            while dest.y > 0 && !is_solid(dest.down())? {
                dest = dest.down();
            }

            if dest.horizontal_chebyshev(start) > limits.search_radius || closed.contains(&dest) {
                continue;
            }

            let step_cost = match dest.y.cmp(&pos.y) {
                std::cmp::Ordering::Greater => costs.step_up,
                std::cmp::Ordering::Less => costs.step_down,
                std::cmp::Ordering::Equal => costs.lateral,
            };
            let tentative_g = current_g + step_cost;
            let best_g = g_score.get(&dest).copied().unwrap_or(f32::INFINITY);
            if tentative_g >= best_g {
                continue;
            }

            came_from.insert(dest, pos);
            g_score.insert(dest, tentative_g);
            let h = costs.heuristic(dest, goal);
            open.push((tentative_g + h, h), dest);
        }
    }

    Err(PathError::Unreachable(goal))
}

/// Route planner bound to a solidity classification.
#[derive(Debug, Clone, Default)]
pub struct PathPlanner {
    /// Search bounds.
    pub limits: PathLimits,
    /// Edge weights.
    pub costs: MoveCosts,
    /// Block classification.
    pub solidity: SolidityRules,
}

impl PathPlanner {
    /// Create a planner; cost weights are clamped into range.
    pub fn new(limits: PathLimits, costs: MoveCosts, solidity: SolidityRules) -> Self {
        Self {
            limits,
            costs: costs.clamped(),
            solidity,
        }
    }

    /// Plan a route through `world`.
    pub fn find_path(
        &self,
        world: &dyn WorldQuery,
        start: Position,
        goal: Position,
    ) -> Result<Vec<Position>, PathError> {
        astar_path_3d(start, goal, &self.limits, &self.costs, |p| {
            Ok(self.solidity.is_solid(&world.block_at(p)?))
        })
    }

    /// Whether the player fits at `pos`.
    pub fn is_passable(&self, world: &dyn WorldQuery, pos: Position) -> Result<bool, WorldError> {
        Ok(!self.solidity.is_solid(&world.block_at(pos)?)
            && !self.solidity.is_solid(&world.block_at(pos.up())?))
    }

    /// Whether the player fits at `pos` and would not fall from it.
    pub fn is_standable(&self, world: &dyn WorldQuery, pos: Position) -> Result<bool, WorldError> {
        Ok(self.is_passable(world, pos)?
            && (pos.y <= 0 || self.solidity.is_solid(&world.block_at(pos.down())?)))
    }
}

#[cfg(test)]
mod tests {
    use super::{astar_path_3d, MoveCosts, PathError, PathLimits};
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use voxbot_core::Position;

    fn open_air(
        solid: &BTreeSet<Position>,
    ) -> impl FnMut(Position) -> Result<bool, crate::WorldError> + '_ {
        move |p| Ok(p.y < 0 || solid.contains(&p))
    }

    fn assert_valid_route(path: &[Position], limits: &PathLimits, solid: &BTreeSet<Position>) {
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(a.horizontal_manhattan(b), 1, "{a} -> {b} is not a lateral step");
            assert!(
                b.y - a.y <= limits.step_height as i32,
                "{a} -> {b} climbs too high"
            );
            assert!(!solid.contains(&b) && !solid.contains(&b.up()), "{b} is obstructed");
        }
    }

    #[test]
    fn returns_straight_path_on_open_floor() {
        let solid = BTreeSet::new();
        let start = Position::new(0, 0, 0);
        let goal = Position::new(3, 0, 0);
        let path = astar_path_3d(
            start,
            goal,
            &PathLimits::default(),
            &MoveCosts::default(),
            open_air(&solid),
        )
        .expect("path should exist");
        assert_eq!(
            path,
            vec![
                Position::new(0, 0, 0),
                Position::new(1, 0, 0),
                Position::new(2, 0, 0),
                Position::new(3, 0, 0),
            ]
        );
    }

    #[test]
    fn start_equal_to_goal_is_a_single_node() {
        let solid = BTreeSet::new();
        let p = Position::new(4, 0, 4);
        let path = astar_path_3d(p, p, &PathLimits::default(), &MoveCosts::default(), open_air(&solid))
            .unwrap();
        assert_eq!(path, vec![p]);
    }

    #[test]
    fn detours_around_obstruction_column() {
        let solid: BTreeSet<Position> = (0..4)
            .flat_map(|y| (10..=20).map(move |z| Position::new(15, y, z)))
            .collect();
        let start = Position::new(15, 0, 0);
        let goal = Position::new(15, 0, 31);
        let limits = PathLimits::default();
        let path = astar_path_3d(start, goal, &limits, &MoveCosts::default(), open_air(&solid))
            .expect("path should exist");
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert!(path.len() as u32 > start.manhattan(goal) + 1);
        assert_valid_route(&path, &limits, &solid);
    }

    #[test]
    fn steps_up_single_block_but_not_a_wall() {
        let mut solid: BTreeSet<Position> = BTreeSet::new();
        // A one-high ledge across x = 2.
        for z in -5..=5 {
            solid.insert(Position::new(2, 0, z));
        }
        let limits = PathLimits {
            search_radius: 5,
            ..PathLimits::default()
        };
        let path = astar_path_3d(
            Position::new(0, 0, 0),
            Position::new(2, 1, 0),
            &limits,
            &MoveCosts::default(),
            open_air(&solid),
        )
        .expect("one-block step is climbable");
        assert_eq!(path.last(), Some(&Position::new(2, 1, 0)));
        assert_valid_route(&path, &limits, &solid);

        // Raise it to a two-high wall spanning the whole search window.
        for z in -5..=5 {
            solid.insert(Position::new(2, 1, z));
        }
        let err = astar_path_3d(
            Position::new(0, 0, 0),
            Position::new(4, 0, 0),
            &limits,
            &MoveCosts::default(),
            open_air(&solid),
        )
        .unwrap_err();
        assert_eq!(err, PathError::Unreachable(Position::new(4, 0, 0)));
    }

    #[test]
    fn falls_to_support_after_walking_off_a_ledge() {
        // Platform at y = 2 under x in 0..=1; open drop beyond.
        let mut solid = BTreeSet::new();
        solid.insert(Position::new(0, 2, 0));
        solid.insert(Position::new(1, 2, 0));
        let path = astar_path_3d(
            Position::new(0, 3, 0),
            Position::new(3, 0, 0),
            &PathLimits::default(),
            &MoveCosts::default(),
            open_air(&solid),
        )
        .expect("can drop down");
        assert_eq!(path.first(), Some(&Position::new(0, 3, 0)));
        assert_eq!(path.last(), Some(&Position::new(3, 0, 0)));
        assert!(path.iter().all(|p| p.y == 3 || p.y == 0), "route: {path:?}");
        assert!(path.windows(2).any(|w| w[0].y - w[1].y == 3));
    }

    #[test]
    fn expansion_budget_fails_without_partial_path() {
        let solid = BTreeSet::new();
        let limits = PathLimits {
            max_expansions: 5,
            ..PathLimits::default()
        };
        let err = astar_path_3d(
            Position::new(0, 0, 0),
            Position::new(30, 0, 30),
            &limits,
            &MoveCosts::default(),
            open_air(&solid),
        )
        .unwrap_err();
        assert_eq!(err, PathError::SearchExhausted { expansions: 5 });
    }

    #[test]
    fn obstructed_start_is_rejected() {
        let solid = BTreeSet::from([Position::new(0, 1, 0)]);
        let err = astar_path_3d(
            Position::new(0, 0, 0),
            Position::new(1, 0, 0),
            &PathLimits::default(),
            &MoveCosts::default(),
            open_air(&solid),
        )
        .unwrap_err();
        assert_eq!(err, PathError::StartObstructed(Position::new(0, 0, 0)));
    }

    #[test]
    fn costs_are_clamped_into_range() {
        let costs = MoveCosts {
            lateral: 3.0,
            step_up: 9.0,
            step_down: 0.1,
            vertical_weight: 0.5,
        }
        .clamped();
        assert_eq!(costs.lateral, 1.0);
        assert_eq!(costs.step_up, 1.4);
        assert_eq!(costs.step_down, 1.0);
        assert_eq!(costs.vertical_weight, 1.0);
    }

    proptest! {
        /// Any route found over random rubble is contiguous and collision free.
        #[test]
        fn routes_over_rubble_are_valid(
            rubble in proptest::collection::btree_set((-6i32..6, 0i32..2, -6i32..6), 0..40),
            gx in -5i32..5,
            gz in -5i32..5,
        ) {
            let solid: BTreeSet<Position> = rubble
                .into_iter()
                .map(|(x, y, z)| Position::new(x, y, z))
                .filter(|p| p.x != 0 || p.z != 0)
                .collect();
            let limits = PathLimits { max_expansions: 2000, search_radius: 8, step_height: 1 };
            let start = Position::new(0, 0, 0);
            let goal = Position::new(gx, 0, gz);
            if let Ok(path) = astar_path_3d(start, goal, &limits, &MoveCosts::default(), open_air(&solid)) {
                prop_assert_eq!(path.first(), Some(&start));
                prop_assert_eq!(path.last(), Some(&goal));
                assert_valid_route(&path, &limits, &solid);
            }
        }
    }
}
