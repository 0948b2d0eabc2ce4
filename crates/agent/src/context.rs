//! Everything a planning call needs, passed explicitly.

use crate::error::PlanError;
use crate::settings::AgentSettings;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use voxbot_core::{Inventory, ItemCatalog};
use voxbot_world::{PathPlanner, WorldError, WorldQuery};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A flag with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the active route to stop at the next waypoint.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop is pending.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Withdraw a pending stop.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Catalog, inventory, settings and world for one agent.
pub struct AgentContext {
    /// How each item is obtained.
    pub catalog: Arc<ItemCatalog>,
    /// What the agent holds. Changed only by confirmed actions.
    pub inventory: Inventory,
    /// Limits and timeouts.
    pub settings: AgentSettings,
    /// The world every query and action goes to.
    pub world: Arc<dyn WorldQuery>,
    /// Checked before every waypoint and repeated action.
    pub stop: StopHandle,
    planner: PathPlanner,
}

impl AgentContext {
    /// Context with an empty inventory and a planner built from `settings`.
    pub fn new(catalog: Arc<ItemCatalog>, settings: AgentSettings, world: Arc<dyn WorldQuery>) -> Self {
        let planner = PathPlanner::new(
            settings.path_limits(),
            settings.move_costs,
            settings.solidity(),
        );
        Self {
            catalog,
            inventory: Inventory::new(),
            settings,
            world,
            stop: StopHandle::new(),
            planner,
        }
    }

    /// Start from a given inventory instead of an empty one.
    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Path planner configured from the settings.
    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// Fail with [`PlanError::Cancelled`] once a stop was requested.
    pub fn check_stop(&self) -> Result<(), PlanError> {
        if self.stop.is_requested() {
            return Err(PlanError::Cancelled);
        }
        Ok(())
    }

    /// Await a primitive action, bounded by the action timeout.
    pub async fn timed<T, F>(&self, action: &str, fut: F) -> Result<T, PlanError>
    where
        F: Future<Output = Result<T, WorldError>>,
    {
        match tokio::time::timeout(self.settings.action_timeout(), fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PlanError::Execution(format!(
                "{action} timed out after {} ms",
                self.settings.action_timeout_ms
            ))),
        }
    }
}
