//! Failures reported by planning and execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxbot_core::{InventoryError, ItemId, Position};
use voxbot_world::{PathError, WorldError};

/// Broad classification of a planning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Nothing in the catalog or world lets the goal be met.
    Planning,
    /// A primitive action reported failure or timed out.
    Execution,
    /// A search bound was hit.
    SearchExhausted,
    /// The world adapter failed unexpectedly.
    Adapter,
}

/// Why an `obtain`, `travel_to` or build did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The catalog has no entry for the item.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),
    /// The item is needed, directly or not, to make itself.
    #[error("cycle while resolving {0}")]
    Cycle(ItemId),
    /// No block, station, entity or route lets the goal be met.
    #[error("{0}")]
    Planning(String),
    /// A primitive action reported failure or timed out.
    #[error("{0}")]
    Execution(String),
    /// The path search hit its expansion budget.
    #[error("search exhausted: {0}")]
    SearchExhausted(String),
    /// A stop was requested.
    #[error("cancelled")]
    Cancelled,
    /// The world adapter failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

impl PlanError {
    /// Category used in task reports.
    pub fn kind(&self) -> FailureKind {
        match self {
            PlanError::UnknownItem(_) | PlanError::Cycle(_) | PlanError::Planning(_) => {
                FailureKind::Planning
            }
            PlanError::Execution(_) | PlanError::Cancelled => FailureKind::Execution,
            PlanError::SearchExhausted(_) => FailureKind::SearchExhausted,
            PlanError::World(_) => FailureKind::Adapter,
        }
    }

    /// Whether the scheduler should give up on the whole queue.
    pub fn is_fatal(&self) -> bool {
        self.kind() == FailureKind::Adapter
    }

    pub(crate) fn no_route(goal: Position, err: PathError) -> Self {
        match err {
            PathError::World(err) => PlanError::World(err),
            PathError::SearchExhausted { expansions } => PlanError::SearchExhausted(format!(
                "no route to {goal} within {expansions} expansions"
            )),
            other => PlanError::Planning(format!("no route to {goal}: {other}")),
        }
    }
}

impl From<InventoryError> for PlanError {
    fn from(err: InventoryError) -> Self {
        PlanError::Execution(err.to_string())
    }
}
