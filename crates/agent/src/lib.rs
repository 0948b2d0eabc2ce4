#![warn(missing_docs)]
//! Planning and execution on top of a [`voxbot_world::WorldQuery`]: route
//! following, recursive resource resolution, blueprint building and the task
//! queue that drives them.

pub mod blueprint;
pub mod context;
pub mod error;
pub mod navigator;
pub mod resources;
pub mod scheduler;
pub mod settings;

pub use blueprint::{Blueprint, PixelArt, Placement};
pub use context::{AgentContext, StopHandle};
pub use error::{FailureKind, PlanError};
pub use resources::{obtain, ResourcePlanner};
pub use scheduler::{RunAborted, Task, TaskOutcome, TaskReport, TaskScheduler};
pub use settings::AgentSettings;
