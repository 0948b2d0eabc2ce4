//! FIFO task queue driving the planners.

use crate::blueprint::{self, Blueprint};
use crate::context::{AgentContext, StopHandle};
use crate::error::{FailureKind, PlanError};
use crate::navigator;
use crate::resources;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};
use voxbot_core::{ItemId, Position};
use voxbot_world::WorldError;

/// A unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    /// Hold at least `count` of `item`.
    Get {
        /// Item to hold.
        item: ItemId,
        /// Inventory level to reach.
        count: u32,
    },
    /// Walk to a position.
    Goto {
        /// Destination cell for the player's feet.
        position: Position,
    },
    /// Gather materials and place a blueprint.
    Build {
        /// What to place, in order.
        blueprint: Blueprint,
    },
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Get { item, count } => write!(f, "get {count} {item}"),
            Task::Goto { position } => write!(f, "goto {position}"),
            Task::Build { blueprint } => write!(f, "build {} blocks", blueprint.blocks.len()),
        }
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The goal was met.
    Completed,
    /// The task gave up; later tasks still run.
    Failed {
        /// Failure category.
        kind: FailureKind,
        /// Human-readable cause.
        reason: String,
    },
}

/// Record of one executed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    /// The task as it was queued.
    pub task: Task,
    /// How it ended.
    #[serde(flatten)]
    pub outcome: TaskOutcome,
    /// Wall-clock run time.
    pub elapsed_ms: u64,
}

impl TaskReport {
    /// Whether the task completed.
    pub fn succeeded(&self) -> bool {
        self.outcome == TaskOutcome::Completed
    }
}

/// Owns the agent context and runs queued tasks strictly in order.
pub struct TaskScheduler {
    ctx: AgentContext,
    queue: VecDeque<Task>,
}

impl TaskScheduler {
    /// Scheduler with an empty queue.
    pub fn new(ctx: AgentContext) -> Self {
        Self {
            ctx,
            queue: VecDeque::new(),
        }
    }

    /// The agent context, e.g. to read the inventory.
    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    /// Mutable access to the agent context.
    pub fn context_mut(&mut self) -> &mut AgentContext {
        &mut self.ctx
    }

    /// Append a task to the back of the queue.
    pub fn enqueue(&mut self, task: Task) {
        info!(task = %task, queued = self.queue.len() + 1, "Task queued");
        self.queue.push_back(task);
    }

    /// Copy of the pending tasks, front first.
    pub fn snapshot(&self) -> Vec<Task> {
        self.queue.iter().cloned().collect()
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no task is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle that cancels the active route from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.ctx.stop.clone()
    }

    /// Cancel the active task, or the next one to start when idle.
    ///
    /// The request is consumed when that task ends. Later tasks run normally.
    pub fn stop(&self) {
        self.ctx.stop.request();
    }

    /// Drop every pending task and return how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        if dropped > 0 {
            info!(dropped, "Task queue cleared");
        }
        dropped
    }

    /// Run the front task, if any.
    ///
    /// Domain failures are reported in the returned [`TaskReport`]; only an
    /// adapter failure is returned as `Err`.
    pub async fn run_next(&mut self) -> Option<Result<TaskReport, WorldError>> {
        let task = self.queue.pop_front()?;
        info!(task = %task, "Task started");
        let started = Instant::now();
        let result = match self.ctx.check_stop() {
            Ok(()) => execute(&mut self.ctx, &task).await,
            Err(err) => Err(err),
        };
        self.ctx.stop.reset();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(()) => {
                info!(task = %task, elapsed_ms, "Task completed");
                TaskOutcome::Completed
            }
            Err(PlanError::World(err)) => {
                error!(task = %task, error = %err, "World adapter failed, aborting");
                return Some(Err(err));
            }
            Err(err) => {
                warn!(task = %task, kind = ?err.kind(), error = %err, "Task failed");
                TaskOutcome::Failed {
                    kind: err.kind(),
                    reason: err.to_string(),
                }
            }
        };
        Some(Ok(TaskReport {
            task,
            outcome,
            elapsed_ms,
        }))
    }

    /// Drain the queue in order.
    ///
    /// An adapter failure ends the run; the reports of tasks finished before
    /// it travel with the error.
    pub async fn run(&mut self) -> Result<Vec<TaskReport>, RunAborted> {
        let mut reports = Vec::with_capacity(self.queue.len());
        while let Some(report) = self.run_next().await {
            match report {
                Ok(report) => reports.push(report),
                Err(error) => return Err(RunAborted { error, reports }),
            }
        }
        Ok(reports)
    }
}

/// A [`TaskScheduler::run`] cut short by the world adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run aborted after {} task(s): {error}", .reports.len())]
pub struct RunAborted {
    /// The adapter failure.
    #[source]
    pub error: WorldError,
    /// Reports of the tasks that finished first.
    pub reports: Vec<TaskReport>,
}

async fn execute(ctx: &mut AgentContext, task: &Task) -> Result<(), PlanError> {
    match task {
        Task::Get { item, count } => resources::obtain(ctx, item, *count).await,
        Task::Goto { position } => navigator::travel_to(ctx, *position).await,
        Task::Build { blueprint } => blueprint::build(ctx, blueprint).await.map(|_| ()),
    }
}
