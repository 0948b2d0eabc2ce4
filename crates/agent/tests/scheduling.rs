use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use voxbot_agent::{
    AgentContext, AgentSettings, Blueprint, FailureKind, StopHandle, Task, TaskOutcome,
    TaskScheduler,
};
use voxbot_core::{
    BlockId, CraftSurface, Face, Inventory, ItemCatalog, ItemId, Position, RecipeGrid,
};
use voxbot_testkit::{flat_world, planks_catalog, JsonlSink};
use voxbot_world::{EntityHandle, EntityRef, SimWorld, WorldError, WorldQuery};

fn scheduler_over(world: Arc<dyn WorldQuery>, inventory: Inventory) -> TaskScheduler {
    let ctx = AgentContext::new(Arc::new(planks_catalog()), AgentSettings::default(), world)
        .with_inventory(inventory);
    TaskScheduler::new(ctx)
}

#[tokio::test]
async fn runs_in_order_and_survives_failures() {
    let world = Arc::new(flat_world());
    let mut scheduler = scheduler_over(world.clone(), Inventory::new());
    scheduler.enqueue(Task::Get {
        item: ItemId::new("diamond"),
        count: 1,
    });
    scheduler.enqueue(Task::Goto {
        position: Position::new(3, 0, 2),
    });
    scheduler.enqueue(Task::Goto {
        position: Position::new(0, 0, 5),
    });

    let reports = scheduler.run().await.unwrap();

    assert_eq!(reports.len(), 3);
    assert!(matches!(
        reports[0].outcome,
        TaskOutcome::Failed {
            kind: FailureKind::Planning,
            ..
        }
    ));
    assert!(reports[1].succeeded());
    assert!(reports[2].succeeded());
    assert_eq!(
        reports[1].task,
        Task::Goto {
            position: Position::new(3, 0, 2)
        }
    );
    assert_eq!(world.player_position().unwrap(), Position::new(0, 0, 5));
    assert!(scheduler.is_empty());
}

#[tokio::test]
async fn adapter_failure_aborts_the_run() {
    let world = Arc::new(flat_world());
    let mut scheduler = scheduler_over(world.clone(), Inventory::new());
    scheduler.enqueue(Task::Goto {
        position: Position::new(2, 0, 0),
    });
    scheduler.enqueue(Task::Goto {
        position: Position::new(4, 0, 0),
    });
    world.disconnect();

    let err = scheduler.run().await.unwrap_err();

    assert!(matches!(err.error, WorldError::Unavailable(_)));
    assert!(err.reports.is_empty());
    assert_eq!(scheduler.len(), 1);
}

#[tokio::test]
async fn aborted_run_keeps_finished_reports() {
    let world = Arc::new(flat_world());
    let mut scheduler = scheduler_over(
        world.clone(),
        [(ItemId::new("planks"), 4)].into_iter().collect(),
    );
    scheduler.enqueue(Task::Get {
        item: ItemId::new("planks"),
        count: 2,
    });
    scheduler.enqueue(Task::Goto {
        position: Position::new(2, 0, 0),
    });
    world.disconnect();

    let err = scheduler.run().await.unwrap_err();

    assert!(matches!(err.error, WorldError::Unavailable(_)));
    assert_eq!(err.reports.len(), 1);
    assert!(err.reports[0].succeeded());
    assert!(err.to_string().contains("after 1 task(s)"));
}

#[tokio::test]
async fn builds_a_blueprint_from_stock() {
    let world = Arc::new(flat_world());
    let mut scheduler = scheduler_over(
        world.clone(),
        [(ItemId::new("planks"), 3)].into_iter().collect(),
    );
    let row = vec![Some(ItemId::new("planks")); 3];
    let blueprint = Blueprint::from_pixels(&[row], 1, Position::new(3, 0, 0));
    scheduler.enqueue(Task::Build {
        blueprint: blueprint.clone(),
    });

    let reports = scheduler.run().await.unwrap();

    assert!(reports[0].succeeded(), "{:?}", reports[0]);
    for x in 3..6 {
        assert_eq!(
            world.block_at(Position::new(x, 0, 0)).unwrap(),
            BlockId::new("planks")
        );
    }
    assert_eq!(scheduler.context().inventory.count(&ItemId::new("planks")), 0);

    // Already standing: nothing to gather or place.
    scheduler.enqueue(Task::Build { blueprint });
    let reports = scheduler.run().await.unwrap();
    assert!(reports[0].succeeded());
}

#[tokio::test]
async fn reports_stream_to_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.jsonl");
    let mut sink = JsonlSink::create(&path).unwrap();

    let mut scheduler = scheduler_over(Arc::new(flat_world()), Inventory::new());
    scheduler.enqueue(Task::Goto {
        position: Position::new(1, 0, 1),
    });
    scheduler.enqueue(Task::Get {
        item: ItemId::new("planks"),
        count: 1,
    });
    while let Some(report) = scheduler.run_next().await {
        sink.write("task_report", &report.unwrap()).unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["payload"]["status"], "completed");
    assert_eq!(lines[1]["payload"]["status"], "failed");
    assert_eq!(lines[1]["payload"]["task"]["item"], "planks");
}

/// Delegates to a [`SimWorld`] and requests a stop after a number of moves.
struct StopAfterMoves {
    inner: Arc<SimWorld>,
    stop: StopHandle,
    moves_left: AtomicU32,
}

#[async_trait]
impl WorldQuery for StopAfterMoves {
    fn player_position(&self) -> Result<Position, WorldError> {
        self.inner.player_position()
    }

    fn block_at(&self, pos: Position) -> Result<BlockId, WorldError> {
        self.inner.block_at(pos)
    }

    fn find_nearest_block(
        &self,
        block: &BlockId,
        radius: u32,
    ) -> Result<Option<Position>, WorldError> {
        self.inner.find_nearest_block(block, radius)
    }

    fn find_nearest_entity(
        &self,
        pattern: &str,
        radius: u32,
    ) -> Result<Option<EntityRef>, WorldError> {
        self.inner.find_nearest_entity(pattern, radius)
    }

    fn entity_alive(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        self.inner.entity_alive(handle)
    }

    async fn move_to(&self, pos: Position) -> Result<bool, WorldError> {
        let moved = self.inner.move_to(pos).await?;
        if self.moves_left.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.stop.request();
        }
        Ok(moved)
    }

    async fn look_at(&self, pos: Position) -> Result<(), WorldError> {
        self.inner.look_at(pos).await
    }

    async fn break_block(&self, pos: Position) -> Result<bool, WorldError> {
        self.inner.break_block(pos).await
    }

    async fn place_block(&self, against: Position, face: Face) -> Result<bool, WorldError> {
        self.inner.place_block(against, face).await
    }

    async fn select_item(&self, item: &ItemId) -> Result<bool, WorldError> {
        self.inner.select_item(item).await
    }

    async fn open_craft_surface(&self, surface: CraftSurface) -> Result<bool, WorldError> {
        self.inner.open_craft_surface(surface).await
    }

    async fn craft_with_grid(
        &self,
        grid: &RecipeGrid,
        surface: CraftSurface,
    ) -> Result<bool, WorldError> {
        self.inner.craft_with_grid(grid, surface).await
    }

    async fn smelt(
        &self,
        station: Position,
        input: &ItemId,
        count: u32,
        fuel: Option<&ItemId>,
    ) -> Result<bool, WorldError> {
        self.inner.smelt(station, input, count, fuel).await
    }

    async fn attack(&self, handle: EntityHandle) -> Result<bool, WorldError> {
        self.inner.attack(handle).await
    }
}

#[tokio::test]
async fn stop_cancels_only_the_active_route() {
    let sim = Arc::new(flat_world());
    let stop = StopHandle::new();
    let world = Arc::new(StopAfterMoves {
        inner: sim.clone(),
        stop: stop.clone(),
        moves_left: AtomicU32::new(3),
    });
    let mut ctx = AgentContext::new(
        Arc::new(ItemCatalog::new()),
        AgentSettings::default(),
        world,
    );
    ctx.stop = stop;
    let mut scheduler = TaskScheduler::new(ctx);
    scheduler.enqueue(Task::Goto {
        position: Position::new(10, 0, 0),
    });
    scheduler.enqueue(Task::Goto {
        position: Position::new(0, 0, 2),
    });

    let reports = scheduler.run().await.unwrap();

    assert_eq!(
        reports[0].outcome,
        TaskOutcome::Failed {
            kind: FailureKind::Execution,
            reason: "cancelled".into(),
        }
    );
    assert!(reports[1].succeeded());
    assert_eq!(sim.player_position().unwrap(), Position::new(0, 0, 2));
}
