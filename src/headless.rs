use crate::command_script::CommandScript;
use crate::commands::{execute_command, parse_command};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use voxbot_agent::{AgentContext, AgentSettings, TaskOutcome, TaskReport, TaskScheduler};
use voxbot_core::{ItemCatalog, Position};
use voxbot_testkit::JsonlSink;
use voxbot_world::{resolve_world, SimConfig, SimWorld, WorldDiscovery, WorldError, WorldQuery};

pub struct HeadlessConfig {
    pub settings: AgentSettings,
    pub catalog: ItemCatalog,
    pub world_layout: Option<PathBuf>,
    pub command_script: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub commands: Vec<String>,
}

/// Simulated world, from a layout file or the built-in demo.
pub struct SimDiscovery {
    layout: Option<PathBuf>,
}

impl SimDiscovery {
    pub fn new(layout: Option<PathBuf>) -> Self {
        Self { layout }
    }
}

impl WorldDiscovery for SimDiscovery {
    fn name(&self) -> &str {
        match self.layout {
            Some(_) => "sim-layout",
            None => "sim-demo",
        }
    }

    fn discover(&self) -> Result<Arc<dyn WorldQuery>, WorldError> {
        let world = match &self.layout {
            Some(path) => SimWorld::load_layout(path)
                .map_err(|err| WorldError::Unavailable(format!("{err:#}")))?,
            None => demo_world(),
        };
        Ok(Arc::new(world))
    }
}

/// Small world with one of everything the built-in catalog can gather.
pub fn demo_world() -> SimWorld {
    let mut world = SimWorld::new(SimConfig::default());
    for x in 3..7 {
        world.set_block(Position::new(x, 0, 2), "oak_log");
    }
    world.set_block(Position::new(-3, 0, 3), "sand");
    world.set_block(Position::new(-4, 0, 3), "sand");
    world.fill(Position::new(-6, 0, -6), Position::new(-4, 1, -4), "stone");
    world.set_block(Position::new(-6, 0, -3), "coal_ore");
    world.set_block(Position::new(2, 0, -3), "crafting_table");
    world.spawn_entity("cow", Position::new(8, 0, -6), None);
    world
}

/// Interactive state for one headless run.
pub struct Session {
    scheduler: TaskScheduler,
    sink: Option<JsonlSink>,
    shutdown: Arc<AtomicBool>,
}

impl Session {
    pub fn new(scheduler: TaskScheduler, sink: Option<JsonlSink>) -> Self {
        Self {
            scheduler,
            sink,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Cancel the active route and stop taking tasks on Ctrl-C.
    pub fn install_interrupt_handler(&self) {
        let stop = self.scheduler.stop_handle();
        let shutdown = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping the active task");
                shutdown.store(true, Ordering::SeqCst);
                stop.request();
            }
        });
    }

    /// Parse and apply one console line, draining the queue on `run`.
    pub async fn handle_line(&mut self, line: &str) -> Result<Vec<TaskReport>> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => {
                println!("Error: {err}");
                return Ok(Vec::new());
            }
        };
        let out = execute_command(&mut self.scheduler, command);
        for line in &out.lines {
            println!("{line}");
        }
        if out.run_requested {
            return self.drain().await;
        }
        Ok(Vec::new())
    }

    /// Run queued tasks in order, writing each report as it lands.
    pub async fn drain(&mut self) -> Result<Vec<TaskReport>> {
        let mut reports = Vec::new();
        while !self.is_shut_down() {
            let Some(report) = self.scheduler.run_next().await else {
                break;
            };
            let report = report.context("world adapter failed")?;
            println!("{}", describe(&report));
            if let Some(sink) = self.sink.as_mut() {
                sink.write("task_report", &report)?;
            }
            reports.push(report);
        }
        Ok(reports)
    }
}

fn describe(report: &TaskReport) -> String {
    match &report.outcome {
        TaskOutcome::Completed => {
            format!("done: {} ({} ms)", report.task, report.elapsed_ms)
        }
        TaskOutcome::Failed { kind, reason } => {
            format!("failed: {} [{kind:?}] {reason}", report.task)
        }
    }
}

pub async fn run(cfg: HeadlessConfig) -> Result<Vec<TaskReport>> {
    let sources: Vec<Box<dyn WorldDiscovery>> =
        vec![Box::new(SimDiscovery::new(cfg.world_layout.clone()))];
    let world = resolve_world(&sources)?;

    let ctx = AgentContext::new(Arc::new(cfg.catalog), cfg.settings, world);
    let sink = cfg
        .report
        .as_ref()
        .map(JsonlSink::create)
        .transpose()
        .context("creating report file")?;
    let mut session = Session::new(TaskScheduler::new(ctx), sink);
    session.install_interrupt_handler();

    let mut lines = Vec::new();
    if let Some(path) = &cfg.command_script {
        let mut script = CommandScript::from_path(path)?;
        while let Some(command) = script.next_command() {
            lines.push(command);
        }
    }
    lines.extend(cfg.commands);

    let mut reports = Vec::new();
    for line in &lines {
        if session.is_shut_down() {
            break;
        }
        reports.extend(session.handle_line(line).await?);
    }
    if !session.scheduler().is_empty() && !session.is_shut_down() {
        info!(tasks = session.scheduler().len(), "Running remaining tasks");
        reports.extend(session.drain().await?);
    }

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    info!(tasks = reports.len(), failed, "Headless run finished");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(commands: &[&str]) -> HeadlessConfig {
        HeadlessConfig {
            settings: AgentSettings::default(),
            catalog: ItemCatalog::with_defaults(),
            world_layout: None,
            command_script: None,
            report: None,
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn demo_world_runs_queued_commands_at_end_of_input() {
        let reports = run(config(&["get planks 4", "goto ~1 0 ~1", "get diamond"]))
            .await
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert!(reports[0].succeeded(), "{:?}", reports[0]);
        assert!(reports[1].succeeded(), "{:?}", reports[1]);
        assert!(!reports[2].succeeded());
    }

    #[tokio::test]
    async fn console_stop_cancels_the_next_task_only() {
        let reports = run(config(&["goto 3 0 0", "stop", "run", "goto 0 0 2"]))
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].outcome,
            TaskOutcome::Failed {
                kind: voxbot_agent::FailureKind::Execution,
                reason: "cancelled".into(),
            }
        );
        assert!(reports[1].succeeded(), "{:?}", reports[1]);
    }

    #[tokio::test]
    async fn script_and_report_file_work_together() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.json");
        fs::write(
            &script,
            r#"{"steps": [{"command": "goto 0 0 4"}, {"command": "run"}, {"command": "bogus"}]}"#,
        )
        .unwrap();
        let report = dir.path().join("out").join("reports.jsonl");

        let reports = run(HeadlessConfig {
            command_script: Some(script),
            report: Some(report.clone()),
            ..config(&["goto 1 0 4"])
        })
        .await
        .unwrap();

        assert_eq!(reports.len(), 2);
        let contents = fs::read_to_string(&report).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"status\":\"completed\""));
    }

    #[test]
    fn missing_layout_is_unavailable() {
        let discovery = SimDiscovery::new(Some(PathBuf::from("/nonexistent/world.json")));
        assert!(matches!(
            discovery.discover(),
            Err(WorldError::Unavailable(_))
        ));
    }

    #[test]
    fn demo_world_has_a_station_and_a_cow() {
        let world = demo_world();
        assert!(world
            .find_nearest_block(&"crafting_table".into(), 16)
            .unwrap()
            .is_some());
        assert_eq!(world.entity_count(), 1);
    }
}
