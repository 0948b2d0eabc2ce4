use std::fmt;
use std::path::PathBuf;
use voxbot_agent::{Blueprint, Task, TaskScheduler};
use voxbot_core::{ItemId, Position};

const SUGGESTION_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCoordArg {
    Absolute(i32),
    Relative(i32),
}

impl BlockCoordArg {
    fn resolve(self, base: i32) -> i32 {
        match self {
            BlockCoordArg::Absolute(v) => v,
            BlockCoordArg::Relative(delta) => base.saturating_add(delta),
        }
    }

    fn is_relative(self) -> bool {
        matches!(self, BlockCoordArg::Relative(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Get {
        item: ItemId,
        count: u32,
    },
    Goto {
        x: BlockCoordArg,
        y: BlockCoordArg,
        z: BlockCoordArg,
    },
    Build {
        path: PathBuf,
    },
    Run,
    Stop,
    Clear,
    Queue,
    Inv,
    Suggest {
        query: String,
    },
    Help,
}

#[derive(Debug, Default, Clone)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    /// Set by `run`: the caller should drain the queue now.
    pub run_requested: bool,
}

impl CommandOutput {
    fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            run_requested: false,
        }
    }
}

pub fn help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  get <item> [count]      queue gathering/crafting up to count".to_string(),
        "  goto <x> <y> <z>        queue a walk (use ~ for relative)".to_string(),
        "  build <file>            queue a blueprint build".to_string(),
        "  run                     run every queued task".to_string(),
        "  stop                    cancel the running or next task".to_string(),
        "  clear                   drop queued tasks".to_string(),
        "  queue                   list queued tasks".to_string(),
        "  inv                     show the inventory".to_string(),
        "  suggest <text>          list matching item ids".to_string(),
        "  help".to_string(),
    ]
}

/// Apply a console command to the scheduler.
///
/// `run` is only flagged in the output; draining the queue is left to the
/// caller so reports can be streamed as tasks finish.
pub fn execute_command(scheduler: &mut TaskScheduler, command: ConsoleCommand) -> CommandOutput {
    match command {
        ConsoleCommand::Help => CommandOutput {
            lines: help_lines(),
            run_requested: false,
        },
        ConsoleCommand::Get { item, count } => {
            let mut out = CommandOutput::default();
            if !scheduler.context().catalog.contains(&item) {
                let hints = suggestions(scheduler, item.as_str());
                if hints.is_empty() {
                    out.lines.push(format!("Warning: {item} is not in the catalog"));
                } else {
                    out.lines.push(format!(
                        "Warning: {item} is not in the catalog (did you mean {}?)",
                        hints.join(", ")
                    ));
                }
            }
            let task = Task::Get { item, count };
            out.lines.push(format!("Queued: {task}"));
            scheduler.enqueue(task);
            out
        }
        ConsoleCommand::Goto { x, y, z } => {
            let base = if x.is_relative() || y.is_relative() || z.is_relative() {
                match scheduler.context().world.player_position() {
                    Ok(pos) => pos,
                    Err(err) => return CommandOutput::line(format!("Error: {err}")),
                }
            } else {
                Position::ORIGIN
            };
            let task = Task::Goto {
                position: Position::new(x.resolve(base.x), y.resolve(base.y), z.resolve(base.z)),
            };
            let out = CommandOutput::line(format!("Queued: {task}"));
            scheduler.enqueue(task);
            out
        }
        ConsoleCommand::Build { path } => match Blueprint::load(&path) {
            Ok(blueprint) => {
                let task = Task::Build { blueprint };
                let out = CommandOutput::line(format!("Queued: {task}"));
                scheduler.enqueue(task);
                out
            }
            Err(err) => CommandOutput::line(format!("Error: {err:#}")),
        },
        ConsoleCommand::Run => CommandOutput {
            lines: vec![format!("Running {} task(s)", scheduler.len())],
            run_requested: true,
        },
        ConsoleCommand::Stop => {
            scheduler.stop();
            match scheduler.snapshot().first() {
                Some(task) => {
                    CommandOutput::line(format!("Stop requested: {task} will be cancelled"))
                }
                None => CommandOutput::line("Stop requested: the next task will be cancelled"),
            }
        }
        ConsoleCommand::Clear => {
            let dropped = scheduler.clear();
            CommandOutput::line(format!("Cleared {dropped} task(s)"))
        }
        ConsoleCommand::Queue => {
            let tasks = scheduler.snapshot();
            if tasks.is_empty() {
                return CommandOutput::line("Queue is empty");
            }
            CommandOutput {
                lines: tasks
                    .iter()
                    .enumerate()
                    .map(|(i, task)| format!("{}. {task}", i + 1))
                    .collect(),
                run_requested: false,
            }
        }
        ConsoleCommand::Inv => {
            let inventory = &scheduler.context().inventory;
            if inventory.is_empty() {
                return CommandOutput::line("Inventory is empty");
            }
            CommandOutput {
                lines: inventory
                    .iter()
                    .map(|(item, count)| format!("{item} x{count}"))
                    .collect(),
                run_requested: false,
            }
        }
        ConsoleCommand::Suggest { query } => {
            let hints = suggestions(scheduler, &query);
            if hints.is_empty() {
                CommandOutput::line(format!("No items match '{query}'"))
            } else {
                CommandOutput::line(hints.join(", "))
            }
        }
    }
}

fn suggestions(scheduler: &TaskScheduler, query: &str) -> Vec<String> {
    scheduler
        .context()
        .catalog
        .suggest(query, SUGGESTION_LIMIT)
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

pub fn parse_command(input: &str) -> Result<ConsoleCommand, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input).trim();
    if input.is_empty() {
        return Ok(ConsoleCommand::Help);
    }

    let mut parts = input.split_whitespace();
    let cmd = parts
        .next()
        .ok_or_else(|| CommandError::new("Missing command"))?
        .to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "help" | "?" => Ok(ConsoleCommand::Help),
        "get" => {
            if !(1..=2).contains(&args.len()) {
                return Err(CommandError::new("Usage: get <item> [count]"));
            }
            let count = if args.len() == 2 {
                parse_positive_u32(args[1])
                    .ok_or_else(|| CommandError::new(format!("Invalid count: {}", args[1])))?
            } else {
                1
            };
            Ok(ConsoleCommand::Get {
                item: ItemId::new(args[0]),
                count,
            })
        }
        "goto" => {
            if args.len() != 3 {
                return Err(CommandError::new("Usage: goto <x> <y> <z>"));
            }
            Ok(ConsoleCommand::Goto {
                x: parse_block_coord(args[0])?,
                y: parse_block_coord(args[1])?,
                z: parse_block_coord(args[2])?,
            })
        }
        "build" => {
            if args.len() != 1 {
                return Err(CommandError::new("Usage: build <file>"));
            }
            Ok(ConsoleCommand::Build {
                path: PathBuf::from(args[0]),
            })
        }
        "suggest" => {
            if args.len() != 1 {
                return Err(CommandError::new("Usage: suggest <text>"));
            }
            Ok(ConsoleCommand::Suggest {
                query: args[0].to_string(),
            })
        }
        "run" | "stop" | "clear" | "queue" | "inv" if !args.is_empty() => Err(CommandError::new(
            format!("Usage: {cmd} (takes no arguments)"),
        )),
        "run" => Ok(ConsoleCommand::Run),
        "stop" => Ok(ConsoleCommand::Stop),
        "clear" => Ok(ConsoleCommand::Clear),
        "queue" => Ok(ConsoleCommand::Queue),
        "inv" | "inventory" => Ok(ConsoleCommand::Inv),
        _ => Err(CommandError::new(format!(
            "Unknown command: {cmd}. Try help"
        ))),
    }
}

fn parse_positive_u32(s: &str) -> Option<u32> {
    s.parse::<u32>().ok().filter(|value| *value > 0)
}

fn parse_block_coord(s: &str) -> Result<BlockCoordArg, CommandError> {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix('~') {
        if rest.is_empty() {
            return Ok(BlockCoordArg::Relative(0));
        }
        let delta = rest
            .parse::<i32>()
            .map_err(|_| CommandError::new(format!("Invalid relative coordinate: {s}")))?;
        return Ok(BlockCoordArg::Relative(delta));
    }
    let value = s
        .parse::<i32>()
        .map_err(|_| CommandError::new(format!("Invalid coordinate: {s}")))?;
    Ok(BlockCoordArg::Absolute(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use voxbot_agent::{AgentContext, AgentSettings};
    use voxbot_core::ItemCatalog;
    use voxbot_world::SimWorld;

    fn scheduler() -> TaskScheduler {
        let mut world = SimWorld::new(Default::default());
        world.set_player(Position::new(4, 0, -2));
        let ctx = AgentContext::new(
            Arc::new(ItemCatalog::with_defaults()),
            AgentSettings::default(),
            Arc::new(world),
        );
        TaskScheduler::new(ctx)
    }

    #[test]
    fn parses_get_with_and_without_count() {
        assert_eq!(
            parse_command("get planks 5").unwrap(),
            ConsoleCommand::Get {
                item: ItemId::new("planks"),
                count: 5
            }
        );
        assert_eq!(
            parse_command("/GET stick").unwrap(),
            ConsoleCommand::Get {
                item: ItemId::new("stick"),
                count: 1
            }
        );
        assert!(parse_command("get planks 0").is_err());
        assert!(parse_command("get").is_err());
    }

    #[test]
    fn parses_relative_coordinates() {
        assert_eq!(
            parse_command("goto ~ 0 ~-3").unwrap(),
            ConsoleCommand::Goto {
                x: BlockCoordArg::Relative(0),
                y: BlockCoordArg::Absolute(0),
                z: BlockCoordArg::Relative(-3),
            }
        );
        let err = parse_command("goto 1 two 3").unwrap_err();
        assert!(err.to_string().contains("Invalid coordinate"));
    }

    #[test]
    fn rejects_unknown_and_malformed_commands() {
        assert!(parse_command("dance")
            .unwrap_err()
            .to_string()
            .contains("Unknown command"));
        assert!(parse_command("run now").is_err());
        assert_eq!(parse_command("   ").unwrap(), ConsoleCommand::Help);
    }

    #[test]
    fn goto_resolves_against_the_player() {
        let mut scheduler = scheduler();
        let command = parse_command("goto ~1 ~ ~2").unwrap();

        let out = execute_command(&mut scheduler, command);

        assert_eq!(out.lines, vec!["Queued: goto (5, 0, 0)".to_string()]);
        assert_eq!(
            scheduler.snapshot(),
            vec![Task::Goto {
                position: Position::new(5, 0, 0)
            }]
        );
    }

    #[test]
    fn queue_clear_and_run_report_state() {
        let mut scheduler = scheduler();
        execute_command(&mut scheduler, parse_command("get stick 2").unwrap());
        execute_command(&mut scheduler, parse_command("goto 1 0 1").unwrap());

        let listed = execute_command(&mut scheduler, ConsoleCommand::Queue);
        assert_eq!(listed.lines, vec!["1. get 2 stick", "2. goto (1, 0, 1)"]);

        let run = execute_command(&mut scheduler, ConsoleCommand::Run);
        assert!(run.run_requested);

        let cleared = execute_command(&mut scheduler, ConsoleCommand::Clear);
        assert_eq!(cleared.lines, vec!["Cleared 2 task(s)"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn stop_names_the_task_it_cancels() {
        let mut scheduler = scheduler();
        execute_command(&mut scheduler, parse_command("goto 1 0 1").unwrap());

        let out = execute_command(&mut scheduler, ConsoleCommand::Stop);

        assert_eq!(
            out.lines,
            vec!["Stop requested: goto (1, 0, 1) will be cancelled"]
        );
        assert!(scheduler.stop_handle().is_requested());
    }

    #[test]
    fn unknown_items_are_queued_with_hints() {
        let mut scheduler = scheduler();
        let out = execute_command(&mut scheduler, parse_command("get plank").unwrap());
        assert!(out.lines[0].contains("did you mean planks"), "{:?}", out.lines);
        assert_eq!(scheduler.len(), 1);

        let out = execute_command(&mut scheduler, parse_command("suggest pick").unwrap());
        assert!(out.lines[0].contains("wooden_pickaxe"));
    }

    #[test]
    fn missing_blueprint_is_reported() {
        let mut scheduler = scheduler();
        let out = execute_command(
            &mut scheduler,
            parse_command("build /nonexistent/house.json").unwrap(),
        );
        assert!(out.lines[0].starts_with("Error:"));
        assert!(scheduler.is_empty());
    }
}
