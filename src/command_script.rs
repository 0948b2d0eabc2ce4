use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};

#[derive(Debug, Deserialize)]
struct CommandScriptFile {
    steps: Vec<CommandScriptStep>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommandScriptStep {
    command: String,
}

/// Console commands read from a JSON file, replayed in file order.
///
/// Scripts are a list of `{command}` steps.
#[derive(Debug)]
pub struct CommandScript {
    pending: VecDeque<String>,
}

impl CommandScript {
    /// Load a command script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading command script {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load a command script from an in-memory JSON string.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: CommandScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("command script contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        for step in file.steps {
            let command = step.command.trim().to_string();
            if command.is_empty() {
                anyhow::bail!("command script contains an empty command");
            }
            pending.push_back(command);
        }
        Ok(Self { pending })
    }

    /// Take the next command, if any.
    pub fn next_command(&mut self) -> Option<String> {
        self.pending.pop_front()
    }
}
