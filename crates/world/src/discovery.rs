//! Finding a usable world at startup.
//!
//! The runner asks each registered source in order and keeps the first one
//! that yields a world.

use crate::query::{WorldError, WorldQuery};
use std::sync::Arc;
use tracing::{debug, info};

/// A place a world can come from.
pub trait WorldDiscovery: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Produce a world, or explain why none is available.
    fn discover(&self) -> Result<Arc<dyn WorldQuery>, WorldError>;
}

/// Discovery that always yields the same pre-built world.
pub struct StaticDiscovery {
    name: String,
    world: Arc<dyn WorldQuery>,
}

impl StaticDiscovery {
    /// Wrap an existing world.
    pub fn new(name: impl Into<String>, world: Arc<dyn WorldQuery>) -> Self {
        Self {
            name: name.into(),
            world,
        }
    }
}

impl WorldDiscovery for StaticDiscovery {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&self) -> Result<Arc<dyn WorldQuery>, WorldError> {
        Ok(Arc::clone(&self.world))
    }
}

/// Try each source in order and return the first world found.
pub fn resolve_world(
    sources: &[Box<dyn WorldDiscovery>],
) -> Result<Arc<dyn WorldQuery>, WorldError> {
    let mut reasons = Vec::new();
    for source in sources {
        match source.discover() {
            Ok(world) => {
                info!(source = source.name(), "World attached");
                return Ok(world);
            }
            Err(err) => {
                debug!(source = source.name(), error = %err, "World source unavailable");
                reasons.push(format!("{}: {}", source.name(), err));
            }
        }
    }
    if reasons.is_empty() {
        return Err(WorldError::Unavailable("no world sources registered".into()));
    }
    Err(WorldError::Unavailable(reasons.join("; ")))
}
