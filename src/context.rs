//! Application context wiring configuration and data into services.

use std::sync::Arc;

use crate::config::Config;
use crate::models::Atlas;
use crate::services::{ProgressionGate, Session, VisibilityResolver};

/// Root context for one loaded graph.
///
/// Holds the shared, read-only dependencies; services and sessions are
/// constructed from it. A host keeps one context per loaded atlas and one
/// session per active player.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Loaded node collection.
    pub atlas: Arc<Atlas>,
}

impl Context {
    /// Creates a new context with the given dependencies.
    pub fn new(config: Config, atlas: Atlas) -> Self {
        Self {
            config: Arc::new(config),
            atlas: Arc::new(atlas),
        }
    }

    /// Builds the accessibility gate service.
    pub fn gate(&self) -> ProgressionGate {
        ProgressionGate::new(self.config.clone())
    }

    /// Builds the visibility resolver service.
    pub fn resolver(&self) -> VisibilityResolver {
        VisibilityResolver::new(self.config.clone())
    }

    /// Starts a fresh session at the atlas entry node.
    pub fn session(&self) -> Session {
        Session::new(self.config.clone(), self.atlas.clone())
    }
}
