//! Labyrinth - Dimensional Knowledge Graph Progression Engine
//!
//! Decides, per node of a dimensional knowledge graph, whether a player may
//! navigate to it (dual-gate progression: clearance and source depth, with
//! anchor prerequisites and a bypass tag) and how it is displayed
//! (three-tier visibility overrides composed with unlock state).

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod models;
pub mod services;

pub use context::Context;
pub use error::AppError;
