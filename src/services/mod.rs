//! Business logic services for the progression engine.
//!
//! Services hold the shared configuration and apply the gating and
//! visibility rules; all player-state mutation funnels through them.

mod gate;
mod session;
mod visibility;

pub use gate::{AccessDenial, ProgressionEvent, ProgressionGate};
pub use session::{NavOutcome, Session};
pub use visibility::VisibilityResolver;
