//! Domain Services
//!
//! Stateless services containing business logic that doesn't naturally
//! belong to any entity or value object.

mod planner;

pub use planner::{Planner, SyncAction};
