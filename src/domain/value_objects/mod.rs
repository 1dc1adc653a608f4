//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod direction;
mod path_filter;
pub mod relative_path;

pub use direction::SyncDirection;
pub use path_filter::{FilterChain, PathFilter};
pub use relative_path::PathError;
