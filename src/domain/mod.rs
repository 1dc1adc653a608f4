//! Domain Layer
//!
//! The core of treesync - sync policy without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Endpoints, configuration, tree entries
//! - `value_objects/` - Direction, path filters, relative paths
//! - `services/` - The diff planner
//! - `ports/` - The `Transport` interface implemented by infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never touches the file system or network directly
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - All I/O goes through trait-defined ports

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
