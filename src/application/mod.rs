//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `SyncEngine` - Walks a tree between two transports or delegates the run
//! - `CancelToken` - Cooperative cancellation shared with the CLI

pub mod cancel;
pub mod sync;

pub use cancel::CancelToken;
pub use sync::{SyncEngine, SyncReport, SyncRequest};
