//! Sync Module
//!
//! ## Structure
//!
//! - `options` - Per-call request (`SyncRequest`)
//! - `report` - Run outcome (`SyncReport`)
//! - `engine` - Tree walk and delegation (`SyncEngine`)
//!
//! ## Usage
//!
//! ```ignore
//! use treesync::application::sync::SyncEngine;
//!
//! let engine = SyncEngine::new().with_cancel(token);
//! let report = engine.sync(&config, SyncDirection::ToDestination, &[], false, &FilterChain::new())?;
//! ```

mod engine;
mod options;
mod report;

pub use engine::SyncEngine;
pub use options::SyncRequest;
pub use report::SyncReport;
