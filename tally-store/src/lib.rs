//! Persistent touchpoint storage for tally.
//!
//! [`TursoTouchpointStore`] implements the `tally-core` store traits on
//! libSQL. It can connect to:
//! - Local embedded SQLite file
//! - Remote Turso database (cloud)
//! - In-memory database (tests, ephemeral runs)

mod error;
mod turso;

pub use error::{Error, Result};
pub use turso::TursoTouchpointStore;
