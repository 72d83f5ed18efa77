//! Safe lifecycle management for SQLite connections, prepared statements and result sets.
//!
//! The actual wrapper lives in the `sqlite` crate (enabled by the default `sqlite` feature),
//! the shared error type in `inf`.

pub use inf::{Error, Result};

pub use inf;
#[cfg(feature = "sqlite")]
pub use sqlite;
