//! Lightweight sqlite wrapper on top of the sqlite3-sys crate that manages the lifetime of the
//! native connection and statement handles.
//!
//! A [`Connection`] owns the database handle and tracks every [`PreparedStatement`] and
//! [`ResultSet`] created from it. Handles are released exactly once, statements are always
//! released before the connection they depend on, and any use of a released handle is reported as
//! an error instead of reaching the engine.

mod connection;
pub mod errorcode;
mod handle;
mod resultset;
mod row;
mod statement;
mod value;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    /// Read-write, the database is created when it does not exist
    #[default]
    Create,
}

pub use connection::{Connection, OpenOptions};
pub use resultset::{ResultSet, TypedRows};
pub use row::{ColumnType, Row};
pub use statement::{PreparedStatement, StatementState};
pub use value::{FieldValue, FromField};

pub type Error = inf::Error;
pub type Result<T> = inf::Result<T>;
