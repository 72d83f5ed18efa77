//! Shared infrastructure for the database crates: the common error type and result alias.

pub use error::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

mod error;
