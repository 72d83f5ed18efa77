use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to open database '{path}': {message}")]
    OpenFailure { path: String, message: String },
    #[error("Attempted operation on a closed database")]
    DatabaseClosed,
    #[error("Attempted operation on a closed statement")]
    StatementClosed,
    #[error("Value error: {0}")]
    ValueError(String),
    #[error("SQLite error: {message}")]
    Sqlite {
        code: i32,
        extended_code: i32,
        message: String,
    },
    #[error("Invalid string: {0}")]
    InvalidString(#[from] std::ffi::NulError),
}

impl Error {
    /// The primary engine result code, only available for engine errors
    pub fn sqlite_code(&self) -> Option<i32> {
        match self {
            Error::Sqlite { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn sqlite_extended_code(&self) -> Option<i32> {
        match self {
            Error::Sqlite { extended_code, .. } => Some(*extended_code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn display_messages() {
        assert_eq!(
            Error::DatabaseClosed.to_string(),
            "Attempted operation on a closed database"
        );
        assert_eq!(
            Error::ValueError("Too many values".to_string()).to_string(),
            "Value error: Too many values"
        );

        let err = Error::Sqlite {
            code: 19,
            extended_code: 1555,
            message: "Primary key constraint failed".to_string(),
        };
        assert_eq!(err.to_string(), "SQLite error: Primary key constraint failed");
        assert_eq!(err.sqlite_code(), Some(19));
        assert_eq!(err.sqlite_extended_code(), Some(1555));
        assert_eq!(Error::StatementClosed.sqlite_code(), None);
    }

    #[test_log::test]
    fn nul_error_conversion() {
        let err: Error = std::ffi::CString::new("a\0b").unwrap_err().into();
        assert!(matches!(err, Error::InvalidString(_)));
    }
}
