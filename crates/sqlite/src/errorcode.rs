//! Translation of engine result codes into readable error messages.

use crate::Error;
use libsqlite3_sys as ffi;
use std::ffi::c_int;

pub fn primary_message(code: c_int) -> Option<&'static str> {
    let msg = match code {
        ffi::SQLITE_ERROR => "SQLITE_ERROR: Generic SQLite Error",
        ffi::SQLITE_INTERNAL => "SQLITE_INTERNAL: Internal logic error in SQLite",
        ffi::SQLITE_PERM => "SQLITE_PERM: Access permission denied",
        ffi::SQLITE_ABORT => "SQLITE_ABORT: Operation aborted",
        ffi::SQLITE_BUSY => "SQLITE_BUSY: The database file is locked",
        ffi::SQLITE_LOCKED => "SQLITE_LOCKED: A table in the database is locked",
        ffi::SQLITE_NOMEM => "SQLITE_NOMEM: Out of memory",
        ffi::SQLITE_READONLY => "SQLITE_READONLY: Attempt to write a readonly database",
        ffi::SQLITE_INTERRUPT => "SQLITE_INTERRUPT: Operation interrupted",
        ffi::SQLITE_IOERR => "SQLITE_IOERR: Disk I/O error",
        ffi::SQLITE_CORRUPT => "SQLITE_CORRUPT: The database disk image is malformed",
        ffi::SQLITE_FULL => "SQLITE_FULL: The database is full",
        ffi::SQLITE_CANTOPEN => "SQLITE_CANTOPEN: Unable to open the database file",
        ffi::SQLITE_PROTOCOL => "SQLITE_PROTOCOL: Database lock protocol error",
        ffi::SQLITE_SCHEMA => "SQLITE_SCHEMA: The database schema changed",
        ffi::SQLITE_TOOBIG => "SQLITE_TOOBIG: String or blob exceeds size limit",
        ffi::SQLITE_CONSTRAINT => "SQLITE_CONSTRAINT: SQL constraint violated",
        ffi::SQLITE_MISMATCH => "SQLITE_MISMATCH: Data type mismatch",
        ffi::SQLITE_MISUSE => "SQLITE_MISUSE: Library used incorrectly",
        ffi::SQLITE_AUTH => "SQLITE_AUTH: Authorization denied",
        ffi::SQLITE_RANGE => "SQLITE_RANGE: Bind or column index out of range",
        ffi::SQLITE_NOTADB => "SQLITE_NOTADB: File is not a database",
        _ => return None,
    };

    Some(msg)
}

pub fn extended_message(code: c_int) -> Option<&'static str> {
    let msg = match code {
        ffi::SQLITE_CONSTRAINT_CHECK => "SQLITE_CONSTRAINT_CHECK: Check constraint failed",
        ffi::SQLITE_CONSTRAINT_COMMITHOOK => "SQLITE_CONSTRAINT_COMMITHOOK: Commit hook caused rollback",
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => "SQLITE_CONSTRAINT_FOREIGNKEY: Foreign key constraint failed",
        ffi::SQLITE_CONSTRAINT_FUNCTION => "SQLITE_CONSTRAINT_FUNCTION: Function constraint failed",
        ffi::SQLITE_CONSTRAINT_NOTNULL => "SQLITE_CONSTRAINT_NOTNULL: Not null constraint failed",
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => "SQLITE_CONSTRAINT_PRIMARYKEY: Primary key constraint failed",
        ffi::SQLITE_CONSTRAINT_TRIGGER => "SQLITE_CONSTRAINT_TRIGGER: Trigger raised a constraint failure",
        ffi::SQLITE_CONSTRAINT_UNIQUE => "SQLITE_CONSTRAINT_UNIQUE: Unique constraint failed",
        ffi::SQLITE_CONSTRAINT_VTAB => "SQLITE_CONSTRAINT_VTAB: Virtual table constraint failed",
        ffi::SQLITE_CONSTRAINT_ROWID => "SQLITE_CONSTRAINT_ROWID: Rowid constraint failed",
        _ => return None,
    };

    Some(msg)
}

/// Resolve the message for a failure, the extended code wins when both codes are known.
/// Unknown primary codes degrade to `Code {n}`.
pub fn error_message(code: c_int, extended_code: c_int) -> String {
    match (primary_message(code), extended_message(extended_code)) {
        (Some(_), Some(ext_msg)) => ext_msg.to_string(),
        (Some(msg), None) => msg.to_string(),
        (None, _) => format!("Code {code}"),
    }
}

/// Build the engine error, the optional detail is the engine's own description of the failure
pub fn sqlite_error(code: c_int, extended_code: c_int, detail: Option<&str>) -> Error {
    let mut message = error_message(code, extended_code);
    if let Some(detail) = detail.filter(|d| !d.is_empty()) {
        message = format!("{message} ({detail})");
    }

    Error::Sqlite {
        code,
        extended_code,
        message,
    }
}
