use crate::handle::HandleGuard;
use crate::statement::StatementHandle;
use crate::{AccessMode, Error, PreparedStatement, Result, ResultSet, errorcode};
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr::NonNull;
use std::rc::{Rc, Weak};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    mode: AccessMode,
    busy_timeout: Option<Duration>,
    foreign_keys: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Let the engine wait up to `timeout` for locks held by other connections instead of
    /// failing immediately with a busy error.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn open(&self, db_path: impl AsRef<Path>) -> Result<Connection> {
        let db_path = db_path.as_ref();
        let mut db: *mut libsqlite3_sys::sqlite3 = std::ptr::null_mut();
        let c_path = CString::new(db_path.to_string_lossy().to_string())?;
        let flags = access_mode_flags(self.mode);
        let rc = unsafe { libsqlite3_sys::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, std::ptr::null()) };
        if rc != libsqlite3_sys::SQLITE_OK {
            let message = match NonNull::new(db) {
                Some(db) => last_sqlite_error(db),
                None => errorcode::error_message(rc, rc),
            };
            // the engine allocates a handle even when opening fails, closing a null handle is a no-op
            unsafe { libsqlite3_sys::sqlite3_close_v2(db) };
            return Err(Error::OpenFailure {
                path: db_path.to_string_lossy().to_string(),
                message,
            });
        }

        let conn = Connection {
            db: HandleGuard::new(db),
            statements: RefCell::new(Vec::new()),
            last_error: RefCell::new(None),
        };

        if let Some(timeout) = self.busy_timeout {
            let millis = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
            unsafe { libsqlite3_sys::sqlite3_busy_timeout(db, millis) };
        }

        if self.foreign_keys {
            conn.exec("PRAGMA foreign_keys = ON")?;
        }

        log::debug!("Opened database '{}' ({:?})", db_path.to_string_lossy(), self.mode);
        Ok(conn)
    }
}

/// Connection to a SQLite database.
///
/// The connection keeps track of every statement and result set created from it. Closing the
/// connection, explicitly or by dropping it, first closes all of those statements and only then
/// releases the database handle. Statements that are used after their connection was closed
/// report [`Error::StatementClosed`], operations on the closed connection itself report
/// [`Error::DatabaseClosed`].
pub struct Connection {
    db: HandleGuard<libsqlite3_sys::sqlite3>,
    statements: RefCell<Vec<Weak<StatementHandle>>>,
    last_error: RefCell<Option<String>>,
}

impl Connection {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        OpenOptions::new().open(db_path)
    }

    pub fn open_in_memory() -> Result<Self> {
        OpenOptions::new().open(":memory:")
    }

    /// Execute one or more statements that do not produce result rows.
    ///
    /// The raw engine message of a failure is kept as [`Connection::last_error`] until the next call.
    pub fn exec(&self, sql: &str) -> Result<()> {
        let db = self.raw_handle()?;
        let c_sql = CString::new(sql)?;
        log::trace!("exec: {sql}");
        self.last_error.replace(None);

        let mut error_message: *mut c_char = std::ptr::null_mut();
        let rc = unsafe {
            libsqlite3_sys::sqlite3_exec(db.as_ptr(), c_sql.as_ptr(), None, std::ptr::null_mut(), &mut error_message)
        };
        if rc == libsqlite3_sys::SQLITE_OK {
            return Ok(());
        }

        let detail = if error_message.is_null() {
            last_sqlite_error(db)
        } else {
            let msg = unsafe { CStr::from_ptr(error_message) }.to_string_lossy().into_owned();
            unsafe { libsqlite3_sys::sqlite3_free(error_message.cast()) };
            msg
        };

        let extended_code = unsafe { libsqlite3_sys::sqlite3_extended_errcode(db.as_ptr()) };
        let err = errorcode::sqlite_error(rc, extended_code, Some(&detail));
        *self.last_error.borrow_mut() = Some(detail);
        Err(err)
    }

    /// Compile `sql` into a statement for inserting or updating rows.
    ///
    /// A transaction is started first, it stays open until the statement is committed, rolled
    /// back, fails, or the connection is closed.
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement<'_>> {
        self.exec("BEGIN TRANSACTION")?;

        match self.compile(sql).and_then(|handle| PreparedStatement::new(self, handle)) {
            Ok(stmt) => Ok(stmt),
            Err(e) => {
                self.rollback_quietly();
                Err(e)
            }
        }
    }

    /// Compile `sql` into a result set to iterate over, no transaction is started
    pub fn query(&self, sql: &str) -> Result<ResultSet<'_>> {
        let handle = self.compile(sql)?;
        Ok(ResultSet::new(PreparedStatement::new(self, handle)?))
    }

    /// The raw database handle, never null: a closed connection reports an error instead
    pub fn handle(&self) -> Result<*mut libsqlite3_sys::sqlite3> {
        self.raw_handle().map(NonNull::as_ptr)
    }

    /// Close every statement created from this connection, then the connection itself.
    ///
    /// Calling this more than once is harmless, it is also called when the connection is dropped.
    pub fn close(&self) {
        let statements = std::mem::take(&mut *self.statements.borrow_mut());
        for stmt in statements.iter().filter_map(Weak::upgrade) {
            stmt.close();
        }

        if self.db.release() {
            log::debug!("Closed database connection");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.db.is_released()
    }

    pub fn in_transaction(&self) -> bool {
        match self.db.get() {
            Ok(db) => unsafe { libsqlite3_sys::sqlite3_get_autocommit(db.as_ptr()) == 0 },
            Err(_) => false,
        }
    }

    /// Number of statements and result sets created from this connection that are still open
    pub fn open_statement_count(&self) -> usize {
        self.statements
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|stmt| !stmt.is_closed())
            .count()
    }

    /// The raw engine message of the last [`Connection::exec`], `None` when it succeeded
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// File name of the main database, `None` for in-memory databases or a closed connection
    pub fn path(&self) -> Option<String> {
        let db = self.db.get().ok()?;
        let filename = unsafe { libsqlite3_sys::sqlite3_db_filename(db.as_ptr(), c"main".as_ptr()) };
        if filename.is_null() {
            return None;
        }

        let c_str = unsafe { CStr::from_ptr(filename) };
        let path = c_str.to_string_lossy().into_owned();
        if path.is_empty() { None } else { Some(path) }
    }

    pub(crate) fn raw_handle(&self) -> Result<NonNull<libsqlite3_sys::sqlite3>> {
        self.db.get()
    }

    pub(crate) fn rollback_quietly(&self) {
        if let Err(e) = self.exec("ROLLBACK") {
            log::warn!("Rollback failed: {e}");
        }
    }

    fn compile(&self, sql: &str) -> Result<Rc<StatementHandle>> {
        let db = self.raw_handle()?;
        let c_sql = CString::new(sql)?;
        let mut stmt: *mut libsqlite3_sys::sqlite3_stmt = std::ptr::null_mut();
        let mut tail: *const c_char = std::ptr::null();
        let rc = unsafe { libsqlite3_sys::sqlite3_prepare_v2(db.as_ptr(), c_sql.as_ptr(), -1, &mut stmt, &mut tail) };
        if rc != libsqlite3_sys::SQLITE_OK {
            let extended_code = unsafe { libsqlite3_sys::sqlite3_extended_errcode(db.as_ptr()) };
            return Err(errorcode::sqlite_error(rc, extended_code, Some(&last_sqlite_error(db))));
        }

        if stmt.is_null() {
            return Err(Error::ValueError(format!("No SQL statement to compile in '{sql}'")));
        }

        if !tail.is_null() {
            let remainder = unsafe { CStr::from_ptr(tail) }.to_string_lossy();
            if !remainder.trim().is_empty() {
                log::warn!("Only the first statement is compiled, ignoring '{}'", remainder.trim());
            }
        }

        log::debug!("Compiled statement: {sql}");
        let handle = Rc::new(StatementHandle::new(stmt));

        let mut statements = self.statements.borrow_mut();
        statements.retain(|stmt| stmt.upgrade().is_some_and(|stmt| !stmt.is_closed()));
        statements.push(Rc::downgrade(&handle));

        Ok(handle)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("open_statements", &self.open_statement_count())
            .finish_non_exhaustive()
    }
}

pub(crate) fn last_sqlite_error(db: NonNull<libsqlite3_sys::sqlite3>) -> String {
    let error_message = unsafe { libsqlite3_sys::sqlite3_errmsg(db.as_ptr()) };
    if error_message.is_null() {
        return String::new();
    }

    let c_str = unsafe { CStr::from_ptr(error_message) };
    c_str.to_string_lossy().into_owned()
}

fn access_mode_flags(mode: AccessMode) -> c_int {
    match mode {
        AccessMode::ReadOnly => libsqlite3_sys::SQLITE_OPEN_READONLY,
        AccessMode::ReadWrite => libsqlite3_sys::SQLITE_OPEN_READWRITE,
        AccessMode::Create => libsqlite3_sys::SQLITE_OPEN_READWRITE | libsqlite3_sys::SQLITE_OPEN_CREATE,
    }
}
