use crate::connection::last_sqlite_error;
use crate::handle::HandleGuard;
use crate::{Connection, Error, FieldValue, Result, errorcode};
use std::cell::Cell;
use std::ffi::{c_char, c_int};
use std::ptr::NonNull;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Open,
    Bound,
    /// The transaction was ended successfully and the statement released
    Committed,
    /// The transaction was rolled back and the statement released
    RolledBack,
    /// Released without ending the transaction
    Closed,
}

pub(crate) struct StatementHandle {
    guard: HandleGuard<libsqlite3_sys::sqlite3_stmt>,
    state: Cell<StatementState>,
}

impl StatementHandle {
    pub fn new(stmt: *mut libsqlite3_sys::sqlite3_stmt) -> Self {
        Self {
            guard: HandleGuard::new(stmt),
            state: Cell::new(StatementState::Open),
        }
    }

    pub fn get(&self) -> Result<NonNull<libsqlite3_sys::sqlite3_stmt>> {
        self.guard.get()
    }

    pub fn is_closed(&self) -> bool {
        self.guard.is_released()
    }

    pub fn state(&self) -> StatementState {
        self.state.get()
    }

    fn mark_bound(&self) {
        if self.state.get() == StatementState::Open {
            self.state.set(StatementState::Bound);
        }
    }

    /// Release the handle, a statement that already ended keeps its final state
    fn finish(&self, final_state: StatementState) {
        self.guard.release();
        if matches!(self.state.get(), StatementState::Open | StatementState::Bound) {
            self.state.set(final_state);
        }
    }

    pub fn close(&self) {
        self.finish(StatementState::Closed);
    }
}

/// A compiled statement that inserts or updates rows inside the transaction opened by
/// [`Connection::prepare`].
///
/// Every [`bind`](PreparedStatement::bind) applies one row. Once all rows are applied,
/// [`commit`](PreparedStatement::commit) ends the transaction. A failing row rolls the whole
/// transaction back and closes the statement.
///
/// Clones share the underlying handle: closing one closes them all, and the handle is released
/// once the last clone is dropped.
#[derive(Clone)]
pub struct PreparedStatement<'conn> {
    conn: &'conn Connection,
    handle: Rc<StatementHandle>,
    params: usize,
}

impl<'conn> PreparedStatement<'conn> {
    pub(crate) fn new(conn: &'conn Connection, handle: Rc<StatementHandle>) -> Result<Self> {
        let count = unsafe { libsqlite3_sys::sqlite3_bind_parameter_count(handle.get()?.as_ptr()) };
        Ok(Self {
            conn,
            handle,
            params: usize::try_from(count).unwrap_or(0),
        })
    }

    /// Bind the values to the parameters in order and execute the statement.
    ///
    /// Parameters without a value are bound to null. Supplying more values than the statement has
    /// parameters is a [`Error::ValueError`] and binds nothing.
    pub fn bind(&self, values: &[FieldValue]) -> Result<()> {
        let stmt = self.raw_handle()?;
        if values.len() > self.params {
            return Err(Error::ValueError(format!(
                "Too many arguments to bind(): {} expected, {} specified",
                self.params,
                values.len()
            )));
        }

        unsafe { libsqlite3_sys::sqlite3_clear_bindings(stmt.as_ptr()) };
        for (index, value) in values.iter().enumerate() {
            bind_value(stmt, index, value)?;
        }

        self.handle.mark_bound();
        self.next()
    }

    /// Bind a single value to the zero based parameter `index` without executing the statement
    pub fn bind_at(&self, index: usize, value: impl Into<FieldValue>) -> Result<()> {
        let stmt = self.raw_handle()?;
        if index >= self.params {
            return Err(Error::ValueError(format!(
                "Parameter index {index} out of range, statement has {} parameters",
                self.params
            )));
        }

        bind_value(stmt, index, &value.into())?;
        self.handle.mark_bound();
        Ok(())
    }

    /// Execute the statement with the currently bound values and reset it for the next row.
    ///
    /// Any failure rolls back the transaction and closes the statement before the error is
    /// returned.
    pub fn next(&self) -> Result<()> {
        let stmt = self.raw_handle()?;
        let db = self.conn.raw_handle()?;

        let rc = unsafe { libsqlite3_sys::sqlite3_step(stmt.as_ptr()) };
        let failure = match rc {
            libsqlite3_sys::SQLITE_ROW | libsqlite3_sys::SQLITE_DONE => {
                match unsafe { libsqlite3_sys::sqlite3_reset(stmt.as_ptr()) } {
                    libsqlite3_sys::SQLITE_OK => None,
                    reset_rc => Some(reset_rc),
                }
            }
            _ => Some(rc),
        };

        let Some(code) = failure else {
            return Ok(());
        };

        let extended_code = unsafe { libsqlite3_sys::sqlite3_extended_errcode(db.as_ptr()) };
        let detail = last_sqlite_error(db);
        log::warn!("Statement execution failed ({detail}), rolling back transaction");

        self.handle.finish(StatementState::RolledBack);
        self.conn.rollback_quietly();
        Err(errorcode::sqlite_error(code, extended_code, Some(&detail)))
    }

    /// End the transaction and close the statement.
    ///
    /// When the transaction cannot be committed it is rolled back instead and the error returned.
    pub fn commit(&self) -> Result<()> {
        self.raw_handle()?;
        match self.conn.exec("END TRANSACTION") {
            Ok(()) => {
                self.handle.finish(StatementState::Committed);
                Ok(())
            }
            Err(e) => {
                self.handle.finish(StatementState::RolledBack);
                self.conn.rollback_quietly();
                Err(e)
            }
        }
    }

    /// Discard every row applied through this statement and close it
    pub fn rollback(&self) -> Result<()> {
        self.raw_handle()?;
        self.handle.finish(StatementState::RolledBack);
        self.conn.exec("ROLLBACK")
    }

    /// Release the statement handle, the transaction is left as is. Never fails.
    pub fn close(&self) {
        self.handle.close();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    pub fn state(&self) -> StatementState {
        self.handle.state()
    }

    pub fn param_count(&self) -> usize {
        self.params
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub fn handle(&self) -> Result<*mut libsqlite3_sys::sqlite3_stmt> {
        self.raw_handle().map(NonNull::as_ptr)
    }

    pub(crate) fn raw_handle(&self) -> Result<NonNull<libsqlite3_sys::sqlite3_stmt>> {
        self.handle.get()
    }

    pub(crate) fn shared_handle(&self) -> &StatementHandle {
        &self.handle
    }
}

impl std::fmt::Debug for PreparedStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("state", &self.state())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Bind one value, `index` is zero based while the engine counts parameters from one
fn bind_value(stmt: NonNull<libsqlite3_sys::sqlite3_stmt>, index: usize, value: &FieldValue) -> Result<()> {
    let position = c_int::try_from(index + 1)
        .map_err(|_| Error::ValueError(format!("Parameter index {index} out of range")))?;

    let rc = match value {
        FieldValue::Integer(v) => unsafe { libsqlite3_sys::sqlite3_bind_int64(stmt.as_ptr(), position, *v) },
        FieldValue::Real(v) => unsafe { libsqlite3_sys::sqlite3_bind_double(stmt.as_ptr(), position, *v) },
        FieldValue::Text(v) => {
            let size = c_int::try_from(v.len())
                .map_err(|_| Error::ValueError(format!("Text of {} bytes is too large to bind", v.len())))?;
            unsafe {
                libsqlite3_sys::sqlite3_bind_text(
                    stmt.as_ptr(),
                    position,
                    v.as_ptr().cast::<c_char>(),
                    size,
                    libsqlite3_sys::SQLITE_TRANSIENT(),
                )
            }
        }
        FieldValue::Null => unsafe { libsqlite3_sys::sqlite3_bind_null(stmt.as_ptr(), position) },
    };

    check_rc(stmt, rc)
}

fn check_rc(stmt: NonNull<libsqlite3_sys::sqlite3_stmt>, rc: c_int) -> Result<()> {
    if rc == libsqlite3_sys::SQLITE_OK {
        return Ok(());
    }

    match NonNull::new(unsafe { libsqlite3_sys::sqlite3_db_handle(stmt.as_ptr()) }) {
        Some(db) => {
            let extended_code = unsafe { libsqlite3_sys::sqlite3_extended_errcode(db.as_ptr()) };
            Err(errorcode::sqlite_error(rc, extended_code, Some(&last_sqlite_error(db))))
        }
        None => Err(errorcode::sqlite_error(rc, rc, None)),
    }
}
