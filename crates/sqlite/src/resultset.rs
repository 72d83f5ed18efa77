use crate::connection::last_sqlite_error;
use crate::row::column_name;
use crate::{Error, FieldValue, PreparedStatement, Result, Row, errorcode};
use std::ffi::c_int;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    BeforeFirst,
    OnRow,
    Exhausted,
}

/// Read-only iteration over the rows produced by [`Connection::query`](crate::Connection::query).
///
/// ```ignore
/// let mut rs = conn.query("SELECT * FROM players")?;
/// while rs.next()? {
///     let row = rs.row()?;
/// }
/// ```
pub struct ResultSet<'conn> {
    stmt: PreparedStatement<'conn>,
    cursor: Cursor,
}

impl<'conn> ResultSet<'conn> {
    pub(crate) fn new(stmt: PreparedStatement<'conn>) -> Self {
        Self {
            stmt,
            cursor: Cursor::BeforeFirst,
        }
    }

    pub fn column_count(&self) -> Result<usize> {
        let stmt = self.stmt.raw_handle()?;
        let count = unsafe { libsqlite3_sys::sqlite3_column_count(stmt.as_ptr()) };
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn column_names(&self) -> Result<Vec<String>> {
        let stmt = self.stmt.raw_handle()?;
        let count = unsafe { libsqlite3_sys::sqlite3_column_count(stmt.as_ptr()) };
        Ok((0..count).map(|i: c_int| column_name(stmt, i)).collect())
    }

    /// Advance to the next row, returns false once all rows were consumed.
    ///
    /// Exhaustion is final: every later call returns false as well.
    pub fn next(&mut self) -> Result<bool> {
        let stmt = self.stmt.raw_handle()?;
        if self.cursor == Cursor::Exhausted {
            return Ok(false);
        }

        match unsafe { libsqlite3_sys::sqlite3_step(stmt.as_ptr()) } {
            libsqlite3_sys::SQLITE_ROW => {
                self.cursor = Cursor::OnRow;
                Ok(true)
            }
            libsqlite3_sys::SQLITE_DONE => {
                self.cursor = Cursor::Exhausted;
                Ok(false)
            }
            rc => {
                self.cursor = Cursor::Exhausted;
                let db = self.stmt.connection().raw_handle()?;
                let extended_code = unsafe { libsqlite3_sys::sqlite3_extended_errcode(db.as_ptr()) };
                Err(errorcode::sqlite_error(rc, extended_code, Some(&last_sqlite_error(db))))
            }
        }
    }

    /// Advance and store the text of the new row in `row`, which is left untouched once exhausted
    pub fn next_row(&mut self, row: &mut Vec<String>) -> Result<bool> {
        if !self.next()? {
            return Ok(false);
        }

        *row = self.row()?;
        Ok(true)
    }

    /// Advance and store the typed values of the new row in `row`, which is left untouched once
    /// exhausted
    pub fn next_typed_row(&mut self, row: &mut Vec<FieldValue>) -> Result<bool> {
        if !self.next()? {
            return Ok(false);
        }

        *row = self.typed_row()?;
        Ok(true)
    }

    pub fn current(&self) -> Result<Row<'_>> {
        self.stmt.raw_handle()?;
        match self.cursor {
            Cursor::OnRow => Row::new(self.stmt.shared_handle()),
            Cursor::BeforeFirst => Err(Error::ValueError("next() has not been called on the result set".to_string())),
            Cursor::Exhausted => Err(Error::ValueError("The result set has no more rows".to_string())),
        }
    }

    /// Text of every column of the current row, null is represented as an empty string.
    /// Use [`ResultSet::typed_row`] to tell null apart from empty text.
    pub fn row(&self) -> Result<Vec<String>> {
        self.current()?.texts()
    }

    /// Typed value of every column of the current row, blob columns are omitted
    pub fn typed_row(&self) -> Result<Vec<FieldValue>> {
        self.current()?.values()
    }

    pub fn typed_rows(&mut self) -> TypedRows<'_, 'conn> {
        TypedRows {
            result_set: self,
            failed: false,
        }
    }

    pub fn close(&self) {
        self.stmt.close();
    }

    pub fn is_closed(&self) -> bool {
        self.stmt.is_closed()
    }

    pub fn handle(&self) -> Result<*mut libsqlite3_sys::sqlite3_stmt> {
        self.stmt.handle()
    }
}

impl std::fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("cursor", &self.cursor)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

pub struct TypedRows<'rs, 'conn> {
    result_set: &'rs mut ResultSet<'conn>,
    failed: bool,
}

impl Iterator for TypedRows<'_, '_> {
    type Item = Result<Vec<FieldValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut row = Vec::new();
        match self.result_set.next_typed_row(&mut row) {
            Ok(true) => Some(Ok(row)),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
