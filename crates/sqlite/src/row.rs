use crate::statement::StatementHandle;
use crate::{FieldValue, Result};
use std::{
    ffi::{CStr, c_char, c_double, c_int, c_longlong},
    fmt,
    ptr::NonNull,
    slice,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Blob,
    Null,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Blob => "blob",
            ColumnType::Null => "null",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

/// View of the row a result set is currently positioned on.
///
/// The result set cannot be advanced while a view is alive, but it can still be closed (directly or
/// through its connection). Every accessor therefore checks the statement handle and reports
/// [`Error::StatementClosed`](crate::Error::StatementClosed) once it was released.
#[derive(Clone, Copy)]
pub struct Row<'stmt> {
    handle: &'stmt StatementHandle,
    column_count: usize,
}

impl<'stmt> Row<'stmt> {
    pub(crate) fn new(handle: &'stmt StatementHandle) -> Result<Self> {
        let column_count = unsafe { libsqlite3_sys::sqlite3_column_count(handle.get()?.as_ptr()) };
        Ok(Self {
            handle,
            column_count: usize::try_from(column_count).unwrap_or(0),
        })
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// The storage class of the column value, `None` for an out of range index
    pub fn column_type(&self, index: usize) -> Result<Option<ColumnType>> {
        let stmt = self.handle.get()?;
        let Some(index) = self.column_index(index) else {
            return Ok(None);
        };

        let column_type = match unsafe { libsqlite3_sys::sqlite3_column_type(stmt.as_ptr(), index) } {
            libsqlite3_sys::SQLITE_INTEGER => Some(ColumnType::Integer),
            libsqlite3_sys::SQLITE_FLOAT => Some(ColumnType::Float),
            libsqlite3_sys::SQLITE_BLOB => Some(ColumnType::Blob),
            libsqlite3_sys::SQLITE_NULL => Some(ColumnType::Null),
            libsqlite3_sys::SQLITE_TEXT => Some(ColumnType::Text),
            _ => None,
        };

        Ok(column_type)
    }

    pub fn column_is_null(&self, index: usize) -> Result<bool> {
        Ok(self.column_type(index)? == Some(ColumnType::Null))
    }

    /// Text representation of the column value as produced by the engine, `None` for null
    pub fn column_text(&self, index: usize) -> Result<Option<String>> {
        let stmt = self.handle.get()?;
        let Some(index) = self.column_index(index) else {
            return Ok(None);
        };

        let data = unsafe { libsqlite3_sys::sqlite3_column_text(stmt.as_ptr(), index) };
        if data.is_null() {
            return Ok(None);
        }

        // the byte count has to be requested after the text conversion
        let size = unsafe { libsqlite3_sys::sqlite3_column_bytes(stmt.as_ptr(), index) };
        let bytes = match usize::try_from(size) {
            Ok(size) if size > 0 => unsafe { slice::from_raw_parts(data.cast::<u8>(), size) },
            _ => &[],
        };

        Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn column_int64(&self, index: usize) -> Result<c_longlong> {
        let stmt = self.handle.get()?;
        Ok(match self.column_index(index) {
            Some(index) => unsafe { libsqlite3_sys::sqlite3_column_int64(stmt.as_ptr(), index) },
            None => 0,
        })
    }

    pub fn column_double(&self, index: usize) -> Result<c_double> {
        let stmt = self.handle.get()?;
        Ok(match self.column_index(index) {
            Some(index) => unsafe { libsqlite3_sys::sqlite3_column_double(stmt.as_ptr(), index) },
            None => 0.0,
        })
    }

    /// The typed value of the column, `None` for blobs which are not supported
    pub fn value(&self, index: usize) -> Result<Option<FieldValue>> {
        let value = match self.column_type(index)? {
            Some(ColumnType::Integer) => Some(FieldValue::Integer(self.column_int64(index)?)),
            Some(ColumnType::Float) => Some(FieldValue::Real(self.column_double(index)?)),
            Some(ColumnType::Text) => Some(FieldValue::Text(self.column_text(index)?.unwrap_or_default())),
            Some(ColumnType::Null) => Some(FieldValue::Null),
            Some(ColumnType::Blob) | None => None,
        };

        Ok(value)
    }

    /// Text of every column, null values are represented as an empty string
    pub fn texts(&self) -> Result<Vec<String>> {
        (0..self.column_count)
            .map(|i| Ok(self.column_text(i)?.unwrap_or_default()))
            .collect()
    }

    pub fn values(&self) -> Result<Vec<FieldValue>> {
        let mut values = Vec::with_capacity(self.column_count);
        for i in 0..self.column_count {
            if let Some(value) = self.value(i)? {
                values.push(value);
            }
        }

        Ok(values)
    }

    fn column_index(&self, index: usize) -> Option<c_int> {
        if index < self.column_count {
            c_int::try_from(index).ok()
        } else {
            None
        }
    }
}

pub(crate) fn column_name(stmt: NonNull<libsqlite3_sys::sqlite3_stmt>, index: c_int) -> String {
    let name = unsafe { libsqlite3_sys::sqlite3_column_name(stmt.as_ptr(), index) };
    if name.is_null() {
        return String::new();
    }

    let c_str = unsafe { CStr::from_ptr(name.cast::<c_char>()) };
    c_str.to_string_lossy().into_owned()
}
