use crate::{Error, Result};
use std::cell::Cell;
use std::ptr::NonNull;

/// A native engine resource that is released through a single engine call.
pub(crate) trait NativeHandle {
    /// Release the resource.
    ///
    /// # Safety
    /// `handle` must be live and must not be used after this call.
    unsafe fn release(handle: NonNull<Self>);

    fn closed_error() -> Error;
}

impl NativeHandle for libsqlite3_sys::sqlite3 {
    unsafe fn release(handle: NonNull<Self>) {
        let rc = unsafe { libsqlite3_sys::sqlite3_close_v2(handle.as_ptr()) };
        if rc != libsqlite3_sys::SQLITE_OK {
            log::warn!("Closing database handle returned code {rc}");
        }
    }

    fn closed_error() -> Error {
        Error::DatabaseClosed
    }
}

impl NativeHandle for libsqlite3_sys::sqlite3_stmt {
    unsafe fn release(handle: NonNull<Self>) {
        // finalize repeats the code of the last failed step, which was already reported
        unsafe { libsqlite3_sys::sqlite3_finalize(handle.as_ptr()) };
    }

    fn closed_error() -> Error {
        Error::StatementClosed
    }
}

/// Owns at most one native handle and releases it exactly once.
///
/// Release is idempotent: the handle is taken out of the guard before the engine call,
/// so a second `release` (or the one issued on drop) finds the guard empty and does nothing.
/// Shared ownership is obtained by wrapping the guard in an `Rc`: every owner observes the same
/// explicit release, and the implicit release runs when the last owner is dropped.
pub(crate) struct HandleGuard<T: NativeHandle> {
    handle: Cell<Option<NonNull<T>>>,
}

impl<T: NativeHandle> HandleGuard<T> {
    /// Take ownership of a raw handle, a null pointer results in an already released guard
    pub fn new(handle: *mut T) -> Self {
        Self {
            handle: Cell::new(NonNull::new(handle)),
        }
    }

    pub fn get(&self) -> Result<NonNull<T>> {
        self.handle.get().ok_or_else(T::closed_error)
    }

    pub fn is_released(&self) -> bool {
        self.handle.get().is_none()
    }

    /// Returns true when this call actually released the handle
    pub fn release(&self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                unsafe { T::release(handle) };
                true
            }
            None => false,
        }
    }
}

impl<T: NativeHandle> Drop for HandleGuard<T> {
    fn drop(&mut self) {
        self.release();
    }
}
