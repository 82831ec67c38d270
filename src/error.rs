//! # Recoverable Errors
//!
//! Fallible operations return `eyre::Result`. The conditions a caller may want
//! to branch on are raised as [`ArrayError`] and can be recovered from the
//! report with `downcast_ref`:
//!
//! ```ignore
//! match array.value_at(i) {
//!     Ok(v) => ...,
//!     Err(e) if ArrayError::is_out_of_range(&e) => ...,
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! Misuse of the API (writing to a frozen array, exceeding the bound, reading
//! an unpositioned cursor, truncating with live cursors, ...) is not reported
//! here. Those are programming errors and panic at the call site.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArrayError {
    #[error("index {index} is out of range for array of length {len}")]
    OutOfRange { index: u64, len: u64 },

    #[error("{op}: not implemented")]
    NotImplemented { op: &'static str },

    #[error("iterator is already closed")]
    ClosedIterator,

    #[error("page at offset {offset} holds only {available} bytes")]
    ShortPage { offset: u64, available: usize },
}

impl ArrayError {
    pub fn not_implemented(op: &'static str) -> Self {
        ArrayError::NotImplemented { op }
    }

    pub fn of(report: &eyre::Report) -> Option<&ArrayError> {
        report.downcast_ref::<ArrayError>()
    }

    pub fn is_out_of_range(report: &eyre::Report) -> bool {
        matches!(Self::of(report), Some(ArrayError::OutOfRange { .. }))
    }

    pub fn is_not_implemented(report: &eyre::Report) -> bool {
        matches!(Self::of(report), Some(ArrayError::NotImplemented { .. }))
    }

    pub fn is_closed_iterator(report: &eyre::Report) -> bool {
        matches!(Self::of(report), Some(ArrayError::ClosedIterator))
    }
}
