//! # Cursor Protocol
//!
//! Sequential access to an array goes through a cursor over a half-open
//! index range `[start, end)`. Both backings implement the same protocol; the
//! only difference is where values come from (a vector, or a pinned page).
//!
//! ## Usage
//!
//! ```ignore
//! let mut iter = array.iterate(0, array.len());
//! while iter.advance() {
//!     let doubled = iter.value() * 2;
//!     iter.set_value(doubled.min(array.max_value()));
//! }
//! iter.close()?;
//! ```
//!
//! ## State Machine
//!
//! ```text
//!            skip(n >= 1)             skip(n), in range
//! Unprimed ───────────────> Active ──────────────────────> Active
//!    │                        │
//!    │ skip(n), past end      │ skip(n), past end
//!    └────────────┬───────────┘
//!                 v
//!             Exhausted
//!
//! load failure (any state) ──> Errored (latched; every skip returns false)
//! close() (any state)      ──> Closed  (second close returns ClosedIterator)
//! ```
//!
//! The first `skip(n)` consumes one unit of `n` to prime the cursor, so
//! `skip(1)` lands on the first element and `skip(k)` on the k-th.
//! `skip(0)` before priming is a contract violation.
//!
//! ## Direction
//!
//! The logical position `pos` always counts up from zero. Ascending cursors
//! map it to `start + pos`; descending cursors map it to
//! `start + (len - pos - 1)`, walking from `end - 1` down to `start`.
//!
//! ## Contract Violations
//!
//! `index()`, `value()` and `set_value()` panic unless the cursor is
//! positioned on an element: primed, not exhausted, not errored, not closed.
//! Constructing a cursor with `start > end` panics before any I/O.

mod paged;
mod resident;

pub use paged::PagedIter;
pub use resident::ResidentIter;

use eyre::{Report, Result};

use crate::config::NO_VALUE;
use crate::error::ArrayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Position bookkeeping shared by both cursor kinds.
#[derive(Debug)]
pub(crate) struct Cursor {
    base: u64,
    pos: u64,
    num: u64,
    value: u64,
    primed: bool,
    direction: Direction,
    err: Option<Report>,
    closed: bool,
}

impl Cursor {
    pub(crate) fn new(start: u64, end: u64, direction: Direction) -> Self {
        assert!(
            start <= end,
            "iterator range is inverted: start={} end={}",
            start,
            end
        );
        Self {
            base: start,
            pos: 0,
            num: end - start,
            value: NO_VALUE,
            primed: false,
            direction,
            err: None,
            closed: false,
        }
    }

    /// Moves the cursor `n` elements forward.
    ///
    /// Returns the array index to load, or `None` when the cursor stopped
    /// (exhausted, or an error is latched).
    pub(crate) fn step(&mut self, mut n: u64) -> Option<u64> {
        assert!(
            self.pos <= self.num,
            "cursor position {} past range length {}",
            self.pos,
            self.num
        );
        assert!(n != 0 || self.primed, "must advance before skip(0)");
        if self.err.is_some() {
            return None;
        }
        if !self.primed {
            n -= 1;
            self.primed = true;
        }
        if n >= self.num - self.pos {
            self.pos = self.num;
            self.value = NO_VALUE;
            return None;
        }
        self.pos += n;
        Some(self.current_index())
    }

    /// Records the outcome of loading the element at the new position.
    pub(crate) fn settle(&mut self, loaded: Result<u64>) -> bool {
        match loaded {
            Ok(value) => {
                self.value = value;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    pub(crate) fn fail(&mut self, err: Report) {
        self.err = Some(err);
        self.value = NO_VALUE;
    }

    fn current_index(&self) -> u64 {
        match self.direction {
            Direction::Ascending => self.base + self.pos,
            Direction::Descending => self.base + (self.num - self.pos - 1),
        }
    }

    /// Index of the current element, checking the cursor is positioned.
    pub(crate) fn positioned(&self, op: &str) -> u64 {
        assert!(!self.closed, "must not call {}() on a closed iterator", op);
        assert!(self.primed, "must advance before {}()", op);
        assert!(
            self.pos < self.num,
            "must not call {}() after the iterator is exhausted",
            op
        );
        assert!(
            self.err.is_none(),
            "must not call {}() after the iterator failed",
            op
        );
        self.current_index()
    }

    pub(crate) fn index(&self) -> u64 {
        self.positioned("index")
    }

    pub(crate) fn value(&self) -> u64 {
        self.positioned("value");
        self.value
    }

    pub(crate) fn set_cached(&mut self, value: u64) {
        self.value = value;
    }

    pub(crate) fn err(&self) -> Option<&Report> {
        self.err.as_ref()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    /// Resets to an inert closed shell, handing back any latched error.
    pub(crate) fn shut(&mut self) -> Option<Report> {
        let latched = self.err.take();
        *self = Cursor {
            base: 0,
            pos: 0,
            num: 0,
            value: NO_VALUE,
            primed: false,
            direction: self.direction,
            err: Some(ArrayError::ClosedIterator.into()),
            closed: true,
        };
        latched
    }
}

/// Cursor over either backing.
#[derive(Debug)]
pub enum ArrayIter<'a> {
    Resident(ResidentIter<'a>),
    Paged(PagedIter<'a>),
}

impl<'a> ArrayIter<'a> {
    /// Moves to the next element. Equivalent to `skip(1)`.
    pub fn advance(&mut self) -> bool {
        self.skip(1)
    }

    /// Moves `n` elements forward, returning false once the range is exhausted
    /// or an error is latched.
    pub fn skip(&mut self, n: u64) -> bool {
        on_backing!(self, iter => iter.skip(n))
    }

    pub fn index(&self) -> u64 {
        on_backing!(self, iter => iter.index())
    }

    pub fn value(&self) -> u64 {
        on_backing!(self, iter => iter.value())
    }

    pub fn set_value(&mut self, value: u64) {
        on_backing!(self, iter => iter.set_value(value))
    }

    /// The error that stopped this cursor, if any.
    pub fn err(&self) -> Option<&Report> {
        on_backing!(self, iter => iter.err())
    }

    pub fn direction(&self) -> Direction {
        on_backing!(self, iter => iter.direction())
    }

    pub fn is_closed(&self) -> bool {
        on_backing!(self, iter => iter.is_closed())
    }

    pub fn flush(&mut self) -> Result<()> {
        on_backing!(self, iter => iter.flush())
    }

    pub fn close(&mut self) -> Result<()> {
        on_backing!(self, iter => iter.close())
    }
}

impl<'a> From<ResidentIter<'a>> for ArrayIter<'a> {
    fn from(iter: ResidentIter<'a>) -> Self {
        ArrayIter::Resident(iter)
    }
}

impl<'a> From<PagedIter<'a>> for ArrayIter<'a> {
    fn from(iter: PagedIter<'a>) -> Self {
        ArrayIter::Paged(iter)
    }
}
