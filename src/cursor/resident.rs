//! Cursor over a resident array. Reads and writes go straight to the
//! array's vector; there is nothing to flush.

use eyre::{Report, Result};

use super::{Cursor, Direction};
use crate::array::ResidentArray;
use crate::error::ArrayError;

#[derive(Debug)]
pub struct ResidentIter<'a> {
    array: &'a ResidentArray,
    cursor: Cursor,
}

impl<'a> ResidentIter<'a> {
    pub(crate) fn new(array: &'a ResidentArray, start: u64, end: u64, direction: Direction) -> Self {
        Self {
            array,
            cursor: Cursor::new(start, end, direction),
        }
    }

    pub fn advance(&mut self) -> bool {
        self.skip(1)
    }

    pub fn skip(&mut self, n: u64) -> bool {
        let Some(index) = self.cursor.step(n) else {
            return false;
        };
        let loaded = self.array.value_at(index);
        self.cursor.settle(loaded)
    }

    pub fn index(&self) -> u64 {
        self.cursor.index()
    }

    pub fn value(&self) -> u64 {
        self.cursor.value()
    }

    /// Writes `value` at the current index.
    ///
    /// # Panics
    ///
    /// If the cursor is not positioned, the array is frozen, or `value`
    /// exceeds the bound.
    pub fn set_value(&mut self, value: u64) {
        let index = self.cursor.positioned("set_value");
        match self.array.set_value_at(index, value) {
            Ok(()) => self.cursor.set_cached(value),
            Err(e) => self.cursor.fail(e),
        }
    }

    pub fn err(&self) -> Option<&Report> {
        self.cursor.err()
    }

    pub fn direction(&self) -> Direction {
        self.cursor.direction()
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_closed()
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.cursor.is_closed() {
            return Err(ArrayError::ClosedIterator.into());
        }
        match self.cursor.shut() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
