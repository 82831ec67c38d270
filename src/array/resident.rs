//! # Resident Arrays
//!
//! A resident array keeps every element in one contiguous vector of the
//! array's native width (`Vec<u8>`, `Vec<u16>`, `Vec<u32>` or `Vec<u64>`).
//! The width is chosen once at construction; all operations dispatch on it
//! through `with_cells!`.
//!
//! Element access goes through a `RefCell` so that cursors (which borrow the
//! array shared) can write back. Borrows never outlive a single element read
//! or write, so they cannot conflict.

use std::cell::RefCell;

use eyre::{ensure, Result, WrapErr};

use crate::cursor::{Direction, ResidentIter};
use crate::encoding::Width;
use crate::error::ArrayError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Cells {
    One(Vec<u8>),
    Two(Vec<u16>),
    Four(Vec<u32>),
    Eight(Vec<u64>),
}

impl Cells {
    fn zeroed(width: Width, len: usize) -> Self {
        match width {
            Width::One => Cells::One(vec![0; len]),
            Width::Two => Cells::Two(vec![0; len]),
            Width::Four => Cells::Four(vec![0; len]),
            Width::Eight => Cells::Eight(vec![0; len]),
        }
    }

    fn width(&self) -> Width {
        match self {
            Cells::One(_) => Width::One,
            Cells::Two(_) => Width::Two,
            Cells::Four(_) => Width::Four,
            Cells::Eight(_) => Width::Eight,
        }
    }

    fn len(&self) -> usize {
        with_cells!(self, vec => vec.len())
    }

    fn get(&self, index: usize) -> u64 {
        with_cells!(self, vec => vec[index] as u64)
    }

    fn set(&mut self, index: usize, value: u64) {
        with_cells!(self, vec => vec[index] = value as _)
    }

    fn truncate(&mut self, len: usize) {
        with_cells!(self, vec => vec.truncate(len))
    }

    /// Bulk copy between equal-width, equal-length vectors.
    fn copy_raw(&mut self, src: &Cells) -> bool {
        match (self, src) {
            (Cells::One(dst), Cells::One(src)) => dst.copy_from_slice(src),
            (Cells::Two(dst), Cells::Two(src)) => dst.copy_from_slice(src),
            (Cells::Four(dst), Cells::Four(src)) => dst.copy_from_slice(src),
            (Cells::Eight(dst), Cells::Eight(src)) => dst.copy_from_slice(src),
            _ => return false,
        }
        true
    }
}

/// Array whose elements all live in memory.
#[derive(Debug)]
pub struct ResidentArray {
    cells: RefCell<Cells>,
    max_value: u64,
    frozen: bool,
}

impl ResidentArray {
    /// Allocates `len` zeroed elements of `width` bytes each.
    pub fn new(len: u64, max_value: u64, width: Width) -> Result<Self> {
        ensure!(
            max_value <= width.bound(),
            "max value {} is greater than {}, the upper limit for width {}",
            max_value,
            width.bound(),
            width
        );
        let len = usize::try_from(len)
            .wrap_err_with(|| format!("{} elements do not fit in addressable memory", len))?;

        Ok(Self {
            cells: RefCell::new(Cells::zeroed(width, len)),
            max_value,
            frozen: false,
        })
    }

    pub fn len(&self) -> u64 {
        self.cells.borrow().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> Width {
        self.cells.borrow().width()
    }

    pub fn max_value(&self) -> u64 {
        self.max_value
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn value_at(&self, index: u64) -> Result<u64> {
        let cells = self.cells.borrow();
        let len = cells.len() as u64;
        if index >= len {
            return Err(ArrayError::OutOfRange { index, len }.into());
        }
        Ok(cells.get(index as usize))
    }

    /// # Panics
    ///
    /// If the array is frozen or `value` exceeds the bound.
    pub fn set_value_at(&self, index: u64, value: u64) -> Result<()> {
        assert!(!self.frozen, "array is read-only");
        assert!(
            value <= self.max_value,
            "value out of range: value {} vs max {}",
            value,
            self.max_value
        );
        let mut cells = self.cells.borrow_mut();
        let len = cells.len() as u64;
        if index >= len {
            return Err(ArrayError::OutOfRange { index, len }.into());
        }
        cells.set(index as usize, value);
        Ok(())
    }

    pub fn iterate(&self, start: u64, end: u64) -> ResidentIter<'_> {
        ResidentIter::new(self, start, end, Direction::Ascending)
    }

    pub fn reverse_iterate(&self, start: u64, end: u64) -> ResidentIter<'_> {
        ResidentIter::new(self, start, end, Direction::Descending)
    }

    /// # Panics
    ///
    /// If the array is frozen or `len` exceeds the current length.
    pub fn truncate(&mut self, len: u64) {
        assert!(!self.frozen, "array is read-only");
        let current = self.len();
        assert!(len <= current, "cannot grow an array from {} to {}", current, len);
        self.cells.get_mut().truncate(len as usize);
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Replaces every element with `src`'s if both share a width.
    ///
    /// Returns false (copying nothing) when the widths differ.
    pub(crate) fn copy_cells_from(&mut self, src: &ResidentArray) -> bool {
        let src = src.cells.borrow();
        self.cells.get_mut().copy_raw(&src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_array_reads_zero() {
        for width in Width::ALL {
            let array = ResidentArray::new(10, width.bound(), width).unwrap();
            assert_eq!(array.len(), 10);
            assert_eq!(array.width(), width);
            for i in 0..10 {
                assert_eq!(array.value_at(i).unwrap(), 0);
            }
            let err = array.value_at(10).unwrap_err();
            assert!(ArrayError::is_out_of_range(&err));
        }
    }

    #[test]
    fn set_value_round_trips_at_full_bound() {
        for width in Width::ALL {
            let array = ResidentArray::new(4, width.bound(), width).unwrap();
            array.set_value_at(2, width.bound()).unwrap();
            assert_eq!(array.value_at(2).unwrap(), width.bound());
            assert_eq!(array.value_at(1).unwrap(), 0);
            assert_eq!(array.value_at(3).unwrap(), 0);
        }
    }

    #[test]
    fn set_value_past_end_is_out_of_range() {
        let array = ResidentArray::new(3, 255, Width::One).unwrap();
        let err = array.set_value_at(3, 1).unwrap_err();
        assert_eq!(
            ArrayError::of(&err),
            Some(&ArrayError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    #[should_panic(expected = "value out of range")]
    fn set_value_above_bound_panics() {
        let array = ResidentArray::new(3, 100, Width::One).unwrap();
        let _ = array.set_value_at(0, 101);
    }

    #[test]
    #[should_panic(expected = "read-only")]
    fn frozen_array_rejects_writes() {
        let mut array = ResidentArray::new(3, 255, Width::One).unwrap();
        array.freeze();
        let _ = array.set_value_at(0, 1);
    }

    #[test]
    fn truncate_keeps_prefix() {
        let mut array = ResidentArray::new(8, 65535, Width::Two).unwrap();
        for i in 0..8 {
            array.set_value_at(i, i * 1000).unwrap();
        }
        array.truncate(5);
        assert_eq!(array.len(), 5);
        assert_eq!(array.value_at(4).unwrap(), 4000);
        assert!(array.value_at(5).is_err());
    }

    #[test]
    #[should_panic(expected = "cannot grow")]
    fn truncate_cannot_grow() {
        let mut array = ResidentArray::new(2, 255, Width::One).unwrap();
        array.truncate(3);
    }

    #[test]
    fn bound_must_fit_width() {
        assert!(ResidentArray::new(1, 256, Width::One).is_err());
        assert!(ResidentArray::new(1, 256, Width::Two).is_ok());
    }

    #[test]
    fn raw_copy_requires_same_width() {
        let src = ResidentArray::new(3, 255, Width::One).unwrap();
        src.set_value_at(1, 9).unwrap();

        let mut same = ResidentArray::new(3, 255, Width::One).unwrap();
        assert!(same.copy_cells_from(&src));
        assert_eq!(same.value_at(1).unwrap(), 9);

        let mut wider = ResidentArray::new(3, 65535, Width::Two).unwrap();
        assert!(!wider.copy_cells_from(&src));
        assert_eq!(wider.value_at(1).unwrap(), 0);
    }
}
