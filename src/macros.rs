//! # Internal Macros
//!
//! Dispatch helpers for the closed enums at the center of the crate.
//!
//! ## with_cells!
//!
//! Runs the same expression against whichever typed vector a resident array
//! holds. The body is monomorphised per arm, so `vec[i] as u64` and
//! `vec[i] = v as _` compile to the native width in each case.
//!
//! ```ignore
//! let len = with_cells!(&self.cells, vec => vec.len());
//! ```
//!
//! ## on_backing!
//!
//! Forwards a call to the resident or paged variant of a `BigArray` or
//! `ArrayIter`.
//!
//! ```ignore
//! on_backing!(self, inner => inner.len())
//! ```

macro_rules! with_cells {
    ($cells:expr, $vec:ident => $body:expr) => {
        match $cells {
            $crate::array::resident::Cells::One($vec) => $body,
            $crate::array::resident::Cells::Two($vec) => $body,
            $crate::array::resident::Cells::Four($vec) => $body,
            $crate::array::resident::Cells::Eight($vec) => $body,
        }
    };
}

macro_rules! on_backing {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::Resident($inner) => $body,
            Self::Paged($inner) => $body,
        }
    };
}
