//! Whole-array traversal built on the cursor protocol.
//!
//! These work on any pair of backings and widths; `BigArray::copy_from` only
//! falls back to [`copy_through_cursors`] when no bulk copy applies.

use eyre::Result;
use tracing::warn;

use super::BigArray;

/// Copies `src` into `dst` element by element.
///
/// The destination cursor is closed first; its error wins over the source's.
pub(crate) fn copy_through_cursors(dst: &BigArray, src: &BigArray) -> Result<()> {
    let mut src_iter = src.iterate(0, src.len());
    let mut dst_iter = dst.iterate(0, dst.len());

    while src_iter.advance() && dst_iter.advance() {
        dst_iter.set_value(src_iter.value());
    }

    let dst_closed = dst_iter.close();
    let src_closed = src_iter.close();
    dst_closed?;
    src_closed
}

/// Calls `f(index, value)` for every element in ascending order.
///
/// An error from `f` stops the traversal and is returned after the cursor is
/// closed.
pub fn for_each<F>(array: &BigArray, f: F) -> Result<()>
where
    F: FnMut(u64, u64) -> Result<()>,
{
    drive(array.iterate(0, array.len()), f)
}

/// Calls `f(index, value)` for every element in descending order.
pub fn reverse_for_each<F>(array: &BigArray, f: F) -> Result<()>
where
    F: FnMut(u64, u64) -> Result<()>,
{
    drive(array.reverse_iterate(0, array.len()), f)
}

fn drive<F>(mut iter: crate::cursor::ArrayIter<'_>, mut f: F) -> Result<()>
where
    F: FnMut(u64, u64) -> Result<()>,
{
    while iter.advance() {
        if let Err(e) = f(iter.index(), iter.value()) {
            if let Err(close_err) = iter.close() {
                warn!(error = %close_err, "closing iterator after callback failure also failed");
            }
            return Err(e);
        }
    }
    iter.close()
}
