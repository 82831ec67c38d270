//! # Fixed-Width Cell Encoding
//!
//! Every element of an array is stored as a little-endian unsigned integer
//! occupying exactly `width` bytes. There is no header, tag or padding:
//!
//! | Width | Cell layout            | Largest value          |
//! |-------|------------------------|------------------------|
//! | 1     | `[b0]`                 | 255                    |
//! | 2     | `[b0, b1]`             | 65535                  |
//! | 4     | `[b0, b1, b2, b3]`     | 4294967295             |
//! | 8     | `[b0 .. b7]`           | u64::MAX               |
//!
//! A persisted array of `N` elements is therefore exactly `N * width` bytes
//! and element `i` starts at byte `i * width`.
//!
//! ## Usage Example
//!
//! ```rust
//! use bigarray::encoding::{decode, encode, Width};
//!
//! let width = Width::for_bound(1000);
//! assert_eq!(width, Width::Two);
//!
//! let mut cell = [0u8; 2];
//! encode(width, 1000, &mut cell);
//! assert_eq!(cell, [0xE8, 0x03]);
//! assert_eq!(decode(width, &cell), 1000);
//! ```
//!
//! ## Contract
//!
//! `decode` and `encode` index into the given slice; passing a slice shorter
//! than the width panics. Values wider than the cell are truncated by
//! `encode`; callers check the array bound before encoding.

use eyre::{bail, Result};

/// Number of bytes used to store one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Width {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl Width {
    pub const ALL: [Width; 4] = [Width::One, Width::Two, Width::Four, Width::Eight];

    /// Validates a raw byte count.
    pub fn from_bytes(bytes: u8) -> Result<Self> {
        match bytes {
            1 => Ok(Width::One),
            2 => Ok(Width::Two),
            4 => Ok(Width::Four),
            8 => Ok(Width::Eight),
            other => bail!("width must be 1, 2, 4, or 8 bytes, got {}", other),
        }
    }

    /// Smallest width whose range covers `max_value`.
    pub fn for_bound(max_value: u64) -> Self {
        if max_value <= u8::MAX as u64 {
            Width::One
        } else if max_value <= u16::MAX as u64 {
            Width::Two
        } else if max_value <= u32::MAX as u64 {
            Width::Four
        } else {
            Width::Eight
        }
    }

    /// Largest value representable in this width: `2^(8 * width) - 1`.
    pub fn bound(self) -> u64 {
        match self {
            Width::One => u8::MAX as u64,
            Width::Two => u16::MAX as u64,
            Width::Four => u32::MAX as u64,
            Width::Eight => u64::MAX,
        }
    }

    #[inline]
    pub fn bytes(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Width {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}B", self.bytes())
    }
}

#[inline]
pub fn decode(width: Width, data: &[u8]) -> u64 {
    match width {
        Width::One => data[0] as u64,
        Width::Two => u16::from_le_bytes([data[0], data[1]]) as u64,
        Width::Four => u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as u64,
        Width::Eight => {
            let mut cell = [0u8; 8];
            cell.copy_from_slice(&data[..8]);
            u64::from_le_bytes(cell)
        }
    }
}

#[inline]
pub fn encode(width: Width, value: u64, out: &mut [u8]) {
    match width {
        Width::One => out[0] = value as u8,
        Width::Two => out[..2].copy_from_slice(&(value as u16).to_le_bytes()),
        Width::Four => out[..4].copy_from_slice(&(value as u32).to_le_bytes()),
        Width::Eight => out[..8].copy_from_slice(&value.to_le_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_bound_picks_smallest_width() {
        assert_eq!(Width::for_bound(0), Width::One);
        assert_eq!(Width::for_bound(255), Width::One);
        assert_eq!(Width::for_bound(256), Width::Two);
        assert_eq!(Width::for_bound(65535), Width::Two);
        assert_eq!(Width::for_bound(65536), Width::Four);
        assert_eq!(Width::for_bound(u32::MAX as u64), Width::Four);
        assert_eq!(Width::for_bound(u32::MAX as u64 + 1), Width::Eight);
        assert_eq!(Width::for_bound(u64::MAX), Width::Eight);
    }

    #[test]
    fn bound_covers_full_cell() {
        assert_eq!(Width::One.bound(), 0xFF);
        assert_eq!(Width::Two.bound(), 0xFFFF);
        assert_eq!(Width::Four.bound(), 0xFFFF_FFFF);
        assert_eq!(Width::Eight.bound(), u64::MAX);
    }

    #[test]
    fn bound_and_for_bound_agree() {
        for width in Width::ALL {
            assert_eq!(Width::for_bound(width.bound()), width);
        }
    }

    #[test]
    fn from_bytes_rejects_odd_widths() {
        assert_eq!(Width::from_bytes(4).unwrap(), Width::Four);
        assert!(Width::from_bytes(0).is_err());
        assert!(Width::from_bytes(3).is_err());
        assert!(Width::from_bytes(16).is_err());
    }

    #[test]
    fn encode_is_little_endian() {
        let mut cell = [0u8; 8];
        encode(Width::Four, 0x0102_0304, &mut cell);
        assert_eq!(&cell[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&cell[4..], &[0, 0, 0, 0]);

        encode(Width::Eight, 0x0102_0304_0506_0708, &mut cell);
        assert_eq!(cell, [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn decode_reads_only_its_width() {
        let data = [0xCC, 0xDD, 0xEE, 0xFF, 0x11, 0x22, 0x33, 0x44];
        assert_eq!(decode(Width::One, &data), 0xCC);
        assert_eq!(decode(Width::Two, &data), 0xDDCC);
        assert_eq!(decode(Width::Four, &data), 0xFFEE_DDCC);
        assert_eq!(decode(Width::Eight, &data), 0x4433_2211_FFEE_DDCC);
    }

    #[test]
    fn encode_leaves_neighbours_untouched() {
        let mut data = [0xAAu8; 6];
        encode(Width::Two, 0x1234, &mut data[2..]);
        assert_eq!(data, [0xAA, 0xAA, 0x34, 0x12, 0xAA, 0xAA]);
    }

    #[test]
    #[should_panic]
    fn decode_short_slice_panics() {
        decode(Width::Four, &[1, 2]);
    }
}
