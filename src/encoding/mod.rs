//! # Encoding Module
//!
//! This module provides the fixed-width value codec shared by every backing:
//!
//! - **Width**: the number of bytes per element (1, 2, 4 or 8)
//! - **Cell encoding**: little-endian, unsigned, no sign bit, no padding

pub mod width;

pub use width::{decode, encode, Width};
