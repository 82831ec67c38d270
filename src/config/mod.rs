//! # Configuration Module
//!
//! This module centralizes the numeric defaults used across the crate. Values
//! that depend on each other are co-located and checked at compile time.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
