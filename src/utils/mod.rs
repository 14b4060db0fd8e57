//! Utility modules for the maker engine.
//!
//! - Constants and default parameters
//! - Fixed-point decimal arithmetic

pub mod constants;
pub mod math;

pub use constants::*;
pub use math::*;
