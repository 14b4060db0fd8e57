//! Core domain types of the maker engine.
//!
//! - Coins and addresses
//! - Engine configuration and governable parameters
//! - Backing pools (swap-based minting)
//! - Collateral positions (debt-based minting)

pub mod backing;
pub mod coin;
pub mod collateral;
pub mod config;

pub use backing::*;
pub use coin::*;
pub use collateral::*;
pub use config::*;
