//! Oracle module for price feeds.
//!
//! ## Usage
//!
//! ```rust
//! use gridiron_maker::oracle::{InMemoryOracle, PriceOracle};
//! use rust_decimal_macros::dec;
//!
//! let oracle = InMemoryOracle::new().with_price("uatom", dec!(10)).unwrap();
//! assert_eq!(oracle.exchange_rate("uatom").unwrap(), dec!(10));
//! ```

pub mod price_feed;

pub use price_feed::*;
