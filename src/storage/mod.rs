//! Storage module for persistent maker state.
//!
//! - Risk parameters per backing and collateral denomination
//! - Pool and total aggregates
//! - Per-account collateral positions
//! - Module params and the backing ratio
//!
//! ## Usage
//!
//! ```rust
//! use gridiron_maker::storage::{InMemoryStore, MakerStore};
//!
//! let store = MakerStore::new(InMemoryStore::new());
//! assert_eq!(store.backing_ratio().unwrap(), rust_decimal::Decimal::ONE);
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
