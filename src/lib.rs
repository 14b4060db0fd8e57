//! # Gridiron Maker
//!
//! The maker engine of the Gridiron stablecoin. Grid is issued in two ways:
//! by swapping a registered backing asset together with the auxiliary Iron
//! token, split according to a dynamic backing ratio, or by borrowing
//! against collateral in a debt position whose borrowing power grows with
//! posted Iron.
//!
//! ## Architecture
//!
//! - **Core**: coins, configuration, backing pools and collateral positions
//! - **Maker**: backing ratio controller, swap calculations, collateral
//!   engine, message handlers, queries and governance proposals
//! - **Storage**: typed key-value state with atomic write batches
//! - **Oracle** and **Ledger**: injected price source and bank capabilities
//!
//! ## Design Principles
//!
//! - **Exact**: fixed-point decimals with explicit rounding in the
//!   protocol's favour
//! - **Atomic**: a failed message leaves state and balances unchanged
//! - **Deterministic**: identical inputs produce identical state hashes
//!
//! ## Example
//!
//! ```rust
//! use gridiron_maker::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let oracle = InMemoryOracle::new()
//!     .with_price("ugrid", dec!(1))
//!     .unwrap()
//!     .with_price("airon", dec!(2))
//!     .unwrap()
//!     .with_price("uusdc", dec!(1))
//!     .unwrap();
//! let ledger = InMemoryLedger::new();
//! let alice = Address::new("grid1alice").unwrap();
//! ledger.fund(&alice, &[Coin::new("uusdc", 1_000_000)]).unwrap();
//!
//! let mut maker = Maker::new(InMemoryStore::new(), oracle, ledger, MakerConfig::default()).unwrap();
//! maker.register_backing(&BackingRiskParams::new("uusdc")).unwrap();
//!
//! let response = maker
//!     .mint_by_swap(
//!         &BlockContext::new(1),
//!         &MsgMintBySwap {
//!             sender: alice.clone(),
//!             to: None,
//!             backing_in_max: Coin::new("uusdc", 1_000),
//!             iron_in_max: Coin::zero("airon"),
//!             mint_out_min: Coin::new("ugrid", 1_000),
//!             full_backing: false,
//!         },
//!     )
//!     .unwrap();
//! assert_eq!(response.mint_out, Coin::new("ugrid", 1_000));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod error;
pub mod ledger;
pub mod maker;
pub mod oracle;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        backing::{BackingRiskParams, PoolBacking, TotalBacking},
        coin::{Address, Coin},
        collateral::{AccountCollateral, CollateralRiskParams, PoolCollateral, TotalCollateral},
        config::{MakerConfig, MakerParams},
    };
    pub use crate::error::{Error, Result};
    pub use crate::ledger::{InMemoryLedger, Ledger};
    pub use crate::maker::{
        proposals::MakerProposal, BlockContext, Maker, MakerEvent, MsgBurnByCollateral, MsgBurnBySwap,
        MsgBuyBacking, MsgDepositCollateral, MsgLiquidateCollateral, MsgMintByCollateral, MsgMintBySwap,
        MsgRedeemCollateral, MsgSellBacking,
    };
    pub use crate::oracle::{InMemoryOracle, PriceOracle};
    pub use crate::storage::{InMemoryStore, MakerStore, StorageBackend};
}

pub use error::{Error, Result};
pub use maker::Maker;
