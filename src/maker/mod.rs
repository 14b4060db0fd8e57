//! Maker engine.
//!
//! [`Maker`] owns the persisted state and the injected oracle and ledger
//! capabilities. Its behaviour is split across:
//! - [`backing_ratio`]: the per-block backing ratio controller
//! - [`calculate`]: pure swap computations (mint, burn, buyback, reback)
//! - [`collateral`]: position loading, interest settlement and loan-to-value
//! - [`handlers`]: message execution against the store and the ledger
//! - [`query`]: read-only queries and estimates
//! - [`proposals`]: governance updates of risk parameters
//!
//! ## Usage
//!
//! ```rust
//! use gridiron_maker::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let oracle = InMemoryOracle::new().with_price("ugrid", dec!(1)).unwrap();
//! let maker = Maker::new(InMemoryStore::new(), oracle, InMemoryLedger::new(), MakerConfig::default()).unwrap();
//! assert_eq!(maker.backing_ratio().unwrap(), dec!(1));
//! ```

pub mod backing_ratio;
pub mod calculate;
pub mod collateral;
pub mod events;
pub mod handlers;
pub mod msgs;
pub mod proposals;
pub mod query;

pub use calculate::*;
pub use collateral::CollateralPosition;
pub use events::*;
pub use msgs::*;
pub use query::*;

use rust_decimal::Decimal;
use tracing::debug;

use crate::core::backing::{BackingRiskParams, PoolBacking, TotalBacking};
use crate::core::coin::{Address, Coin};
use crate::core::collateral::CollateralRiskParams;
use crate::core::config::{MakerConfig, MakerParams};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::oracle::PriceOracle;
use crate::storage::{MakerStore, StorageBackend};

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Execution context of the block being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    /// Block height
    pub height: i64,
}

impl BlockContext {
    /// Context at `height`
    pub fn new(height: i64) -> Self {
        Self { height }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// The maker engine
pub struct Maker<B: StorageBackend, O: PriceOracle, L: Ledger> {
    /// Persisted state
    store: MakerStore<B>,
    /// Price source
    oracle: O,
    /// Bank
    ledger: L,
    /// Constructor-time configuration
    config: MakerConfig,
    /// Events not yet drained by the caller
    events: EventLog,
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    /// Create an engine over `backend`.
    ///
    /// The configuration is validated and its params are written to the
    /// store unless params were persisted before.
    pub fn new(backend: B, oracle: O, ledger: L, config: MakerConfig) -> Result<Self> {
        config.validate()?;

        let store = MakerStore::new(backend);
        if !store.has_params()? {
            store.set_params(&config.params)?;
        }

        Ok(Self {
            store,
            oracle,
            ledger,
            config,
            events: EventLog::new(),
        })
    }

    /// Persisted state
    pub fn store(&self) -> &MakerStore<B> {
        &self.store
    }

    /// Price source
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Bank
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Engine configuration
    pub fn config(&self) -> &MakerConfig {
        &self.config
    }

    /// Events emitted since the last drain
    pub fn events(&self) -> &[MakerEvent] {
        self.events.events()
    }

    /// Take every pending event
    pub fn drain_events(&mut self) -> Vec<MakerEvent> {
        self.events.drain()
    }

    pub(crate) fn emit(&mut self, event: MakerEvent) {
        self.events.push(event);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SHARED LOOKUPS
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn grid_denom(&self) -> &str {
        &self.config.grid_denom
    }

    pub(crate) fn iron_denom(&self) -> &str {
        &self.config.iron_denom
    }

    pub(crate) fn target(&self) -> Decimal {
        self.config.grid_target
    }

    pub(crate) fn price(&self, denom: &str) -> Result<Decimal> {
        self.oracle.exchange_rate(denom)
    }

    pub(crate) fn iron_price(&self) -> Result<Decimal> {
        self.price(&self.config.iron_denom)
    }

    pub(crate) fn maker_address(&self) -> Address {
        self.ledger.module_address(&self.config.maker_module)
    }

    /// Backing held by the maker module account
    pub(crate) fn module_balance(&self, denom: &str) -> Result<u128> {
        self.ledger.balance(&self.maker_address(), denom)
    }

    pub(crate) fn grid_coin(&self, amount: u128) -> Coin {
        Coin::new(self.config.grid_denom.clone(), amount)
    }

    pub(crate) fn iron_coin(&self, amount: u128) -> Coin {
        Coin::new(self.config.iron_denom.clone(), amount)
    }

    /// Registered and enabled backing params
    pub(crate) fn available_backing_params(&self, denom: &str) -> Result<BackingRiskParams> {
        let params = self
            .store
            .backing_risk_params(denom)?
            .ok_or_else(|| Error::BackingCoinNotFound(denom.to_string()))?;
        if !params.enabled {
            debug!(denom, "backing disabled");
            return Err(Error::BackingCoinDisabled(denom.to_string()));
        }
        Ok(params)
    }

    /// Registered and enabled collateral params
    pub(crate) fn available_collateral_params(&self, denom: &str) -> Result<CollateralRiskParams> {
        let params = self
            .store
            .collateral_risk_params(denom)?
            .ok_or_else(|| Error::CollateralCoinNotFound(denom.to_string()))?;
        if !params.enabled {
            debug!(denom, "collateral disabled");
            return Err(Error::CollateralCoinDisabled(denom.to_string()));
        }
        Ok(params)
    }

    /// Total backing and the pool of `denom`
    pub(crate) fn backing(&self, denom: &str) -> Result<(TotalBacking, PoolBacking)> {
        let total = self
            .store
            .total_backing()?
            .ok_or_else(|| Error::BackingCoinNotFound("total backing not found".into()))?;
        let pool = self
            .store
            .pool_backing(denom)?
            .ok_or_else(|| Error::BackingCoinNotFound(denom.to_string()))?;
        Ok((total, pool))
    }

    /// Grid must trade at or above `target * (1 + mint_price_bias)`
    pub(crate) fn check_mint_price_lower_bound(&self, params: &MakerParams) -> Result<()> {
        let grid_price = self.price(self.grid_denom())?;
        let bound = self.target() * (Decimal::ONE + params.mint_price_bias);
        if grid_price < bound {
            debug!(%grid_price, %bound, "grid price below mint bound");
            return Err(Error::GridPriceTooLow {
                price: grid_price.to_string(),
                bound: bound.to_string(),
            });
        }
        Ok(())
    }

    /// Grid must trade at or below `target * (1 - burn_price_bias)`
    pub(crate) fn check_burn_price_upper_bound(&self, params: &MakerParams) -> Result<()> {
        let grid_price = self.price(self.grid_denom())?;
        let bound = self.target() * (Decimal::ONE - params.burn_price_bias);
        if grid_price > bound {
            debug!(%grid_price, %bound, "grid price above burn bound");
            return Err(Error::GridPriceTooHigh {
                price: grid_price.to_string(),
                bound: bound.to_string(),
            });
        }
        Ok(())
    }
}

/// Net minted Grid must stay within an optional ceiling
pub(crate) fn check_grid_ceiling(minted: i128, ceiling: Option<u128>) -> Result<()> {
    match ceiling {
        Some(max) if u128::try_from(minted).map_or(false, |minted| minted > max) => {
            debug!(minted, max, "grid over ceiling");
            Err(Error::GridCeiling { minted, max })
        }
        _ => Ok(()),
    }
}

/// Pool backing must stay within an optional ceiling
pub(crate) fn check_backing_ceiling(denom: &str, amount: u128, ceiling: Option<u128>) -> Result<()> {
    match ceiling {
        Some(max) if amount > max => {
            debug!(denom, amount, max, "backing over ceiling");
            Err(Error::BackingCeiling {
                denom: denom.to_string(),
                amount,
                max,
            })
        }
        _ => Ok(()),
    }
}
