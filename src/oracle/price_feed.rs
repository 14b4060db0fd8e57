//! Price feed capability.
//!
//! The maker engine never fetches prices itself: a [`PriceOracle`] is
//! injected at construction and queried for the USD exchange rate of a
//! denomination. The voting process behind the rates lives elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of USD exchange rates
pub trait PriceOracle {
    /// USD price of one base unit of `denom`.
    ///
    /// Fails with [`Error::PriceUnavailable`] when no valid price exists in
    /// the current window. A returned price is always positive.
    fn exchange_rate(&self, denom: &str) -> Result<Decimal>;
}

impl<T: PriceOracle + ?Sized> PriceOracle for Arc<T> {
    fn exchange_rate(&self, denom: &str) -> Result<Decimal> {
        (**self).exchange_rate(denom)
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for &T {
    fn exchange_rate(&self, denom: &str) -> Result<Decimal> {
        (**self).exchange_rate(denom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY ORACLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Oracle backed by a price table, for tests and simulations
#[derive(Debug, Default)]
pub struct InMemoryOracle {
    prices: RwLock<HashMap<String, Decimal>>,
}

impl InMemoryOracle {
    /// Create an oracle with no prices
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style price setup
    pub fn with_price(self, denom: impl Into<String>, price: Decimal) -> Result<Self> {
        self.set_price(denom, price)?;
        Ok(self)
    }

    /// Set or replace the price of `denom`; the price must be positive
    pub fn set_price(&self, denom: impl Into<String>, price: Decimal) -> Result<()> {
        let denom = denom.into();
        if price <= Decimal::ZERO {
            return Err(Error::InvalidPrice {
                denom,
                price: price.to_string(),
            });
        }
        let mut prices = self
            .prices
            .write()
            .map_err(|_| Error::Internal("oracle lock poisoned".into()))?;
        prices.insert(denom, price);
        Ok(())
    }

    /// Drop the price of `denom`, making it unavailable
    pub fn remove_price(&self, denom: &str) -> Result<Option<Decimal>> {
        let mut prices = self
            .prices
            .write()
            .map_err(|_| Error::Internal("oracle lock poisoned".into()))?;
        Ok(prices.remove(denom))
    }
}

impl PriceOracle for InMemoryOracle {
    fn exchange_rate(&self, denom: &str) -> Result<Decimal> {
        let prices = self
            .prices
            .read()
            .map_err(|_| Error::Internal("oracle lock poisoned".into()))?;

        match prices.get(denom) {
            Some(price) if *price > Decimal::ZERO => Ok(*price),
            _ => Err(Error::PriceUnavailable(denom.to_string())),
        }
    }
}
