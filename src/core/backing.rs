//! Backing pools for swap-based minting.
//!
//! A backing pool holds one registered hard asset. Grid is minted against it
//! by swap and burned back out of it; the signed counters track the net
//! Grid issued and net Iron retired through the pool.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::coin::{validate_denom, Coin};
use crate::core::config::check_fraction;
use crate::error::{Error, Result};
use crate::utils::math::{safe_add, safe_sub, signed_add, signed_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// RISK PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Governance-controlled parameters of one backing denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingRiskParams {
    /// Backing denomination
    pub backing_denom: String,

    /// Whether swaps against this backing are allowed
    pub enabled: bool,

    /// Maximum backing the pool may hold; `None` is unlimited
    pub max_backing: Option<u128>,

    /// Maximum net Grid minted through the pool; `None` is unlimited
    pub max_grid_mint: Option<u128>,

    /// Fee rate on mint by swap
    pub mint_fee: Option<Decimal>,

    /// Fee rate on burn by swap
    pub burn_fee: Option<Decimal>,

    /// Fee rate on buying backing with Iron
    pub buyback_fee: Option<Decimal>,

    /// Fee rate on selling backing for Iron
    pub reback_fee: Option<Decimal>,
}

impl BackingRiskParams {
    /// Enabled backing with no fees and no ceilings
    pub fn new(backing_denom: impl Into<String>) -> Self {
        Self {
            backing_denom: backing_denom.into(),
            enabled: true,
            max_backing: None,
            max_grid_mint: None,
            mint_fee: None,
            burn_fee: None,
            buyback_fee: None,
            reback_fee: None,
        }
    }

    /// Set all four fee rates
    pub fn with_fees(
        mut self,
        mint: Option<Decimal>,
        burn: Option<Decimal>,
        buyback: Option<Decimal>,
        reback: Option<Decimal>,
    ) -> Self {
        self.mint_fee = mint;
        self.burn_fee = burn;
        self.buyback_fee = buyback;
        self.reback_fee = reback;
        self
    }

    /// Set pool ceilings
    pub fn with_ceilings(mut self, max_backing: Option<u128>, max_grid_mint: Option<u128>) -> Self {
        self.max_backing = max_backing;
        self.max_grid_mint = max_grid_mint;
        self
    }

    /// Enable or disable swaps
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate fee ranges.
    ///
    /// `reback_bonus` is the module-wide bonus; the reback fee plus the bonus
    /// must stay below one so that selling backing always issues Iron.
    pub fn validate(&self, reback_bonus: Decimal) -> Result<()> {
        validate_denom(&self.backing_denom)?;
        for (name, rate) in [
            ("mint_fee", self.mint_fee),
            ("burn_fee", self.burn_fee),
            ("buyback_fee", self.buyback_fee),
            ("reback_fee", self.reback_fee),
        ] {
            if let Some(rate) = rate {
                check_fraction(name, rate)?;
            }
        }

        let reback_fee = self.reback_fee.unwrap_or(Decimal::ZERO);
        if reback_fee + reback_bonus >= Decimal::ONE {
            return Err(Error::invalid_param(
                "reback_fee",
                format!("reback fee {} plus bonus {} must be below 1", reback_fee, reback_bonus),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POOL AGGREGATES
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-denomination backing pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBacking {
    /// Backing asset held by the pool
    pub backing: Coin,

    /// Net Grid issued; negative when more was burned than minted
    pub grid_minted: i128,

    /// Net Iron retired; negative when more was minted than burned
    pub iron_burned: i128,
}

impl PoolBacking {
    /// Empty pool for `denom`
    pub fn new(denom: impl Into<String>) -> Self {
        Self {
            backing: Coin::zero(denom),
            grid_minted: 0,
            iron_burned: 0,
        }
    }

    /// Apply a mint by swap: backing and Iron flow in, Grid flows out
    pub fn record_mint(&mut self, backing_in: u128, iron_in: u128, grid_total: u128) -> Result<()> {
        self.backing.amount = safe_add(self.backing.amount, backing_in)?;
        self.grid_minted = signed_add(self.grid_minted, grid_total)?;
        self.iron_burned = signed_add(self.iron_burned, iron_in)?;
        Ok(())
    }

    /// Apply a burn by swap: Grid flows in, backing and Iron flow out
    pub fn record_burn(&mut self, backing_out: u128, iron_out: u128, grid_burned: u128) -> Result<()> {
        self.backing.amount = safe_sub(self.backing.amount, backing_out)?;
        self.grid_minted = signed_sub(self.grid_minted, grid_burned)?;
        self.iron_burned = signed_sub(self.iron_burned, iron_out)?;
        Ok(())
    }
}

/// Totals across every backing pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalBacking {
    /// Sum of pool `grid_minted`
    pub grid_minted: i128,

    /// Sum of pool `iron_burned`
    pub iron_burned: i128,
}

impl TotalBacking {
    /// Mirror of [`PoolBacking::record_mint`]
    pub fn record_mint(&mut self, iron_in: u128, grid_total: u128) -> Result<()> {
        self.grid_minted = signed_add(self.grid_minted, grid_total)?;
        self.iron_burned = signed_add(self.iron_burned, iron_in)?;
        Ok(())
    }

    /// Mirror of [`PoolBacking::record_burn`]
    pub fn record_burn(&mut self, iron_out: u128, grid_burned: u128) -> Result<()> {
        self.grid_minted = signed_sub(self.grid_minted, grid_burned)?;
        self.iron_burned = signed_sub(self.iron_burned, iron_out)?;
        Ok(())
    }
}
