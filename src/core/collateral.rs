//! Collateralized debt positions.
//!
//! Each account holds at most one position per collateral denomination.
//! Pool and total aggregates are maintained incrementally alongside the
//! account record and always equal the sum of their constituents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::coin::{validate_denom, Address, Coin};
use crate::core::config::{check_fraction, check_unit_interval};
use crate::error::{Error, Result};
use crate::utils::math::{dec_div, dec_mul, round_amount, safe_add, safe_sub, to_dec};

// ═══════════════════════════════════════════════════════════════════════════════
// RISK PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Governance-controlled parameters of one collateral denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRiskParams {
    /// Collateral denomination
    pub collateral_denom: String,

    /// Whether positions in this collateral may be opened or changed
    pub enabled: bool,

    /// Maximum collateral the pool may hold; `None` is unlimited
    pub max_collateral: Option<u128>,

    /// Maximum Grid debt of the pool; `None` is unlimited
    pub max_grid_mint: Option<u128>,

    /// Debt value at or above `collateral value * threshold` is liquidatable
    pub liquidation_threshold: Decimal,

    /// Loan-to-value reached with the full catalytic Iron ratio
    pub loan_to_value: Decimal,

    /// Loan-to-value without any Iron posted
    pub basic_loan_to_value: Decimal,

    /// Iron-to-collateral value ratio at which `loan_to_value` is reached
    pub catalytic_iron_ratio: Decimal,

    /// Fraction of seized collateral held back on liquidation
    pub liquidation_fee: Decimal,

    /// Fee rate on mint by collateral
    pub mint_fee: Option<Decimal>,

    /// Annual interest rate on principal debt
    pub interest_fee: Decimal,
}

impl CollateralRiskParams {
    /// Enabled collateral with the given loan-to-value and no Iron boost
    pub fn new(collateral_denom: impl Into<String>, loan_to_value: Decimal) -> Self {
        Self {
            collateral_denom: collateral_denom.into(),
            enabled: true,
            max_collateral: None,
            max_grid_mint: None,
            liquidation_threshold: loan_to_value,
            loan_to_value,
            basic_loan_to_value: loan_to_value,
            catalytic_iron_ratio: Decimal::ZERO,
            liquidation_fee: Decimal::ZERO,
            mint_fee: None,
            interest_fee: Decimal::ZERO,
        }
    }

    /// Set the Iron catalysed loan-to-value range
    pub fn with_catalytic(mut self, basic_loan_to_value: Decimal, catalytic_iron_ratio: Decimal) -> Self {
        self.basic_loan_to_value = basic_loan_to_value;
        self.catalytic_iron_ratio = catalytic_iron_ratio;
        self
    }

    /// Set liquidation threshold and fee
    pub fn with_liquidation(mut self, threshold: Decimal, fee: Decimal) -> Self {
        self.liquidation_threshold = threshold;
        self.liquidation_fee = fee;
        self
    }

    /// Set mint fee and interest rate
    pub fn with_fees(mut self, mint_fee: Option<Decimal>, interest_fee: Decimal) -> Self {
        self.mint_fee = mint_fee;
        self.interest_fee = interest_fee;
        self
    }

    /// Set pool ceilings
    pub fn with_ceilings(mut self, max_collateral: Option<u128>, max_grid_mint: Option<u128>) -> Self {
        self.max_collateral = max_collateral;
        self.max_grid_mint = max_grid_mint;
        self
    }

    /// Enable or disable the collateral
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate `basic_ltv <= ltv <= threshold <= 1` and fee ranges
    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.collateral_denom)?;
        check_unit_interval("liquidation_threshold", self.liquidation_threshold)?;
        check_unit_interval("loan_to_value", self.loan_to_value)?;
        check_unit_interval("basic_loan_to_value", self.basic_loan_to_value)?;
        check_unit_interval("catalytic_iron_ratio", self.catalytic_iron_ratio)?;
        check_fraction("liquidation_fee", self.liquidation_fee)?;
        if let Some(mint_fee) = self.mint_fee {
            check_fraction("mint_fee", mint_fee)?;
        }
        if self.interest_fee.is_sign_negative() {
            return Err(Error::invalid_param("interest_fee", "cannot be negative"));
        }

        if self.basic_loan_to_value > self.loan_to_value {
            return Err(Error::invalid_param(
                "basic_loan_to_value",
                format!("{} exceeds loan_to_value {}", self.basic_loan_to_value, self.loan_to_value),
            ));
        }
        if self.loan_to_value > self.liquidation_threshold {
            return Err(Error::invalid_param(
                "loan_to_value",
                format!(
                    "{} exceeds liquidation_threshold {}",
                    self.loan_to_value, self.liquidation_threshold
                ),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSITIONS AND AGGREGATES
// ═══════════════════════════════════════════════════════════════════════════════

/// One account's position in one collateral denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCollateral {
    /// Owner
    pub account: Address,

    /// Collateral held
    pub collateral: Coin,

    /// Iron posted to raise the available loan-to-value
    pub iron_collateralized: u128,

    /// Grid debt including accrued interest
    pub grid_debt: u128,

    /// Accrued interest not yet repaid; part of `grid_debt`
    pub last_interest: u128,

    /// Height interest was last settled at
    pub last_settlement_block: i64,
}

impl AccountCollateral {
    /// Empty position opened at `height`
    pub fn new(account: Address, denom: impl Into<String>, height: i64) -> Self {
        Self {
            account,
            collateral: Coin::zero(denom),
            iron_collateralized: 0,
            grid_debt: 0,
            last_interest: 0,
            last_settlement_block: height,
        }
    }

    /// Debt excluding accrued interest
    pub fn principal_debt(&self) -> Result<u128> {
        safe_sub(self.grid_debt, self.last_interest)
    }
}

/// Per-denomination collateral aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCollateral {
    /// Collateral held across all positions
    pub collateral: Coin,

    /// Grid debt across all positions
    pub grid_debt: u128,

    /// Iron posted across all positions
    pub iron_collateralized: u128,
}

impl PoolCollateral {
    /// Empty pool for `denom`
    pub fn new(denom: impl Into<String>) -> Self {
        Self {
            collateral: Coin::zero(denom),
            grid_debt: 0,
            iron_collateralized: 0,
        }
    }
}

/// Totals across every collateral pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCollateral {
    /// Grid debt across all pools
    pub grid_debt: u128,

    /// Iron posted across all pools
    pub iron_collateralized: u128,
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTEREST AND LOAN-TO-VALUE
// ═══════════════════════════════════════════════════════════════════════════════

/// Accrue interest on the principal debt since the last settlement.
///
/// `interest = round(principal * apr * blocks_elapsed / blocks_per_year)` is
/// added to the account, pool and total debt and to the unpaid interest
/// tracker, and the settlement height moves to `height`. Settling twice at
/// the same height changes nothing. Returns the accrued interest.
pub fn settle_interest_fee(
    acc: &mut AccountCollateral,
    pool: &mut PoolCollateral,
    total: &mut TotalCollateral,
    apr: Decimal,
    height: i64,
    blocks_per_year: u64,
) -> Result<u128> {
    let period = height - acc.last_settlement_block;
    if period <= 0 {
        return Ok(0);
    }
    if blocks_per_year == 0 {
        return Err(Error::invalid_param("blocks_per_year", "cannot be zero"));
    }

    let principal = to_dec(acc.principal_debt()?)?;
    let accrued = dec_mul(dec_mul(principal, apr)?, Decimal::from(period))?;
    let interest = round_amount(dec_div(accrued, Decimal::from(blocks_per_year))?)?;

    acc.last_interest = safe_add(acc.last_interest, interest)?;
    acc.grid_debt = safe_add(acc.grid_debt, interest)?;
    pool.grid_debt = safe_add(pool.grid_debt, interest)?;
    total.grid_debt = safe_add(total.grid_debt, interest)?;
    acc.last_settlement_block = height;

    Ok(interest)
}

/// Loan-to-value available to a position.
///
/// Posted Iron raises the loan-to-value linearly from `basic_loan_to_value`
/// to `loan_to_value` as the Iron-to-collateral value ratio grows to
/// `catalytic_iron_ratio`. With a zero catalytic ratio the basic value
/// applies. `collateral_value` must be positive.
pub fn available_loan_to_value(
    params: &CollateralRiskParams,
    collateral_value: Decimal,
    iron_value: Decimal,
) -> Result<Decimal> {
    if params.catalytic_iron_ratio <= Decimal::ZERO {
        return Ok(params.basic_loan_to_value);
    }

    let catalytic_ratio = dec_div(iron_value, collateral_value)?.min(params.catalytic_iron_ratio);
    let boost = dec_mul(catalytic_ratio, params.loan_to_value - params.basic_loan_to_value)?;
    Ok(params.basic_loan_to_value + dec_div(boost, params.catalytic_iron_ratio)?)
}
