//! Collateral engine calculations.
//!
//! A position is keyed by (account, collateral denomination). Interest is
//! settled lazily whenever a message touches the position, and the
//! borrowing power of a position grows with the Iron posted alongside it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::coin::{Address, Coin};
use crate::core::collateral::{
    available_loan_to_value, settle_interest_fee, AccountCollateral, CollateralRiskParams, PoolCollateral,
    TotalCollateral,
};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::maker::{check_grid_ceiling, Maker};
use crate::oracle::PriceOracle;
use crate::storage::StorageBackend;
use crate::utils::math::*;

/// A position together with the aggregates it rolls up into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPosition {
    /// Totals across every collateral pool
    pub total: TotalCollateral,
    /// Pool of the position's denomination
    pub pool: PoolCollateral,
    /// The account's position
    pub account: AccountCollateral,
}

/// Borrowing power of a position at current prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanToValue {
    /// Loan-to-value after the Iron boost
    pub available: Decimal,
    /// Maximum debt value in USD
    pub max_debt_value: Decimal,
}

/// Outcome of a mint by collateral, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintByCollateralResult {
    /// Grid fee on top of the minted amount
    pub mint_fee: Coin,
    /// Position with interest settled and the new debt applied
    pub position: CollateralPosition,
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    /// Load a position and its aggregates.
    ///
    /// A missing position is an error unless `allow_new`, in which case an
    /// empty position opened at `height` is returned.
    pub(crate) fn collateral_position(
        &self,
        account: &Address,
        denom: &str,
        allow_new: bool,
        height: i64,
    ) -> Result<CollateralPosition> {
        let total = self
            .store
            .total_collateral()?
            .ok_or_else(|| Error::CollateralCoinNotFound(denom.to_string()))?;
        let pool = self
            .store
            .pool_collateral(denom)?
            .ok_or_else(|| Error::CollateralCoinNotFound(denom.to_string()))?;
        let account = match self.store.account_collateral(account, denom)? {
            Some(acc) => acc,
            None if allow_new => AccountCollateral::new(account.clone(), denom, height),
            None => return Err(Error::AccountNoCollateral(format!("{} has no {}", account, denom))),
        };
        Ok(CollateralPosition { total, pool, account })
    }

    /// Accrue interest on the position up to `height`
    pub(crate) fn settle_interest(
        &self,
        position: &mut CollateralPosition,
        params: &CollateralRiskParams,
        height: i64,
    ) -> Result<u128> {
        let interest = settle_interest_fee(
            &mut position.account,
            &mut position.pool,
            &mut position.total,
            params.interest_fee,
            height,
            self.config.blocks_per_year,
        )?;
        if interest > 0 {
            debug!(
                account = %position.account.account,
                denom = %position.account.collateral.denom,
                interest,
                "interest settled"
            );
        }
        Ok(interest)
    }

    /// Loan-to-value and maximum debt value of `acc` at current prices.
    ///
    /// A position without collateral value supports no debt.
    pub fn max_loan_to_value(&self, acc: &AccountCollateral, params: &CollateralRiskParams) -> Result<LoanToValue> {
        let collateral_price = self.price(&acc.collateral.denom)?;
        let iron_price = self.iron_price()?;

        let collateral_value = dec_mul(to_dec(acc.collateral.amount)?, collateral_price)?;
        let iron_value = dec_mul(to_dec(acc.iron_collateralized)?, iron_price)?;
        if collateral_value <= Decimal::ZERO {
            return Ok(LoanToValue {
                available: Decimal::ZERO,
                max_debt_value: Decimal::ZERO,
            });
        }

        let available = available_loan_to_value(params, collateral_value, iron_value)?;
        Ok(LoanToValue {
            available,
            max_debt_value: dec_mul(collateral_value, available)?,
        })
    }

    /// Settle interest and add `mint_out` plus its fee to the position debt.
    ///
    /// Fails on the pool Grid ceiling and when the resulting debt exceeds
    /// the borrowing power of the position.
    pub(crate) fn calculate_mint_by_collateral(
        &self,
        account: &Address,
        denom: &str,
        mint_out: u128,
        height: i64,
    ) -> Result<MintByCollateralResult> {
        let params = self.available_collateral_params(denom)?;

        let mut position = self.collateral_position(account, denom, false, height)?;
        self.settle_interest(&mut position, &params, height)?;

        let mint_fee = compute_fee(mint_out, params.mint_fee)?;
        let mint_total = safe_add(mint_out, mint_fee)?;

        position.account.grid_debt = safe_add(position.account.grid_debt, mint_total)?;
        position.pool.grid_debt = safe_add(position.pool.grid_debt, mint_total)?;
        position.total.grid_debt = safe_add(position.total.grid_debt, mint_total)?;

        check_grid_ceiling(to_signed(position.pool.grid_debt)?, params.max_grid_mint)?;

        let ltv = self.max_loan_to_value(&position.account, &params)?;
        if ltv.max_debt_value <= Decimal::ZERO {
            return Err(Error::AccountInsufficientCollateral {
                denom: denom.to_string(),
                debt: position.account.grid_debt,
                max_debt: 0,
            });
        }

        let max_debt = truncate_amount(dec_div(ltv.max_debt_value, self.target())?)?;
        if max_debt < position.account.grid_debt {
            debug!(debt = position.account.grid_debt, max_debt, denom, "mint exceeds borrowing power");
            return Err(Error::AccountInsufficientCollateral {
                denom: denom.to_string(),
                debt: position.account.grid_debt,
                max_debt,
            });
        }

        Ok(MintByCollateralResult {
            mint_fee: self.grid_coin(mint_fee),
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MakerConfig;
    use crate::ledger::InMemoryLedger;
    use crate::oracle::InMemoryOracle;
    use crate::storage::InMemoryStore;
    use rust_decimal_macros::dec;

    type TestMaker = Maker<InMemoryStore, InMemoryOracle, InMemoryLedger>;

    fn alice() -> Address {
        Address::new("grid1alice").unwrap()
    }

    fn setup(params: CollateralRiskParams, collateral: u128, iron: u128) -> TestMaker {
        let oracle = InMemoryOracle::new()
            .with_price("ugrid", dec!(1))
            .unwrap()
            .with_price("airon", dec!(1))
            .unwrap()
            .with_price("uatom", dec!(1))
            .unwrap();
        let maker = Maker::new(InMemoryStore::new(), oracle, InMemoryLedger::new(), MakerConfig::default()).unwrap();

        let mut acc = AccountCollateral::new(alice(), "uatom", 1);
        acc.collateral.amount = collateral;
        acc.iron_collateralized = iron;
        let mut pool = PoolCollateral::new("uatom");
        pool.collateral.amount = collateral;
        pool.iron_collateralized = iron;

        maker.store().set_collateral_risk_params(&params).unwrap();
        maker.store().set_pool_collateral(&pool).unwrap();
        maker
            .store()
            .set_total_collateral(&TotalCollateral {
                grid_debt: 0,
                iron_collateralized: iron,
            })
            .unwrap();
        maker.store().set_account_collateral(&acc).unwrap();
        maker
    }

    #[test]
    fn test_mint_within_loan_to_value() {
        let maker = setup(CollateralRiskParams::new("uatom", dec!(0.5)), 1000, 0);

        assert!(matches!(
            maker.calculate_mint_by_collateral(&alice(), "uatom", 600, 1),
            Err(Error::AccountInsufficientCollateral { max_debt: 500, .. })
        ));

        let result = maker.calculate_mint_by_collateral(&alice(), "uatom", 400, 1).unwrap();
        assert_eq!(result.position.account.grid_debt, 400);
        assert_eq!(result.position.pool.grid_debt, 400);
        assert_eq!(result.position.total.grid_debt, 400);
    }

    #[test]
    fn test_iron_raises_loan_to_value() {
        let params = CollateralRiskParams::new("uatom", dec!(0.8))
            .with_catalytic(dec!(0.5), dec!(0.2))
            .with_liquidation(dec!(0.9), dec!(0.05));
        let maker = setup(params.clone(), 1000, 100);

        let acc = maker.store().account_collateral(&alice(), "uatom").unwrap().unwrap();
        let ltv = maker.max_loan_to_value(&acc, &params).unwrap();
        assert_eq!(ltv.available, dec!(0.65));
        assert_eq!(ltv.max_debt_value, dec!(650));
    }

    #[test]
    fn test_mint_requires_position() {
        let maker = setup(CollateralRiskParams::new("uatom", dec!(0.5)), 1000, 0);
        let bob = Address::new("grid1bob").unwrap();
        assert!(matches!(
            maker.calculate_mint_by_collateral(&bob, "uatom", 1, 1),
            Err(Error::AccountNoCollateral(_))
        ));
    }

    #[test]
    fn test_mint_grid_ceiling() {
        let params = CollateralRiskParams::new("uatom", dec!(0.5)).with_ceilings(None, Some(100));
        let maker = setup(params, 1000, 0);
        assert!(matches!(
            maker.calculate_mint_by_collateral(&alice(), "uatom", 101, 1),
            Err(Error::GridCeiling { .. })
        ));
    }

    #[test]
    fn test_empty_position_supports_no_debt() {
        let params = CollateralRiskParams::new("uatom", dec!(0.5));
        let maker = setup(params.clone(), 0, 0);
        let acc = maker.store().account_collateral(&alice(), "uatom").unwrap().unwrap();
        assert_eq!(maker.max_loan_to_value(&acc, &params).unwrap().max_debt_value, dec!(0));
    }
}
