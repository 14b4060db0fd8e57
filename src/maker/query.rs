//! Read-only queries and swap estimates.
//!
//! Nothing here writes to the store, moves funds or emits events. The
//! estimates run the same calculations as the handlers so clients can
//! quote a swap before submitting it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::backing::{BackingRiskParams, PoolBacking, TotalBacking};
use crate::core::coin::{Address, Coin};
use crate::core::collateral::{AccountCollateral, CollateralRiskParams, PoolCollateral, TotalCollateral};
use crate::core::config::MakerParams;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::maker::calculate::*;
use crate::maker::{BlockContext, Maker};
use crate::oracle::PriceOracle;
use crate::storage::StorageBackend;

/// Backing ratio together with the height it was last adjusted at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingRatioResponse {
    /// Current backing ratio
    pub backing_ratio: Decimal,
    /// Height of the last controller run
    pub last_update_block: i64,
}

/// Total backing with its current USD value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalBackingResponse {
    /// Net counters across every pool
    pub total: TotalBacking,
    /// USD value of every pool's backing, rounded down
    pub backing_value: u128,
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    // ═══════════════════════════════════════════════════════════════════════════
    // STATE QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current backing ratio
    pub fn backing_ratio(&self) -> Result<Decimal> {
        self.store.backing_ratio()
    }

    /// Backing ratio and last adjustment height
    pub fn backing_ratio_info(&self) -> Result<BackingRatioResponse> {
        Ok(BackingRatioResponse {
            backing_ratio: self.store.backing_ratio()?,
            last_update_block: self.store.backing_ratio_last_block()?,
        })
    }

    /// Current module params
    pub fn params(&self) -> Result<MakerParams> {
        self.store.params()
    }

    /// Every registered backing
    pub fn all_backing_risk_params(&self) -> Result<Vec<BackingRiskParams>> {
        self.store.all_backing_risk_params()
    }

    /// Every registered collateral
    pub fn all_collateral_risk_params(&self) -> Result<Vec<CollateralRiskParams>> {
        self.store.all_collateral_risk_params()
    }

    /// Backing pool of `denom`
    pub fn backing_pool(&self, denom: &str) -> Result<PoolBacking> {
        self.store
            .pool_backing(denom)?
            .ok_or_else(|| Error::BackingCoinNotFound(denom.to_string()))
    }

    /// Every backing pool
    pub fn all_backing_pools(&self) -> Result<Vec<PoolBacking>> {
        self.store.all_pool_backing()
    }

    /// Collateral pool of `denom`
    pub fn collateral_pool(&self, denom: &str) -> Result<PoolCollateral> {
        self.store
            .pool_collateral(denom)?
            .ok_or_else(|| Error::CollateralCoinNotFound(denom.to_string()))
    }

    /// Every collateral pool
    pub fn all_collateral_pools(&self) -> Result<Vec<PoolCollateral>> {
        self.store.all_pool_collateral()
    }

    /// Total backing; zero before the first registration
    pub fn total_backing(&self) -> Result<TotalBackingResponse> {
        Ok(TotalBackingResponse {
            total: self.store.total_backing()?.unwrap_or_default(),
            backing_value: self.total_backing_value()?,
        })
    }

    /// Total collateral; zero before the first registration
    pub fn total_collateral(&self) -> Result<TotalCollateral> {
        Ok(self.store.total_collateral()?.unwrap_or_default())
    }

    /// Position of `account` in `denom` as persisted.
    ///
    /// Interest is not settled. An account without a position in a
    /// registered collateral gets an empty position at the current height.
    pub fn collateral_of_account(
        &self,
        ctx: &BlockContext,
        account: &Address,
        denom: &str,
    ) -> Result<AccountCollateral> {
        account.validate()?;
        match self.store.account_collateral(account, denom)? {
            Some(acc) => Ok(acc),
            None if self.store.collateral_risk_params(denom)?.is_some() => {
                Ok(AccountCollateral::new(account.clone(), denom, ctx.height))
            }
            None => Err(Error::CollateralCoinNotFound(denom.to_string())),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ESTIMATES
    // ═══════════════════════════════════════════════════════════════════════════

    fn expect_grid(&self, coin: &Coin) -> Result<()> {
        if coin.denom != self.config.grid_denom {
            return Err(Error::InvalidCoin(format!("expected {}, got {}", self.config.grid_denom, coin)));
        }
        Ok(())
    }

    fn expect_iron(&self, coin: &Coin) -> Result<()> {
        if coin.denom != self.config.iron_denom {
            return Err(Error::InvalidCoin(format!("expected {}, got {}", self.config.iron_denom, coin)));
        }
        Ok(())
    }

    /// Inputs needed to mint exactly `mint_out`
    pub fn estimate_mint_by_swap_in(
        &self,
        mint_out: &Coin,
        backing_denom: &str,
        full_backing: bool,
    ) -> Result<MintBySwapInResult> {
        self.expect_grid(mint_out)?;
        self.calculate_mint_by_swap_in(mint_out.amount, backing_denom, full_backing)
    }

    /// Grid minted for the capped inputs
    pub fn estimate_mint_by_swap_out(
        &self,
        backing_in_max: &Coin,
        iron_in_max: &Coin,
        full_backing: bool,
    ) -> Result<MintBySwapOutResult> {
        self.expect_iron(iron_in_max)?;
        self.calculate_mint_by_swap_out(backing_in_max, iron_in_max.amount, full_backing)
    }

    /// Grid needed to receive up to the capped outputs
    pub fn estimate_burn_by_swap_in(&self, backing_out_max: &Coin, iron_out_max: &Coin) -> Result<BurnBySwapInResult> {
        self.expect_iron(iron_out_max)?;
        self.calculate_burn_by_swap_in(backing_out_max, iron_out_max.amount)
    }

    /// Outputs of burning exactly `burn_in`
    pub fn estimate_burn_by_swap_out(&self, burn_in: &Coin, backing_denom: &str) -> Result<BurnBySwapOutResult> {
        self.expect_grid(burn_in)?;
        self.calculate_burn_by_swap_out(burn_in.amount, backing_denom)
    }

    /// Iron needed to buy exactly `backing_out`
    pub fn estimate_buy_backing_in(&self, backing_out: &Coin) -> Result<BuyBackingInResult> {
        self.calculate_buy_backing_in(backing_out)
    }

    /// Backing bought with exactly `iron_in`
    pub fn estimate_buy_backing_out(&self, iron_in: &Coin, backing_denom: &str) -> Result<BuyBackingOutResult> {
        self.expect_iron(iron_in)?;
        self.calculate_buy_backing_out(iron_in.amount, backing_denom)
    }

    /// Backing needed to receive exactly `iron_out`
    pub fn estimate_sell_backing_in(&self, iron_out: &Coin, backing_denom: &str) -> Result<SellBackingInResult> {
        self.expect_iron(iron_out)?;
        self.calculate_sell_backing_in(iron_out.amount, backing_denom)
    }

    /// Iron received for exactly `backing_in`
    pub fn estimate_sell_backing_out(&self, backing_in: &Coin) -> Result<SellBackingOutResult> {
        self.calculate_sell_backing_out(backing_in)
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

    fn setup() -> TestMaker {
        let oracle = InMemoryOracle::new()
            .with_price("ugrid", dec!(1))
            .unwrap()
            .with_price("airon", dec!(2))
            .unwrap()
            .with_price("uusdc", dec!(1))
            .unwrap();
        Maker::new(InMemoryStore::new(), oracle, InMemoryLedger::new(), MakerConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_state_queries() {
        let maker = setup();
        let info = maker.backing_ratio_info().unwrap();
        assert_eq!(info.backing_ratio, dec!(1));
        assert_eq!(info.last_update_block, 0);

        let total = maker.total_backing().unwrap();
        assert_eq!(total.total, TotalBacking::default());
        assert_eq!(total.backing_value, 0);
        assert_eq!(maker.total_collateral().unwrap(), TotalCollateral::default());
        assert!(maker.all_backing_pools().unwrap().is_empty());
        assert!(matches!(maker.backing_pool("uusdc"), Err(Error::BackingCoinNotFound(_))));
    }

    #[test]
    fn test_collateral_of_account_default() {
        let maker = setup();
        let alice = Address::new("grid1alice").unwrap();
        let ctx = BlockContext::new(42);

        assert!(matches!(
            maker.collateral_of_account(&ctx, &alice, "uatom"),
            Err(Error::CollateralCoinNotFound(_))
        ));

        maker
            .store()
            .set_collateral_risk_params(&CollateralRiskParams::new("uatom", dec!(0.5)))
            .unwrap();
        let acc = maker.collateral_of_account(&ctx, &alice, "uatom").unwrap();
        assert_eq!(acc.collateral, Coin::zero("uatom"));
        assert_eq!(acc.grid_debt, 0);
        assert_eq!(acc.last_settlement_block, 42);
    }

    #[test]
    fn test_estimates_check_denoms() {
        let maker = setup();
        assert!(matches!(
            maker.estimate_mint_by_swap_in(&Coin::new("airon", 1), "uusdc", false),
            Err(Error::InvalidCoin(_))
        ));
        assert!(matches!(
            maker.estimate_sell_backing_in(&Coin::new("ugrid", 1), "uusdc"),
            Err(Error::InvalidCoin(_))
        ));
    }

    #[test]
    fn test_estimate_matches_calculation() {
        let maker = setup();
        maker.store().set_backing_risk_params(&BackingRiskParams::new("uusdc")).unwrap();
        maker.store().set_pool_backing(&PoolBacking::new("uusdc")).unwrap();
        maker.store().set_total_backing(&TotalBacking::default()).unwrap();

        let estimate = maker
            .estimate_mint_by_swap_in(&Coin::new("ugrid", 1_000), "uusdc", false)
            .unwrap();
        assert_eq!(estimate, maker.calculate_mint_by_swap_in(1_000, "uusdc", false).unwrap());
        assert_eq!(estimate.backing_in.amount, 1_000);
        assert_eq!(estimate.iron_in.amount, 0);
    }
}
