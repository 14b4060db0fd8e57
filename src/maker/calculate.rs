//! Swap calculations.
//!
//! Each computation reads the current state and oracle prices and returns
//! the exact amounts a swap would move, without writing anything. Amounts
//! owed to the protocol round up and amounts paid out round down. Every USD
//! conversion of Grid uses the configured target peg, never the market
//! price.
//!
//! Slippage bounds are the caller's concern; they are checked by the
//! message handlers after calling these functions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::coin::Coin;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::maker::{check_backing_ceiling, check_grid_ceiling, Maker};
use crate::oracle::PriceOracle;
use crate::storage::StorageBackend;
use crate::utils::math::*;

// ═══════════════════════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Inputs required to mint an exact Grid amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapInResult {
    /// Backing to pay
    pub backing_in: Coin,
    /// Iron to pay
    pub iron_in: Coin,
    /// Grid fee on top of the requested amount
    pub mint_fee: Coin,
}

/// Grid minted for capped inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapOutResult {
    /// Backing to pay
    pub backing_in: Coin,
    /// Iron to pay
    pub iron_in: Coin,
    /// Grid received after the fee
    pub mint_out: Coin,
    /// Grid fee
    pub mint_fee: Coin,
}

/// Grid required to burn for capped outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapInResult {
    /// Grid to pay, fee included
    pub burn_in: Coin,
    /// Backing received
    pub backing_out: Coin,
    /// Iron received
    pub iron_out: Coin,
    /// Grid fee
    pub burn_fee: Coin,
}

/// Outputs of burning an exact Grid amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapOutResult {
    /// Backing received
    pub backing_out: Coin,
    /// Iron received
    pub iron_out: Coin,
    /// Grid fee taken from the input
    pub burn_fee: Coin,
}

/// Iron required to buy an exact backing amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingInResult {
    /// Iron to pay
    pub iron_in: Coin,
    /// Backing fee
    pub buyback_fee: Coin,
}

/// Backing bought with an exact Iron amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingOutResult {
    /// Backing received after the fee
    pub backing_out: Coin,
    /// Backing fee
    pub buyback_fee: Coin,
}

/// Backing required to receive an exact Iron amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingInResult {
    /// Backing to pay
    pub backing_in: Coin,
    /// Iron fee
    pub reback_fee: Coin,
}

/// Iron received for an exact backing amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingOutResult {
    /// Iron received, bonus included and fee deducted
    pub iron_out: Coin,
    /// Iron fee
    pub reback_fee: Coin,
}

/// Reback bonus plus fee must stay below one
fn check_reback_rates(bonus: Decimal, fee: Decimal) -> Result<()> {
    if bonus + fee >= Decimal::ONE {
        return Err(Error::invalid_param(
            "reback_fee",
            format!("reback fee {} plus bonus {} must be below 1", fee, bonus),
        ));
    }
    Ok(())
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    // ═══════════════════════════════════════════════════════════════════════════
    // MINT BY SWAP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Backing and Iron required to receive exactly `mint_out` Grid.
    ///
    /// The fee is added on top of `mint_out` and the total is split by the
    /// backing ratio. `full_backing` pays everything in backing.
    pub fn calculate_mint_by_swap_in(
        &self,
        mint_out: u128,
        backing_denom: &str,
        full_backing: bool,
    ) -> Result<MintBySwapInResult> {
        let params = self.params()?;
        self.check_mint_price_lower_bound(&params)?;

        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;

        let mint_fee = compute_fee(mint_out, backing_params.mint_fee)?;
        let mint_total = safe_add(mint_out, mint_fee)?;
        let mint_total_usd = dec_mul(to_dec(mint_total)?, self.target())?;

        let (_, pool) = self.backing(backing_denom)?;
        check_grid_ceiling(
            signed_add(pool.grid_minted, mint_total)?,
            backing_params.max_grid_mint,
        )?;

        let ratio = self.store.backing_ratio()?;
        let (backing_in, iron_in) = if ratio >= Decimal::ONE || full_backing {
            (quo_round_up(mint_total_usd, backing_price)?, 0)
        } else if ratio.is_zero() {
            (0, quo_round_up(mint_total_usd, iron_price)?)
        } else {
            (
                quo_round_up(dec_mul(mint_total_usd, ratio)?, backing_price)?,
                quo_round_up(dec_mul(mint_total_usd, Decimal::ONE - ratio)?, iron_price)?,
            )
        };

        check_backing_ceiling(
            backing_denom,
            safe_add(pool.backing.amount, backing_in)?,
            backing_params.max_backing,
        )?;

        Ok(MintBySwapInResult {
            backing_in: Coin::new(backing_denom, backing_in),
            iron_in: self.iron_coin(iron_in),
            mint_fee: self.grid_coin(mint_fee),
        })
    }

    /// Largest Grid amount mintable without exceeding either input cap.
    ///
    /// In the fractional regime each cap implies a total; the smaller one
    /// binds and the other leg is derived from it, clipped to its cap when
    /// that cap is positive. On a tie the backing leg binds.
    pub fn calculate_mint_by_swap_out(
        &self,
        backing_in_max: &Coin,
        iron_in_max: u128,
        full_backing: bool,
    ) -> Result<MintBySwapOutResult> {
        let backing_denom = backing_in_max.denom.as_str();

        let params = self.params()?;
        self.check_mint_price_lower_bound(&params)?;

        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;
        let ratio = self.store.backing_ratio()?;

        let backing_max_usd = dec_mul(to_dec(backing_in_max.amount)?, backing_price)?;
        let iron_max_usd = dec_mul(to_dec(iron_in_max)?, iron_price)?;

        let (mint_total_usd, backing_in, iron_in) = if ratio >= Decimal::ONE || full_backing {
            (backing_max_usd, backing_in_max.amount, 0)
        } else if ratio.is_zero() {
            (iron_max_usd, 0, iron_in_max)
        } else {
            let with_backing = dec_div(backing_max_usd, ratio)?;
            let with_iron = dec_div(iron_max_usd, Decimal::ONE - ratio)?;
            if backing_in_max.amount > 0 && (iron_in_max == 0 || with_backing <= with_iron) {
                let mut iron_in = quo_round_up(dec_mul(with_backing, Decimal::ONE - ratio)?, iron_price)?;
                if iron_in_max > 0 {
                    iron_in = iron_in.min(iron_in_max);
                }
                (with_backing, backing_in_max.amount, iron_in)
            } else {
                let mut backing_in = quo_round_up(dec_mul(with_iron, ratio)?, backing_price)?;
                if backing_in_max.amount > 0 {
                    backing_in = backing_in.min(backing_in_max.amount);
                }
                (with_iron, backing_in, iron_in_max)
            }
        };

        let mint_total = truncate_amount(dec_div(mint_total_usd, self.target())?)?;

        let (_, pool) = self.backing(backing_denom)?;
        check_grid_ceiling(
            signed_add(pool.grid_minted, mint_total)?,
            backing_params.max_grid_mint,
        )?;
        check_backing_ceiling(
            backing_denom,
            safe_add(pool.backing.amount, backing_in)?,
            backing_params.max_backing,
        )?;

        let mint_fee = compute_fee(mint_total, backing_params.mint_fee)?;
        let mint_out = safe_sub(mint_total, mint_fee)?;

        Ok(MintBySwapOutResult {
            backing_in: Coin::new(backing_denom, backing_in),
            iron_in: self.iron_coin(iron_in),
            mint_out: self.grid_coin(mint_out),
            mint_fee: self.grid_coin(mint_fee),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BURN BY SWAP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Grid required to receive up to the capped outputs.
    ///
    /// The binding leg is paid in full and the other leg derived from it,
    /// rounded down. The burn fee is folded into the input:
    /// `burn_in = value / (1 - fee_rate)`, rounded up.
    pub fn calculate_burn_by_swap_in(
        &self,
        backing_out_max: &Coin,
        iron_out_max: u128,
    ) -> Result<BurnBySwapInResult> {
        let backing_denom = backing_out_max.denom.as_str();

        let params = self.params()?;
        self.check_burn_price_upper_bound(&params)?;

        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;
        let ratio = self.store.backing_ratio()?;

        let backing_max_usd = dec_mul(to_dec(backing_out_max.amount)?, backing_price)?;
        let iron_max_usd = dec_mul(to_dec(iron_out_max)?, iron_price)?;

        let (burn_actual_usd, backing_out, iron_out) = if ratio >= Decimal::ONE {
            (backing_max_usd, backing_out_max.amount, 0)
        } else if ratio.is_zero() {
            (iron_max_usd, 0, iron_out_max)
        } else {
            let with_backing = dec_div(backing_max_usd, ratio)?;
            let with_iron = dec_div(iron_max_usd, Decimal::ONE - ratio)?;
            if iron_out_max == 0 || (backing_out_max.amount > 0 && with_backing < with_iron) {
                let iron_out = quo_truncate(dec_mul(with_backing, Decimal::ONE - ratio)?, iron_price)?;
                (with_backing, backing_out_max.amount, iron_out)
            } else {
                let backing_out = quo_truncate(dec_mul(with_iron, ratio)?, backing_price)?;
                (with_iron, backing_out, iron_out_max)
            }
        };

        let module_backing = self.module_balance(backing_denom)?;
        if module_backing < backing_out {
            debug!(backing_out, module_backing, "burn exceeds module backing");
            return Err(Error::BackingCoinInsufficient(format!(
                "backing out {}{} exceeds balance {}{}",
                backing_out, backing_denom, module_backing, backing_denom
            )));
        }

        let fee_rate = rate_or_zero(backing_params.burn_fee);
        let burn_in_value = dec_div(
            dec_div(burn_actual_usd, self.target())?,
            Decimal::ONE - fee_rate,
        )?;
        let burn_in = ceil_amount(burn_in_value)?;
        let burn_fee = round_amount(dec_mul(burn_in_value, fee_rate)?)?;

        Ok(BurnBySwapInResult {
            burn_in: self.grid_coin(burn_in),
            backing_out: Coin::new(backing_denom, backing_out),
            iron_out: self.iron_coin(iron_out),
            burn_fee: self.grid_coin(burn_fee),
        })
    }

    /// Backing and Iron paid for burning exactly `burn_in` Grid.
    ///
    /// The fee is taken from the input and the remainder split by the
    /// backing ratio, each leg rounded down.
    pub fn calculate_burn_by_swap_out(&self, burn_in: u128, backing_denom: &str) -> Result<BurnBySwapOutResult> {
        let params = self.params()?;
        self.check_burn_price_upper_bound(&params)?;

        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;
        let ratio = self.store.backing_ratio()?;

        let burn_fee = compute_fee(burn_in, backing_params.burn_fee)?;
        let burn_actual = safe_sub(burn_in, burn_fee)?;
        let burn_actual_usd = dec_mul(to_dec(burn_actual)?, self.target())?;

        let (backing_out, iron_out) = if ratio >= Decimal::ONE {
            (quo_truncate(burn_actual_usd, backing_price)?, 0)
        } else if ratio.is_zero() {
            (0, quo_truncate(burn_actual_usd, iron_price)?)
        } else {
            (
                quo_truncate(dec_mul(burn_actual_usd, ratio)?, backing_price)?,
                quo_truncate(dec_mul(burn_actual_usd, Decimal::ONE - ratio)?, iron_price)?,
            )
        };

        self.check_backing_available(backing_denom, backing_out)?;

        Ok(BurnBySwapOutResult {
            backing_out: Coin::new(backing_denom, backing_out),
            iron_out: self.iron_coin(iron_out),
            burn_fee: self.grid_coin(burn_fee),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BUYBACK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Iron required to receive exactly `backing_out` of excess backing
    pub fn calculate_buy_backing_in(&self, backing_out: &Coin) -> Result<BuyBackingInResult> {
        let backing_denom = backing_out.denom.as_str();

        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;

        let excess = self.excess_backing_value()?;

        let fee_rate = rate_or_zero(backing_params.buyback_fee);
        let backing_out_total = truncate_amount(dec_div(to_dec(backing_out.amount)?, Decimal::ONE - fee_rate)?)?;
        let iron_in_value = dec_mul(to_dec(backing_out_total)?, backing_price)?;
        self.check_within_excess(iron_in_value, excess)?;

        self.check_backing_available(backing_denom, backing_out_total)?;

        let iron_in = ceil_amount(dec_div(iron_in_value, iron_price)?)?;
        let buyback_fee = round_amount(dec_mul(to_dec(backing_out_total)?, fee_rate)?)?;

        Ok(BuyBackingInResult {
            iron_in: self.iron_coin(iron_in),
            buyback_fee: Coin::new(backing_denom, buyback_fee),
        })
    }

    /// Backing received for exactly `iron_in` Iron
    pub fn calculate_buy_backing_out(&self, iron_in: u128, backing_denom: &str) -> Result<BuyBackingOutResult> {
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;

        let excess = self.excess_backing_value()?;

        let iron_in_value = dec_mul(to_dec(iron_in)?, iron_price)?;
        self.check_within_excess(iron_in_value, excess)?;

        let backing_out_total = truncate_amount(dec_div(iron_in_value, backing_price)?)?;
        self.check_backing_available(backing_denom, backing_out_total)?;

        let buyback_fee = compute_fee(backing_out_total, backing_params.buyback_fee)?;
        let backing_out = safe_sub(backing_out_total, buyback_fee)?;

        Ok(BuyBackingOutResult {
            backing_out: Coin::new(backing_denom, backing_out),
            buyback_fee: Coin::new(backing_denom, buyback_fee),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REBACK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Backing required to receive exactly `iron_out` Iron.
    ///
    /// `iron_mint = iron_out / (1 + bonus - fee)` must fit within the
    /// backing deficit expressed in Iron.
    pub fn calculate_sell_backing_in(&self, iron_out: u128, backing_denom: &str) -> Result<SellBackingInResult> {
        let params = self.params()?;
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;

        let (_, pool) = self.backing(backing_denom)?;
        let available_iron_mint = self.available_iron_mint(iron_price)?;

        let reback_fee = rate_or_zero(backing_params.reback_fee);
        check_reback_rates(params.reback_bonus, reback_fee)?;

        let iron_mint = dec_div(to_dec(iron_out)?, Decimal::ONE + params.reback_bonus - reback_fee)?;
        let backing_in = ceil_amount(dec_div(dec_mul(iron_mint, iron_price)?, backing_price)?)?;
        let fee = round_amount(dec_mul(iron_mint, reback_fee)?)?;

        check_backing_ceiling(
            backing_denom,
            safe_add(pool.backing.amount, backing_in)?,
            backing_params.max_backing,
        )?;
        if iron_mint > available_iron_mint {
            debug!(%iron_mint, %available_iron_mint, "reback exceeds backing deficit");
            return Err(Error::IronCoinInsufficient(format!(
                "iron mint {} exceeds available {}",
                iron_mint, available_iron_mint
            )));
        }

        Ok(SellBackingInResult {
            backing_in: Coin::new(backing_denom, backing_in),
            reback_fee: self.iron_coin(fee),
        })
    }

    /// Iron received for exactly `backing_in` backing.
    ///
    /// `iron_out = iron_mint + bonus - fee` where `iron_mint` is the value
    /// of the backing in Iron, rounded down.
    pub fn calculate_sell_backing_out(&self, backing_in: &Coin) -> Result<SellBackingOutResult> {
        let backing_denom = backing_in.denom.as_str();

        let params = self.params()?;
        let backing_params = self.available_backing_params(backing_denom)?;
        let backing_price = self.price(backing_denom)?;
        let iron_price = self.iron_price()?;

        let (_, pool) = self.backing(backing_denom)?;
        check_backing_ceiling(
            backing_denom,
            safe_add(pool.backing.amount, backing_in.amount)?,
            backing_params.max_backing,
        )?;

        let available_iron_mint = self.available_iron_mint(iron_price)?;
        check_reback_rates(params.reback_bonus, rate_or_zero(backing_params.reback_fee))?;

        let iron_mint = truncate_amount(dec_div(
            dec_mul(to_dec(backing_in.amount)?, backing_price)?,
            iron_price,
        )?)?;
        let bonus = compute_fee(iron_mint, Some(params.reback_bonus))?;
        let reback_fee = compute_fee(iron_mint, backing_params.reback_fee)?;

        if to_dec(iron_mint)? > available_iron_mint {
            debug!(iron_mint, %available_iron_mint, "reback exceeds backing deficit");
            return Err(Error::IronCoinInsufficient(format!(
                "iron mint {} exceeds available {}",
                iron_mint, available_iron_mint
            )));
        }

        let iron_out = safe_sub(safe_add(iron_mint, bonus)?, reback_fee)?;

        Ok(SellBackingOutResult {
            iron_out: self.iron_coin(iron_out),
            reback_fee: self.iron_coin(reback_fee),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BACKING VALUE
    // ═══════════════════════════════════════════════════════════════════════════

    /// USD value of every backing pool, rounded down
    pub fn total_backing_value(&self) -> Result<u128> {
        let mut value = Decimal::ZERO;
        for pool in self.store.all_pool_backing()? {
            let price = self.price(&pool.backing.denom)?;
            value = value
                .checked_add(dec_mul(to_dec(pool.backing.amount)?, price)?)
                .ok_or_else(|| Error::Overflow {
                    operation: "total backing value".into(),
                })?;
        }
        truncate_amount(value)
    }

    /// Backing value above what the current ratio requires; negative on deficit.
    ///
    /// The requirement is `ceil(grid_minted * ratio * target)`, floored at
    /// zero when more Grid was burned than minted.
    pub fn excess_backing_value(&self) -> Result<i128> {
        let total = self
            .store
            .total_backing()?
            .ok_or_else(|| Error::BackingCoinNotFound("total backing not found".into()))?;
        let ratio = self.store.backing_ratio()?;

        let required = dec_mul(dec_mul(signed_to_dec(total.grid_minted)?, ratio)?, self.target())?;
        let required = ceil_signed(required)?.max(0);

        let value = to_signed(self.total_backing_value()?)?;
        value.checked_sub(required).ok_or_else(|| Error::Underflow {
            operation: format!("{} - {}", value, required),
        })
    }

    /// Backing deficit in Iron; negative when backing is in excess
    fn available_iron_mint(&self, iron_price: Decimal) -> Result<Decimal> {
        let excess = self.excess_backing_value()?;
        let missing = excess.checked_neg().ok_or_else(|| Error::Overflow {
            operation: format!("-{}", excess),
        })?;
        dec_div(signed_to_dec(missing)?, iron_price)
    }

    fn check_within_excess(&self, value: Decimal, excess: i128) -> Result<()> {
        if value > signed_to_dec(excess)? {
            debug!(%value, excess, "buyback exceeds excess backing");
            return Err(Error::BackingCoinInsufficient(format!(
                "buyback value {} exceeds excess backing value {}",
                value, excess
            )));
        }
        Ok(())
    }

    /// `amount` must not exceed the pool backing nor the module balance
    fn check_backing_available(&self, denom: &str, amount: u128) -> Result<()> {
        let (_, pool) = self.backing(denom)?;
        let available = pool.backing.amount.min(self.module_balance(denom)?);
        if available < amount {
            debug!(denom, amount, available, "backing payout exceeds balance");
            return Err(Error::BackingCoinInsufficient(format!(
                "backing coin out {}{} exceeds balance {}{}",
                amount, denom, available, denom
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backing::{BackingRiskParams, PoolBacking, TotalBacking};
    use crate::core::coin::Address;
    use crate::core::config::MakerConfig;
    use crate::ledger::InMemoryLedger;
    use crate::oracle::InMemoryOracle;
    use crate::storage::InMemoryStore;
    use rust_decimal_macros::dec;

    type TestMaker = Maker<InMemoryStore, InMemoryOracle, InMemoryLedger>;

    fn setup(ratio: Decimal, params: BackingRiskParams) -> TestMaker {
        let oracle = InMemoryOracle::new()
            .with_price("ugrid", dec!(1))
            .unwrap()
            .with_price("airon", dec!(2))
            .unwrap()
            .with_price("uusdc", dec!(1))
            .unwrap();
        let maker = Maker::new(InMemoryStore::new(), oracle, InMemoryLedger::new(), MakerConfig::default()).unwrap();
        maker.store().set_backing_ratio(ratio).unwrap();
        maker.store().set_backing_risk_params(&params).unwrap();
        maker.store().set_pool_backing(&PoolBacking::new("uusdc")).unwrap();
        maker.store().set_total_backing(&TotalBacking::default()).unwrap();
        maker
    }

    fn fund_pool(maker: &TestMaker, backing: u128, grid_minted: i128) {
        let mut pool = PoolBacking::new("uusdc");
        pool.backing.amount = backing;
        pool.grid_minted = grid_minted;
        maker.store().set_pool_backing(&pool).unwrap();
        maker
            .store()
            .set_total_backing(&TotalBacking {
                grid_minted,
                iron_burned: 0,
            })
            .unwrap();
        maker
            .ledger()
            .fund(&Address::module("maker"), &[Coin::new("uusdc", backing)])
            .unwrap();
    }

    fn usdc() -> BackingRiskParams {
        BackingRiskParams::new("uusdc")
    }

    #[test]
    fn test_mint_in_fractional_split() {
        let maker = setup(dec!(0.5), usdc().with_fees(Some(dec!(0.001)), None, None, None));

        let result = maker.calculate_mint_by_swap_in(100_000_000, "uusdc", false).unwrap();
        assert_eq!(result.mint_fee, Coin::new("ugrid", 100_000));
        assert_eq!(result.backing_in, Coin::new("uusdc", 50_050_000));
        assert_eq!(result.iron_in, Coin::new("airon", 25_025_000));
    }

    #[test]
    fn test_mint_in_full_backing_and_algorithmic() {
        let maker = setup(dec!(0.5), usdc());
        let full = maker.calculate_mint_by_swap_in(1000, "uusdc", true).unwrap();
        assert_eq!(full.backing_in.amount, 1000);
        assert_eq!(full.iron_in.amount, 0);

        maker.store().set_backing_ratio(dec!(0)).unwrap();
        let algo = maker.calculate_mint_by_swap_in(1001, "uusdc", false).unwrap();
        assert_eq!(algo.backing_in.amount, 0);
        assert_eq!(algo.iron_in.amount, 501);
    }

    #[test]
    fn test_mint_in_ceilings() {
        let maker = setup(dec!(1), usdc().with_ceilings(Some(500), None));
        assert!(matches!(
            maker.calculate_mint_by_swap_in(501, "uusdc", false),
            Err(Error::BackingCeiling { .. })
        ));

        let maker = setup(dec!(1), usdc().with_ceilings(None, Some(500)));
        assert!(matches!(
            maker.calculate_mint_by_swap_in(501, "uusdc", false),
            Err(Error::GridCeiling { .. })
        ));
    }

    #[test]
    fn test_mint_requires_price_at_target() {
        let maker = setup(dec!(1), usdc());
        maker.oracle().set_price("ugrid", dec!(0.98)).unwrap();
        assert!(matches!(
            maker.calculate_mint_by_swap_in(100, "uusdc", false),
            Err(Error::GridPriceTooLow { .. })
        ));
    }

    #[test]
    fn test_mint_out_binding_leg() {
        let maker = setup(dec!(0.5), usdc().with_fees(Some(dec!(0.01)), None, None, None));

        // backing cap implies 2000 total, iron cap implies 4000
        let result = maker
            .calculate_mint_by_swap_out(&Coin::new("uusdc", 1000), 1000, false)
            .unwrap();
        assert_eq!(result.backing_in.amount, 1000);
        assert_eq!(result.iron_in.amount, 500);
        assert_eq!(result.mint_fee.amount, 20);
        assert_eq!(result.mint_out.amount, 1980);

        // iron binds
        let result = maker
            .calculate_mint_by_swap_out(&Coin::new("uusdc", 1000), 100, false)
            .unwrap();
        assert_eq!(result.iron_in.amount, 100);
        assert_eq!(result.backing_in.amount, 200);
        assert_eq!(result.mint_out.amount + result.mint_fee.amount, 400);
    }

    #[test]
    fn test_mint_out_tie_favours_backing() {
        let maker = setup(dec!(0.5), usdc());
        let result = maker
            .calculate_mint_by_swap_out(&Coin::new("uusdc", 1000), 500, false)
            .unwrap();
        assert_eq!(result.backing_in.amount, 1000);
        assert_eq!(result.iron_in.amount, 500);
        assert_eq!(result.mint_out.amount, 2000);
    }

    #[test]
    fn test_burn_out_split_and_balance() {
        let maker = setup(dec!(0.5), usdc().with_fees(None, Some(dec!(0.01)), None, None));
        fund_pool(&maker, 1_000, 2_000);

        let result = maker.calculate_burn_by_swap_out(1000, "uusdc").unwrap();
        assert_eq!(result.burn_fee.amount, 10);
        assert_eq!(result.backing_out.amount, 495);
        assert_eq!(result.iron_out.amount, 247);

        assert!(matches!(
            maker.calculate_burn_by_swap_out(3000, "uusdc"),
            Err(Error::BackingCoinInsufficient(_))
        ));
    }

    #[test]
    fn test_burn_in_fee_folded_into_input() {
        let maker = setup(dec!(1), usdc().with_fees(None, Some(dec!(0.01)), None, None));
        fund_pool(&maker, 1_000, 1_000);

        let result = maker.calculate_burn_by_swap_in(&Coin::new("uusdc", 990), 0).unwrap();
        assert_eq!(result.backing_out.amount, 990);
        assert_eq!(result.burn_in.amount, 1000);
        assert_eq!(result.burn_fee.amount, 10);

        assert!(matches!(
            maker.calculate_burn_by_swap_in(&Coin::new("uusdc", 1001), 0),
            Err(Error::BackingCoinInsufficient(_))
        ));
    }

    #[test]
    fn test_burn_requires_price_at_target() {
        let maker = setup(dec!(1), usdc());
        maker.oracle().set_price("ugrid", dec!(1.02)).unwrap();
        assert!(matches!(
            maker.calculate_burn_by_swap_out(100, "uusdc"),
            Err(Error::GridPriceTooHigh { .. })
        ));
    }

    #[test]
    fn test_excess_backing_value() {
        let maker = setup(dec!(0.5), usdc());
        fund_pool(&maker, 1_000, 1_000);
        assert_eq!(maker.excess_backing_value().unwrap(), 500);

        maker.store().set_backing_ratio(dec!(1)).unwrap();
        fund_pool(&maker, 800, 1_000);
        assert_eq!(maker.excess_backing_value().unwrap(), -200);

        fund_pool(&maker, 800, -50);
        assert_eq!(maker.excess_backing_value().unwrap(), 800);
    }

    #[test]
    fn test_buyback_bounded_by_excess() {
        let maker = setup(dec!(0.5), usdc().with_fees(None, None, Some(dec!(0.01)), None));
        fund_pool(&maker, 1_000, 1_000);

        let result = maker.calculate_buy_backing_out(100, "uusdc").unwrap();
        assert_eq!(result.backing_out.amount, 198);
        assert_eq!(result.buyback_fee.amount, 2);

        let result = maker.calculate_buy_backing_in(&Coin::new("uusdc", 198)).unwrap();
        assert_eq!(result.iron_in.amount, 100);
        assert_eq!(result.buyback_fee.amount, 2);

        assert!(matches!(
            maker.calculate_buy_backing_out(251, "uusdc"),
            Err(Error::BackingCoinInsufficient(_))
        ));
    }

    #[test]
    fn test_reback_bounded_by_deficit() {
        let maker = setup(dec!(1), usdc().with_fees(None, None, None, Some(dec!(0.0025))));
        fund_pool(&maker, 800, 1_000);

        // deficit 200 USD is 100 Iron at 2 USD
        let result = maker.calculate_sell_backing_out(&Coin::new("uusdc", 200)).unwrap();
        assert_eq!(result.reback_fee.amount, 0);
        assert_eq!(result.iron_out.amount, 101);

        assert!(matches!(
            maker.calculate_sell_backing_out(&Coin::new("uusdc", 202)),
            Err(Error::IronCoinInsufficient(_))
        ));

        let result = maker.calculate_sell_backing_in(100, "uusdc").unwrap();
        assert_eq!(result.backing_in.amount, 200);
    }

    #[test]
    fn test_reback_rates_bound() {
        assert!(check_reback_rates(dec!(0.0075), dec!(0.01)).is_ok());
        assert!(check_reback_rates(dec!(0.5), dec!(0.5)).is_err());
    }
}
