//! Message execution.
//!
//! Every handler follows the same order: stateless validation, then all
//! calculations and checks against a staged copy of the state, then the
//! transfer that takes funds from the sender, then module-funded ledger
//! operations, and finally a single batch commit. A handler that fails
//! before the sender transfer leaves the store, the ledger and the event
//! log untouched.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::core::coin::{Address, Coin};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::maker::events::*;
use crate::maker::msgs::*;
use crate::maker::{BlockContext, Maker};
use crate::oracle::PriceOracle;
use crate::storage::StorageBackend;
use crate::utils::math::*;

fn check_min_out(name: &str, out: u128, min: u128) -> Result<()> {
    if out < min {
        debug!(name, out, min, "output below slippage bound");
        return Err(Error::OverSlippage(format!("{} {} below minimum {}", name, out, min)));
    }
    Ok(())
}

impl<B: StorageBackend, O: PriceOracle, L: Ledger> Maker<B, O, L> {
    // ═══════════════════════════════════════════════════════════════════════════
    // LEDGER SHORTHANDS
    // ═══════════════════════════════════════════════════════════════════════════

    fn take(&self, from: &Address, coins: &[Coin]) -> Result<()> {
        self.ledger
            .send_coins_from_account_to_module(from, &self.config.maker_module, coins)
    }

    fn pay(&self, to: &Address, coins: &[Coin]) -> Result<()> {
        self.ledger
            .send_coins_from_module_to_account(&self.config.maker_module, to, coins)
    }

    fn mint(&self, coin: Coin) -> Result<()> {
        self.ledger.mint_coins(&self.config.maker_module, &[coin])
    }

    fn burn(&self, coin: Coin) -> Result<()> {
        self.ledger.burn_coins(&self.config.maker_module, &[coin])
    }

    fn reward(&self, coin: Coin) -> Result<()> {
        self.ledger.send_coins_from_module_to_module(
            &self.config.maker_module,
            &self.config.reward_module,
            &[coin],
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SWAPS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mint Grid by paying backing and Iron
    pub fn mint_by_swap(&mut self, ctx: &BlockContext, msg: &MsgMintBySwap) -> Result<MintBySwapResponse> {
        msg.validate_basic(&self.config)?;
        let backing_denom = msg.backing_in_max.denom.as_str();

        let result = self.calculate_mint_by_swap_out(&msg.backing_in_max, msg.iron_in_max.amount, msg.full_backing)?;
        check_min_out("mint out", result.mint_out.amount, msg.mint_out_min.amount)?;
        let mint_total = safe_add(result.mint_out.amount, result.mint_fee.amount)?;

        let (mut total, mut pool) = self.backing(backing_denom)?;
        pool.record_mint(result.backing_in.amount, result.iron_in.amount, mint_total)?;
        total.record_mint(result.iron_in.amount, mint_total)?;

        let mut batch = self.store.batch();
        batch.set_pool_backing(&pool)?;
        batch.set_total_backing(&total)?;

        self.take(&msg.sender, &[result.backing_in.clone(), result.iron_in.clone()])?;
        self.burn(result.iron_in.clone())?;
        self.mint(self.grid_coin(mint_total))?;
        self.pay(msg.receiver(), &[result.mint_out.clone()])?;
        self.reward(result.mint_fee.clone())?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            backing_in = %result.backing_in,
            iron_in = %result.iron_in,
            mint_out = %result.mint_out,
            "minted by swap"
        );
        self.emit(MakerEvent::MintBySwap(MintBySwapEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            backing_in: result.backing_in.clone(),
            iron_in: result.iron_in.clone(),
            mint_out: result.mint_out.clone(),
            mint_fee: result.mint_fee.clone(),
            block_height: ctx.height,
        }));

        Ok(MintBySwapResponse {
            backing_in: result.backing_in,
            iron_in: result.iron_in,
            mint_out: result.mint_out,
            mint_fee: result.mint_fee,
        })
    }

    /// Burn Grid for backing and Iron
    pub fn burn_by_swap(&mut self, ctx: &BlockContext, msg: &MsgBurnBySwap) -> Result<BurnBySwapResponse> {
        msg.validate_basic(&self.config)?;
        let backing_denom = msg.backing_out_min.denom.as_str();

        let result = self.calculate_burn_by_swap_out(msg.burn_in.amount, backing_denom)?;
        check_min_out("backing out", result.backing_out.amount, msg.backing_out_min.amount)?;
        check_min_out("iron out", result.iron_out.amount, msg.iron_out_min.amount)?;
        let burn_actual = safe_sub(msg.burn_in.amount, result.burn_fee.amount)?;

        let (mut total, mut pool) = self.backing(backing_denom)?;
        pool.record_burn(result.backing_out.amount, result.iron_out.amount, burn_actual)?;
        total.record_burn(result.iron_out.amount, burn_actual)?;

        let mut batch = self.store.batch();
        batch.set_pool_backing(&pool)?;
        batch.set_total_backing(&total)?;

        self.take(&msg.sender, &[msg.burn_in.clone()])?;
        self.burn(self.grid_coin(burn_actual))?;
        self.reward(result.burn_fee.clone())?;
        self.mint(result.iron_out.clone())?;
        self.pay(msg.receiver(), &[result.backing_out.clone(), result.iron_out.clone()])?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            burn_in = %msg.burn_in,
            backing_out = %result.backing_out,
            iron_out = %result.iron_out,
            "burned by swap"
        );
        self.emit(MakerEvent::BurnBySwap(BurnBySwapEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            burn_in: msg.burn_in.clone(),
            backing_out: result.backing_out.clone(),
            iron_out: result.iron_out.clone(),
            burn_fee: result.burn_fee.clone(),
            block_height: ctx.height,
        }));

        Ok(BurnBySwapResponse {
            backing_out: result.backing_out,
            iron_out: result.iron_out,
            burn_fee: result.burn_fee,
        })
    }

    /// Buy excess backing with Iron; the Iron is burned
    pub fn buy_backing(&mut self, ctx: &BlockContext, msg: &MsgBuyBacking) -> Result<BuyBackingResponse> {
        msg.validate_basic(&self.config)?;
        let backing_denom = msg.backing_out_min.denom.as_str();

        let result = self.calculate_buy_backing_out(msg.iron_in.amount, backing_denom)?;
        check_min_out("backing out", result.backing_out.amount, msg.backing_out_min.amount)?;

        let (mut total, mut pool) = self.backing(backing_denom)?;
        let backing_total = safe_add(result.backing_out.amount, result.buyback_fee.amount)?;
        pool.backing.amount = safe_sub(pool.backing.amount, backing_total)?;
        pool.iron_burned = signed_add(pool.iron_burned, msg.iron_in.amount)?;
        total.iron_burned = signed_add(total.iron_burned, msg.iron_in.amount)?;

        let mut batch = self.store.batch();
        batch.set_pool_backing(&pool)?;
        batch.set_total_backing(&total)?;

        self.take(&msg.sender, &[msg.iron_in.clone()])?;
        self.burn(msg.iron_in.clone())?;
        self.pay(msg.receiver(), &[result.backing_out.clone()])?;
        self.reward(result.buyback_fee.clone())?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            iron_in = %msg.iron_in,
            backing_out = %result.backing_out,
            "bought backing"
        );
        self.emit(MakerEvent::BuyBacking(BuyBackingEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            iron_in: msg.iron_in.clone(),
            backing_out: result.backing_out.clone(),
            buyback_fee: result.buyback_fee.clone(),
            block_height: ctx.height,
        }));

        Ok(BuyBackingResponse {
            backing_out: result.backing_out,
            buyback_fee: result.buyback_fee,
        })
    }

    /// Sell backing to cover a backing deficit for newly minted Iron
    pub fn sell_backing(&mut self, ctx: &BlockContext, msg: &MsgSellBacking) -> Result<SellBackingResponse> {
        msg.validate_basic(&self.config)?;
        let backing_denom = msg.backing_in.denom.as_str();

        let result = self.calculate_sell_backing_out(&msg.backing_in)?;
        check_min_out("iron out", result.iron_out.amount, msg.iron_out_min.amount)?;
        let iron_mint = safe_add(result.iron_out.amount, result.reback_fee.amount)?;

        let (mut total, mut pool) = self.backing(backing_denom)?;
        pool.backing.amount = safe_add(pool.backing.amount, msg.backing_in.amount)?;
        pool.iron_burned = signed_sub(pool.iron_burned, iron_mint)?;
        total.iron_burned = signed_sub(total.iron_burned, iron_mint)?;

        let mut batch = self.store.batch();
        batch.set_pool_backing(&pool)?;
        batch.set_total_backing(&total)?;

        self.take(&msg.sender, &[msg.backing_in.clone()])?;
        self.mint(self.iron_coin(iron_mint))?;
        self.pay(msg.receiver(), &[result.iron_out.clone()])?;
        self.reward(result.reback_fee.clone())?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            backing_in = %msg.backing_in,
            iron_out = %result.iron_out,
            "sold backing"
        );
        self.emit(MakerEvent::SellBacking(SellBackingEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            backing_in: msg.backing_in.clone(),
            iron_out: result.iron_out.clone(),
            reback_fee: result.reback_fee.clone(),
            block_height: ctx.height,
        }));

        Ok(SellBackingResponse {
            iron_out: result.iron_out,
            reback_fee: result.reback_fee,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COLLATERAL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Post collateral and Iron to the receiver's position, opening it if needed
    pub fn deposit_collateral(&mut self, ctx: &BlockContext, msg: &MsgDepositCollateral) -> Result<()> {
        msg.validate_basic(&self.config)?;
        let denom = msg.collateral_in.denom.as_str();
        let receiver = msg.receiver();

        let params = self.available_collateral_params(denom)?;
        let mut position = self.collateral_position(receiver, denom, true, ctx.height)?;
        self.settle_interest(&mut position, &params, ctx.height)?;

        let amount = msg.collateral_in.amount;
        let iron = msg.iron_in.amount;
        position.account.collateral.amount = safe_add(position.account.collateral.amount, amount)?;
        position.pool.collateral.amount = safe_add(position.pool.collateral.amount, amount)?;
        position.account.iron_collateralized = safe_add(position.account.iron_collateralized, iron)?;
        position.pool.iron_collateralized = safe_add(position.pool.iron_collateralized, iron)?;
        position.total.iron_collateralized = safe_add(position.total.iron_collateralized, iron)?;

        if let Some(max) = params.max_collateral {
            if position.pool.collateral.amount > max {
                debug!(denom, amount = position.pool.collateral.amount, max, "collateral over ceiling");
                return Err(Error::CollateralCeiling {
                    denom: denom.to_string(),
                    amount: position.pool.collateral.amount,
                    max,
                });
            }
        }

        let mut batch = self.store.batch();
        batch.set_collateral_position(&position.total, &position.pool, &position.account)?;

        self.take(&msg.sender, &[msg.collateral_in.clone(), msg.iron_in.clone()])?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            owner = %receiver,
            collateral_in = %msg.collateral_in,
            iron_in = %msg.iron_in,
            "collateral deposited"
        );
        self.emit(MakerEvent::DepositCollateral(DepositCollateralEvent {
            sender: msg.sender.clone(),
            receiver: receiver.clone(),
            collateral_in: msg.collateral_in.clone(),
            iron_in: msg.iron_in.clone(),
            block_height: ctx.height,
        }));
        Ok(())
    }

    /// Withdraw collateral and Iron while keeping the debt within borrowing power
    pub fn redeem_collateral(&mut self, ctx: &BlockContext, msg: &MsgRedeemCollateral) -> Result<()> {
        msg.validate_basic(&self.config)?;
        let denom = msg.collateral_out.denom.as_str();

        let params = self.available_collateral_params(denom)?;
        let mut position = self.collateral_position(&msg.sender, denom, false, ctx.height)?;
        self.settle_interest(&mut position, &params, ctx.height)?;

        let amount = msg.collateral_out.amount;
        let iron = msg.iron_out.amount;
        if amount > position.account.collateral.amount {
            return Err(Error::CollateralCoinInsufficient {
                requested: amount,
                available: position.account.collateral.amount,
            });
        }
        if iron > position.account.iron_collateralized {
            return Err(Error::IronCoinInsufficient(format!(
                "requested {} but position holds {}",
                iron, position.account.iron_collateralized
            )));
        }

        position.account.collateral.amount = safe_sub(position.account.collateral.amount, amount)?;
        position.pool.collateral.amount = safe_sub(position.pool.collateral.amount, amount)?;
        position.account.iron_collateralized = safe_sub(position.account.iron_collateralized, iron)?;
        position.pool.iron_collateralized = safe_sub(position.pool.iron_collateralized, iron)?;
        position.total.iron_collateralized = safe_sub(position.total.iron_collateralized, iron)?;

        let ltv = self.max_loan_to_value(&position.account, &params)?;
        let debt_value = dec_mul(to_dec(position.account.grid_debt)?, self.target())?;
        if debt_value > ltv.max_debt_value {
            let max_debt = truncate_amount(dec_div(ltv.max_debt_value, self.target())?)?;
            debug!(%debt_value, max_debt_value = %ltv.max_debt_value, "redeem would undercollateralize");
            return Err(Error::AccountInsufficientCollateral {
                denom: denom.to_string(),
                debt: position.account.grid_debt,
                max_debt,
            });
        }

        let mut batch = self.store.batch();
        batch.set_collateral_position(&position.total, &position.pool, &position.account)?;

        self.pay(msg.receiver(), &[msg.collateral_out.clone(), msg.iron_out.clone()])?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            collateral_out = %msg.collateral_out,
            iron_out = %msg.iron_out,
            "collateral redeemed"
        );
        self.emit(MakerEvent::RedeemCollateral(RedeemCollateralEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            collateral_out: msg.collateral_out.clone(),
            iron_out: msg.iron_out.clone(),
            block_height: ctx.height,
        }));
        Ok(())
    }

    /// Borrow Grid against the sender's position
    pub fn mint_by_collateral(
        &mut self,
        ctx: &BlockContext,
        msg: &MsgMintByCollateral,
    ) -> Result<MintByCollateralResponse> {
        msg.validate_basic(&self.config)?;

        let result = self.calculate_mint_by_collateral(
            &msg.sender,
            &msg.collateral_denom,
            msg.mint_out.amount,
            ctx.height,
        )?;
        let mint_total = safe_add(msg.mint_out.amount, result.mint_fee.amount)?;
        let position = &result.position;

        let mut batch = self.store.batch();
        batch.set_collateral_position(&position.total, &position.pool, &position.account)?;

        self.mint(self.grid_coin(mint_total))?;
        self.pay(msg.receiver(), &[msg.mint_out.clone()])?;
        self.reward(result.mint_fee.clone())?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            denom = %msg.collateral_denom,
            mint_out = %msg.mint_out,
            debt = position.account.grid_debt,
            "minted by collateral"
        );
        self.emit(MakerEvent::MintByCollateral(MintByCollateralEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            collateral_denom: msg.collateral_denom.clone(),
            mint_out: msg.mint_out.clone(),
            mint_fee: result.mint_fee.clone(),
            block_height: ctx.height,
        }));

        Ok(MintByCollateralResponse {
            mint_out: msg.mint_out.clone(),
            mint_fee: result.mint_fee,
        })
    }

    /// Repay debt, accrued interest first.
    ///
    /// The interest part goes to the reward module and the principal part
    /// is burned.
    pub fn burn_by_collateral(
        &mut self,
        ctx: &BlockContext,
        msg: &MsgBurnByCollateral,
    ) -> Result<BurnByCollateralResponse> {
        msg.validate_basic(&self.config)?;
        let denom = msg.collateral_denom.as_str();

        let params = self.available_collateral_params(denom)?;
        let mut position = self.collateral_position(&msg.sender, denom, false, ctx.height)?;
        self.settle_interest(&mut position, &params, ctx.height)?;

        if position.account.grid_debt == 0 {
            return Err(Error::AccountNoDebt(denom.to_string()));
        }

        let repay_in = position.account.grid_debt.min(msg.repay_in_max.amount);
        let interest = position.account.last_interest.min(repay_in);
        let principal = safe_sub(repay_in, interest)?;

        position.account.last_interest = safe_sub(position.account.last_interest, interest)?;
        position.account.grid_debt = safe_sub(position.account.grid_debt, repay_in)?;
        position.pool.grid_debt = safe_sub(position.pool.grid_debt, repay_in)?;
        position.total.grid_debt = safe_sub(position.total.grid_debt, repay_in)?;

        let mut batch = self.store.batch();
        batch.set_collateral_position(&position.total, &position.pool, &position.account)?;

        self.take(&msg.sender, &[self.grid_coin(repay_in)])?;
        self.burn(self.grid_coin(principal))?;
        self.reward(self.grid_coin(interest))?;
        batch.commit()?;

        info!(
            sender = %msg.sender,
            denom,
            repay_in,
            interest,
            debt = position.account.grid_debt,
            "debt repaid"
        );
        self.emit(MakerEvent::BurnByCollateral(BurnByCollateralEvent {
            sender: msg.sender.clone(),
            collateral_denom: denom.to_string(),
            repay_in: self.grid_coin(repay_in),
            interest_repaid: self.grid_coin(interest),
            block_height: ctx.height,
        }));

        Ok(BurnByCollateralResponse {
            repay_in: self.grid_coin(repay_in),
            interest_repaid: self.grid_coin(interest),
        })
    }

    /// Seize collateral from an undercollateralized position.
    ///
    /// The liquidator pays the seized value net of the liquidation fee. The
    /// payment settles the debtor's debt, accrued interest first, and any
    /// surplus is refunded to the debtor. A commission share of the fee is
    /// routed to the reward module in collateral.
    pub fn liquidate_collateral(
        &mut self,
        ctx: &BlockContext,
        msg: &MsgLiquidateCollateral,
    ) -> Result<LiquidateCollateralResponse> {
        msg.validate_basic(&self.config)?;
        let denom = msg.collateral.denom.as_str();
        let seized = msg.collateral.amount;

        let params = self.available_collateral_params(denom)?;
        let mut position = self.collateral_position(&msg.debtor, denom, false, ctx.height)?;
        self.settle_interest(&mut position, &params, ctx.height)?;

        let collateral_price = self.price(denom)?;
        let collateral_value = dec_mul(to_dec(position.account.collateral.amount)?, collateral_price)?;
        let liquidation_value = dec_mul(collateral_value, params.liquidation_threshold)?;
        let debt_value = dec_mul(to_dec(position.account.grid_debt)?, self.target())?;
        if debt_value < liquidation_value {
            debug!(debtor = %msg.debtor, %debt_value, %liquidation_value, "position is healthy");
            return Err(Error::NotUndercollateralized);
        }

        if seized > position.account.collateral.amount {
            return Err(Error::CollateralCoinInsufficient {
                requested: seized,
                available: position.account.collateral.amount,
            });
        }

        let commission_rate = self.params()?.liquidation_commission_fee;
        let seized_dec = to_dec(seized)?;
        let liquidation_fee = dec_mul(seized_dec, params.liquidation_fee)?;
        let commission = truncate_amount(dec_mul(liquidation_fee, commission_rate)?)?;
        let collateral_out = safe_sub(seized, commission)?;
        let repay_in = truncate_amount(dec_div(
            dec_mul(seized_dec - liquidation_fee, collateral_price)?,
            self.target(),
        )?)?;

        if msg.repay_in_max.amount < repay_in {
            debug!(repay_in, max = msg.repay_in_max.amount, "liquidator repay bound too low");
            return Err(Error::GridSlippage {
                required: repay_in,
                max: msg.repay_in_max.amount,
            });
        }

        let repay_debt = position.account.grid_debt.min(repay_in);
        let refund = safe_sub(repay_in, repay_debt)?;
        let interest = position.account.last_interest.min(repay_debt);
        let principal = safe_sub(repay_debt, interest)?;

        position.account.last_interest = safe_sub(position.account.last_interest, interest)?;
        position.account.grid_debt = safe_sub(position.account.grid_debt, repay_debt)?;
        position.pool.grid_debt = safe_sub(position.pool.grid_debt, repay_debt)?;
        position.total.grid_debt = safe_sub(position.total.grid_debt, repay_debt)?;
        position.account.collateral.amount = safe_sub(position.account.collateral.amount, seized)?;
        position.pool.collateral.amount = safe_sub(position.pool.collateral.amount, seized)?;

        let mut batch = self.store.batch();
        batch.set_collateral_position(&position.total, &position.pool, &position.account)?;

        let collateral_out = Coin::new(denom, collateral_out);
        let commission = Coin::new(denom, commission);
        self.take(&msg.sender, &[self.grid_coin(repay_in)])?;
        self.burn(self.grid_coin(principal))?;
        self.reward(self.grid_coin(interest))?;
        self.pay(&msg.debtor, &[self.grid_coin(refund)])?;
        self.pay(msg.receiver(), &[collateral_out.clone()])?;
        self.reward(commission.clone())?;
        batch.commit()?;

        info!(
            liquidator = %msg.sender,
            debtor = %msg.debtor,
            seized = %msg.collateral,
            repay_in,
            refund,
            "position liquidated"
        );
        self.emit(MakerEvent::LiquidateCollateral(LiquidateCollateralEvent {
            sender: msg.sender.clone(),
            receiver: msg.receiver().clone(),
            debtor: msg.debtor.clone(),
            collateral_seized: msg.collateral.clone(),
            collateral_out: collateral_out.clone(),
            repay_in: self.grid_coin(repay_in),
            refund: self.grid_coin(refund),
            commission,
            block_height: ctx.height,
        }));

        Ok(LiquidateCollateralResponse {
            repay_in: self.grid_coin(repay_in),
            collateral_out,
        })
    }

    /// Debt value against liquidation value of a position; liquidatable at or above one
    pub fn health_factor(&self, account: &Address, denom: &str) -> Result<Option<Decimal>> {
        let Some(acc) = self.store.account_collateral(account, denom)? else {
            return Ok(None);
        };
        let params = self
            .store
            .collateral_risk_params(denom)?
            .ok_or_else(|| Error::CollateralCoinNotFound(denom.to_string()))?;
        let collateral_value = dec_mul(to_dec(acc.collateral.amount)?, self.price(denom)?)?;
        let liquidation_value = dec_mul(collateral_value, params.liquidation_threshold)?;
        if liquidation_value.is_zero() {
            return Ok(None);
        }
        let debt_value = dec_mul(to_dec(acc.grid_debt)?, self.target())?;
        Ok(Some(dec_div(debt_value, liquidation_value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backing::{BackingRiskParams, PoolBacking, TotalBacking};
    use crate::core::collateral::{CollateralRiskParams, PoolCollateral, TotalCollateral};
    use crate::core::config::MakerConfig;
    use crate::ledger::InMemoryLedger;
    use crate::oracle::InMemoryOracle;
    use crate::storage::InMemoryStore;
    use rust_decimal_macros::dec;

    type TestMaker = Maker<InMemoryStore, InMemoryOracle, InMemoryLedger>;

    fn alice() -> Address {
        Address::new("grid1alice").unwrap()
    }

    fn bob() -> Address {
        Address::new("grid1bob").unwrap()
    }

    fn setup() -> TestMaker {
        let oracle = InMemoryOracle::new()
            .with_price("ugrid", dec!(1))
            .unwrap()
            .with_price("airon", dec!(2))
            .unwrap()
            .with_price("uusdc", dec!(1))
            .unwrap()
            .with_price("uatom", dec!(10))
            .unwrap();
        let ledger = InMemoryLedger::new();
        ledger
            .fund(
                &alice(),
                &[
                    Coin::new("uusdc", 1_000_000),
                    Coin::new("airon", 1_000_000),
                    Coin::new("uatom", 1_000_000),
                ],
            )
            .unwrap();
        let maker = Maker::new(InMemoryStore::new(), oracle, ledger, MakerConfig::default()).unwrap();

        let store = maker.store();
        store
            .set_backing_risk_params(&BackingRiskParams::new("uusdc").with_fees(Some(dec!(0.001)), None, None, None))
            .unwrap();
        store.set_pool_backing(&PoolBacking::new("uusdc")).unwrap();
        store.set_total_backing(&TotalBacking::default()).unwrap();
        store
            .set_collateral_risk_params(
                &CollateralRiskParams::new("uatom", dec!(0.5)).with_liquidation(dec!(0.8), dec!(0.1)),
            )
            .unwrap();
        store.set_pool_collateral(&PoolCollateral::new("uatom")).unwrap();
        store.set_total_collateral(&TotalCollateral::default()).unwrap();
        maker
    }

    fn grid_balance(maker: &TestMaker, who: &Address) -> u128 {
        maker.ledger().balance(who, "ugrid").unwrap()
    }

    fn deposit(maker: &mut TestMaker, amount: u128) {
        let msg = MsgDepositCollateral {
            sender: alice(),
            to: None,
            collateral_in: Coin::new("uatom", amount),
            iron_in: Coin::zero("airon"),
        };
        maker.deposit_collateral(&BlockContext::new(1), &msg).unwrap();
    }

    #[test]
    fn test_mint_and_burn_by_swap() {
        let mut maker = setup();
        let ctx = BlockContext::new(1);

        let response = maker
            .mint_by_swap(
                &ctx,
                &MsgMintBySwap {
                    sender: alice(),
                    to: None,
                    backing_in_max: Coin::new("uusdc", 10_000),
                    iron_in_max: Coin::zero("airon"),
                    mint_out_min: Coin::new("ugrid", 1),
                    full_backing: false,
                },
            )
            .unwrap();
        assert_eq!(response.backing_in.amount, 10_000);
        assert_eq!(response.mint_fee.amount, 10);
        assert_eq!(response.mint_out.amount, 9_990);
        assert_eq!(grid_balance(&maker, &alice()), 9_990);
        assert_eq!(maker.ledger().supply("ugrid").unwrap(), 10_000);

        let pool = maker.store().pool_backing("uusdc").unwrap().unwrap();
        assert_eq!(pool.backing.amount, 10_000);
        assert_eq!(pool.grid_minted, 10_000);
        assert_eq!(maker.store().total_backing().unwrap().unwrap().grid_minted, 10_000);

        let response = maker
            .burn_by_swap(
                &ctx,
                &MsgBurnBySwap {
                    sender: alice(),
                    to: Some(bob()),
                    burn_in: Coin::new("ugrid", 5_000),
                    backing_out_min: Coin::new("uusdc", 1),
                    iron_out_min: Coin::zero("airon"),
                },
            )
            .unwrap();
        assert_eq!(response.backing_out.amount, 5_000);
        assert_eq!(maker.ledger().balance(&bob(), "uusdc").unwrap(), 5_000);
        assert_eq!(maker.store().pool_backing("uusdc").unwrap().unwrap().grid_minted, 5_000);
        assert_eq!(maker.events().len(), 2);
    }

    #[test]
    fn test_mint_slippage_leaves_state_unchanged() {
        let mut maker = setup();
        let before = maker.store().state_hash().unwrap();

        let result = maker.mint_by_swap(
            &BlockContext::new(1),
            &MsgMintBySwap {
                sender: alice(),
                to: None,
                backing_in_max: Coin::new("uusdc", 10_000),
                iron_in_max: Coin::zero("airon"),
                mint_out_min: Coin::new("ugrid", 10_000),
                full_backing: false,
            },
        );
        assert!(matches!(result, Err(Error::OverSlippage(_))));
        assert_eq!(maker.store().state_hash().unwrap(), before);
        assert_eq!(maker.ledger().balance(&alice(), "uusdc").unwrap(), 1_000_000);
        assert!(maker.events().is_empty());
    }

    #[test]
    fn test_unfunded_sender_leaves_state_unchanged() {
        let mut maker = setup();
        let before = maker.store().state_hash().unwrap();

        let result = maker.mint_by_swap(
            &BlockContext::new(1),
            &MsgMintBySwap {
                sender: bob(),
                to: None,
                backing_in_max: Coin::new("uusdc", 10_000),
                iron_in_max: Coin::zero("airon"),
                mint_out_min: Coin::new("ugrid", 1),
                full_backing: false,
            },
        );
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(maker.store().state_hash().unwrap(), before);
    }

    #[test]
    fn test_deposit_mint_repay() {
        let mut maker = setup();
        deposit(&mut maker, 100);

        // 100 uatom at $10 with LTV 0.5 supports 500 Grid
        let mint = |amount| MsgMintByCollateral {
            sender: alice(),
            to: None,
            collateral_denom: "uatom".into(),
            mint_out: Coin::new("ugrid", amount),
        };
        assert!(matches!(
            maker.mint_by_collateral(&BlockContext::new(1), &mint(501)),
            Err(Error::AccountInsufficientCollateral { .. })
        ));
        maker.mint_by_collateral(&BlockContext::new(1), &mint(400)).unwrap();
        assert_eq!(grid_balance(&maker, &alice()), 400);

        let response = maker
            .burn_by_collateral(
                &BlockContext::new(1),
                &MsgBurnByCollateral {
                    sender: alice(),
                    collateral_denom: "uatom".into(),
                    repay_in_max: Coin::new("ugrid", 1_000),
                },
            )
            .unwrap();
        assert_eq!(response.repay_in.amount, 400);
        assert_eq!(response.interest_repaid.amount, 0);
        assert_eq!(grid_balance(&maker, &alice()), 0);

        let acc = maker.store().account_collateral(&alice(), "uatom").unwrap().unwrap();
        assert_eq!(acc.grid_debt, 0);
        assert!(matches!(
            maker.burn_by_collateral(
                &BlockContext::new(2),
                &MsgBurnByCollateral {
                    sender: alice(),
                    collateral_denom: "uatom".into(),
                    repay_in_max: Coin::new("ugrid", 1),
                },
            ),
            Err(Error::AccountNoDebt(_))
        ));
    }

    #[test]
    fn test_redeem_respects_loan_to_value() {
        let mut maker = setup();
        deposit(&mut maker, 100);
        maker
            .mint_by_collateral(
                &BlockContext::new(1),
                &MsgMintByCollateral {
                    sender: alice(),
                    to: None,
                    collateral_denom: "uatom".into(),
                    mint_out: Coin::new("ugrid", 400),
                },
            )
            .unwrap();

        let redeem = |amount| MsgRedeemCollateral {
            sender: alice(),
            to: None,
            collateral_out: Coin::new("uatom", amount),
            iron_out: Coin::zero("airon"),
        };

        let before = maker.store().state_hash().unwrap();
        assert!(matches!(
            maker.redeem_collateral(&BlockContext::new(1), &redeem(21)),
            Err(Error::AccountInsufficientCollateral { .. })
        ));
        assert_eq!(maker.store().state_hash().unwrap(), before);

        maker.redeem_collateral(&BlockContext::new(1), &redeem(20)).unwrap();
        assert_eq!(
            maker.store().pool_collateral("uatom").unwrap().unwrap().collateral.amount,
            80
        );
        assert!(matches!(
            maker.redeem_collateral(&BlockContext::new(1), &redeem(81)),
            Err(Error::CollateralCoinInsufficient { requested: 81, available: 80 })
        ));
    }

    #[test]
    fn test_liquidation() {
        let mut maker = setup();
        deposit(&mut maker, 100);
        maker
            .mint_by_collateral(
                &BlockContext::new(1),
                &MsgMintByCollateral {
                    sender: alice(),
                    to: Some(bob()),
                    collateral_denom: "uatom".into(),
                    mint_out: Coin::new("ugrid", 500),
                },
            )
            .unwrap();

        let liquidate = MsgLiquidateCollateral {
            sender: bob(),
            to: None,
            debtor: alice(),
            collateral: Coin::new("uatom", 10),
            repay_in_max: Coin::new("ugrid", 500),
        };

        // debt 500 against liquidation value 100 * 10 * 0.8 = 800
        assert!(matches!(
            maker.liquidate_collateral(&BlockContext::new(1), &liquidate),
            Err(Error::NotUndercollateralized)
        ));

        maker.oracle().set_price("uatom", dec!(6)).unwrap();
        let mut tight = liquidate.clone();
        tight.repay_in_max = Coin::new("ugrid", 53);
        assert!(matches!(
            maker.liquidate_collateral(&BlockContext::new(1), &tight),
            Err(Error::GridSlippage { required: 54, max: 53 })
        ));

        // seize 10: fee 1, commission trunc(0.1) = 0, repay (10 - 1) * 6 = 54
        let response = maker.liquidate_collateral(&BlockContext::new(1), &liquidate).unwrap();
        assert_eq!(response.repay_in.amount, 54);
        assert_eq!(response.collateral_out.amount, 10);
        assert_eq!(maker.ledger().balance(&bob(), "uatom").unwrap(), 10);
        assert_eq!(grid_balance(&maker, &bob()), 446);

        let acc = maker.store().account_collateral(&alice(), "uatom").unwrap().unwrap();
        assert_eq!(acc.grid_debt, 446);
        assert_eq!(acc.collateral.amount, 90);
        assert_eq!(maker.store().total_collateral().unwrap().unwrap().grid_debt, 446);
        assert!(maker.health_factor(&alice(), "uatom").unwrap().unwrap() > dec!(1));
    }

    #[test]
    fn test_deposit_ceiling() {
        let mut maker = setup();
        maker
            .store()
            .set_collateral_risk_params(&CollateralRiskParams::new("uatom", dec!(0.5)).with_ceilings(Some(50), None))
            .unwrap();
        let result = maker.deposit_collateral(
            &BlockContext::new(1),
            &MsgDepositCollateral {
                sender: alice(),
                to: None,
                collateral_in: Coin::new("uatom", 51),
                iron_in: Coin::zero("airon"),
            },
        );
        assert!(matches!(result, Err(Error::CollateralCeiling { amount: 51, max: 50, .. })));
        assert!(maker.store().account_collateral(&alice(), "uatom").unwrap().is_none());
    }
}
