//! Maker messages and responses.
//!
//! Each message carries a stateless `validate_basic` that checks addresses,
//! denominations and amounts before any state is read. When `to` is absent
//! the sender receives the output.

use serde::{Deserialize, Serialize};

use crate::core::coin::{validate_denom, Address, Coin};
use crate::core::config::MakerConfig;
use crate::error::{Error, Result};

fn validate_sender_receiver(sender: &Address, to: Option<&Address>) -> Result<()> {
    sender
        .validate()
        .map_err(|e| Error::InvalidAddress(format!("invalid sender address ({})", e)))?;
    if let Some(to) = to {
        to.validate()
            .map_err(|e| Error::InvalidAddress(format!("invalid receiver address ({})", e)))?;
    }
    Ok(())
}

fn expect_denom(coin: &Coin, denom: &str) -> Result<()> {
    if coin.denom != denom {
        return Err(Error::InvalidCoin(format!("invalid coin: {}", coin.denom)));
    }
    Ok(())
}

fn expect_positive(coin: &Coin, name: &str) -> Result<()> {
    if !coin.is_positive() {
        return Err(Error::InvalidCoin(format!("{} must be positive: {}", name, coin)));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SWAP MESSAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Mint Grid by paying backing and Iron
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMintBySwap {
    /// Account paying
    pub sender: Address,
    /// Account receiving Grid; defaults to the sender
    pub to: Option<Address>,
    /// Maximum backing to pay; its denomination selects the pool
    pub backing_in_max: Coin,
    /// Maximum Iron to pay
    pub iron_in_max: Coin,
    /// Minimum Grid to receive
    pub mint_out_min: Coin,
    /// Pay entirely in backing regardless of the backing ratio
    pub full_backing: bool,
}

impl MsgMintBySwap {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        expect_denom(&self.mint_out_min, &config.grid_denom)?;
        expect_denom(&self.iron_in_max, &config.iron_denom)?;
        validate_denom(&self.backing_in_max.denom)?;
        expect_positive(&self.mint_out_min, "mint_out_min")?;
        if self.backing_in_max.is_zero() && self.iron_in_max.is_zero() {
            return Err(Error::InvalidCoin(
                "backing_in_max and iron_in_max must not be both zero".into(),
            ));
        }
        if self.full_backing && self.iron_in_max.is_positive() {
            return Err(Error::InvalidCoin(
                "iron_in_max must be zero when full_backing is true".into(),
            ));
        }
        Ok(())
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

/// Burn Grid for backing and Iron
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurnBySwap {
    /// Account paying Grid
    pub sender: Address,
    /// Account receiving backing and Iron; defaults to the sender
    pub to: Option<Address>,
    /// Grid to burn, fee included
    pub burn_in: Coin,
    /// Minimum backing to receive; its denomination selects the pool
    pub backing_out_min: Coin,
    /// Minimum Iron to receive
    pub iron_out_min: Coin,
}

impl MsgBurnBySwap {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        expect_denom(&self.burn_in, &config.grid_denom)?;
        expect_denom(&self.iron_out_min, &config.iron_denom)?;
        validate_denom(&self.backing_out_min.denom)?;
        expect_positive(&self.burn_in, "burn_in")
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

/// Buy excess backing with Iron
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBuyBacking {
    /// Account paying Iron
    pub sender: Address,
    /// Account receiving backing; defaults to the sender
    pub to: Option<Address>,
    /// Iron to pay
    pub iron_in: Coin,
    /// Minimum backing to receive; its denomination selects the pool
    pub backing_out_min: Coin,
}

impl MsgBuyBacking {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        expect_denom(&self.iron_in, &config.iron_denom)?;
        validate_denom(&self.backing_out_min.denom)?;
        expect_positive(&self.iron_in, "iron_in")
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

/// Sell backing for newly minted Iron
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSellBacking {
    /// Account paying backing
    pub sender: Address,
    /// Account receiving Iron; defaults to the sender
    pub to: Option<Address>,
    /// Backing to pay
    pub backing_in: Coin,
    /// Minimum Iron to receive
    pub iron_out_min: Coin,
}

impl MsgSellBacking {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        expect_denom(&self.iron_out_min, &config.iron_denom)?;
        validate_denom(&self.backing_in.denom)?;
        expect_positive(&self.backing_in, "backing_in")
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL MESSAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Post collateral and Iron to a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDepositCollateral {
    /// Account paying
    pub sender: Address,
    /// Position owner; defaults to the sender
    pub to: Option<Address>,
    /// Collateral to post; its denomination selects the pool
    pub collateral_in: Coin,
    /// Iron to post
    pub iron_in: Coin,
}

impl MsgDepositCollateral {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        validate_denom(&self.collateral_in.denom)?;
        expect_denom(&self.iron_in, &config.iron_denom)?;
        if self.collateral_in.is_zero() && self.iron_in.is_zero() {
            return Err(Error::InvalidCoin(format!(
                "collateral_in and iron_in must not be both zero: {}, {}",
                self.collateral_in, self.iron_in
            )));
        }
        Ok(())
    }

    /// Position owner
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

/// Withdraw collateral and Iron from the sender's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRedeemCollateral {
    /// Position owner
    pub sender: Address,
    /// Account receiving the withdrawal; defaults to the sender
    pub to: Option<Address>,
    /// Collateral to withdraw; its denomination selects the position
    pub collateral_out: Coin,
    /// Iron to withdraw
    pub iron_out: Coin,
}

impl MsgRedeemCollateral {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        validate_denom(&self.collateral_out.denom)?;
        expect_denom(&self.iron_out, &config.iron_denom)?;
        if self.collateral_out.is_zero() && self.iron_out.is_zero() {
            return Err(Error::InvalidCoin(format!(
                "collateral_out and iron_out must not be both zero: {}, {}",
                self.collateral_out, self.iron_out
            )));
        }
        Ok(())
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

/// Borrow Grid against the sender's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMintByCollateral {
    /// Position owner
    pub sender: Address,
    /// Account receiving Grid; defaults to the sender
    pub to: Option<Address>,
    /// Collateral denomination of the position
    pub collateral_denom: String,
    /// Grid to receive; the fee is added to the debt on top
    pub mint_out: Coin,
}

impl MsgMintByCollateral {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        validate_denom(&self.collateral_denom)?;
        expect_denom(&self.mint_out, &config.grid_denom)?;
        expect_positive(&self.mint_out, "mint_out")
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

/// Repay Grid debt of the sender's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurnByCollateral {
    /// Position owner
    pub sender: Address,
    /// Collateral denomination of the position
    pub collateral_denom: String,
    /// Maximum Grid to repay
    pub repay_in_max: Coin,
}

impl MsgBurnByCollateral {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, None)?;
        validate_denom(&self.collateral_denom)?;
        expect_denom(&self.repay_in_max, &config.grid_denom)?;
        expect_positive(&self.repay_in_max, "repay_in_max")
    }
}

/// Liquidate part of an undercollateralized position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLiquidateCollateral {
    /// Liquidator paying Grid
    pub sender: Address,
    /// Account receiving the collateral; defaults to the sender
    pub to: Option<Address>,
    /// Owner of the position
    pub debtor: Address,
    /// Collateral to seize
    pub collateral: Coin,
    /// Maximum Grid the liquidator pays
    pub repay_in_max: Coin,
}

impl MsgLiquidateCollateral {
    /// Stateless checks
    pub fn validate_basic(&self, config: &MakerConfig) -> Result<()> {
        validate_sender_receiver(&self.sender, self.to.as_ref())?;
        self.debtor
            .validate()
            .map_err(|e| Error::InvalidAddress(format!("invalid debtor address ({})", e)))?;
        validate_denom(&self.collateral.denom)?;
        expect_positive(&self.collateral, "collateral")?;
        expect_denom(&self.repay_in_max, &config.grid_denom)?;
        expect_positive(&self.repay_in_max, "repay_in_max")
    }

    /// Account receiving the output
    pub fn receiver(&self) -> &Address {
        self.to.as_ref().unwrap_or(&self.sender)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESPONSES
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a mint by swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapResponse {
    /// Backing paid
    pub backing_in: Coin,
    /// Iron paid
    pub iron_in: Coin,
    /// Grid received
    pub mint_out: Coin,
    /// Grid fee
    pub mint_fee: Coin,
}

/// Result of a burn by swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapResponse {
    /// Backing received
    pub backing_out: Coin,
    /// Iron received
    pub iron_out: Coin,
    /// Grid fee
    pub burn_fee: Coin,
}

/// Result of a buyback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingResponse {
    /// Backing received
    pub backing_out: Coin,
    /// Backing fee
    pub buyback_fee: Coin,
}

/// Result of a reback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingResponse {
    /// Iron received
    pub iron_out: Coin,
    /// Iron fee
    pub reback_fee: Coin,
}

/// Result of a mint by collateral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintByCollateralResponse {
    /// Grid received
    pub mint_out: Coin,
    /// Grid fee added to the debt
    pub mint_fee: Coin,
}

/// Result of a debt repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnByCollateralResponse {
    /// Grid taken from the sender
    pub repay_in: Coin,
    /// Part of the repayment that settled interest
    pub interest_repaid: Coin,
}

/// Result of a liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateCollateralResponse {
    /// Grid paid by the liquidator
    pub repay_in: Coin,
    /// Collateral received
    pub collateral_out: Coin,
}
