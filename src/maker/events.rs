//! Maker events.
//!
//! Every successful message and every backing ratio adjustment emits one
//! event. Events accumulate in the engine until the caller drains them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::coin::{Address, Coin};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All maker event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MakerEvent {
    // Swap Events
    /// Grid minted against backing and Iron
    MintBySwap(MintBySwapEvent),
    /// Grid burned for backing and Iron
    BurnBySwap(BurnBySwapEvent),
    /// Excess backing bought with Iron
    BuyBacking(BuyBackingEvent),
    /// Backing sold for newly minted Iron
    SellBacking(SellBackingEvent),

    // Collateral Events
    /// Collateral or Iron posted to a position
    DepositCollateral(DepositCollateralEvent),
    /// Collateral or Iron withdrawn from a position
    RedeemCollateral(RedeemCollateralEvent),
    /// Grid borrowed against a position
    MintByCollateral(MintByCollateralEvent),
    /// Grid debt repaid
    BurnByCollateral(BurnByCollateralEvent),
    /// Undercollateralized position liquidated
    LiquidateCollateral(LiquidateCollateralEvent),

    // Controller Events
    /// Backing ratio controller ran
    BackingRatioAdjusted(BackingRatioAdjustedEvent),
}

impl MakerEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MintBySwap(_) => "mint_by_swap",
            Self::BurnBySwap(_) => "burn_by_swap",
            Self::BuyBacking(_) => "buy_backing",
            Self::SellBacking(_) => "sell_backing",
            Self::DepositCollateral(_) => "deposit_collateral",
            Self::RedeemCollateral(_) => "redeem_collateral",
            Self::MintByCollateral(_) => "mint_by_collateral",
            Self::BurnByCollateral(_) => "burn_by_collateral",
            Self::LiquidateCollateral(_) => "liquidate_collateral",
            Self::BackingRatioAdjusted(_) => "backing_ratio_adjusted",
        }
    }

    /// Get the block height of the event
    pub fn block_height(&self) -> i64 {
        match self {
            Self::MintBySwap(e) => e.block_height,
            Self::BurnBySwap(e) => e.block_height,
            Self::BuyBacking(e) => e.block_height,
            Self::SellBacking(e) => e.block_height,
            Self::DepositCollateral(e) => e.block_height,
            Self::RedeemCollateral(e) => e.block_height,
            Self::MintByCollateral(e) => e.block_height,
            Self::BurnByCollateral(e) => e.block_height,
            Self::LiquidateCollateral(e) => e.block_height,
            Self::BackingRatioAdjusted(e) => e.block_height,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SWAP EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted on mint by swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBySwapEvent {
    /// Account paying backing and Iron
    pub sender: Address,
    /// Account receiving Grid
    pub receiver: Address,
    /// Backing paid
    pub backing_in: Coin,
    /// Iron paid and burned
    pub iron_in: Coin,
    /// Grid received
    pub mint_out: Coin,
    /// Grid fee routed to the reward module
    pub mint_fee: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on burn by swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBySwapEvent {
    /// Account paying Grid
    pub sender: Address,
    /// Account receiving backing and Iron
    pub receiver: Address,
    /// Grid paid
    pub burn_in: Coin,
    /// Backing received
    pub backing_out: Coin,
    /// Iron minted and received
    pub iron_out: Coin,
    /// Grid fee routed to the reward module
    pub burn_fee: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on buyback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBackingEvent {
    /// Account paying Iron
    pub sender: Address,
    /// Account receiving backing
    pub receiver: Address,
    /// Iron paid and burned
    pub iron_in: Coin,
    /// Backing received
    pub backing_out: Coin,
    /// Backing fee routed to the reward module
    pub buyback_fee: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on reback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellBackingEvent {
    /// Account paying backing
    pub sender: Address,
    /// Account receiving Iron
    pub receiver: Address,
    /// Backing paid
    pub backing_in: Coin,
    /// Iron received
    pub iron_out: Coin,
    /// Iron fee routed to the reward module
    pub reback_fee: Coin,
    /// Block height
    pub block_height: i64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted on collateral deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCollateralEvent {
    /// Account paying
    pub sender: Address,
    /// Position owner
    pub receiver: Address,
    /// Collateral posted
    pub collateral_in: Coin,
    /// Iron posted
    pub iron_in: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on collateral redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemCollateralEvent {
    /// Position owner
    pub sender: Address,
    /// Account receiving the withdrawal
    pub receiver: Address,
    /// Collateral withdrawn
    pub collateral_out: Coin,
    /// Iron withdrawn
    pub iron_out: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on mint by collateral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintByCollateralEvent {
    /// Position owner
    pub sender: Address,
    /// Account receiving Grid
    pub receiver: Address,
    /// Collateral denomination of the position
    pub collateral_denom: String,
    /// Grid received
    pub mint_out: Coin,
    /// Grid fee routed to the reward module
    pub mint_fee: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on debt repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnByCollateralEvent {
    /// Position owner
    pub sender: Address,
    /// Collateral denomination of the position
    pub collateral_denom: String,
    /// Grid repaid in total
    pub repay_in: Coin,
    /// Part of the repayment that settled interest
    pub interest_repaid: Coin,
    /// Block height
    pub block_height: i64,
}

/// Event emitted on liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateCollateralEvent {
    /// Liquidator
    pub sender: Address,
    /// Account receiving the seized collateral
    pub receiver: Address,
    /// Liquidated account
    pub debtor: Address,
    /// Collateral seized from the position
    pub collateral_seized: Coin,
    /// Collateral paid to the receiver
    pub collateral_out: Coin,
    /// Grid paid by the liquidator
    pub repay_in: Coin,
    /// Grid refunded to the debtor
    pub refund: Coin,
    /// Collateral routed to the reward module
    pub commission: Coin,
    /// Block height
    pub block_height: i64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLLER EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted whenever the controller runs past its cooldown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackingRatioAdjustedEvent {
    /// Ratio before the adjustment
    pub previous_ratio: Decimal,
    /// Ratio after the adjustment
    pub new_ratio: Decimal,
    /// Grid price observed
    pub grid_price: Decimal,
    /// Block height
    pub block_height: i64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Events pending delivery to the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<MakerEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn push(&mut self, event: MakerEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[MakerEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&MakerEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Take every event, leaving the log empty
    pub fn drain(&mut self) -> Vec<MakerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn adjusted(height: i64) -> MakerEvent {
        MakerEvent::BackingRatioAdjusted(BackingRatioAdjustedEvent {
            previous_ratio: dec!(1),
            new_ratio: dec!(0.9975),
            grid_price: dec!(1.01),
            block_height: height,
        })
    }

    #[test]
    fn test_event_types() {
        let event = adjusted(600);
        assert_eq!(event.event_type(), "backing_ratio_adjusted");
        assert_eq!(event.block_height(), 600);
    }

    #[test]
    fn test_event_log_drain() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(adjusted(600));
        log.push(MakerEvent::DepositCollateral(DepositCollateralEvent {
            sender: Address::module("alice"),
            receiver: Address::module("alice"),
            collateral_in: Coin::new("uatom", 1000),
            iron_in: Coin::zero("airon"),
            block_height: 601,
        }));

        assert_eq!(log.len(), 2);
        assert_eq!(log.filter_by_type("deposit_collateral").len(), 1);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_serializes() {
        let json = serde_json::to_string(&adjusted(1)).unwrap();
        let back: MakerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, adjusted(1));
    }
}
