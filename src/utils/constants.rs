//! Protocol constants and default parameters.
//!
//! All protocol-wide constants are defined here for easy auditing and modification.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ═══════════════════════════════════════════════════════════════════════════════
// DENOMINATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Grid stablecoin denomination (micro units)
pub const GRID_DENOM: &str = "ugrid";

/// Iron auxiliary token denomination (atto units)
pub const IRON_DENOM: &str = "airon";

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Human-readable prefix of every account address
pub const ACCOUNT_PREFIX: &str = "grid1";

/// Name of the module account holding backing and collateral
pub const MAKER_MODULE: &str = "maker";

/// Name of the module account receiving fees, interest and commission
pub const ORACLE_MODULE: &str = "oracle";

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// Blocks per year at a ~5 second block time
pub const BLOCKS_PER_YEAR: u64 = 6_311_520;

/// Target USD peg of Grid
pub const GRID_TARGET_PRICE: Decimal = dec!(1);

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT MODULE PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Backing ratio change per adjustment - 0.25%
pub const DEFAULT_BACKING_RATIO_STEP: Decimal = dec!(0.0025);

/// Price deviation band around the target that triggers an adjustment - 0.1%
pub const DEFAULT_BACKING_RATIO_PRICE_BAND: Decimal = dec!(0.001);

/// Minimum blocks between two adjustments
pub const DEFAULT_BACKING_RATIO_COOLDOWN_PERIOD: i64 = 600;

/// Extra premium over target required to mint
pub const DEFAULT_MINT_PRICE_BIAS: Decimal = dec!(0);

/// Discount under target required to burn
pub const DEFAULT_BURN_PRICE_BIAS: Decimal = dec!(0);

/// Extra Iron paid for recollateralizing - 0.75%
pub const DEFAULT_REBACK_BONUS: Decimal = dec!(0.0075);

/// Share of the liquidation fee routed to the reward module - 10%
pub const DEFAULT_LIQUIDATION_COMMISSION_FEE: Decimal = dec!(0.1);

/// Backing ratio before the controller first runs (fully backed)
pub const INITIAL_BACKING_RATIO: Decimal = dec!(1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fractions_in_range() {
        for fraction in [
            DEFAULT_BACKING_RATIO_STEP,
            DEFAULT_BACKING_RATIO_PRICE_BAND,
            DEFAULT_MINT_PRICE_BIAS,
            DEFAULT_BURN_PRICE_BIAS,
            DEFAULT_REBACK_BONUS,
            DEFAULT_LIQUIDATION_COMMISSION_FEE,
        ] {
            assert!(fraction >= Decimal::ZERO && fraction < Decimal::ONE);
        }
    }

    #[test]
    fn test_denoms_distinct() {
        assert_ne!(GRID_DENOM, IRON_DENOM);
        assert_ne!(MAKER_MODULE, ORACLE_MODULE);
    }
}
