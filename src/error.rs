//! Error types for the maker engine.
//!
//! Every failure aborts the enclosing message and leaves persisted state
//! untouched. Variants are grouped by the numeric range of [`Error::code`].

use thiserror::Error;

/// Result type alias for maker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the maker engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Backing Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Backing denomination is not registered
    #[error("backing coin denomination not found: {0}")]
    BackingCoinNotFound(String),

    /// Backing denomination is registered but disabled
    #[error("backing coin disabled: {0}")]
    BackingCoinDisabled(String),

    /// Pool would hold more backing than its ceiling
    #[error("backing over ceiling: {denom} pool would hold {amount}, max {max}")]
    BackingCeiling {
        /// Backing denomination
        denom: String,
        /// Resulting pool backing
        amount: u128,
        /// Configured ceiling
        max: u128,
    },

    /// Not enough backing coin available to pay out
    #[error("backing coin insufficient: {0}")]
    BackingCoinInsufficient(String),

    /// Not enough backing deficit to mint the requested Iron
    #[error("iron coin insufficient: {0}")]
    IronCoinInsufficient(String),

    // ═══════════════════════════════════════════════════════════════════
    // Collateral Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Collateral denomination is not registered
    #[error("collateral coin denomination not found: {0}")]
    CollateralCoinNotFound(String),

    /// Collateral denomination is registered but disabled
    #[error("collateral coin disabled: {0}")]
    CollateralCoinDisabled(String),

    /// Pool would hold more collateral than its ceiling
    #[error("collateral over ceiling: {denom} pool would hold {amount}, max {max}")]
    CollateralCeiling {
        /// Collateral denomination
        denom: String,
        /// Resulting pool collateral
        amount: u128,
        /// Configured ceiling
        max: u128,
    },

    /// Requested collateral exceeds what the position holds
    #[error("collateral coin insufficient: requested {requested}, available {available}")]
    CollateralCoinInsufficient {
        /// Requested amount
        requested: u128,
        /// Amount held by the position
        available: u128,
    },

    /// Account has never deposited this collateral
    #[error("account has no collateral: {0}")]
    AccountNoCollateral(String),

    /// Account has no debt to repay
    #[error("account has no debt for {0} collateral")]
    AccountNoDebt(String),

    /// Debt would exceed the borrowing power of the position
    #[error("account collateral insufficient: debt {debt} exceeds max {max_debt} for {denom}")]
    AccountInsufficientCollateral {
        /// Collateral denomination
        denom: String,
        /// Resulting debt
        debt: u128,
        /// Maximum debt the position supports
        max_debt: u128,
    },

    /// Position is healthy and cannot be liquidated
    #[error("position is not undercollateralized")]
    NotUndercollateralized,

    // ═══════════════════════════════════════════════════════════════════
    // Grid / Price Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Oracle has no valid price for the denomination
    #[error("no price available for {0}")]
    PriceUnavailable(String),

    /// Price fed to the oracle is not positive
    #[error("invalid price for {denom}: {price}")]
    InvalidPrice {
        /// Denomination
        denom: String,
        /// Rejected price
        price: String,
    },

    /// Grid market price is below the mint lower bound
    #[error("grid price too low: {price} < {bound}")]
    GridPriceTooLow {
        /// Current market price
        price: String,
        /// Required lower bound
        bound: String,
    },

    /// Grid market price is above the burn upper bound
    #[error("grid price too high: {price} > {bound}")]
    GridPriceTooHigh {
        /// Current market price
        price: String,
        /// Required upper bound
        bound: String,
    },

    /// Minted Grid would exceed the pool ceiling
    #[error("grid over ceiling: {minted} > {max}")]
    GridCeiling {
        /// Resulting minted amount
        minted: i128,
        /// Configured ceiling
        max: u128,
    },

    /// Result is worse than the caller's slippage bound
    #[error("over slippage: {0}")]
    OverSlippage(String),

    /// Liquidator's repay bound does not cover the required repayment
    #[error("grid slippage: repay {required} exceeds max {max}")]
    GridSlippage {
        /// Required repayment
        required: u128,
        /// Caller's maximum
        max: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Account or module does not hold enough funds
    #[error("insufficient funds: {address} has {available}{denom}, needs {required}{denom}")]
    InsufficientFunds {
        /// Holder address
        address: String,
        /// Denomination
        denom: String,
        /// Required amount
        required: u128,
        /// Available amount
        available: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid input parameter
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Coin has the wrong denomination or amount
    #[error("invalid coin: {0}")]
    InvalidCoin(String),

    /// Address is malformed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Amount is zero
    #[error("amount cannot be zero")]
    ZeroAmount,

    /// Overflow in calculation
    #[error("arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Underflow in calculation
    #[error("arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Governance Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Backing denomination already registered
    #[error("existing backing coin: {0}")]
    ExistingBacking(String),

    /// Collateral denomination already registered
    #[error("existing collateral coin: {0}")]
    ExistingCollateral(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("config error: {0}")]
    Config(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen in production)
    #[error("internal error: {0}")]
    Internal(String),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns true if the caller can retry with different inputs
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::OverSlippage(_)
                | Error::GridSlippage { .. }
                | Error::AccountInsufficientCollateral { .. }
                | Error::GridPriceTooLow { .. }
                | Error::GridPriceTooHigh { .. }
                | Error::InsufficientFunds { .. }
        )
    }

    /// Returns true for configuration failures (unknown/disabled denom, missing price)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::BackingCoinNotFound(_)
                | Error::BackingCoinDisabled(_)
                | Error::CollateralCoinNotFound(_)
                | Error::CollateralCoinDisabled(_)
                | Error::PriceUnavailable(_)
                | Error::Config(_)
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Backing errors: 1xxx
            Error::BackingCoinNotFound(_) => 1001,
            Error::BackingCoinDisabled(_) => 1002,
            Error::BackingCeiling { .. } => 1003,
            Error::BackingCoinInsufficient(_) => 1004,
            Error::IronCoinInsufficient(_) => 1005,

            // Collateral errors: 2xxx
            Error::CollateralCoinNotFound(_) => 2001,
            Error::CollateralCoinDisabled(_) => 2002,
            Error::CollateralCeiling { .. } => 2003,
            Error::CollateralCoinInsufficient { .. } => 2004,
            Error::AccountNoCollateral(_) => 2005,
            Error::AccountNoDebt(_) => 2006,
            Error::AccountInsufficientCollateral { .. } => 2007,
            Error::NotUndercollateralized => 2008,

            // Grid / price errors: 3xxx
            Error::PriceUnavailable(_) => 3001,
            Error::GridPriceTooLow { .. } => 3002,
            Error::GridPriceTooHigh { .. } => 3003,
            Error::GridCeiling { .. } => 3004,
            Error::OverSlippage(_) => 3005,
            Error::GridSlippage { .. } => 3006,
            Error::InvalidPrice { .. } => 3007,

            // Ledger errors: 4xxx
            Error::InsufficientFunds { .. } => 4001,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,
            Error::InvalidCoin(_) => 5002,
            Error::InvalidAddress(_) => 5003,
            Error::ZeroAmount => 5004,
            Error::Overflow { .. } => 5005,
            Error::Underflow { .. } => 5006,

            // Governance errors: 6xxx
            Error::ExistingBacking(_) => 6001,
            Error::ExistingCollateral(_) => 6002,
            Error::Config(_) => 6003,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
            Error::Storage(_) => 9002,
        }
    }

    /// Shorthand for an [`Error::InvalidParameter`]
    pub fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let codes = vec![
            Error::BackingCoinNotFound("".into()).code(),
            Error::BackingCeiling { denom: "".into(), amount: 0, max: 0 }.code(),
            Error::CollateralCoinNotFound("".into()).code(),
            Error::AccountInsufficientCollateral { denom: "".into(), debt: 0, max_debt: 0 }.code(),
            Error::NotUndercollateralized.code(),
            Error::PriceUnavailable("".into()).code(),
            Error::GridCeiling { minted: 0, max: 0 }.code(),
            Error::OverSlippage("".into()).code(),
            Error::InsufficientFunds { address: "".into(), denom: "".into(), required: 0, available: 0 }.code(),
            Error::ZeroAmount.code(),
            Error::ExistingBacking("".into()).code(),
            Error::Internal("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::AccountInsufficientCollateral {
            denom: "uatom".into(),
            debt: 600,
            max_debt: 500,
        };
        assert!(err.to_string().contains("600"));
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("uatom"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::OverSlippage("mint out".into()).is_recoverable());
        assert!(Error::GridSlippage { required: 2, max: 1 }.is_recoverable());
        assert!(!Error::Internal("test".into()).is_recoverable());
    }

    #[test]
    fn test_is_configuration() {
        assert!(Error::PriceUnavailable("ugrid".into()).is_configuration());
        assert!(Error::BackingCoinDisabled("uusdc".into()).is_configuration());
        assert!(!Error::NotUndercollateralized.is_configuration());
    }
}
