//! Coins and account addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::ACCOUNT_PREFIX;
use crate::utils::math::{safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// COIN
// ═══════════════════════════════════════════════════════════════════════════════

/// An amount of a single denomination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination
    pub denom: String,
    /// Amount in base units
    pub amount: u128,
}

impl Coin {
    /// Create a new coin
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Zero amount of `denom`
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    /// Check if amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Check if amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Add a coin of the same denomination
    pub fn checked_add(&self, other: &Coin) -> Result<Coin> {
        self.ensure_same_denom(other)?;
        Ok(Coin::new(self.denom.clone(), safe_add(self.amount, other.amount)?))
    }

    /// Subtract a coin of the same denomination
    pub fn checked_sub(&self, other: &Coin) -> Result<Coin> {
        self.ensure_same_denom(other)?;
        Ok(Coin::new(self.denom.clone(), safe_sub(self.amount, other.amount)?))
    }

    /// Validate the denomination is well formed
    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.denom)
    }

    fn ensure_same_denom(&self, other: &Coin) -> Result<()> {
        if self.denom != other.denom {
            return Err(Error::InvalidCoin(format!(
                "denomination mismatch: {} vs {}",
                self.denom, other.denom
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Validate a denomination: 3 to 128 characters, starting with a letter
pub fn validate_denom(denom: &str) -> Result<()> {
    let valid_len = (3..=128).contains(&denom.len());
    let starts_alpha = denom.chars().next().map_or(false, |c| c.is_ascii_alphabetic());
    let valid_chars = denom
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));

    if !(valid_len && starts_alpha && valid_chars) {
        return Err(Error::InvalidCoin(format!("invalid denom: {:?}", denom)));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Account address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parse and validate an address
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = Self(address.into());
        address.validate()?;
        Ok(address)
    }

    /// Deterministic address of a named module account
    pub fn module(name: &str) -> Self {
        Self(format!("{}{}", ACCOUNT_PREFIX, name.to_ascii_lowercase()))
    }

    /// Validate prefix and character set
    pub fn validate(&self) -> Result<()> {
        let body = self
            .0
            .strip_prefix(ACCOUNT_PREFIX)
            .ok_or_else(|| Error::InvalidAddress(format!("missing prefix: {}", self.0)))?;

        if body.is_empty()
            || !body
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(Error::InvalidAddress(self.0.clone()));
        }
        Ok(())
    }

    /// Address as string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_arithmetic() {
        let a = Coin::new("uusdc", 100);
        let b = Coin::new("uusdc", 40);

        assert_eq!(a.checked_add(&b).unwrap().amount, 140);
        assert_eq!(a.checked_sub(&b).unwrap().amount, 60);
        assert!(b.checked_sub(&a).is_err());
        assert!(a.checked_add(&Coin::new("uatom", 1)).is_err());
    }

    #[test]
    fn test_coin_display() {
        assert_eq!(Coin::new("ugrid", 42).to_string(), "42ugrid");
        assert!(Coin::zero("ugrid").is_zero());
    }

    #[test]
    fn test_denom_validation() {
        assert!(validate_denom("uusdc").is_ok());
        assert!(validate_denom("ibc/27394FB0").is_ok());
        assert!(validate_denom("u").is_err());
        assert!(validate_denom("1abc").is_err());
        assert!(validate_denom("u usdc").is_err());
    }

    #[test]
    fn test_address_validation() {
        assert!(Address::new("grid1alice").is_ok());
        assert!(Address::new("cosmos1alice").is_err());
        assert!(Address::new("grid1").is_err());
        assert!(Address::new("grid1Alice").is_err());
    }

    #[test]
    fn test_module_address() {
        let maker = Address::module("maker");
        assert_eq!(maker.as_str(), "grid1maker");
        assert!(maker.validate().is_ok());
        assert_ne!(maker, Address::module("oracle"));
    }
}
