//! Bank ledger capability.
//!
//! The maker engine moves funds only through an injected [`Ledger`]:
//! - Minting and burning from a module account
//! - Transfers between user accounts and module accounts
//! - Balance and supply queries
//!
//! Every multi-coin operation is all-or-nothing and zero-amount coins are
//! ignored.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::core::coin::{Address, Coin};
use crate::error::{Error, Result};
use crate::utils::math::{safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Account and module balances
pub trait Ledger {
    /// Create `coins` in `module`'s account
    fn mint_coins(&self, module: &str, coins: &[Coin]) -> Result<()>;

    /// Destroy `coins` held by `module`
    fn burn_coins(&self, module: &str, coins: &[Coin]) -> Result<()>;

    /// Move `coins` from a user account into a module account
    fn send_coins_from_account_to_module(&self, sender: &Address, module: &str, coins: &[Coin]) -> Result<()>;

    /// Move `coins` from a module account to a user account
    fn send_coins_from_module_to_account(&self, module: &str, recipient: &Address, coins: &[Coin]) -> Result<()>;

    /// Move `coins` between module accounts
    fn send_coins_from_module_to_module(&self, from: &str, to: &str, coins: &[Coin]) -> Result<()>;

    /// Balance of `denom` held by `address`
    fn balance(&self, address: &Address, denom: &str) -> Result<u128>;

    /// Whether any amount of `denom` exists
    fn has_supply(&self, denom: &str) -> Result<bool>;

    /// Account address of a module
    fn module_address(&self, module: &str) -> Address {
        Address::module(module)
    }
}

impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    fn mint_coins(&self, module: &str, coins: &[Coin]) -> Result<()> {
        (**self).mint_coins(module, coins)
    }

    fn burn_coins(&self, module: &str, coins: &[Coin]) -> Result<()> {
        (**self).burn_coins(module, coins)
    }

    fn send_coins_from_account_to_module(&self, sender: &Address, module: &str, coins: &[Coin]) -> Result<()> {
        (**self).send_coins_from_account_to_module(sender, module, coins)
    }

    fn send_coins_from_module_to_account(&self, module: &str, recipient: &Address, coins: &[Coin]) -> Result<()> {
        (**self).send_coins_from_module_to_account(module, recipient, coins)
    }

    fn send_coins_from_module_to_module(&self, from: &str, to: &str, coins: &[Coin]) -> Result<()> {
        (**self).send_coins_from_module_to_module(from, to, coins)
    }

    fn balance(&self, address: &Address, denom: &str) -> Result<u128> {
        (**self).balance(address, denom)
    }

    fn has_supply(&self, denom: &str) -> Result<bool> {
        (**self).has_supply(denom)
    }

    fn module_address(&self, module: &str) -> Address {
        (**self).module_address(module)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone)]
struct LedgerState {
    balances: BTreeMap<(Address, String), u128>,
    supply: BTreeMap<String, u128>,
}

impl LedgerState {
    fn balance(&self, address: &Address, denom: &str) -> u128 {
        self.balances
            .get(&(address.clone(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, address: &Address, coin: &Coin) -> Result<()> {
        let entry = self
            .balances
            .entry((address.clone(), coin.denom.clone()))
            .or_insert(0);
        *entry = safe_add(*entry, coin.amount)?;
        Ok(())
    }

    fn debit(&mut self, address: &Address, coin: &Coin) -> Result<()> {
        let available = self.balance(address, &coin.denom);
        if available < coin.amount {
            return Err(Error::InsufficientFunds {
                address: address.to_string(),
                denom: coin.denom.clone(),
                required: coin.amount,
                available,
            });
        }
        self.balances
            .insert((address.clone(), coin.denom.clone()), available - coin.amount);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<()> {
        for coin in coins.iter().filter(|c| c.is_positive()) {
            self.debit(from, coin)?;
            self.credit(to, coin)?;
        }
        Ok(())
    }
}

/// Ledger kept in memory, for tests and simulations
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `address` with newly created coins
    pub fn fund(&self, address: &Address, coins: &[Coin]) -> Result<()> {
        self.update(|state| {
            for coin in coins.iter().filter(|c| c.is_positive()) {
                state.credit(address, coin)?;
                let supply = state.supply.entry(coin.denom.clone()).or_insert(0);
                *supply = safe_add(*supply, coin.amount)?;
            }
            Ok(())
        })
    }

    /// Total supply of `denom`
    pub fn supply(&self, denom: &str) -> Result<u128> {
        let state = self.read()?;
        Ok(state.supply.get(denom).copied().unwrap_or(0))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| Error::Internal("ledger lock poisoned".into()))
    }

    /// Run `op` on a copy of the state and install it only on success
    fn update<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut LedgerState) -> Result<()>,
    {
        let mut guard = self
            .state
            .write()
            .map_err(|_| Error::Internal("ledger lock poisoned".into()))?;
        let mut next = guard.clone();
        op(&mut next)?;
        *guard = next;
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn mint_coins(&self, module: &str, coins: &[Coin]) -> Result<()> {
        let address = self.module_address(module);
        self.update(|state| {
            for coin in coins.iter().filter(|c| c.is_positive()) {
                state.credit(&address, coin)?;
                let supply = state.supply.entry(coin.denom.clone()).or_insert(0);
                *supply = safe_add(*supply, coin.amount)?;
            }
            Ok(())
        })
    }

    fn burn_coins(&self, module: &str, coins: &[Coin]) -> Result<()> {
        let address = self.module_address(module);
        self.update(|state| {
            for coin in coins.iter().filter(|c| c.is_positive()) {
                state.debit(&address, coin)?;
                let supply = state.supply.entry(coin.denom.clone()).or_insert(0);
                *supply = safe_sub(*supply, coin.amount)?;
            }
            Ok(())
        })
    }

    fn send_coins_from_account_to_module(&self, sender: &Address, module: &str, coins: &[Coin]) -> Result<()> {
        let module = self.module_address(module);
        self.update(|state| state.transfer(sender, &module, coins))
    }

    fn send_coins_from_module_to_account(&self, module: &str, recipient: &Address, coins: &[Coin]) -> Result<()> {
        let module = self.module_address(module);
        self.update(|state| state.transfer(&module, recipient, coins))
    }

    fn send_coins_from_module_to_module(&self, from: &str, to: &str, coins: &[Coin]) -> Result<()> {
        let from = self.module_address(from);
        let to = self.module_address(to);
        self.update(|state| state.transfer(&from, &to, coins))
    }

    fn balance(&self, address: &Address, denom: &str) -> Result<u128> {
        Ok(self.read()?.balance(address, denom))
    }

    fn has_supply(&self, denom: &str) -> Result<bool> {
        Ok(self.supply(denom)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("grid1alice").unwrap()
    }

    #[test]
    fn test_fund_and_transfer() {
        let ledger = InMemoryLedger::new();
        ledger.fund(&alice(), &[Coin::new("uusdc", 100)]).unwrap();

        ledger
            .send_coins_from_account_to_module(&alice(), "maker", &[Coin::new("uusdc", 60)])
            .unwrap();

        assert_eq!(ledger.balance(&alice(), "uusdc").unwrap(), 40);
        assert_eq!(ledger.balance(&Address::module("maker"), "uusdc").unwrap(), 60);
        assert!(ledger.has_supply("uusdc").unwrap());
        assert!(!ledger.has_supply("uatom").unwrap());
    }

    #[test]
    fn test_multi_coin_transfer_is_atomic() {
        let ledger = InMemoryLedger::new();
        ledger.fund(&alice(), &[Coin::new("uusdc", 100)]).unwrap();

        let result = ledger.send_coins_from_account_to_module(
            &alice(),
            "maker",
            &[Coin::new("uusdc", 50), Coin::new("airon", 1)],
        );
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(ledger.balance(&alice(), "uusdc").unwrap(), 100);
    }

    #[test]
    fn test_mint_burn_supply() {
        let ledger = InMemoryLedger::new();
        ledger.mint_coins("maker", &[Coin::new("ugrid", 500)]).unwrap();
        ledger.burn_coins("maker", &[Coin::new("ugrid", 200)]).unwrap();

        assert_eq!(ledger.supply("ugrid").unwrap(), 300);
        assert!(ledger.burn_coins("maker", &[Coin::new("ugrid", 301)]).is_err());
    }

    #[test]
    fn test_zero_coins_ignored() {
        let ledger = InMemoryLedger::new();
        ledger
            .send_coins_from_module_to_module("maker", "oracle", &[Coin::zero("ugrid")])
            .unwrap();
        ledger.burn_coins("maker", &[Coin::zero("airon")]).unwrap();
    }
}
