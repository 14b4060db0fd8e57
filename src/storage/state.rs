//! Maker state access with persistence.
//!
//! Typed getters and setters for every persisted record, plus
//! [`MakerBatch`], the write buffer message handlers stage their updates in.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::core::backing::{BackingRiskParams, PoolBacking, TotalBacking};
use crate::core::coin::Address;
use crate::core::collateral::{AccountCollateral, CollateralRiskParams, PoolCollateral, TotalCollateral};
use crate::core::config::MakerParams;
use crate::error::{Error, Result};
use crate::storage::backend::{make_key, prefixes, StorageBackend, StoreTransaction, TypedStore};
use crate::utils::constants::INITIAL_BACKING_RATIO;

fn account_collateral_key(account: &Address, denom: &str) -> Vec<u8> {
    make_key(
        prefixes::ACCOUNT_COLLATERAL,
        format!("{}:{}", account, denom).as_bytes(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed access to the persisted maker state
pub struct MakerStore<B: StorageBackend> {
    /// Underlying storage
    store: TypedStore<B>,
}

impl<B: StorageBackend> MakerStore<B> {
    /// Create a new state store
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PARAMS AND BACKING RATIO
    // ═══════════════════════════════════════════════════════════════════════════

    /// Load module params
    pub fn params(&self) -> Result<MakerParams> {
        self.store
            .get(prefixes::PARAMS)?
            .ok_or_else(|| Error::Storage("maker params not initialized".into()))
    }

    /// Whether module params were written
    pub fn has_params(&self) -> Result<bool> {
        self.store.exists(prefixes::PARAMS)
    }

    /// Save module params
    pub fn set_params(&self, params: &MakerParams) -> Result<()> {
        self.store.set(prefixes::PARAMS, params)
    }

    /// Current backing ratio; fully backed until first adjusted
    pub fn backing_ratio(&self) -> Result<Decimal> {
        Ok(self
            .store
            .get(prefixes::BACKING_RATIO)?
            .unwrap_or(INITIAL_BACKING_RATIO))
    }

    /// Save backing ratio
    pub fn set_backing_ratio(&self, ratio: Decimal) -> Result<()> {
        self.store.set(prefixes::BACKING_RATIO, &ratio)
    }

    /// Height of the last backing ratio adjustment, zero if never adjusted
    pub fn backing_ratio_last_block(&self) -> Result<i64> {
        Ok(self
            .store
            .get(prefixes::BACKING_RATIO_LAST_BLOCK)?
            .unwrap_or(0))
    }

    /// Save height of the last backing ratio adjustment
    pub fn set_backing_ratio_last_block(&self, height: i64) -> Result<()> {
        self.store.set(prefixes::BACKING_RATIO_LAST_BLOCK, &height)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RISK PARAMETERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Load backing risk params
    pub fn backing_risk_params(&self, denom: &str) -> Result<Option<BackingRiskParams>> {
        self.store.get(&make_key(prefixes::BACKING_PARAMS, denom.as_bytes()))
    }

    /// Save backing risk params
    pub fn set_backing_risk_params(&self, params: &BackingRiskParams) -> Result<()> {
        let key = make_key(prefixes::BACKING_PARAMS, params.backing_denom.as_bytes());
        self.store.set(&key, params)
    }

    /// All backing risk params, ordered by denom
    pub fn all_backing_risk_params(&self) -> Result<Vec<BackingRiskParams>> {
        self.store.values_with_prefix(prefixes::BACKING_PARAMS)
    }

    /// Load collateral risk params
    pub fn collateral_risk_params(&self, denom: &str) -> Result<Option<CollateralRiskParams>> {
        self.store.get(&make_key(prefixes::COLLATERAL_PARAMS, denom.as_bytes()))
    }

    /// Save collateral risk params
    pub fn set_collateral_risk_params(&self, params: &CollateralRiskParams) -> Result<()> {
        let key = make_key(prefixes::COLLATERAL_PARAMS, params.collateral_denom.as_bytes());
        self.store.set(&key, params)
    }

    /// All collateral risk params, ordered by denom
    pub fn all_collateral_risk_params(&self) -> Result<Vec<CollateralRiskParams>> {
        self.store.values_with_prefix(prefixes::COLLATERAL_PARAMS)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BACKING POOLS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Load a backing pool
    pub fn pool_backing(&self, denom: &str) -> Result<Option<PoolBacking>> {
        self.store.get(&make_key(prefixes::POOL_BACKING, denom.as_bytes()))
    }

    /// Save a backing pool
    pub fn set_pool_backing(&self, pool: &PoolBacking) -> Result<()> {
        let key = make_key(prefixes::POOL_BACKING, pool.backing.denom.as_bytes());
        self.store.set(&key, pool)
    }

    /// All backing pools, ordered by denom
    pub fn all_pool_backing(&self) -> Result<Vec<PoolBacking>> {
        self.store.values_with_prefix(prefixes::POOL_BACKING)
    }

    /// Load total backing
    pub fn total_backing(&self) -> Result<Option<TotalBacking>> {
        self.store.get(prefixes::TOTAL_BACKING)
    }

    /// Save total backing
    pub fn set_total_backing(&self, total: &TotalBacking) -> Result<()> {
        self.store.set(prefixes::TOTAL_BACKING, total)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COLLATERAL POOLS AND POSITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Load a collateral pool
    pub fn pool_collateral(&self, denom: &str) -> Result<Option<PoolCollateral>> {
        self.store.get(&make_key(prefixes::POOL_COLLATERAL, denom.as_bytes()))
    }

    /// Save a collateral pool
    pub fn set_pool_collateral(&self, pool: &PoolCollateral) -> Result<()> {
        let key = make_key(prefixes::POOL_COLLATERAL, pool.collateral.denom.as_bytes());
        self.store.set(&key, pool)
    }

    /// All collateral pools, ordered by denom
    pub fn all_pool_collateral(&self) -> Result<Vec<PoolCollateral>> {
        self.store.values_with_prefix(prefixes::POOL_COLLATERAL)
    }

    /// Load total collateral
    pub fn total_collateral(&self) -> Result<Option<TotalCollateral>> {
        self.store.get(prefixes::TOTAL_COLLATERAL)
    }

    /// Save total collateral
    pub fn set_total_collateral(&self, total: &TotalCollateral) -> Result<()> {
        self.store.set(prefixes::TOTAL_COLLATERAL, total)
    }

    /// Load an account position
    pub fn account_collateral(&self, account: &Address, denom: &str) -> Result<Option<AccountCollateral>> {
        self.store.get(&account_collateral_key(account, denom))
    }

    /// Save an account position
    pub fn set_account_collateral(&self, acc: &AccountCollateral) -> Result<()> {
        let key = account_collateral_key(&acc.account, &acc.collateral.denom);
        self.store.set(&key, acc)
    }

    /// Every position of every account
    pub fn all_account_collateral(&self) -> Result<Vec<AccountCollateral>> {
        self.store.values_with_prefix(prefixes::ACCOUNT_COLLATERAL)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UTILITY METHODS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a write buffer
    pub fn batch(&self) -> MakerBatch<'_, B> {
        MakerBatch {
            tx: self.store.transaction(),
        }
    }

    /// SHA-256 over every key-value pair in key order, hex encoded
    pub fn state_hash(&self) -> Result<String> {
        let backend = self.store.backend();
        let mut hasher = Sha256::new();

        for key in backend.keys()? {
            if let Some(value) = backend.get(&key)? {
                hasher.update((key.len() as u64).to_be_bytes());
                hasher.update(&key);
                hasher.update((value.len() as u64).to_be_bytes());
                hasher.update(&value);
            }
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        self.store.backend()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WRITE BUFFER
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed write buffer over [`StoreTransaction`]
pub struct MakerBatch<'a, B: StorageBackend> {
    tx: StoreTransaction<'a, B>,
}

impl<'a, B: StorageBackend> MakerBatch<'a, B> {
    /// Stage module params
    pub fn set_params(&mut self, params: &MakerParams) -> Result<()> {
        self.tx.put(prefixes::PARAMS.to_vec(), params)
    }

    /// Stage backing ratio and adjustment height
    pub fn set_backing_ratio(&mut self, ratio: Decimal, height: i64) -> Result<()> {
        self.tx.put(prefixes::BACKING_RATIO.to_vec(), &ratio)?;
        self.tx.put(prefixes::BACKING_RATIO_LAST_BLOCK.to_vec(), &height)
    }

    /// Stage backing risk params
    pub fn set_backing_risk_params(&mut self, params: &BackingRiskParams) -> Result<()> {
        let key = make_key(prefixes::BACKING_PARAMS, params.backing_denom.as_bytes());
        self.tx.put(key, params)
    }

    /// Stage collateral risk params
    pub fn set_collateral_risk_params(&mut self, params: &CollateralRiskParams) -> Result<()> {
        let key = make_key(prefixes::COLLATERAL_PARAMS, params.collateral_denom.as_bytes());
        self.tx.put(key, params)
    }

    /// Stage a backing pool
    pub fn set_pool_backing(&mut self, pool: &PoolBacking) -> Result<()> {
        let key = make_key(prefixes::POOL_BACKING, pool.backing.denom.as_bytes());
        self.tx.put(key, pool)
    }

    /// Stage total backing
    pub fn set_total_backing(&mut self, total: &TotalBacking) -> Result<()> {
        self.tx.put(prefixes::TOTAL_BACKING.to_vec(), total)
    }

    /// Stage a collateral pool
    pub fn set_pool_collateral(&mut self, pool: &PoolCollateral) -> Result<()> {
        let key = make_key(prefixes::POOL_COLLATERAL, pool.collateral.denom.as_bytes());
        self.tx.put(key, pool)
    }

    /// Stage total collateral
    pub fn set_total_collateral(&mut self, total: &TotalCollateral) -> Result<()> {
        self.tx.put(prefixes::TOTAL_COLLATERAL.to_vec(), total)
    }

    /// Stage an account position
    pub fn set_account_collateral(&mut self, acc: &AccountCollateral) -> Result<()> {
        let key = account_collateral_key(&acc.account, &acc.collateral.denom);
        self.tx.put(key, acc)
    }

    /// Stage a whole collateral position update
    pub fn set_collateral_position(
        &mut self,
        total: &TotalCollateral,
        pool: &PoolCollateral,
        acc: &AccountCollateral,
    ) -> Result<()> {
        self.set_total_collateral(total)?;
        self.set_pool_collateral(pool)?;
        self.set_account_collateral(acc)
    }

    /// Apply all staged writes atomically
    pub fn commit(self) -> Result<()> {
        self.tx.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::InMemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_backing_ratio_defaults() {
        let store = MakerStore::new(InMemoryStore::new());
        assert_eq!(store.backing_ratio().unwrap(), dec!(1));
        assert_eq!(store.backing_ratio_last_block().unwrap(), 0);

        store.set_backing_ratio(dec!(0.9975)).unwrap();
        store.set_backing_ratio_last_block(600).unwrap();
        assert_eq!(store.backing_ratio().unwrap(), dec!(0.9975));
        assert_eq!(store.backing_ratio_last_block().unwrap(), 600);
    }

    #[test]
    fn test_params_round_trip() {
        let store = MakerStore::new(InMemoryStore::new());
        assert!(store.params().is_err());

        store.set_params(&MakerParams::default()).unwrap();
        assert_eq!(store.params().unwrap(), MakerParams::default());
    }

    #[test]
    fn test_risk_params_listing() {
        let store = MakerStore::new(InMemoryStore::new());
        store
            .set_backing_risk_params(&BackingRiskParams::new("uusdt").with_fees(Some(dec!(0.001)), None, None, None))
            .unwrap();
        store.set_backing_risk_params(&BackingRiskParams::new("uusdc")).unwrap();

        let all = store.all_backing_risk_params().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].backing_denom, "uusdc");
        assert_eq!(all[1].mint_fee, Some(dec!(0.001)));
    }

    #[test]
    fn test_account_collateral_keyed_by_account_and_denom() {
        let store = MakerStore::new(InMemoryStore::new());
        let alice = Address::new("grid1alice").unwrap();
        let bob = Address::new("grid1bob").unwrap();

        let mut acc = AccountCollateral::new(alice.clone(), "uatom", 10);
        acc.grid_debt = 400;
        store.set_account_collateral(&acc).unwrap();
        store
            .set_account_collateral(&AccountCollateral::new(bob.clone(), "uatom", 10))
            .unwrap();

        assert_eq!(store.account_collateral(&alice, "uatom").unwrap().unwrap().grid_debt, 400);
        assert!(store.account_collateral(&alice, "uosmo").unwrap().is_none());
        assert_eq!(store.all_account_collateral().unwrap().len(), 2);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let store = MakerStore::new(InMemoryStore::new());
        let before = store.state_hash().unwrap();

        {
            let mut batch = store.batch();
            batch.set_pool_backing(&PoolBacking::new("uusdc")).unwrap();
            batch.set_total_backing(&TotalBacking::default()).unwrap();
        }
        assert_eq!(store.state_hash().unwrap(), before);

        let mut batch = store.batch();
        batch.set_pool_backing(&PoolBacking::new("uusdc")).unwrap();
        batch.set_total_backing(&TotalBacking::default()).unwrap();
        batch.commit().unwrap();

        assert!(store.pool_backing("uusdc").unwrap().is_some());
        assert_ne!(store.state_hash().unwrap(), before);
    }

    #[test]
    fn test_state_hash_deterministic() {
        let a = MakerStore::new(InMemoryStore::new());
        let b = MakerStore::new(InMemoryStore::new());

        a.set_pool_backing(&PoolBacking::new("uusdc")).unwrap();
        a.set_pool_backing(&PoolBacking::new("uatom")).unwrap();
        b.set_pool_backing(&PoolBacking::new("uatom")).unwrap();
        b.set_pool_backing(&PoolBacking::new("uusdc")).unwrap();

        assert_eq!(a.state_hash().unwrap(), b.state_hash().unwrap());
    }
}
