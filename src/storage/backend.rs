//! Storage backend implementations.
//!
//! This module provides the key-value layer under the maker state:
//! - StorageBackend: byte-level trait with atomic batch writes
//! - InMemoryStore: ordered in-memory storage
//! - TypedStore: bincode-encoded typed access
//! - StoreTransaction: write buffer committed as one batch

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key type for storage operations
pub type StorageKey = Vec<u8>;

/// Value type for storage operations
pub type StorageValue = Vec<u8>;

/// A single write in an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair
    Put {
        /// Key
        key: StorageKey,
        /// Value
        value: StorageValue,
    },
    /// Delete a key
    Delete {
        /// Key
        key: StorageKey,
    },
}

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// List all keys with a given prefix, in ascending key order
    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>>;

    /// Get all keys, in ascending key order
    fn keys(&self) -> Result<Vec<StorageKey>>;

    /// Apply every operation or none of them
    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend with deterministic key order
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get number of entries
    pub fn len(&self) -> Result<usize> {
        let data = self.data.read().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        let data = self.data.read().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut data = self.data.write().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut data = self.data.write().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data.remove(key).is_some())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let data = self.data.read().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data.contains_key(key))
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let data = self.data.read().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn keys(&self) -> Result<Vec<StorageKey>> {
        let data = self.data.read().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data.keys().cloned().collect())
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<()> {
        let mut data = self.data.write().map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Encode a value the way [`TypedStore`] persists it
pub fn encode<T: Serialize>(value: &T) -> Result<StorageValue> {
    bincode::serialize(value)
        .map_err(|e| Error::Serialization(format!("Failed to serialize value: {}", e)))
}

/// Type-safe wrapper around a storage backend
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Create a new typed store
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a typed value
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.backend.get(key)? {
            Some(data) => {
                let value = bincode::deserialize(&data).map_err(|e| {
                    Error::Deserialization(format!("Failed to deserialize value: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        self.backend.set(key, &encode(value)?)
    }

    /// Check if a key exists
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.backend.exists(key)
    }

    /// Decode every value under `prefix`, in key order
    pub fn values_with_prefix<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for key in self.backend.list_prefix(prefix)? {
            if let Some(value) = self.get(&key)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Start a write buffer
    pub fn transaction(&self) -> StoreTransaction<'_, B> {
        StoreTransaction {
            store: self,
            operations: Vec::new(),
        }
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WRITE BUFFER
// ═══════════════════════════════════════════════════════════════════════════════

/// Buffered writes applied by [`StoreTransaction::commit`] as one batch.
///
/// Dropping the transaction without committing discards every staged write.
pub struct StoreTransaction<'a, B: StorageBackend> {
    store: &'a TypedStore<B>,
    operations: Vec<BatchOperation>,
}

impl<'a, B: StorageBackend> StoreTransaction<'a, B> {
    /// Stage a typed put
    pub fn put<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<()> {
        self.operations.push(BatchOperation::Put {
            key,
            value: encode(value)?,
        });
        Ok(())
    }

    /// Stage a delete
    pub fn delete(&mut self, key: Vec<u8>) {
        self.operations.push(BatchOperation::Delete { key });
    }

    /// Number of staged operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply all staged writes atomically
    pub fn commit(self) -> Result<()> {
        if self.operations.is_empty() {
            return Ok(());
        }
        self.store.backend.write_batch(self.operations)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes for different data types
pub mod prefixes {
    /// Module params
    pub const PARAMS: &[u8] = b"params";
    /// Backing ratio
    pub const BACKING_RATIO: &[u8] = b"br";
    /// Block of the last backing ratio adjustment
    pub const BACKING_RATIO_LAST_BLOCK: &[u8] = b"brlb";
    /// Backing risk params prefix
    pub const BACKING_PARAMS: &[u8] = b"bparams:";
    /// Collateral risk params prefix
    pub const COLLATERAL_PARAMS: &[u8] = b"cparams:";
    /// Backing pool prefix
    pub const POOL_BACKING: &[u8] = b"bpool:";
    /// Collateral pool prefix
    pub const POOL_COLLATERAL: &[u8] = b"cpool:";
    /// Total backing
    pub const TOTAL_BACKING: &[u8] = b"tbacking";
    /// Total collateral
    pub const TOTAL_COLLATERAL: &[u8] = b"tcoll";
    /// Account collateral prefix
    pub const ACCOUNT_COLLATERAL: &[u8] = b"acoll:";
}

/// Create a key with a prefix
pub fn make_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(prefix.len() + key.len());
    result.extend_from_slice(prefix);
    result.extend_from_slice(key);
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
