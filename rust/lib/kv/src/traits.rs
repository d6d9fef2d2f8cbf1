use crate::error::KVError;

/// Read access to one consistent view of the store.
///
/// Keys follow a namespaced convention: `social:user:00000000000000000001`,
/// `social:like:{tweet}:{user}`, etc. `scan` returns entries sorted by key.
pub trait KVRead {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}

/// A serializable read-write transaction.
///
/// Writes become visible to other readers only after `commit`. Dropping the
/// transaction without committing discards every write made through it.
pub trait KVTxn: KVRead {
    /// Set a key-value pair, replacing any previous value.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Insert a key only if it is absent.
    ///
    /// Returns `false` (and writes nothing) when the key already exists. This
    /// is the store-level uniqueness constraint callers rely on for pair keys.
    fn insert_new(&mut self, key: &str, value: &[u8]) -> Result<bool, KVError>;

    /// Delete a key. Returns whether a value was removed.
    fn delete(&mut self, key: &str) -> Result<bool, KVError>;

    /// Atomically publish every write made in this transaction.
    fn commit(self: Box<Self>) -> Result<(), KVError>;
}

/// KVStore provides a key-value storage interface with transactional writes.
///
/// `get`/`set`/`delete`/`scan` are single-key shortcuts, each in its own
/// transaction. Anything that must stay consistent across keys goes through
/// `begin()` or `snapshot()`.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair in its own transaction.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key in its own transaction.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Begin a read-write transaction. Only one may be open at a time; a
    /// second caller waits until the first commits or is dropped.
    fn begin(&self) -> Result<Box<dyn KVTxn + '_>, KVError>;

    /// Open a read-only snapshot. Snapshots never block writers.
    fn snapshot(&self) -> Result<Box<dyn KVRead + '_>, KVError>;
}
